//! Grouping engine: generic pass drivers (C2) plus the fixed-order
//! pipeline of recognizers (C3), grounded in
//! `examples/original_source/sqlparse/engine/grouping.py`.

mod brackets;
mod casts;
mod clauses;
mod expr;
mod lists;
mod names;
mod statements;

use crate::error::{Clause, GroupError};
use crate::lexer::token::LexKind;
use crate::tree::{Arena, GroupKind, NodeId};
use tracing::debug;

/// Shared "looks like a name or qualified name" test used by the
/// period/array/typecast/comparison family of passes.
pub(crate) fn is_identifier_like(arena: &Arena, id: NodeId) -> bool {
    arena.token_matches(id, LexKind::Name, None)
        || arena.token_matches(id, LexKind::StringSymbol, None)
        || arena.token_matches(id, LexKind::NamePlaceholder, None)
        || arena.token_matches(id, LexKind::NameBuiltin, None)
        || arena.token_matches(id, LexKind::Wildcard, None)
        || arena.is_group_kind(id, GroupKind::Identifier)
        || arena.is_group_kind(id, GroupKind::Function)
}

/// Delimiter pairing with a stack (spec.md §4.2 `_group_matching`).
/// Recurses into contained groups of a different kind first. An
/// unmatched close is tolerated for every kind except `Parenthesis`,
/// where it is a fatal `UnbalancedParenthesis`.
pub fn group_matching(
    arena: &mut Arena,
    id: NodeId,
    kind: GroupKind,
    is_open: &dyn Fn(&Arena, NodeId) -> bool,
    is_close: &dyn Fn(&Arena, NodeId) -> bool,
) -> Result<(), GroupError> {
    let mut idx = 0usize;
    let mut stack: Vec<usize> = Vec::new();
    loop {
        let len = arena.children(id).len();
        if idx >= len {
            break;
        }
        let child = arena.children(id)[idx];

        if arena.is_whitespace(child) {
            idx += 1;
            continue;
        }

        if arena.is_group(child) && !arena.is_group_kind(child, kind) {
            group_matching(arena, child, kind, is_open, is_close)?;
            idx += 1;
            continue;
        }

        if is_open(arena, child) {
            stack.push(idx);
            idx += 1;
            continue;
        }

        if is_close(arena, child) {
            match stack.pop() {
                Some(open_idx) => {
                    arena.group_tokens(id, kind, open_idx, idx, false);
                    idx = open_idx + 1;
                }
                None => {
                    if kind == GroupKind::Parenthesis {
                        return Err(GroupError::UnbalancedParenthesis);
                    }
                    debug!(?kind, "unmatched close, tolerating malformed input");
                    idx += 1;
                }
            }
            continue;
        }

        idx += 1;
    }
    Ok(())
}

/// Infix-anchored grouping (spec.md §4.2 `_group`) for the common case
/// where the collapsed span is exactly `[prev, curr, next]`. Passes
/// needing a different span compute it directly against `Arena`
/// rather than going through this helper.
pub fn group_adjacent(
    arena: &mut Arena,
    id: NodeId,
    kind: GroupKind,
    extend: bool,
    is_center: &dyn Fn(&Arena, NodeId) -> bool,
    valid_prev: &dyn Fn(&Arena, Option<NodeId>) -> bool,
    valid_next: &dyn Fn(&Arena, Option<NodeId>) -> bool,
) {
    let mut tidx = 0usize;
    loop {
        let len = arena.children(id).len();
        if tidx >= len {
            break;
        }
        let curr = arena.children(id)[tidx];

        if arena.is_group(curr) && !arena.is_group_kind(curr, kind) {
            group_adjacent(arena, curr, kind, extend, is_center, valid_prev, valid_next);
        }

        if is_center(arena, curr) {
            let prev = arena.token_prev(id, Some(tidx), true, false).map(|(_, n)| n);
            let next = arena.token_next(id, Some(tidx), true, false, false).map(|(_, n)| n);
            if valid_prev(arena, prev) && valid_next(arena, next) {
                if let (Some(p), Some(n)) = (prev, next) {
                    let from = arena.token_index(id, p).unwrap();
                    let to = arena.token_index(id, n).unwrap();
                    arena.group_tokens(id, kind, from, to, extend);
                    tidx = from;
                    continue;
                }
            }
        }
        tidx += 1;
    }
}

/// Runs the fixed 32-pass pipeline on the root statement
/// (spec.md §4.3). Order is load-bearing.
pub fn group(arena: &mut Arena) -> Result<(), GroupError> {
    let root = arena.root;

    brackets::group_comments(arena, root);
    brackets::group_brackets(arena, root);
    brackets::group_parenthesis(arena, root)?;
    brackets::group_case(arena, root);
    brackets::group_if(arena, root);
    brackets::group_for(arena, root);
    brackets::group_begin(arena, root);

    names::group_functions(arena, root);
    names::group_window_function(arena, root);
    names::group_period(arena, root);
    names::group_arrays(arena, root);
    names::group_identifier(arena, root);
    names::group_signed_identifier(arena, root);
    names::group_order(arena, root);

    casts::group_typecasts(arena, root);
    casts::group_tzcasts(arena, root);
    casts::group_typed_literal(arena, root);

    expr::group_operator(arena, root);
    expr::group_comparison(arena, root);
    expr::group_as(arena, root);
    expr::group_sub_query(arena, root);
    expr::group_aliased(arena, root);
    expr::group_assignment(arena, root);
    expr::group_conditions_list(arena, root);
    expr::align_comments(arena, root);

    lists::group_identifier_list(arena, root);
    lists::group_clause_partition_by(arena, root);
    lists::group_clause_order_by(arena, root);
    lists::group_clause_group_by(arena, root);
    lists::group_values(arena, root);

    clauses::group_clause_where(arena, root);
    clauses::group_clause_from(arena, root);
    clauses::group_select_projection(arena, root).map_err(|_| GroupError::invalid_syntax(Clause::Select))?;
    clauses::group_clause_with(arena, root).map_err(|_| GroupError::invalid_syntax(Clause::With))?;
    clauses::group_clause_insert(arena, root).map_err(|_| GroupError::invalid_syntax(Clause::Insert))?;

    statements::group_statement_select(arena, root);
    statements::group_statement_union(arena, root);
    statements::group_statement_insert(arena, root);

    Ok(())
}
