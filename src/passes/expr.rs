//! Passes 15-22: operators, comparisons, AS-aliasing, subqueries,
//! implicit aliases, assignment, boolean condition lists, comment
//! alignment.

use super::{group_adjacent, is_identifier_like};
use crate::lexer::token::LexKind;
use crate::tree::{Arena, GroupKind, NodeId};

fn is_operand(arena: &Arena, id: NodeId) -> bool {
    is_identifier_like(arena, id)
        || arena.token_matches(id, LexKind::Number, None)
        || arena.is_any_group_kind(id, &[GroupKind::Operation, GroupKind::TypedLiteral, GroupKind::Parenthesis, GroupKind::Function, GroupKind::SignedIdentifier])
}

/// Pass 15: arithmetic/wildcard operators between valid operands ->
/// `Operation`; a matched `Wildcard` is renormalized to `Operator`.
pub fn group_operator(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::Operation) {
            group_operator(arena, curr);
        }
        let is_op = arena.token_matches(curr, LexKind::Operator, None) || arena.token_matches(curr, LexKind::Wildcard, None);
        if is_op {
            let prev = arena.token_prev(id, Some(i), true, false);
            let next = arena.token_next(id, Some(i), true, false, false);
            if let (Some((pidx, p)), Some((nidx, n))) = (prev, next) {
                if is_operand(arena, p) && is_operand(arena, n) {
                    arena.set_token_kind(curr, LexKind::Operator);
                    let grp = arena.group_tokens(id, GroupKind::Operation, pidx, nidx, true);
                    i = arena.token_index(id, grp).unwrap();
                    continue;
                }
            }
        }
        i += 1;
    }
}

fn is_comparison_operand(arena: &Arena, id: NodeId) -> bool {
    is_identifier_like(arena, id)
        || arena.token_matches(id, LexKind::Number, None)
        || arena.token_matches(id, LexKind::StringLit, None)
        || arena.token_matches(id, LexKind::Keyword, Some(&["NULL"]))
        || arena.is_any_group_kind(id, &[GroupKind::Identifier, GroupKind::Parenthesis, GroupKind::Function, GroupKind::Operation, GroupKind::TypedLiteral])
}

/// Pass 16: `x <cmp> y` -> `Comparison`. `NULL` is accepted on either
/// side regardless of the specific operator (spec.md §9, open question iii).
pub fn group_comparison(arena: &mut Arena, id: NodeId) {
    group_adjacent(
        arena,
        id,
        GroupKind::Comparison,
        false,
        &|a, t| a.token_matches(t, LexKind::OperatorComparison, None),
        &|a, prev| prev.map(|p| is_comparison_operand(a, p)).unwrap_or(false),
        &|a, next| next.map(|n| is_comparison_operand(a, n)).unwrap_or(false),
    );
}

fn valid_as_prev(arena: &Arena, prev: Option<NodeId>) -> bool {
    match prev {
        None => false,
        Some(p) => {
            let bad_keyword = arena.is_keyword(p) && !arena.token_matches(p, LexKind::Keyword, Some(&["NULL"]));
            let bad_paren = arena.is_group_kind(p, GroupKind::Parenthesis) && !arena.attrs(p).map(|a| a.is_sub_query).unwrap_or(false);
            !bad_keyword && !bad_paren
        }
    }
}

fn valid_as_next(arena: &Arena, next: Option<NodeId>) -> bool {
    match next {
        None => false,
        Some(n) => {
            let bad_type = arena.token_matches(n, LexKind::KeywordDml, None) || arena.token_matches(n, LexKind::KeywordDdl, None) || arena.token_matches(n, LexKind::Cte, None);
            let bad_paren = arena.is_group_kind(n, GroupKind::Parenthesis) && !arena.attrs(n).map(|a| a.is_sub_query).unwrap_or(false);
            !bad_type && !bad_paren
        }
    }
}

/// Pass 17: `expr AS alias` -> `Identifier`.
pub fn group_as(arena: &mut Arena, id: NodeId) {
    group_adjacent(arena, id, GroupKind::Identifier, false, &|a, t| a.token_matches(t, LexKind::Keyword, Some(&["AS"])), &valid_as_prev, &valid_as_next);
}

/// Pass 18: `(subquery) alias` or `alias (subquery)`, optionally with
/// `AS`, where the parenthesis carries `is_subQuery` -> `SubQuery`.
pub fn group_sub_query(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::SubQuery) {
            group_sub_query(arena, curr);
        }
        let is_sub_paren = arena.is_group_kind(curr, GroupKind::Parenthesis) && arena.attrs(curr).map(|a| a.is_sub_query).unwrap_or(false);
        if is_sub_paren {
            if let Some((nidx, nid)) = arena.token_next(id, Some(i), true, false, false) {
                if arena.token_matches(nid, LexKind::Keyword, Some(&["AS"])) {
                    if let Some((aidx, aid)) = arena.token_next(id, Some(nidx), true, false, false) {
                        if is_identifier_like(arena, aid) {
                            arena.group_tokens(id, GroupKind::SubQuery, i, aidx, false);
                            i += 1;
                            continue;
                        }
                    }
                } else if is_identifier_like(arena, nid) {
                    arena.group_tokens(id, GroupKind::SubQuery, i, nidx, false);
                    i += 1;
                    continue;
                }
            }
            if let Some((pidx, pid)) = arena.token_prev(id, Some(i), true, false) {
                if is_identifier_like(arena, pid) {
                    arena.group_tokens(id, GroupKind::SubQuery, pidx, i, false);
                    i = pidx;
                    i += 1;
                    continue;
                }
            }
        }
        i += 1;
    }
}

/// Pass 19: an expression immediately followed by an `Identifier`
/// (no `AS`) -> extend into `Identifier` (implicit alias).
pub fn group_aliased(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::Identifier) {
            group_aliased(arena, curr);
        }
        let is_target = arena.is_any_group_kind(curr, &[GroupKind::Function, GroupKind::Case, GroupKind::Identifier, GroupKind::Operation, GroupKind::Comparison, GroupKind::WindowFunction]) || arena.token_matches(curr, LexKind::Number, None);
        if is_target {
            if let Some((nidx, nid)) = arena.token_next(id, Some(i), true, false, false) {
                if arena.is_group_kind(nid, GroupKind::Identifier) {
                    arena.group_tokens(id, GroupKind::Identifier, i, nidx, true);
                    continue;
                }
            }
        }
        i += 1;
    }
}

/// Pass 20: `x := ...` up to the next `;` -> `Assignment`.
pub fn group_assignment(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) {
            group_assignment(arena, curr);
        }
        if arena.token_matches(curr, LexKind::Assignment, None) {
            if let Some((pidx, _)) = arena.token_prev(id, Some(i), true, false) {
                let children_len = arena.children(id).len();
                let mut end_idx = children_len - 1;
                let mut j = i + 1;
                while j < children_len {
                    let cid = arena.children(id)[j];
                    if arena.token_matches(cid, LexKind::Punctuation, Some(&[";"])) {
                        end_idx = j.saturating_sub(1);
                        break;
                    }
                    j += 1;
                }
                if end_idx >= pidx {
                    arena.group_tokens(id, GroupKind::Assignment, pidx, end_idx, false);
                    i = pidx;
                }
            }
        }
        i += 1;
    }
}

fn is_condition_operand(arena: &Arena, id: NodeId) -> bool {
    arena.is_any_group_kind(id, &[GroupKind::Comparison, GroupKind::Parenthesis, GroupKind::ConditionsList, GroupKind::Identifier])
}

/// Pass 21: `a AND|OR [NOT] b` -> `ConditionsList`, incrementing
/// `conditions_count` (by 2 when the right operand is a parenthesis).
pub fn group_conditions_list(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::ConditionsList) {
            group_conditions_list(arena, curr);
        }
        if arena.token_matches(curr, LexKind::Keyword, Some(&["AND", "OR"])) {
            let prev = arena.token_prev(id, Some(i), true, false);
            let mut next_cursor = i;
            if let Some((nidx, nid)) = arena.token_next(id, Some(next_cursor), true, false, false) {
                if arena.token_matches(nid, LexKind::Keyword, Some(&["NOT"])) {
                    next_cursor = nidx;
                }
            }
            let next = arena.token_next(id, Some(next_cursor), true, false, false);
            if let (Some((pidx, p)), Some((nidx, n))) = (prev, next) {
                if is_condition_operand(arena, p) && is_condition_operand(arena, n) {
                    let inc = if arena.is_group_kind(n, GroupKind::Parenthesis) { 2 } else { 1 };
                    let grp = arena.group_tokens(id, GroupKind::ConditionsList, pidx, nidx, true);
                    if let Some(attrs) = arena.attrs_mut(grp) {
                        attrs.conditions_count += inc;
                    }
                    i = arena.token_index(id, grp).unwrap();
                    continue;
                }
            }
        }
        i += 1;
    }
}

/// Pass 22: recursive walk of `Comment` groups. Left as a structural
/// pass-through (spec.md §9, open question i): the source's own
/// `align_comments` does not change the tree either.
pub fn align_comments(arena: &mut Arena, id: NodeId) {
    for &child in arena.children(id).to_vec().iter() {
        if arena.is_group(child) {
            align_comments(arena, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use super::super::{brackets, names};

    fn run_prelude(arena: &mut Arena) {
        let root = arena.root;
        brackets::group_comments(arena, root);
        brackets::group_brackets(arena, root);
        brackets::group_parenthesis(arena, root).unwrap();
        names::group_period(arena, root);
        names::group_identifier(arena, root);
    }

    #[test]
    fn comparison_groups_identifiers() {
        let tokens = tokenize("a = 1");
        let mut arena = Arena::from_tokens(tokens);
        run_prelude(&mut arena);
        group_comparison(&mut arena, arena.root);
        assert!(arena.is_group_kind(arena.children(arena.root)[0], GroupKind::Comparison));
    }

    #[test]
    fn conditions_list_counts_junctions() {
        let tokens = tokenize("a = 1 and b = 2");
        let mut arena = Arena::from_tokens(tokens);
        run_prelude(&mut arena);
        group_comparison(&mut arena, arena.root);
        group_conditions_list(&mut arena, arena.root);
        let grp = arena.children(arena.root)[0];
        assert!(arena.is_group_kind(grp, GroupKind::ConditionsList));
        assert_eq!(arena.attrs(grp).unwrap().conditions_count, 1);
    }
}
