//! Passes 30-32: wrapping the whole statement body.

use crate::lexer::token::LexKind;
use crate::tree::{Arena, GroupKind, NodeId};

/// Last meaningful index in `id`'s children, trimming trailing
/// whitespace and (when `id` is itself a `Parenthesis`'s content) the
/// closing `)` token.
fn clause_end(arena: &Arena, id: NodeId) -> Option<usize> {
    let len = arena.children(id).len();
    if len == 0 {
        return None;
    }
    let mut end = len - 1;
    loop {
        let cid = arena.children(id)[end];
        if arena.is_whitespace(cid) || arena.token_matches(cid, LexKind::Punctuation, Some(&[")"])) {
            if end == 0 {
                return None;
            }
            end -= 1;
        } else {
            break;
        }
    }
    Some(end)
}

/// Pass 30: `[ClauseWith] SelectProjection ...` -> `StatementSelect`,
/// spanning to the end of the enclosing list.
pub fn group_statement_select(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::StatementSelect) {
            group_statement_select(arena, curr);
        }
        if arena.is_group_kind(curr, GroupKind::SelectProjection) {
            let mut start_idx = i;
            if let Some((pidx, pid)) = arena.token_prev(id, Some(i), true, false) {
                if arena.is_group_kind(pid, GroupKind::ClauseWith) {
                    start_idx = pidx;
                }
            }
            if let Some(end_idx) = clause_end(arena, id) {
                if end_idx >= i {
                    arena.group_tokens(id, GroupKind::StatementSelect, start_idx, end_idx, false);
                    i = start_idx;
                }
            }
        }
        i += 1;
    }
}

/// Pass 31: `StatementSelect (UNION | UNION ALL) StatementSelect` ->
/// `StatementUnion` (extend, so a chain of unions collapses into one).
pub fn group_statement_union(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::StatementUnion) {
            group_statement_union(arena, curr);
        }
        if arena.is_any_group_kind(curr, &[GroupKind::StatementSelect, GroupKind::StatementUnion]) {
            if let Some((uidx, uid)) = arena.token_next(id, Some(i), true, false, false) {
                if arena.token_matches(uid, LexKind::Keyword, Some(&["UNION", "UNION ALL"])) {
                    if let Some((sidx, sid)) = arena.token_next(id, Some(uidx), true, false, false) {
                        if arena.is_group_kind(sid, GroupKind::StatementSelect) {
                            arena.group_tokens(id, GroupKind::StatementUnion, i, sidx, true);
                            continue;
                        }
                    }
                }
            }
        }
        i += 1;
    }
}

/// Pass 32: `[ClauseWith] ClauseInsert ...` -> `StatementInsert`.
pub fn group_statement_insert(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::StatementInsert) {
            group_statement_insert(arena, curr);
        }
        if arena.is_group_kind(curr, GroupKind::ClauseInsert) {
            let mut start_idx = i;
            if let Some((pidx, pid)) = arena.token_prev(id, Some(i), true, false) {
                if arena.is_group_kind(pid, GroupKind::ClauseWith) {
                    start_idx = pidx;
                }
            }
            if let Some(end_idx) = clause_end(arena, id) {
                if end_idx >= i {
                    arena.group_tokens(id, GroupKind::StatementInsert, start_idx, end_idx, false);
                    i = start_idx;
                }
            }
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::passes::{brackets, clauses, expr, lists, names};

    fn build(sql: &str) -> Arena {
        let tokens = tokenize(sql);
        let mut arena = Arena::from_tokens(tokens);
        let root = arena.root;
        brackets::group_comments(&mut arena, root);
        brackets::group_brackets(&mut arena, root);
        brackets::group_parenthesis(&mut arena, root).unwrap();
        names::group_functions(&mut arena, root);
        names::group_period(&mut arena, root);
        names::group_identifier(&mut arena, root);
        expr::group_comparison(&mut arena, root);
        lists::group_identifier_list(&mut arena, root);
        clauses::group_clause_where(&mut arena, root);
        clauses::group_clause_from(&mut arena, root);
        clauses::group_select_projection(&mut arena, root).unwrap();
        arena
    }

    #[test]
    fn select_statement_spans_to_end() {
        let mut arena = build("SELECT a FROM t WHERE a = 1");
        group_statement_select(&mut arena, arena.root);
        let grp = arena.children(arena.root)[0];
        assert!(arena.is_group_kind(grp, GroupKind::StatementSelect));
        assert_eq!(arena.children(arena.root).len(), 1);
    }
}
