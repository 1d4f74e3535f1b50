//! Passes 23-26: comma lists, BY-clauses, VALUES tuples.

use crate::lexer::token::LexKind;
use crate::tree::{Arena, GroupKind, NodeId};

fn is_list_item(arena: &Arena, id: NodeId) -> bool {
    arena.is_any_group_kind(id, &[GroupKind::Identifier, GroupKind::Function, GroupKind::Case, GroupKind::Comparison, GroupKind::SubQuery, GroupKind::TypedLiteral, GroupKind::Operation])
        || arena.token_matches(id, LexKind::Number, None)
        || arena.token_matches(id, LexKind::StringLit, None)
        || arena.token_matches(id, LexKind::NamePlaceholder, None)
        || arena.token_matches(id, LexKind::Wildcard, None)
        || arena.token_matches(id, LexKind::Keyword, Some(&["NULL"]))
}

/// Pass 23: comma-separated list items -> `IdentifierList`, tracking
/// `id_list_count`.
pub fn group_identifier_list(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::IdentifierList) {
            group_identifier_list(arena, curr);
        }
        if arena.token_matches(curr, LexKind::Punctuation, Some(&[","])) {
            let prev = arena.token_prev(id, Some(i), true, false);
            let next = arena.token_next(id, Some(i), true, false, false);
            if let (Some((pidx, p)), Some((nidx, n))) = (prev, next) {
                if is_list_item(arena, p) && is_list_item(arena, n) {
                    let extending = arena.is_group_kind(p, GroupKind::IdentifierList);
                    let grp = arena.group_tokens(id, GroupKind::IdentifierList, pidx, nidx, true);
                    if let Some(attrs) = arena.attrs_mut(grp) {
                        attrs.id_list_count = if extending { attrs.id_list_count + 1 } else { 2 };
                    }
                    i = arena.token_index(id, grp).unwrap();
                    continue;
                }
            }
        }
        i += 1;
    }
}

fn group_clause_by_keyword(arena: &mut Arena, id: NodeId, kind: GroupKind, keyword_values: &'static [&'static str]) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, kind) {
            group_clause_by_keyword(arena, curr, kind, keyword_values);
        }
        if arena.token_matches(curr, LexKind::Keyword, Some(keyword_values)) {
            if let Some((nidx, nid)) = arena.token_next(id, Some(i), true, false, false) {
                if arena.is_any_group_kind(nid, &[GroupKind::Identifier, GroupKind::IdentifierList, GroupKind::Function]) {
                    let kw_len = arena.text(curr).len() as u32;
                    let grp = arena.group_tokens(id, kind, i, nidx, false);
                    if let Some(attrs) = arena.attrs_mut(grp) {
                        attrs.opening_keyword_length = kw_len;
                    }
                    i = arena.token_index(id, grp).unwrap();
                }
            }
        }
        i += 1;
    }
}

/// Pass 24a: `PARTITION BY ...` -> `ClausePartitionBy`.
pub fn group_clause_partition_by(arena: &mut Arena, id: NodeId) {
    group_clause_by_keyword(arena, id, GroupKind::ClausePartitionBy, &["PARTITION BY"]);
}

/// Pass 24b: `ORDER BY ...` -> `ClauseOrderBy`.
pub fn group_clause_order_by(arena: &mut Arena, id: NodeId) {
    group_clause_by_keyword(arena, id, GroupKind::ClauseOrderBy, &["ORDER BY"]);
}

/// Pass 24c: `GROUP BY ...` -> `ClauseGroupBy`.
pub fn group_clause_group_by(arena: &mut Arena, id: NodeId) {
    group_clause_by_keyword(arena, id, GroupKind::ClauseGroupBy, &["GROUP BY"]);
}

/// Pass 25: `VALUES (...) [, (...)]*` -> `Values`.
pub fn group_values(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::Values) {
            group_values(arena, curr);
        }
        if arena.token_matches(curr, LexKind::Keyword, Some(&["VALUES"])) {
            let mut end_idx = i;
            let mut cursor = i;
            loop {
                let Some((nidx, nid)) = arena.token_next(id, Some(cursor), true, false, false) else { break };
                if !arena.is_group_kind(nid, GroupKind::Parenthesis) {
                    break;
                }
                end_idx = nidx;
                cursor = nidx;
                match arena.token_next(id, Some(cursor), true, false, false) {
                    Some((cidx, cid)) if arena.token_matches(cid, LexKind::Punctuation, Some(&[","])) => {
                        cursor = cidx;
                    }
                    _ => break,
                }
            }
            if end_idx > i {
                arena.group_tokens(id, GroupKind::Values, i, end_idx, false);
            }
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::passes::{brackets, names};

    #[test]
    fn comma_list_groups_with_count() {
        let tokens = tokenize("a, b, c");
        let mut arena = Arena::from_tokens(tokens);
        let root = arena.root;
        names::group_identifier(&mut arena, root);
        group_identifier_list(&mut arena, root);
        let grp = arena.children(root)[0];
        assert!(arena.is_group_kind(grp, GroupKind::IdentifierList));
        assert_eq!(arena.attrs(grp).unwrap().id_list_count, 3);
    }

    #[test]
    fn values_groups_tuples() {
        let tokens = tokenize("VALUES (1, 2), (3, 4)");
        let mut arena = Arena::from_tokens(tokens);
        let root = arena.root;
        brackets::group_parenthesis(&mut arena, root).unwrap();
        group_values(&mut arena, root);
        assert!(arena.is_group_kind(arena.children(root)[0], GroupKind::Values));
    }
}
