//! Passes 26-29: WHERE/FROM spans, SELECT projection, WITH, INSERT INTO.
//!
//! The SELECT/WITH/INSERT passes return `Result<(), ()>`; the caller
//! in `passes::group` maps the missing-tail case to the fatal
//! `GroupError::InvalidSyntax` for its clause.

use crate::lexer::token::LexKind;
use crate::tree::{Arena, GroupKind, NodeId};

const CLAUSE_BOUNDARY_KEYWORDS: &[&str] = &["WHERE", "FROM", "GROUP BY", "ORDER BY", "HAVING", "LIMIT", "OFFSET", "UNION", "UNION ALL", "EXCEPT", "INTERSECT", "VALUES", "SET"];

fn group_clause_span(arena: &mut Arena, id: NodeId, kind: GroupKind, opener_values: &'static [&'static str]) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, kind) {
            group_clause_span(arena, curr, kind, opener_values);
        }
        if arena.token_matches(curr, LexKind::Keyword, Some(opener_values)) {
            let kw_len = arena.text(curr).len() as u32;
            let mut end_idx = arena.children(id).len() - 1;
            let mut j = i + 1;
            while j < arena.children(id).len() {
                let cid = arena.children(id)[j];
                let is_boundary = arena.token_matches(cid, LexKind::Keyword, Some(CLAUSE_BOUNDARY_KEYWORDS)) || arena.token_matches(cid, LexKind::Punctuation, Some(&[";"]));
                if is_boundary {
                    end_idx = j.saturating_sub(1);
                    while end_idx > i && arena.is_whitespace(arena.children(id)[end_idx]) {
                        end_idx -= 1;
                    }
                    break;
                }
                j += 1;
            }
            if end_idx >= i {
                let grp = arena.group_tokens(id, kind, i, end_idx, false);
                if let Some(attrs) = arena.attrs_mut(grp) {
                    attrs.opening_keyword_length = kw_len;
                }
                i = arena.token_index(id, grp).unwrap();
            }
        }
        i += 1;
    }
}

/// Pass 26a: `WHERE ...` through the next clause boundary -> `ClauseWhere`.
pub fn group_clause_where(arena: &mut Arena, id: NodeId) {
    group_clause_span(arena, id, GroupKind::ClauseWhere, &["WHERE"]);
}

/// Pass 26b: `FROM ...` through the next clause boundary -> `ClauseFrom`.
pub fn group_clause_from(arena: &mut Arena, id: NodeId) {
    group_clause_span(arena, id, GroupKind::ClauseFrom, &["FROM"]);
}

/// Pass 27: `SELECT` through the next identifier-like target ->
/// `SelectProjection`. A `SELECT` with no target is fatal.
pub fn group_select_projection(arena: &mut Arena, id: NodeId) -> Result<(), ()> {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::SelectProjection) {
            group_select_projection(arena, curr)?;
        }
        if arena.token_matches(curr, LexKind::KeywordDml, Some(&["SELECT"])) {
            let next = arena.token_next_by(id, Some(i), false, |a, t| {
                a.is_any_group_kind(t, &[GroupKind::IdentifierList, GroupKind::Identifier]) || a.token_matches(t, LexKind::Wildcard, None)
            });
            match next {
                Some((nidx, _nid)) => {
                    let kw_len = arena.text(curr).len() as u32;
                    let grp = arena.group_tokens(id, GroupKind::SelectProjection, i, nidx, false);
                    if let Some(attrs) = arena.attrs_mut(grp) {
                        attrs.opening_keyword_length = kw_len;
                    }
                    i = arena.token_index(id, grp).unwrap();
                }
                _ => return Err(()),
            }
        }
        i += 1;
    }
    Ok(())
}

/// Pass 28: `WITH` through the next identifier/subquery target ->
/// `ClauseWith`. Missing target is fatal.
pub fn group_clause_with(arena: &mut Arena, id: NodeId) -> Result<(), ()> {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::ClauseWith) {
            group_clause_with(arena, curr)?;
        }
        if arena.token_matches(curr, LexKind::Cte, None) {
            let next = arena.token_next_by(id, Some(i), false, |a, t| a.is_any_group_kind(t, &[GroupKind::IdentifierList, GroupKind::Identifier, GroupKind::SubQuery]));
            match next {
                Some((nidx, _nid)) => {
                    let kw_len = arena.text(curr).len() as u32;
                    let grp = arena.group_tokens(id, GroupKind::ClauseWith, i, nidx, false);
                    if let Some(attrs) = arena.attrs_mut(grp) {
                        attrs.opening_keyword_length = kw_len;
                    }
                    i = arena.token_index(id, grp).unwrap();
                }
                _ => return Err(()),
            }
        }
        i += 1;
    }
    Ok(())
}

/// Pass 29: `INSERT INTO` through the next `Parenthesis` ->
/// `ClauseInsert`. Missing `INTO` or target is fatal.
pub fn group_clause_insert(arena: &mut Arena, id: NodeId) -> Result<(), ()> {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::ClauseInsert) {
            group_clause_insert(arena, curr)?;
        }
        if arena.token_matches(curr, LexKind::KeywordDml, Some(&["INSERT"])) {
            let next_kw = arena.token_next(id, Some(i), true, false, false);
            let is_into = next_kw.map(|(_, n)| arena.token_matches(n, LexKind::Keyword, Some(&["INTO"]))).unwrap_or(false);
            if !is_into {
                return Err(());
            }
            let mut end_idx = None;
            let mut j = i + 1;
            loop {
                let len2 = arena.children(id).len();
                if j >= len2 {
                    break;
                }
                let cid = arena.children(id)[j];
                if arena.is_group_kind(cid, GroupKind::Parenthesis) {
                    end_idx = Some(j);
                    break;
                }
                if arena.token_matches(cid, LexKind::Punctuation, Some(&[";"])) {
                    break;
                }
                j += 1;
            }
            match end_idx {
                Some(end) => {
                    let grp = arena.group_tokens(id, GroupKind::ClauseInsert, i, end, false);
                    if let Some(attrs) = arena.attrs_mut(grp) {
                        attrs.opening_keyword_length = "INSERT INTO".len() as u32;
                    }
                    i = arena.token_index(id, grp).unwrap();
                }
                None => return Err(()),
            }
        }
        i += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::passes::names;

    #[test]
    fn where_clause_stops_at_group_by() {
        let tokens = tokenize("WHERE a = 1 GROUP BY a");
        let mut arena = Arena::from_tokens(tokens);
        let root = arena.root;
        names::group_identifier(&mut arena, root);
        group_clause_where(&mut arena, root);
        let grp = arena.children(root)[0];
        assert!(arena.is_group_kind(grp, GroupKind::ClauseWhere));
        assert!(arena.children(root).len() > 1);
    }

    #[test]
    fn bare_select_is_invalid_syntax() {
        let tokens = tokenize("SELECT");
        let mut arena = Arena::from_tokens(tokens);
        let root = arena.root;
        assert!(group_select_projection(&mut arena, root).is_err());
    }

    #[test]
    fn select_distinct_is_not_fatal() {
        let tokens = tokenize("SELECT DISTINCT a FROM t");
        let mut arena = Arena::from_tokens(tokens);
        crate::passes::group(&mut arena).unwrap();
    }

    #[test]
    fn select_with_leading_comment_is_not_fatal() {
        let tokens = tokenize("SELECT /*c*/ a FROM t");
        let mut arena = Arena::from_tokens(tokens);
        crate::passes::group(&mut arena).unwrap();
    }

    #[test]
    fn with_clause_with_leading_comment_is_not_fatal() {
        let tokens = tokenize("WITH /*c*/ cte AS (SELECT 1) SELECT * FROM cte");
        let mut arena = Arena::from_tokens(tokens);
        crate::passes::group(&mut arena).unwrap();
    }
}
