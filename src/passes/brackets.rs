//! Delimiter-pairing passes 1-7: comments, brackets, parenthesis,
//! CASE/IF/FOR/BEGIN blocks.

use super::group_matching;
use crate::error::GroupError;
use crate::lexer::token::LexKind;
use crate::tree::{Arena, GroupKind, NodeId};

/// Pass 1: collapse runs of `Comment` tokens (and interior whitespace
/// between them) into a `Comment` group.
pub fn group_comments(arena: &mut Arena, id: NodeId) {
    let children: Vec<NodeId> = arena.children(id).to_vec();
    for &child in &children {
        if arena.is_group(child) {
            group_comments(arena, child);
        }
    }

    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let child = arena.children(id)[i];
        if !arena.is_comment(child) {
            i += 1;
            continue;
        }
        let mut j = i;
        loop {
            let next = j + 1;
            if next >= arena.children(id).len() {
                break;
            }
            let nid = arena.children(id)[next];
            if arena.is_comment(nid) || arena.is_whitespace(nid) {
                j = next;
            } else {
                break;
            }
        }
        while j > i && arena.is_whitespace(arena.children(id)[j]) {
            j -= 1;
        }
        if j > i {
            arena.group_tokens(id, GroupKind::Comment, i, j, false);
        }
        i += 1;
    }
}

/// Pass 2: `[ ]` -> `SquareBrackets`.
pub fn group_brackets(arena: &mut Arena, id: NodeId) {
    let _ = group_matching(
        arena,
        id,
        GroupKind::SquareBrackets,
        &|a, t| a.token_matches(t, LexKind::Punctuation, Some(&["["])),
        &|a, t| a.token_matches(t, LexKind::Punctuation, Some(&["]"])),
    );
}

/// Pass 3: `( )` -> `Parenthesis`, with `is_codeBlockDelimiter` /
/// `is_subQuery` annotation. Unbalanced close is fatal.
pub fn group_parenthesis(arena: &mut Arena, id: NodeId) -> Result<(), GroupError> {
    group_matching(
        arena,
        id,
        GroupKind::Parenthesis,
        &|a, t| a.token_matches(t, LexKind::Punctuation, Some(&["("])),
        &|a, t| a.token_matches(t, LexKind::Punctuation, Some(&[")"])),
    )?;
    annotate_parenthesis(arena, id);
    Ok(())
}

fn annotate_parenthesis(arena: &mut Arena, id: NodeId) {
    let children: Vec<NodeId> = arena.children(id).to_vec();
    for &child in &children {
        if arena.is_group(child) {
            annotate_parenthesis(arena, child);
        }
        if arena.is_group_kind(child, GroupKind::Parenthesis) {
            let idx = arena.token_index(id, child).unwrap();
            let prev = arena.token_prev(id, Some(idx), true, false).map(|(_, n)| n);
            let is_code_block = prev.map(|p| arena.token_matches(p, LexKind::Keyword, Some(&["THEN", "AS"]))).unwrap_or(false);

            let first_meaningful = arena.children(child).iter().copied().skip(1).find(|&c| !arena.is_whitespace(c));
            let is_sub_query = first_meaningful.map(|f| arena.token_matches(f, LexKind::KeywordDml, Some(&["SELECT"]))).unwrap_or(false);

            let attrs = arena.attrs_mut(child).unwrap();
            attrs.is_code_block_delimiter = is_code_block;
            attrs.is_sub_query = is_sub_query;
        }
    }
}

fn group_block(arena: &mut Arena, id: NodeId, kind: GroupKind, open_kw: &'static str) {
    let _ = group_matching(
        arena,
        id,
        kind,
        &move |a, t| a.token_matches(t, LexKind::Keyword, Some(&[open_kw])),
        &|a, t| a.token_matches(t, LexKind::Keyword, Some(&["END"])),
    );
}

/// Pass 4a: `CASE ... END` -> `Case`.
pub fn group_case(arena: &mut Arena, id: NodeId) {
    group_block(arena, id, GroupKind::Case, "CASE");
}

/// Pass 4b: `IF ... END` -> `If`.
pub fn group_if(arena: &mut Arena, id: NodeId) {
    group_block(arena, id, GroupKind::If, "IF");
}

/// Pass 4c: `FOR ... END` -> `For`.
pub fn group_for(arena: &mut Arena, id: NodeId) {
    group_block(arena, id, GroupKind::For, "FOR");
}

/// Pass 4d: `BEGIN ... END` -> `Begin`.
pub fn group_begin(arena: &mut Arena, id: NodeId) {
    group_block(arena, id, GroupKind::Begin, "BEGIN");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    #[test]
    fn parenthesis_balances_and_annotates_subquery() {
        let tokens = tokenize("SELECT (SELECT 1)");
        let mut arena = Arena::from_tokens(tokens);
        group_parenthesis(&mut arena, arena.root).unwrap();
        let paren = arena.children(arena.root).iter().copied().find(|&c| arena.is_group_kind(c, GroupKind::Parenthesis)).unwrap();
        assert!(arena.attrs(paren).unwrap().is_sub_query);
    }

    #[test]
    fn unbalanced_parenthesis_is_fatal() {
        let tokens = tokenize("(");
        let mut arena = Arena::from_tokens(tokens);
        assert!(group_parenthesis(&mut arena, arena.root).is_err());
    }

    #[test]
    fn case_end_pairs_into_case_group() {
        let tokens = tokenize("CASE WHEN a THEN 1 ELSE 2 END");
        let mut arena = Arena::from_tokens(tokens);
        group_case(&mut arena, arena.root);
        assert!(arena.is_group_kind(arena.children(arena.root)[0], GroupKind::Case));
    }
}
