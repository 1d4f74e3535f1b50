//! Passes 12-14: `::` typecasts, `AT TIME ZONE` casts, typed literals.

use super::{group_adjacent, is_identifier_like};
use crate::lexer::token::LexKind;
use crate::tree::{Arena, GroupKind, NodeId};

/// Pass 12: `expr :: type` -> `Identifier`.
pub fn group_typecasts(arena: &mut Arena, id: NodeId) {
    group_adjacent(
        arena,
        id,
        GroupKind::Identifier,
        true,
        &|a, t| a.token_matches(t, LexKind::Punctuation, Some(&["::"])),
        &|a, prev| prev.map(|p| is_identifier_like(a, p)).unwrap_or(false),
        &|a, next| next.map(|n| is_identifier_like(a, n)).unwrap_or(false),
    );
}

/// Pass 13: `expr AT TIME ZONE 'tz'` -> `Identifier`. The lexer has
/// already merged the phrase into one `Keyword` token.
pub fn group_tzcasts(arena: &mut Arena, id: NodeId) {
    group_adjacent(
        arena,
        id,
        GroupKind::Identifier,
        true,
        &|a, t| a.token_matches(t, LexKind::Keyword, Some(&["AT TIME ZONE"])),
        &|a, prev| prev.map(|p| is_identifier_like(a, p)).unwrap_or(false),
        &|a, next| next.is_some(),
    );
}

const TYPED_LITERAL_KEYWORDS: &[&str] = &["DATE", "TIMESTAMP", "INTERVAL"];

/// Pass 14: `DATE 'literal'` / `INTERVAL 'literal'` -> `TypedLiteral`,
/// with a second phase absorbing a trailing unit keyword (e.g.
/// `INTERVAL '3' DAY`).
pub fn group_typed_literal(arena: &mut Arena, id: NodeId) {
    wrap_typed_literal(arena, id);
    extend_typed_literal_unit(arena, id);
}

fn wrap_typed_literal(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::TypedLiteral) {
            wrap_typed_literal(arena, curr);
        }
        if arena.token_matches(curr, LexKind::Keyword, Some(TYPED_LITERAL_KEYWORDS)) {
            if let Some((nidx, nid)) = arena.token_next(id, Some(i), true, false, false) {
                if arena.token_matches(nid, LexKind::StringLit, None) {
                    arena.group_tokens(id, GroupKind::TypedLiteral, i, nidx, false);
                }
            }
        }
        i += 1;
    }
}

fn extend_typed_literal_unit(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) {
            extend_typed_literal_unit(arena, curr);
        }
        if arena.is_group_kind(curr, GroupKind::TypedLiteral) {
            if let Some((nidx, nid)) = arena.token_next(id, Some(i), true, false, false) {
                if arena.token_matches(nid, LexKind::Name, None) {
                    arena.group_tokens(id, GroupKind::TypedLiteral, i, nidx, true);
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

    #[test]
    fn typecast_groups_as_identifier() {
        let tokens = tokenize("a::int");
        let mut arena = Arena::from_tokens(tokens);
        group_typecasts(&mut arena, arena.root);
        assert!(arena.is_group_kind(arena.children(arena.root)[0], GroupKind::Identifier));
    }

    #[test]
    fn interval_with_unit_groups_as_typed_literal() {
        let tokens = tokenize("INTERVAL '3' DAY");
        let mut arena = Arena::from_tokens(tokens);
        group_typed_literal(&mut arena, arena.root);
        let root = arena.root;
        assert_eq!(arena.children(root).len(), 1);
        assert!(arena.is_group_kind(arena.children(root)[0], GroupKind::TypedLiteral));
    }
}
