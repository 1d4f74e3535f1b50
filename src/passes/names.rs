//! Passes 5-11: functions, window functions, qualified names, arrays,
//! bare identifiers, signed identifiers, ORDER suffixes.

use super::{group_adjacent, is_identifier_like};
use crate::lexer::token::LexKind;
use crate::tree::{Arena, GroupKind, NodeId};

fn statement_creates_table(arena: &Arena, root: NodeId) -> bool {
    let mut has_create = false;
    let mut has_table = false;
    for leaf in arena.flatten(root) {
        if arena.token_matches(leaf, LexKind::KeywordDdl, Some(&["CREATE"])) {
            has_create = true;
        }
        if arena.token_matches(leaf, LexKind::KeywordDdl, Some(&["TABLE"])) {
            has_table = true;
        }
    }
    has_create && has_table
}

/// Pass 5: `Name.Builtin (...)` -> `Function`. Suppressed wholesale
/// when the statement contains both CREATE and TABLE (known coarse
/// limitation, see DESIGN.md).
pub fn group_functions(arena: &mut Arena, id: NodeId) {
    if statement_creates_table(arena, arena.root) {
        return;
    }
    group_functions_rec(arena, id);
}

fn group_functions_rec(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::Function) {
            group_functions_rec(arena, curr);
        }
        if arena.token_matches(curr, LexKind::NameBuiltin, None) {
            if let Some((nidx, nid)) = arena.token_next(id, Some(i), true, false, false) {
                if arena.is_group_kind(nid, GroupKind::Parenthesis) {
                    arena.group_tokens(id, GroupKind::Function, i, nidx, false);
                }
            }
        }
        i += 1;
    }
}

/// Pass 6: `FUNC(...) [FILTER (WHERE ...)] [OVER (...)]` -> `WindowFunction`.
pub fn group_window_function(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::WindowFunction) {
            group_window_function(arena, curr);
        }
        if arena.is_any_group_kind(curr, &[GroupKind::Function, GroupKind::WindowFunction]) {
            let mut end_idx = i;
            let mut cursor = i;
            if let Some((fidx, fid)) = arena.token_next(id, Some(cursor), true, false, false) {
                if arena.token_matches(fid, LexKind::Keyword, Some(&["FILTER"])) {
                    if let Some((pidx, pid)) = arena.token_next(id, Some(fidx), true, false, false) {
                        if arena.is_group_kind(pid, GroupKind::Parenthesis) {
                            end_idx = pidx;
                            cursor = pidx;
                        }
                    }
                }
            }
            if let Some((oidx, oid)) = arena.token_next(id, Some(cursor), true, false, false) {
                if arena.token_matches(oid, LexKind::Keyword, Some(&["OVER"])) {
                    if let Some((pidx, pid)) = arena.token_next(id, Some(oidx), true, false, false) {
                        if arena.is_group_kind(pid, GroupKind::Parenthesis) {
                            end_idx = pidx;
                        }
                    }
                }
            }
            if end_idx > i {
                arena.group_tokens(id, GroupKind::WindowFunction, i, end_idx, true);
            }
        }
        i += 1;
    }
}

/// Pass 7: `ident . ident` -> `Identifier` (chains extend).
pub fn group_period(arena: &mut Arena, id: NodeId) {
    group_adjacent(
        arena,
        id,
        GroupKind::Identifier,
        true,
        &|a, t| a.token_matches(t, LexKind::Punctuation, Some(&["."])),
        &|a, prev| prev.map(|p| is_identifier_like(a, p)).unwrap_or(false),
        &|a, next| next.map(|n| is_identifier_like(a, n)).unwrap_or(false),
    );
}

/// Pass 8: `ident [ ... ]` -> `Identifier`, extended. Bracket contents
/// are left unvisited by this pass.
pub fn group_arrays(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::SquareBrackets) {
            group_arrays(arena, curr);
        }
        if is_identifier_like(arena, curr) {
            if let Some((nidx, nid)) = arena.token_next(id, Some(i), true, false, false) {
                if arena.is_group_kind(nid, GroupKind::SquareBrackets) {
                    arena.group_tokens(id, GroupKind::Identifier, i, nidx, true);
                    continue;
                }
            }
        }
        i += 1;
    }
}

/// Pass 9: lift bare `Name`/`String.Symbol`/`Name.Placeholder` to
/// `Identifier`; a placeholder absorbs an adjacent `Identifier`.
pub fn group_identifier(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) {
            group_identifier(arena, curr);
            i += 1;
            continue;
        }

        let is_bare = arena.token_matches(curr, LexKind::Name, None) || arena.token_matches(curr, LexKind::StringSymbol, None);
        let is_placeholder = arena.token_matches(curr, LexKind::NamePlaceholder, None);

        if is_bare {
            arena.group_tokens(id, GroupKind::Identifier, i, i, false);
        } else if is_placeholder {
            if let Some((pidx, p)) = arena.token_prev(id, Some(i), true, false) {
                if arena.is_group_kind(p, GroupKind::Identifier) {
                    arena.group_tokens(id, GroupKind::Identifier, pidx, i, true);
                    i = pidx;
                    i += 1;
                    continue;
                }
            }
            if let Some((nidx, n)) = arena.token_next(id, Some(i), true, false, false) {
                if arena.is_group_kind(n, GroupKind::Identifier) {
                    arena.group_tokens(id, GroupKind::Identifier, i, nidx, false);
                    i += 1;
                    continue;
                }
            }
            arena.group_tokens(id, GroupKind::Identifier, i, i, false);
        }
        i += 1;
    }
}

/// Pass 10: a unary `-`/`+` directly left of an `Identifier`, not
/// itself preceded by one, -> `SignedIdentifier`.
pub fn group_signed_identifier(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) && !arena.is_group_kind(curr, GroupKind::SignedIdentifier) {
            group_signed_identifier(arena, curr);
        }
        let is_sign = arena.token_matches(curr, LexKind::Operator, Some(&["-"])) || arena.token_matches(curr, LexKind::Operator, Some(&["+"]));
        if is_sign {
            let prev_is_identifier = arena.token_prev(id, Some(i), true, false).map(|(_, p)| arena.is_group_kind(p, GroupKind::Identifier)).unwrap_or(false);
            if !prev_is_identifier {
                if let Some((nidx, nid)) = arena.token_next(id, Some(i), true, false, false) {
                    if arena.is_group_kind(nid, GroupKind::Identifier) {
                        arena.group_tokens(id, GroupKind::SignedIdentifier, i, nidx, false);
                        i += 1;
                        continue;
                    }
                }
            }
        }
        i += 1;
    }
}

/// Pass 11: `ident ASC|DESC` -> extend into `Identifier`.
pub fn group_order(arena: &mut Arena, id: NodeId) {
    let mut i = 0usize;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_group(curr) {
            group_order(arena, curr);
        }
        let is_target = arena.is_group_kind(curr, GroupKind::Identifier) || arena.token_matches(curr, LexKind::Number, None);
        if is_target {
            if let Some((nidx, nid)) = arena.token_next(id, Some(i), true, false, false) {
                if arena.token_matches(nid, LexKind::KeywordOrder, None) {
                    arena.group_tokens(id, GroupKind::Identifier, i, nidx, true);
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
    fn qualified_name_groups_as_identifier() {
        let tokens = tokenize("a.b.c");
        let mut arena = Arena::from_tokens(tokens);
        group_period(&mut arena, arena.root);
        let root = arena.root;
        assert_eq!(arena.children(root).len(), 1);
        assert!(arena.is_group_kind(arena.children(root)[0], GroupKind::Identifier));
        assert_eq!(arena.children(arena.children(root)[0]).len(), 5);
    }

    #[test]
    fn builtin_call_groups_as_function() {
        let tokens = tokenize("COUNT(*)");
        let mut arena = Arena::from_tokens(tokens);
        crate::passes::brackets::group_parenthesis(&mut arena, arena.root).unwrap();
        group_functions(&mut arena, arena.root);
        assert!(arena.is_group_kind(arena.children(arena.root)[0], GroupKind::Function));
    }
}
