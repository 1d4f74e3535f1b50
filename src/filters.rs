//! Ancillary filters (C5), grounded in
//! `examples/original_source/sqlparse/filters/others.py`: comment
//! stripping, whitespace collapsing, operator spacing, and the final
//! text serializer.

use crate::lexer::token::{LexKind, Token};
use crate::tree::{Arena, GroupKind, NodeId};

/// Removes comment tokens/groups, replacing an interior comment with a
/// single space, or with the trailing newline(s) extracted from the
/// comment's own text when it carried one — so a `-- x\n` mid-statement
/// still breaks the line it was on.
pub struct StripCommentsFilter;

impl StripCommentsFilter {
    pub fn process(&self, arena: &mut Arena, id: NodeId) {
        let mut i = 0usize;
        loop {
            let len = arena.children(id).len();
            if i >= len {
                break;
            }
            let curr = arena.children(id)[i];
            if arena.is_group(curr) {
                self.process(arena, curr);
            }
            if arena.is_comment(curr) {
                let text = arena.text(curr);
                let trailing_newlines: String = {
                    let nl_start = text.find('\n');
                    match nl_start {
                        Some(pos) => text[pos..].chars().take_while(|&c| c == '\n').collect(),
                        None => String::new(),
                    }
                };
                let replacement = if trailing_newlines.is_empty() { " ".to_string() } else { trailing_newlines };
                let kind = if replacement.contains('\n') { LexKind::WhitespaceNewline } else { LexKind::Whitespace };
                if arena.is_group(curr) {
                    // A `GroupKind::Comment` run: collapse to a single
                    // whitespace leaf in place of the whole group.
                    while !arena.children(curr).is_empty() {
                        arena.remove_child(curr, 0);
                    }
                    let tok_id = arena.push_token(Token::new(kind, replacement, 0, 0, 0, 0));
                    arena.remove_child(id, i);
                    arena.insert_child(id, i, tok_id);
                } else {
                    arena.set_token_kind(curr, kind);
                    arena.set_token_text(curr, replacement);
                }
                i += 1;
                continue;
            }
            i += 1;
        }
    }
}

/// Collapses whitespace runs to a single space, with per-kind overrides
/// for `Identifier`/`IdentifierList`/`Parenthesis`/`Function` that
/// encode distinct rules rather than one generic pass (spec.md
/// supplemented features, §16).
pub struct StripWhitespaceFilter;

impl StripWhitespaceFilter {
    pub fn process(&self, arena: &mut Arena, id: NodeId) {
        match arena.group_kind(id) {
            Some(GroupKind::Identifier) => self.stripws_identifier(arena, id),
            Some(GroupKind::IdentifierList) => self.stripws_identifier_list(arena, id),
            Some(GroupKind::Parenthesis) => self.stripws_parenthesis(arena, id),
            Some(GroupKind::Function) | Some(GroupKind::WindowFunction) => self.stripws_function(arena, id),
            _ => self.stripws_default(arena, id),
        }
    }

    fn recurse(&self, arena: &mut Arena, id: NodeId) {
        for child in arena.get_sublists(id) {
            self.process(arena, child);
        }
    }

    /// Collapses any whitespace run to a single space; leading/trailing
    /// whitespace directly under a group is stripped entirely.
    fn stripws_default(&self, arena: &mut Arena, id: NodeId) {
        self.collapse_runs(arena, id, true, true);
        self.recurse(arena, id);
    }

    /// An identifier's internal whitespace (around `.`/`AS`) collapses,
    /// but nothing is stripped at the edges — identifiers sit inline.
    fn stripws_identifier(&self, arena: &mut Arena, id: NodeId) {
        self.collapse_runs(arena, id, false, false);
        self.recurse(arena, id);
    }

    /// Whitespace after each comma collapses to a single space; no
    /// space before a comma.
    fn stripws_identifier_list(&self, arena: &mut Arena, id: NodeId) {
        let mut i = 0usize;
        loop {
            let len = arena.children(id).len();
            if i >= len {
                break;
            }
            let curr = arena.children(id)[i];
            if arena.is_whitespace(curr) {
                let prev_is_comma = i > 0 && arena.token_matches(arena.children(id)[i - 1], LexKind::Punctuation, Some(&[","]));
                if prev_is_comma {
                    set_single_space(arena, curr);
                } else {
                    arena.remove_child(id, i);
                    continue;
                }
            }
            i += 1;
        }
        self.recurse(arena, id);
    }

    /// No whitespace directly inside the parens, except a single space
    /// retained before a `SELECT` (subquery readability).
    fn stripws_parenthesis(&self, arena: &mut Arena, id: NodeId) {
        let mut i = 0usize;
        loop {
            let len = arena.children(id).len();
            if i >= len {
                break;
            }
            let curr = arena.children(id)[i];
            if arena.is_whitespace(curr) {
                let next_is_select = arena
                    .token_next(id, Some(i), true, false, false)
                    .map(|(_, n)| arena.token_matches(n, LexKind::KeywordDml, Some(&["SELECT"])))
                    .unwrap_or(false);
                if next_is_select {
                    set_single_space(arena, curr);
                } else {
                    arena.remove_child(id, i);
                    continue;
                }
            }
            i += 1;
        }
        self.recurse(arena, id);
    }

    /// No whitespace between a function's name and its argument list.
    fn stripws_function(&self, arena: &mut Arena, id: NodeId) {
        let mut i = 0usize;
        loop {
            let len = arena.children(id).len();
            if i >= len {
                break;
            }
            let curr = arena.children(id)[i];
            if arena.is_whitespace(curr) {
                arena.remove_child(id, i);
                continue;
            }
            i += 1;
        }
        self.recurse(arena, id);
    }

    fn collapse_runs(&self, arena: &mut Arena, id: NodeId, strip_leading: bool, strip_trailing: bool) {
        let mut i = 0usize;
        loop {
            let len = arena.children(id).len();
            if i >= len {
                break;
            }
            let curr = arena.children(id)[i];
            if arena.is_whitespace(curr) {
                let is_edge = (strip_leading && i == 0) || (strip_trailing && i == arena.children(id).len() - 1);
                if is_edge {
                    arena.remove_child(id, i);
                    continue;
                }
                set_single_space(arena, curr);
            }
            i += 1;
        }
    }
}

fn set_single_space(arena: &mut Arena, id: NodeId) {
    arena.set_token_text(id, " ".to_string());
}

/// Inserts a single space around binary operator tokens that lack one,
/// skipping a unary sign glued to a `SignedIdentifier` (`-1` stays
/// `-1`, not `- 1`).
pub struct SpacesAroundOperatorsFilter;

impl SpacesAroundOperatorsFilter {
    pub fn process(&self, arena: &mut Arena, id: NodeId) {
        let mut i = 0usize;
        loop {
            let len = arena.children(id).len();
            if i >= len {
                break;
            }
            let curr = arena.children(id)[i];
            if arena.is_group(curr) {
                self.process(arena, curr);
            }
            let is_op = arena.token_matches(curr, LexKind::Operator, None) || arena.token_matches(curr, LexKind::OperatorComparison, None);
            if is_op && !arena.within(curr, GroupKind::SignedIdentifier) {
                let needs_after = arena.token_next(id, Some(i), false, false, false).map(|(_, n)| !arena.is_whitespace(n)).unwrap_or(false);
                if needs_after {
                    let sp = arena.push_token(Token::new(LexKind::Whitespace, " ".into(), 0, 0, 0, 0));
                    arena.insert_child(id, i + 1, sp);
                }
                let needs_before = i > 0 && !arena.is_whitespace(arena.children(id)[i - 1]);
                if needs_before {
                    let sp = arena.push_token(Token::new(LexKind::Whitespace, " ".into(), 0, 0, 0, 0));
                    arena.insert_child(id, i, sp);
                    i += 1;
                }
            }
            i += 1;
        }
    }
}

/// Flattens the tree back to text: join verbatim leaf text, then
/// normalize line endings by rstripping each line (spec.md §5
/// "Serialization").
pub struct SerializerUnicode;

impl SerializerUnicode {
    pub fn process(&self, arena: &Arena, id: NodeId) -> String {
        let joined: String = arena.flatten(id).into_iter().map(|leaf| arena.token(leaf).unwrap().text.clone()).collect();
        joined.split('\n').map(|line| line.trim_end()).collect::<Vec<_>>().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::passes;
    use crate::reindent::filter::{IndentPolicy, ReindentFilter};
    use crate::reindent::ReindentOptions;
    use crate::tree::Arena;

    #[test]
    fn strips_inline_comment_to_space() {
        let tokens = tokenize("SELECT a /* c */ FROM t");
        let mut arena = Arena::from_tokens(tokens);
        let root = arena.root;
        StripCommentsFilter.process(&mut arena, root);
        assert!(!arena.text(root).contains("/*"));
    }

    #[test]
    fn serializer_rstrips_each_line() {
        let tokens = tokenize("SELECT a FROM t");
        let mut arena = Arena::from_tokens(tokens);
        passes::group(&mut arena).unwrap();
        ReindentFilter::new(ReindentOptions::default()).process(&mut arena);
        let out = SerializerUnicode.process(&arena, arena.root);
        assert!(!out.lines().any(|l| l.ends_with(' ')));
    }
}
