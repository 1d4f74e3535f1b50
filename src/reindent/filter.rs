//! `ReindentFilter` — per-kind policy table (spec.md §4.5), grounded in
//! `reindent.py` + `statement_sections_splitter.py`'s `_process_*` dispatch.
//!
//! The per-kind dispatch lives on the `IndentPolicy` trait so
//! `AlignedIndentFilter` (aligned.rs) can override just the keyword/
//! section offset calculation and inherit everything else, mirroring
//! how the source's `AlignedIndentFilter` subclasses `ReindentFilter`.

use super::{max_id_list_count, nl, split_kwds, split_sections, ReindentOptions, Scope};
use crate::lexer::token::{LexKind, Token};
use crate::tree::{Arena, GroupKind, NodeId};
use tracing::warn;

pub trait IndentPolicy {
    fn options(&self) -> &ReindentOptions;

    /// Column offset for the body of a keyword-led clause list
    /// (`SelectProjection`/`ClauseWith`/`ClausePartitionBy`/
    /// `ClauseOrderBy`/`ClauseGroupBy`/`ClauseFrom`). Plain reindent
    /// uses the clause's own keyword length; aligned mode widens this
    /// to the longest sibling keyword (aligned.rs).
    fn kwd_offset(&self, arena: &Arena, id: NodeId) -> i64 {
        arena.attrs(id).map(|a| a.opening_keyword_length).unwrap_or(0) as i64 + 1
    }

    fn process(&self, arena: &mut Arena) {
        let mut scope = Scope::new(self.options().width);
        if self.options().indent_after_first {
            scope.indent = 1;
        }
        let root = arena.root;
        self.process_group(arena, root, &mut scope);
    }

    fn recurse(&self, arena: &mut Arena, id: NodeId, scope: &mut Scope) {
        for child in arena.get_sublists(id) {
            self.process_group(arena, child, scope);
        }
    }

    fn process_group(&self, arena: &mut Arena, id: NodeId, scope: &mut Scope) {
        let Some(kind) = arena.group_kind(id) else { return };
        match kind {
            GroupKind::Statement | GroupKind::StatementSelect | GroupKind::StatementInsert | GroupKind::StatementUnion => {
                split_sections(arena, id, scope, self.options().char);
                self.recurse(arena, id, scope);
            }
            GroupKind::Parenthesis => self.process_parenthesis(arena, id, scope),
            GroupKind::Case => self.process_case(arena, id, scope),
            GroupKind::ConditionsList => self.process_conditions_list(arena, id, scope),
            GroupKind::IdentifierList => self.process_identifier_list(arena, id, scope),
            GroupKind::SelectProjection | GroupKind::ClauseWith | GroupKind::ClausePartitionBy | GroupKind::ClauseOrderBy | GroupKind::ClauseGroupBy => self.process_clause_list(arena, id, scope),
            GroupKind::ClauseFrom => self.process_clause_from(arena, id, scope),
            GroupKind::Values => self.process_values(arena, id, scope),
            _ => self.process_default(arena, id, scope),
        }
    }

    fn process_default(&self, arena: &mut Arena, id: NodeId, scope: &mut Scope) {
        split_kwds(arena, id, scope, self.options().char);
        self.recurse(arena, id, scope);
    }

    fn process_parenthesis(&self, arena: &mut Arena, id: NodeId, scope: &mut Scope) {
        let attrs = arena.attrs(id).unwrap_or_default();
        let parent = arena.parent(id);
        let in_clause_insert = parent.map(|p| arena.is_group_kind(p, GroupKind::ClauseInsert)).unwrap_or(false);

        if attrs.is_code_block_delimiter {
            if let Some((fidx, _)) = arena.token_next(id, Some(0), true, false, false) {
                let tok_id = arena.push_token(nl(scope, self.options().char, 4));
                arena.insert_child(id, fidx, tok_id);
            }
            let last = arena.children(id).len().saturating_sub(1);
            let tok_id = arena.push_token(nl(scope, self.options().char, 0));
            arena.insert_child(id, last, tok_id);
            self.recurse(arena, id, scope);
            return;
        }

        if in_clause_insert {
            if let Some((fidx, _)) = arena.token_next(id, Some(0), true, false, false) {
                let tok_id = arena.push_token(nl(scope, self.options().char, "SELECT ".len() as i64));
                arena.insert_child(id, fidx, tok_id);
            }
            let last = arena.children(id).len().saturating_sub(1);
            let space_id = arena.push_token(Token::new(LexKind::Whitespace, " ".into(), 0, 0, 0, 0));
            arena.insert_child(id, last, space_id);
            self.recurse(arena, id, scope);
            return;
        }

        let open_col = arena.children(id).first().and_then(|&c| arena.token(c)).map(|t| t.column).unwrap_or(0) as i64;
        let extra = match parent {
            Some(p) if arena.is_any_group_kind(p, &[GroupKind::Function, GroupKind::WindowFunction, GroupKind::Comparison]) => 0,
            _ => 1,
        };
        let target = open_col + extra;
        scope.with_absolute_offset(target, |scope| {
            if extra > 0 {
                split_kwds(arena, id, scope, self.options().char);
            }
            self.recurse(arena, id, scope);
        });
    }

    fn process_case(&self, arena: &mut Arena, id: NodeId, scope: &mut Scope) {
        let case_col = arena.children(id).first().and_then(|&c| arena.token(c)).map(|t| t.column).unwrap_or(0) as i64;
        scope.with_absolute_offset(case_col, |scope| {
            let mut i = 0usize;
            loop {
                let len = arena.children(id).len();
                if i >= len {
                    break;
                }
                let curr = arena.children(id)[i];
                if arena.token_matches(curr, LexKind::Keyword, Some(&["WHEN", "ELSE", "END"])) {
                    let tok_id = arena.push_token(nl(scope, self.options().char, 0));
                    arena.insert_child(id, i, tok_id);
                    i += 1;
                }
                i += 1;
            }
        });
        scope.with_offset(4, |scope| {
            self.recurse(arena, id, scope);
        });
    }

    fn process_conditions_list(&self, arena: &mut Arena, id: NodeId, scope: &mut Scope) {
        let attrs = arena.attrs(id).unwrap_or_default();
        if attrs.conditions_count > 2 {
            let col = arena.children(id).first().and_then(|&c| arena.token(c)).map(|t| t.column).unwrap_or(0) as i64;
            scope.with_absolute_offset(col, |scope| {
                split_kwds(arena, id, scope, self.options().char);
            });
        }
        self.recurse(arena, id, scope);
    }

    fn process_identifier_list(&self, arena: &mut Arena, id: NodeId, scope: &mut Scope) {
        let parent = arena.parent(id);
        let in_func_or_values = parent.map(|p| arena.is_any_group_kind(p, &[GroupKind::Function, GroupKind::Values])).unwrap_or(false);
        let attrs = arena.attrs(id).unwrap_or_default();
        let max = parent.and_then(|p| arena.group_kind(p)).map(max_id_list_count).unwrap_or(u32::MAX);

        if !in_func_or_values && attrs.id_list_count > max {
            if self.options().wrap_after == 0 {
                self.wrap_every_identifier(arena, id, scope);
            } else {
                self.wrap_after_column(arena, id, scope);
            }
        }
        self.recurse(arena, id, scope);
    }

    fn wrap_every_identifier(&self, arena: &mut Arena, id: NodeId, scope: &mut Scope) {
        let mut i = 0usize;
        loop {
            let len = arena.children(id).len();
            if i >= len {
                break;
            }
            let curr = arena.children(id)[i];
            if arena.token_matches(curr, LexKind::Punctuation, Some(&[","])) {
                if self.options().comma_first {
                    let tok_id = arena.push_token(nl(scope, self.options().char, -2));
                    arena.insert_child(id, i, tok_id);
                    i += 1;
                } else if let Some((nidx, _)) = arena.token_next(id, Some(i), true, false, false) {
                    let tok_id = arena.push_token(nl(scope, self.options().char, 0));
                    arena.insert_child(id, nidx, tok_id);
                }
            }
            i += 1;
        }
    }

    fn wrap_after_column(&self, arena: &mut Arena, id: NodeId, scope: &mut Scope) {
        let mut col = scope.leading_ws();
        let mut i = 0usize;
        loop {
            let len = arena.children(id).len();
            if i >= len {
                break;
            }
            let curr = arena.children(id)[i];
            col += arena.text(curr).chars().count() as i64;
            if arena.token_matches(curr, LexKind::Punctuation, Some(&[","])) && col as usize > self.options().wrap_after {
                if self.options().comma_first {
                    let tok_id = arena.push_token(nl(scope, self.options().char, -2));
                    arena.insert_child(id, i, tok_id);
                    i += 1;
                } else if let Some((nidx, _)) = arena.token_next(id, Some(i), true, false, false) {
                    let tok_id = arena.push_token(nl(scope, self.options().char, 0));
                    arena.insert_child(id, nidx, tok_id);
                }
                col = scope.leading_ws();
            }
            i += 1;
        }
    }

    fn process_clause_list(&self, arena: &mut Arena, id: NodeId, scope: &mut Scope) {
        let offset = self.kwd_offset(arena, id);
        scope.with_absolute_offset(offset, |scope| {
            self.recurse(arena, id, scope);
        });
    }

    fn process_clause_from(&self, arena: &mut Arena, id: NodeId, scope: &mut Scope) {
        let offset = self.kwd_offset(arena, id);
        scope.with_absolute_offset(offset, |scope| {
            split_kwds(arena, id, scope, self.options().char);
            self.recurse(arena, id, scope);
        });
    }

    fn process_values(&self, arena: &mut Arena, id: NodeId, scope: &mut Scope) {
        let mut i = 0usize;
        loop {
            let len = arena.children(id).len();
            if i >= len {
                break;
            }
            let curr = arena.children(id)[i];
            if arena.token_matches(curr, LexKind::Keyword, Some(&["VALUES"])) {
                let tok_id = arena.push_token(nl(scope, self.options().char, 0));
                arena.insert_child(id, i, tok_id);
                i += 1;
            } else if arena.token_matches(curr, LexKind::Punctuation, Some(&[","])) {
                if self.options().comma_first {
                    let tok_id = arena.push_token(nl(scope, self.options().char, -2));
                    arena.insert_child(id, i, tok_id);
                    i += 1;
                } else if let Some((nidx, _)) = arena.token_next(id, Some(i), true, false, false) {
                    let tok_id = arena.push_token(nl(scope, self.options().char, 0));
                    arena.insert_child(id, nidx, tok_id);
                }
            }
            i += 1;
        }
        self.recurse(arena, id, scope);
    }
}

pub struct ReindentFilter {
    options: ReindentOptions,
}

impl ReindentFilter {
    pub fn new(options: ReindentOptions) -> Self {
        ReindentFilter { options }
    }
}

impl IndentPolicy for ReindentFilter {
    fn options(&self) -> &ReindentOptions {
        &self.options
    }
}

/// Runs a `ReindentFilter` with default options and logs (rather than
/// panicking) if the tree is empty — mirrors the source's tolerance
/// for a corrupt/partial sub-tree (spec.md §7).
pub fn reindent_default(arena: &mut Arena) {
    if arena.children(arena.root).is_empty() {
        warn!("reindent called on an empty statement");
        return;
    }
    ReindentFilter::new(ReindentOptions::default()).process(arena);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::passes;
    use crate::tree::Arena;

    #[test]
    fn simple_select_gets_from_on_new_line() {
        let tokens = tokenize("SELECT a FROM t");
        let mut arena = Arena::from_tokens(tokens);
        passes::group(&mut arena).unwrap();
        ReindentFilter::new(ReindentOptions::default()).process(&mut arena);
        let text = arena.text(arena.root);
        assert!(text.contains('\n'));
    }

    #[test]
    fn case_breaks_before_when_else_end() {
        let tokens = tokenize("SELECT CASE WHEN a = 1 THEN 'x' ELSE 'y' END FROM t");
        let mut arena = Arena::from_tokens(tokens);
        passes::group(&mut arena).unwrap();
        ReindentFilter::new(ReindentOptions::default()).process(&mut arena);
        let text = arena.text(arena.root);
        assert!(text.contains("\nWHEN"));
        assert!(text.contains("\nELSE"));
        assert!(text.contains("\nEND"));
    }
}
