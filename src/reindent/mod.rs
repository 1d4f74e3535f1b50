//! Reindent walker (C4), grounded in
//! `examples/original_source/sqlparse/filters/statement_sections_splitter.py`
//! and `reindent.py`. Shared offset/indent bookkeeping and the
//! keyword/section splitters live here; `filter.rs` and `aligned.rs`
//! provide the two concrete per-kind policy tables.

pub mod aligned;
pub mod filter;

use crate::lexer::token::{LexKind, Token};
use crate::tree::{Arena, GroupKind, NodeId};

/// Keywords that start a new line when encountered mid-clause
/// (spec.md §4.4 "Keyword splitter"). `JOIN`-family and `BY`-family
/// phrases reach here pre-merged by the lexer, so plain string
/// equality suffices in place of the source's regexes.
const SPLIT_KEYWORDS: &[&str] = &[
    "AND", "OR", "INTO", "HAVING", "LIMIT", "UNION", "UNION ALL", "VALUES", "SET", "BETWEEN", "EXCEPT", "GROUP BY", "ORDER BY", "PARTITION BY", "LEFT JOIN", "RIGHT JOIN", "FULL JOIN", "INNER JOIN", "OUTER JOIN", "CROSS JOIN", "NATURAL JOIN",
    "LEFT OUTER JOIN", "RIGHT OUTER JOIN", "FULL OUTER JOIN", "JOIN",
];

/// `width`/`char`/`wrap_after`/`comma_first`/`indent_after_first`/
/// `indent_columns` (spec.md §6 Configuration table).
#[derive(Debug, Clone, Copy)]
pub struct ReindentOptions {
    pub width: usize,
    pub char: char,
    pub wrap_after: usize,
    pub comma_first: bool,
    pub indent_after_first: bool,
    pub indent_columns: bool,
}

impl Default for ReindentOptions {
    fn default() -> Self {
        ReindentOptions { width: 2, char: ' ', wrap_after: 0, comma_first: false, indent_after_first: false, indent_columns: false }
    }
}

/// Scoped `offset`/`indent` state (spec.md §9 "Scoped offset
/// adjustments"). `with_offset`/`with_indent` restore the previous
/// value unconditionally on return, so a panic or early return inside
/// the closure never leaks adjusted state (the Rust analogue of the
/// source's scope-guard requirement).
pub struct Scope {
    pub offset: i64,
    pub indent: i64,
    pub width: usize,
    last_func: Option<NodeId>,
}

impl Scope {
    pub fn new(width: usize) -> Self {
        Scope { offset: 0, indent: 0, width, last_func: None }
    }

    pub fn leading_ws(&self) -> i64 {
        self.offset + self.indent * self.width as i64
    }

    pub fn with_offset<T>(&mut self, delta: i64, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.offset;
        self.offset += delta;
        let result = f(self);
        self.offset = saved;
        result
    }

    pub fn with_absolute_offset<T>(&mut self, value: i64, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.offset;
        self.offset = value;
        let result = f(self);
        self.offset = saved;
        result
    }

    pub fn with_indent<T>(&mut self, delta: i64, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.indent;
        self.indent += delta;
        let result = f(self);
        self.indent = saved;
        result
    }
}

/// Builds a `Whitespace.Newline` token: `"\n" + char * max(0, leading_ws + delta)`.
pub fn nl(scope: &Scope, char: char, delta: i64) -> Token {
    let pad = (scope.leading_ws() + delta).max(0) as usize;
    let mut text = String::with_capacity(pad + 1);
    text.push('\n');
    text.extend(std::iter::repeat(char).take(pad));
    Token::new(LexKind::WhitespaceNewline, text, 0, 0, 0, 0)
}

fn is_split_keyword(arena: &Arena, id: NodeId) -> bool {
    arena.token_matches(id, LexKind::Keyword, Some(SPLIT_KEYWORDS))
}

/// Inserts a newline before each keyword in `SPLIT_KEYWORDS`, skipping
/// the `AND` that immediately follows a `BETWEEN` (it closes a range,
/// not a boolean junction).
pub fn split_kwds(arena: &mut Arena, id: NodeId, scope: &mut Scope, char: char) {
    let mut i = 0usize;
    let mut skip_next_and = false;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        let is_between = arena.token_matches(curr, LexKind::Keyword, Some(&["BETWEEN"]));
        let is_and = arena.token_matches(curr, LexKind::Keyword, Some(&["AND"]));

        if is_split_keyword(arena, curr) && !(is_and && skip_next_and) {
            let tok = nl(scope, char, 0);
            let tok_id = arena.push_token(tok);
            arena.insert_child(id, i, tok_id);
            i += 1;
        }

        skip_next_and = is_between;
        i += 1;
    }
}

/// Inserts a newline before every top-level section (immediate clause
/// child) after the first (spec.md §4.4 "Section splitter").
pub fn split_sections(arena: &mut Arena, id: NodeId, scope: &mut Scope, char: char) {
    let mut i = 0usize;
    let mut seen_section = false;
    loop {
        let len = arena.children(id).len();
        if i >= len {
            break;
        }
        let curr = arena.children(id)[i];
        if arena.is_whitespace(curr) {
            i += 1;
            continue;
        }
        if seen_section {
            let tok = nl(scope, char, 0);
            let tok_id = arena.push_token(tok);
            arena.insert_child(id, i, tok_id);
            i += 1;
        }
        seen_section = true;
        i += 1;
    }
}

pub(crate) fn last_non_ws_column(arena: &Arena, id: NodeId, idx: usize) -> usize {
    arena.token_prev(id, Some(idx + 1), true, false).and_then(|(_, n)| arena.token(n).map(|t| t.column)).unwrap_or(0)
}

pub(crate) fn is_identifier_like(arena: &Arena, id: NodeId) -> bool {
    crate::passes::is_identifier_like(arena, id)
}

pub(crate) const fn max_id_list_count(kind: GroupKind) -> u32 {
    match kind {
        GroupKind::SelectProjection | GroupKind::ClauseWith => 0,
        GroupKind::ClausePartitionBy | GroupKind::ClauseOrderBy | GroupKind::ClauseGroupBy => 2,
        _ => u32::MAX,
    }
}
