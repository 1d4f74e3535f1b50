use crate::lexer::token::{LexKind, Token};
use std::collections::HashSet;

/// SQL-common keywords (spec.md Non-goals: "recognized keywords are a
/// fixed SQL-common set", not dialect-specific).
struct Keywords;

impl Keywords {
    fn dml() -> &'static [&'static str] {
        &["SELECT", "INSERT", "UPDATE", "DELETE"]
    }

    fn order() -> &'static [&'static str] {
        &["ASC", "DESC"]
    }

    fn cte() -> &'static [&'static str] {
        &["WITH"]
    }

    fn builtin_functions() -> &'static [&'static str] {
        &[
            "COUNT", "SUM", "AVG", "MIN", "MAX", "COALESCE", "CAST", "EXTRACT",
            "ARRAYMAP", "ARRAYFILTER", "IF", "IFNULL", "ROUND", "FLOOR", "CEIL",
            "CONCAT", "SUBSTRING", "LENGTH", "LOWER", "UPPER", "NOW", "TUPLE",
            "ARRAY",
        ]
    }

    fn all() -> HashSet<&'static str> {
        [
            "SELECT", "FROM", "WHERE", "GROUP", "BY", "HAVING", "ORDER",
            "LIMIT", "OFFSET", "UNION", "ALL", "EXCEPT", "INTERSECT",
            "JOIN", "ON", "USING", "INNER", "LEFT", "RIGHT",
            "FULL", "OUTER", "CROSS", "NATURAL", "AS", "DISTINCT",
            "INTO", "INSERT", "VALUES", "UPDATE", "DELETE", "SET",
            "WITH", "BETWEEN", "LIKE", "NOT", "AND", "OR", "IN",
            "IS", "NULL", "CASE", "WHEN", "THEN", "ELSE", "END",
            "TRUE", "FALSE", "IF", "FOR", "BEGIN", "OVER", "FILTER",
            "PARTITION", "ASC", "DESC", "AT", "TIME", "ZONE",
            "INTERVAL", "DATE", "TIMESTAMP", "CAST",
        ]
        .into_iter()
        .collect()
    }
}

const MAX_QUERY_SIZE: usize = 1_000_000;

/// Multi-word keyword merges the lexer performs before classification,
/// longest-match first. This is how `GROUP BY`, `ORDER BY`, join
/// phrases and `AT TIME ZONE` reach the grouping engine as a single
/// `Keyword`-typed token, matching sqlparse's own multi-word keyword
/// regexes (see DESIGN.md, "multi-word keyword merge").
const MULTI_WORD_KEYWORDS: &[&[&str]] = &[
    &["AT", "TIME", "ZONE"],
    &["LEFT", "OUTER", "JOIN"],
    &["RIGHT", "OUTER", "JOIN"],
    &["FULL", "OUTER", "JOIN"],
    &["GROUP", "BY"],
    &["ORDER", "BY"],
    &["PARTITION", "BY"],
    &["UNION", "ALL"],
    &["LEFT", "JOIN"],
    &["RIGHT", "JOIN"],
    &["FULL", "JOIN"],
    &["INNER", "JOIN"],
    &["OUTER", "JOIN"],
    &["CROSS", "JOIN"],
    &["NATURAL", "JOIN"],
    &["IS", "NOT"],
    &["NOT", "IN"],
    &["NOT", "LIKE"],
    &["NOT", "BETWEEN"],
];

pub struct Tokenizer<'a> {
    input: &'a str,
    chars: std::str::Chars<'a>,
    position: usize,
    start: usize,
    line: usize,
    column: usize,
    keywords: HashSet<&'static str>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars(),
            position: 0,
            start: 0,
            line: 1,
            column: 1,
            keywords: Keywords::all(),
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        if self.input.len() > MAX_QUERY_SIZE {
            return tokens;
        }

        loop {
            let token = self.next_token();
            let eof = token.kind == LexKind::Error && token.text.is_empty() && self.is_at_end();
            tokens.push(token);
            if eof {
                break;
            }
            if self.is_at_end() {
                break;
            }
        }

        merge_multi_word_keywords(&mut tokens);
        merge_placeholders(&mut tokens);
        classify_keywords(&mut tokens, &self.keywords);
        tokens
    }

    fn next_token(&mut self) -> Token {
        self.start = self.position;

        if self.is_at_end() {
            return self.create_token(LexKind::Error);
        }

        let c = match self.advance() {
            Some(c) => c,
            None => return self.create_token(LexKind::Error),
        };

        if c.is_whitespace() {
            return self.read_whitespace();
        }

        if c == '-' && self.match_char('-') {
            return self.read_single_line_comment();
        }
        if c == '/' && self.match_char('*') {
            return self.read_multi_line_comment();
        }

        match c {
            '0'..='9' => self.read_number(),
            '\'' => self.read_string('\'', LexKind::StringSingle),
            '"' => self.read_string('"', LexKind::StringSymbol),
            '`' => self.read_string('`', LexKind::StringSymbol),

            '(' | ')' | '[' | ']' | '{' | '}' | ',' | ';' => self.create_token(LexKind::Punctuation),
            '.' => self.create_token(LexKind::Punctuation),

            '*' => self.create_token(LexKind::Wildcard),
            '+' => self.create_token(LexKind::Operator),
            '-' => self.create_token(LexKind::Operator),
            '/' => self.create_token(LexKind::Operator),
            '%' => self.create_token(LexKind::Operator),
            '^' => self.create_token(LexKind::Operator),
            '|' => {
                if self.match_char('|') {
                    self.create_token(LexKind::Operator)
                } else {
                    self.create_token(LexKind::Error)
                }
            }

            ':' => {
                if self.match_char(':') {
                    self.create_token(LexKind::Punctuation)
                } else if self.match_char('=') {
                    self.create_token(LexKind::Assignment)
                } else {
                    self.create_token(LexKind::Punctuation)
                }
            }

            '=' => self.create_token(LexKind::OperatorComparison),
            '!' => {
                if self.match_char('=') {
                    self.create_token(LexKind::OperatorComparison)
                } else {
                    self.create_token(LexKind::Error)
                }
            }
            '<' => {
                if self.match_char('=') {
                    if self.match_char('>') {
                        self.create_token(LexKind::OperatorComparison)
                    } else {
                        self.create_token(LexKind::OperatorComparison)
                    }
                } else if self.match_char('>') {
                    self.create_token(LexKind::OperatorComparison)
                } else {
                    self.create_token(LexKind::OperatorComparison)
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.create_token(LexKind::OperatorComparison)
                } else {
                    self.create_token(LexKind::OperatorComparison)
                }
            }

            'a'..='z' | 'A'..='Z' | '_' => self.read_bare_word(),

            _ => self.create_token(LexKind::Error),
        }
    }

    fn read_whitespace(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
        let has_newline = self.input[self.start..self.position].contains('\n');
        self.create_token(if has_newline { LexKind::WhitespaceNewline } else { LexKind::Whitespace })
    }

    fn read_single_line_comment(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        self.create_token(LexKind::Comment)
    }

    fn read_multi_line_comment(&mut self) -> Token {
        let mut depth = 1;
        while depth > 0 {
            match self.advance() {
                Some('/') if self.match_char('*') => depth += 1,
                Some('*') if self.match_char('/') => depth -= 1,
                Some(_) => {}
                None => break,
            }
        }
        self.create_token(LexKind::Comment)
    }

    fn read_number(&mut self) -> Token {
        self.read_digits();
        let mut is_float = false;
        if self.peek_is('.') {
            is_float = true;
            self.advance();
            self.read_digits();
        }
        if let Some(c) = self.peek() {
            if c == 'e' || c == 'E' {
                is_float = true;
                self.advance();
                if self.peek_is('+') || self.peek_is('-') {
                    self.advance();
                }
                self.read_digits();
            }
        }
        self.create_token(if is_float { LexKind::NumberFloat } else { LexKind::NumberInteger })
    }

    fn read_digits(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self, quote: char, success_kind: LexKind) -> Token {
        let mut escaped = false;
        loop {
            match self.peek() {
                Some(c) if c == quote && !escaped => {
                    if self.peek_next() == Some(quote) {
                        self.advance();
                        self.advance();
                        continue;
                    }
                    self.advance();
                    return self.create_token(success_kind);
                }
                Some('\\') if !escaped => {
                    self.advance();
                    escaped = true;
                }
                Some(_) => {
                    self.advance();
                    escaped = false;
                }
                None => return self.create_token(success_kind),
            }
        }
    }

    fn read_bare_word(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        self.create_token(LexKind::Name)
    }

    fn create_token(&self, kind: LexKind) -> Token {
        let lexeme = &self.input[self.start..self.position];
        Token::new(kind, lexeme.to_string(), self.start, self.position, self.line, self.column)
    }

    fn advance(&mut self) -> Option<char> {
        if let Some(c) = self.chars.next() {
            self.position += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(c)
        } else {
            None
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.chars.clone();
        chars.next();
        chars.next()
    }

    fn peek_is(&self, expected: char) -> bool {
        self.peek() == Some(expected)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek_is(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }
}

/// Merges runs of adjacent `Name`-typed tokens that spell a recognized
/// multi-word keyword phrase into a single token (see
/// `MULTI_WORD_KEYWORDS`). Single interior spaces between the words are
/// absorbed into the merged token's text.
fn merge_multi_word_keywords(tokens: &mut Vec<Token>) {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    'outer: while i < tokens.len() {
        for phrase in MULTI_WORD_KEYWORDS {
            if let Some(end) = try_match_phrase(tokens, i, phrase) {
                let start = tokens[i].start;
                let stop = tokens[end - 1].end;
                let text: String = tokens[i..end].iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ");
                let (line, column) = (tokens[i].line, tokens[i].column);
                out.push(Token::new(LexKind::Keyword, text, start, stop, line, column));
                i = end;
                continue 'outer;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    *tokens = out;
}

/// Returns the index just past the matched phrase if `tokens[start..]`
/// spells `phrase` (words separated by single plain-whitespace tokens).
fn try_match_phrase(tokens: &[Token], start: usize, phrase: &[&str]) -> Option<usize> {
    let mut idx = start;
    for (i, word) in phrase.iter().enumerate() {
        if i > 0 {
            match tokens.get(idx) {
                Some(t) if t.kind == LexKind::Whitespace && !t.text.contains('\n') => idx += 1,
                _ => return None,
            }
        }
        match tokens.get(idx) {
            Some(t) if t.kind == LexKind::Name && t.text.eq_ignore_ascii_case(word) => idx += 1,
            _ => return None,
        }
    }
    Some(idx)
}

/// Merges a `:` `Punctuation` token directly adjacent (no intervening
/// whitespace) to a following bare `Name` into a single bind-parameter
/// placeholder token, e.g. `:user_id` -> one `Name.Placeholder` token.
fn merge_placeholders(tokens: &mut Vec<Token>) {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let is_colon = tokens[i].kind == LexKind::Punctuation && tokens[i].text == ":";
        if is_colon {
            if let Some(next) = tokens.get(i + 1) {
                if next.kind == LexKind::Name {
                    let text = format!(":{}", next.text);
                    let (start, stop) = (tokens[i].start, next.end);
                    let (line, column) = (tokens[i].line, tokens[i].column);
                    out.push(Token::new(LexKind::NamePlaceholder, text, start, stop, line, column));
                    i += 2;
                    continue;
                }
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    *tokens = out;
}

/// Looks past whitespace for the next token's text, without mutating
/// classification state (used to disambiguate `CAST`/`IF` as a
/// builtin-function call from their keyword/block-opener readings).
fn next_non_ws_text(tokens: &[Token], i: usize) -> Option<&str> {
    tokens[i + 1..].iter().find(|t| !matches!(t.kind, LexKind::Whitespace | LexKind::WhitespaceNewline)).map(|t| t.text.as_str())
}

/// Reclassifies `Name` tokens that spell a recognized keyword (or a
/// merged multi-word phrase already tagged `Keyword`) into the
/// appropriate `Keyword*`/`Cte` leaf, and `Name` tokens followed
/// directly by `(` into `Name.Builtin` candidates. A handful of words
/// (`CAST`, `IF`) are both reserved keywords and builtin-function
/// names; when immediately followed by `(` they're read as the
/// function-call form, taking priority over the keyword reading.
fn classify_keywords(tokens: &mut [Token], keywords: &HashSet<&'static str>) {
    let len = tokens.len();
    for i in 0..len {
        let norm = tokens[i].text.to_ascii_uppercase();
        if tokens[i].kind == LexKind::Keyword {
            continue; // already merged multi-word phrase
        }
        if tokens[i].kind != LexKind::Name {
            continue;
        }
        let is_call = next_non_ws_text(tokens, i) == Some("(");
        if Keywords::cte().contains(&norm.as_str()) {
            tokens[i].kind = LexKind::Cte;
        } else if Keywords::dml().contains(&norm.as_str()) {
            tokens[i].kind = LexKind::KeywordDml;
        } else if norm == "CREATE" || norm == "ALTER" || norm == "DROP" || norm == "TABLE" {
            tokens[i].kind = LexKind::KeywordDdl;
        } else if Keywords::order().contains(&norm.as_str()) {
            tokens[i].kind = LexKind::KeywordOrder;
        } else if norm == "AT" {
            tokens[i].kind = LexKind::KeywordTzCast;
        } else if is_call && Keywords::builtin_functions().contains(&norm.as_str()) {
            tokens[i].kind = LexKind::NameBuiltin;
        } else if keywords.contains(norm.as_str()) {
            tokens[i].kind = LexKind::Keyword;
        } else if Keywords::builtin_functions().contains(&norm.as_str()) {
            tokens[i].kind = LexKind::NameBuiltin;
        }
    }
}

pub fn tokenize(sql: &str) -> Vec<Token> {
    Tokenizer::new(sql).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_simple_select() {
        let tokens = tokenize("SELECT a, b FROM t");
        assert_eq!(tokens[0].kind, LexKind::KeywordDml);
        assert_eq!(tokens[0].text, "SELECT");
        assert!(tokens.iter().any(|t| t.kind == LexKind::Keyword && t.text.eq_ignore_ascii_case("FROM")));
    }

    #[test]
    fn merges_group_by() {
        let tokens = tokenize("SELECT a FROM t GROUP BY a");
        let gb = tokens.iter().find(|t| t.text.eq_ignore_ascii_case("GROUP BY"));
        assert!(gb.is_some());
        assert_eq!(gb.unwrap().kind, LexKind::Keyword);
    }

    #[test]
    fn classifies_builtin_function_name() {
        let tokens = tokenize("SELECT COUNT(*) FROM t");
        let count = tokens.iter().find(|t| t.text.eq_ignore_ascii_case("COUNT")).unwrap();
        assert_eq!(count.kind, LexKind::NameBuiltin);
    }

    #[test]
    fn cast_as_call_is_builtin_not_keyword() {
        let tokens = tokenize("SELECT CAST(a AS Int32) FROM t");
        let cast = tokens.iter().find(|t| t.text.eq_ignore_ascii_case("CAST")).unwrap();
        assert_eq!(cast.kind, LexKind::NameBuiltin);
    }

    #[test]
    fn bare_if_keyword_is_not_shadowed_by_builtin() {
        let tokens = tokenize("IF a THEN b END");
        let if_tok = tokens.iter().find(|t| t.text.eq_ignore_ascii_case("IF")).unwrap();
        assert_eq!(if_tok.kind, LexKind::Keyword);
    }

    #[test]
    fn if_as_call_is_builtin_not_keyword() {
        let tokens = tokenize("SELECT IF(a, 1, 2) FROM t");
        let if_tok = tokens.iter().find(|t| t.text.eq_ignore_ascii_case("IF")).unwrap();
        assert_eq!(if_tok.kind, LexKind::NameBuiltin);
    }

    #[test]
    fn bind_parameter_placeholder_is_a_single_token() {
        let tokens = tokenize("SELECT a FROM t WHERE id = :user_id");
        let ph = tokens.iter().find(|t| t.text == ":user_id").unwrap();
        assert_eq!(ph.kind, LexKind::NamePlaceholder);
    }

    #[test]
    fn reads_string_and_number_literals() {
        let tokens = tokenize("SELECT 'x', 1.5 FROM t");
        assert!(tokens.iter().any(|t| t.kind == LexKind::StringSingle && t.text == "'x'"));
        assert!(tokens.iter().any(|t| t.kind == LexKind::NumberFloat && t.text == "1.5"));
    }
}
