use std::fmt;

/// Hierarchical lexical type tag (spec.md §3).
///
/// Mirrors the teacher's flat `TokenKind`, but subtypes form a small
/// tree so e.g. `KeywordDml.is_a(Keyword)` holds — grouping passes
/// match on either the specific leaf or the general family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexKind {
    Keyword,
    KeywordDml,
    KeywordDdl,
    KeywordOrder,
    KeywordTzCast,

    Name,
    NamePlaceholder,
    NameBuiltin,

    Number,
    NumberInteger,
    NumberFloat,

    StringLit,
    StringSingle,
    StringSymbol,

    Punctuation,

    Operator,
    OperatorComparison,

    Wildcard,

    Whitespace,
    WhitespaceNewline,

    Comment,
    Assignment,
    Cte,

    Error,
}

impl LexKind {
    /// The immediate ancestor in the hierarchy, if any.
    pub const fn parent(self) -> Option<LexKind> {
        use LexKind::*;
        match self {
            KeywordDml | KeywordDdl | KeywordOrder | KeywordTzCast => Some(Keyword),
            NamePlaceholder | NameBuiltin => Some(Name),
            NumberInteger | NumberFloat => Some(Number),
            StringSingle | StringSymbol => Some(StringLit),
            OperatorComparison => Some(Operator),
            WhitespaceNewline => Some(Whitespace),
            _ => None,
        }
    }

    /// True iff `self` is `ancestor` or a descendant of it.
    pub fn is_a(self, ancestor: LexKind) -> bool {
        let mut cur = Some(self);
        while let Some(k) = cur {
            if k == ancestor {
                return true;
            }
            cur = k.parent();
        }
        false
    }

    /// True iff `self` is a subtype of any of `ancestors`.
    pub fn is_any_a(self, ancestors: &[LexKind]) -> bool {
        ancestors.iter().any(|&a| self.is_a(a))
    }
}

impl fmt::Display for LexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A lexical unit with verbatim source text (spec.md §3).
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: LexKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: LexKind, text: String, start: usize, end: usize, line: usize, column: usize) -> Self {
        Self { kind, text, start, end, line, column }
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind.is_a(LexKind::Whitespace)
    }

    pub fn is_keyword(&self) -> bool {
        self.kind.is_a(LexKind::Keyword) || self.kind == LexKind::Cte
    }

    /// Case-folded canonical form, used for keyword value comparisons.
    pub fn normalized(&self) -> String {
        self.text.to_ascii_uppercase()
    }

    /// True iff this token's lexical type is a subtype of `kind` and
    /// (if `values` is given) its normalized value is one of them.
    pub fn matches(&self, kind: LexKind, values: Option<&[&str]>) -> bool {
        if !self.kind.is_a(kind) {
            return false;
        }
        match values {
            None => true,
            Some(values) => {
                let norm = self.normalized();
                values.iter().any(|v| v.eq_ignore_ascii_case(&norm))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_dml_is_a_keyword() {
        assert!(LexKind::KeywordDml.is_a(LexKind::Keyword));
        assert!(!LexKind::Name.is_a(LexKind::Keyword));
    }

    #[test]
    fn matches_is_case_insensitive() {
        let t = Token::new(LexKind::KeywordDml, "select".into(), 0, 6, 1, 1);
        assert!(t.matches(LexKind::Keyword, Some(&["SELECT"])));
    }
}
