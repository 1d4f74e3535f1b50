use std::fmt;

/// Fatal failures from the grouping pipeline (spec.md §7).
///
/// Everything else a pass encounters is tolerated: malformed input
/// degrades into a less-structured tree rather than aborting.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("unbalanced parenthesis found in the statement")]
    UnbalancedParenthesis,

    #[error("invalid syntax for {clause} clause: identifiers missing")]
    InvalidSyntax { clause: &'static str },
}

/// The clause a `GroupError::InvalidSyntax` was raised for. Kept as a
/// separate enum so call sites don't have to match on a raw `&str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Select,
    With,
    Insert,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Select => write!(f, "SELECT"),
            Clause::With => write!(f, "WITH"),
            Clause::Insert => write!(f, "INSERT"),
        }
    }
}

impl GroupError {
    pub fn invalid_syntax(clause: Clause) -> Self {
        let clause = match clause {
            Clause::Select => "SELECT",
            Clause::With => "WITH",
            Clause::Insert => "INSERT",
        };
        GroupError::InvalidSyntax { clause }
    }
}
