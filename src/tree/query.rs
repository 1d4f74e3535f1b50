//! Predicate combinators for `Arena::token_next_by` (spec.md §4.1).
//!
//! `token_next_by` in the original engine takes an "imt" triple
//! (instance classes / lexical types+values / match function) and ORs
//! them together. Rust has no open class hierarchy to match against at
//! runtime, so the triple is replaced by a plain predicate closure;
//! these helpers build the common ones and compose with `any_of`/`all_of`.

use super::{Arena, GroupKind, NodeId};
use crate::lexer::token::LexKind;

pub type Pred<'a> = Box<dyn Fn(&Arena, NodeId) -> bool + 'a>;

pub fn is_group_kind(kinds: &'static [GroupKind]) -> Pred<'static> {
    Box::new(move |a, id| a.is_any_group_kind(id, kinds))
}

pub fn is_lex(kind: LexKind, values: Option<&'static [&'static str]>) -> Pred<'static> {
    Box::new(move |a, id| a.token_matches(id, kind, values))
}

pub fn is_punctuation(values: &'static [&'static str]) -> Pred<'static> {
    is_lex(LexKind::Punctuation, Some(values))
}

pub fn not_whitespace() -> Pred<'static> {
    Box::new(|a, id| !a.is_whitespace(id))
}

pub fn any_of(preds: Vec<Pred<'static>>) -> Pred<'static> {
    Box::new(move |a, id| preds.iter().any(|p| p(a, id)))
}

pub fn all_of(preds: Vec<Pred<'static>>) -> Pred<'static> {
    Box::new(move |a, id| preds.iter().all(|p| p(a, id)))
}

pub fn negate(pred: Pred<'static>) -> Pred<'static> {
    Box::new(move |a, id| !pred(a, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::tree::Arena;

    #[test]
    fn is_lex_matches_case_insensitively() {
        let tokens = tokenize("SELECT a");
        let arena = Arena::from_tokens(tokens);
        let root = arena.root;
        let pred = is_lex(LexKind::Keyword, Some(&["select"]));
        let (_, id) = arena.token_next_by(root, None, false, &pred).unwrap();
        assert!(arena.token(id).unwrap().normalized() == "SELECT");
    }
}
