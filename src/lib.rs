//! SQL token grouping and reindentation core.
//!
//! Lexes a SQL statement into a flat token stream, groups that stream
//! into a structured parse tree (spec.md §3/§4), then walks the tree
//! to reindent and reserialize it. Grounded throughout in
//! `examples/original_source/sqlparse` (see `DESIGN.md`).
//!
//! ```
//! use sql_reindent_core::{format_sql, ReindentOptions};
//!
//! let out = format_sql("select a,b from t where a=1", ReindentOptions::default()).unwrap();
//! assert!(out.contains("\nFROM") || out.contains("\nfrom"));
//! ```

pub mod error;
pub mod filters;
pub mod lexer;
pub mod passes;
pub mod reindent;
pub mod tree;

pub use error::GroupError;
pub use filters::{SerializerUnicode, SpacesAroundOperatorsFilter, StripCommentsFilter, StripWhitespaceFilter};
pub use lexer::tokenize;
pub use passes::group;
pub use reindent::aligned::AlignedIndentFilter;
pub use reindent::filter::{IndentPolicy, ReindentFilter};
pub use reindent::ReindentOptions;
pub use tree::{Arena, GroupKind};

/// Convenience pipeline exercising the full data flow (spec.md §2):
/// lex, group, strip comments, strip whitespace, reindent, space
/// operators, serialize. Equivalent to driving each stage by hand for
/// callers who don't need to inspect the intermediate tree.
pub fn format_sql(sql: &str, opts: ReindentOptions) -> Result<String, GroupError> {
    let tokens = tokenize(sql);
    let mut arena = Arena::from_tokens(tokens);
    group(&mut arena)?;

    let root = arena.root;
    StripCommentsFilter.process(&mut arena, root);
    StripWhitespaceFilter.process(&mut arena, root);
    ReindentFilter::new(opts).process(&mut arena);
    SpacesAroundOperatorsFilter.process(&mut arena, root);

    Ok(SerializerUnicode.process(&arena, root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_sql_reindents_a_simple_select() {
        let out = format_sql("SELECT a, b FROM t WHERE a = 1", ReindentOptions::default()).unwrap();
        assert!(out.contains('\n'));
        assert!(out.contains("FROM"));
    }

    #[test]
    fn format_sql_rejects_unbalanced_parenthesis() {
        let err = format_sql("SELECT (a FROM t", ReindentOptions::default());
        assert!(err.is_err());
    }

    #[test]
    fn format_sql_cte_absorbs_into_statement_select() {
        let out = format_sql("WITH cte AS (SELECT 1) SELECT * FROM cte", ReindentOptions::default()).unwrap();
        assert!(out.contains("WITH"));
        assert!(out.contains("SELECT"));
    }
}

/// Property-based checks for the invariants named in spec.md §8.
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn ident() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,5}"
    }

    fn select_stmt() -> impl Strategy<Value = String> {
        (prop::collection::vec(ident(), 1..4), ident(), proptest::option::of((ident(), 0u32..1000))).prop_map(|(cols, table, cond)| {
            let mut sql = format!("SELECT {} FROM {}", cols.join(", "), table);
            if let Some((col, n)) = cond {
                sql.push_str(&format!(" WHERE {} = {}", col, n));
            }
            sql
        })
    }

    proptest! {
        /// Invariant 1: grouping never drops or reorders source characters.
        #[test]
        fn content_preservation(sql in select_stmt()) {
            let tokens = tokenize(&sql);
            let mut arena = Arena::from_tokens(tokens);
            group(&mut arena).unwrap();
            let flattened: String = arena.flatten(arena.root).into_iter().map(|leaf| arena.token(leaf).unwrap().text.clone()).collect();
            prop_assert_eq!(flattened, sql);
        }

        /// Invariant 2: reindenting only adds whitespace; every other
        /// token's text is unchanged and in the same relative order.
        #[test]
        fn reindent_touches_only_whitespace(sql in select_stmt()) {
            let before_tokens = tokenize(&sql);
            let mut before = Arena::from_tokens(before_tokens);
            group(&mut before).unwrap();
            let non_ws_before: Vec<String> = before.flatten(before.root).into_iter()
                .filter(|&leaf| !before.is_whitespace(leaf))
                .map(|leaf| before.token(leaf).unwrap().text.clone())
                .collect();

            let after_tokens = tokenize(&sql);
            let mut after = Arena::from_tokens(after_tokens);
            group(&mut after).unwrap();
            ReindentFilter::new(ReindentOptions::default()).process(&mut after);
            let non_ws_after: Vec<String> = after.flatten(after.root).into_iter()
                .filter(|&leaf| !after.is_whitespace(leaf))
                .map(|leaf| after.token(leaf).unwrap().text.clone())
                .collect();

            prop_assert_eq!(non_ws_before, non_ws_after);
        }

        /// Invariant 7: the pipeline is a pure function of its input.
        #[test]
        fn deterministic_output(sql in select_stmt()) {
            let a = format_sql(&sql, ReindentOptions::default()).unwrap();
            let b = format_sql(&sql, ReindentOptions::default()).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
