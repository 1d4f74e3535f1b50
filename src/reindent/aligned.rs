//! `AlignedIndentFilter` — right-aligns clause bodies to the widest
//! opening keyword among sibling clauses instead of each clause's own
//! width, grounded in `aligned_indent.py`'s `_get_offset` override.

use super::filter::IndentPolicy;
use super::ReindentOptions;
use crate::tree::{Arena, NodeId};

pub struct AlignedIndentFilter {
    options: ReindentOptions,
}

impl AlignedIndentFilter {
    pub fn new(options: ReindentOptions) -> Self {
        AlignedIndentFilter { options }
    }
}

impl IndentPolicy for AlignedIndentFilter {
    fn options(&self) -> &ReindentOptions {
        &self.options
    }

    fn kwd_offset(&self, arena: &Arena, id: NodeId) -> i64 {
        let own_len = arena.attrs(id).map(|a| a.opening_keyword_length).unwrap_or(0) as i64;
        let Some(parent) = arena.parent(id) else {
            return own_len + 1;
        };
        let max_len = arena
            .children(parent)
            .iter()
            .filter_map(|&c| arena.attrs(c))
            .map(|a| a.opening_keyword_length as i64)
            .max()
            .unwrap_or(own_len);
        max_len.max(own_len) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::passes;
    use crate::tree::Arena;

    #[test]
    fn aligned_select_from_share_a_column() {
        let tokens = tokenize("SELECT a FROM t WHERE a = 1");
        let mut arena = Arena::from_tokens(tokens);
        passes::group(&mut arena).unwrap();
        AlignedIndentFilter::new(ReindentOptions::default()).process(&mut arena);
        let text = arena.text(arena.root);
        assert!(text.contains('\n'));
    }
}
