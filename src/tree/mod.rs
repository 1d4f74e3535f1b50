//! The in-memory parse tree (spec.md §3, component C1).
//!
//! Nodes live in a flat arena addressed by `NodeId`; a node is either a
//! leaf `Token` or a `Group` that owns an ordered list of child
//! `NodeId`s. Parent back-references are a second `Vec` indexed by
//! handle (see DESIGN.md "arena over owned tree") rather than cyclic
//! `Rc`/`RefCell` ownership, so the grouping passes can freely
//! restructure children without fighting the borrow checker.

pub mod query;

use crate::lexer::token::{LexKind, Token};

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Statement,
    StatementSelect,
    StatementInsert,
    StatementUnion,
    Parenthesis,
    SquareBrackets,
    Case,
    If,
    For,
    Begin,
    Function,
    WindowFunction,
    Identifier,
    SignedIdentifier,
    IdentifierList,
    Operation,
    Comparison,
    Assignment,
    TypedLiteral,
    ConditionsList,
    Comment,
    SubQuery,
    Values,
    ClauseWhere,
    ClauseFrom,
    ClauseWith,
    ClauseInsert,
    ClauseGroupBy,
    ClauseOrderBy,
    ClausePartitionBy,
    SelectProjection,
}

/// Annotations attached during grouping, consumed during reindent
/// (spec.md §3 "Attached attributes").
#[derive(Debug, Clone, Copy, Default)]
pub struct Attrs {
    pub is_code_block_delimiter: bool,
    pub is_sub_query: bool,
    pub conditions_count: u32,
    pub id_list_count: u32,
    pub opening_keyword_length: u32,
}

#[derive(Debug)]
pub struct Group {
    pub kind: GroupKind,
    pub children: Vec<NodeId>,
    pub attrs: Attrs,
}

#[derive(Debug)]
pub enum NodeData {
    Token(Token),
    Group(Group),
}

#[derive(Debug)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
}

/// Owns every node in the tree. `NodeId`s are stable for the lifetime
/// of the arena (nodes are never physically removed, only unlinked
/// from their parent's child list), so holding one across a mutation
/// elsewhere in the tree is safe.
#[derive(Debug)]
pub struct Arena {
    nodes: Vec<Node>,
    pub root: NodeId,
}

impl Arena {
    /// Wraps a flat token stream as the root `Statement` group
    /// (spec.md §6 "Input to core").
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let mut arena = Arena { nodes: Vec::with_capacity(tokens.len() + 1), root: 0 };
        let root = arena.push_node(NodeData::Group(Group { kind: GroupKind::Statement, children: Vec::new(), attrs: Attrs::default() }), None);
        let mut children = Vec::with_capacity(tokens.len());
        for tok in tokens {
            let id = arena.push_node(NodeData::Token(tok), Some(root));
            children.push(id);
        }
        arena.group_mut(root).unwrap().children = children;
        arena.root = root;
        arena
    }

    fn push_node(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        self.nodes.push(Node { data, parent });
        self.nodes.len() - 1
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.nodes[id].parent = parent;
    }

    pub fn is_group(&self, id: NodeId) -> bool {
        matches!(self.nodes[id].data, NodeData::Group(_))
    }

    pub fn group_kind(&self, id: NodeId) -> Option<GroupKind> {
        match &self.nodes[id].data {
            NodeData::Group(g) => Some(g.kind),
            NodeData::Token(_) => None,
        }
    }

    pub fn is_group_kind(&self, id: NodeId, kind: GroupKind) -> bool {
        self.group_kind(id) == Some(kind)
    }

    pub fn is_any_group_kind(&self, id: NodeId, kinds: &[GroupKind]) -> bool {
        matches!(self.group_kind(id), Some(k) if kinds.contains(&k))
    }

    pub fn token(&self, id: NodeId) -> Option<&Token> {
        match &self.nodes[id].data {
            NodeData::Token(t) => Some(t),
            NodeData::Group(_) => None,
        }
    }

    pub fn group(&self, id: NodeId) -> Option<&Group> {
        match &self.nodes[id].data {
            NodeData::Group(g) => Some(g),
            NodeData::Token(_) => None,
        }
    }

    fn group_mut(&mut self, id: NodeId) -> Option<&mut Group> {
        match &mut self.nodes[id].data {
            NodeData::Group(g) => Some(g),
            NodeData::Token(_) => None,
        }
    }

    pub fn attrs(&self, id: NodeId) -> Option<Attrs> {
        self.group(id).map(|g| g.attrs)
    }

    pub fn attrs_mut(&mut self, id: NodeId) -> Option<&mut Attrs> {
        self.group_mut(id).map(|g| &mut g.attrs)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.group(id).map(|g| g.children.as_slice()).unwrap_or(&[])
    }

    pub fn is_whitespace(&self, id: NodeId) -> bool {
        self.token(id).map(|t| t.is_whitespace()).unwrap_or(false)
    }

    pub fn is_keyword(&self, id: NodeId) -> bool {
        self.token(id).map(|t| t.is_keyword()).unwrap_or(false)
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        self.token(id).map(|t| t.kind.is_a(LexKind::Comment)).unwrap_or(false)
            || self.is_group_kind(id, GroupKind::Comment)
    }

    /// Verbatim source text of a leaf, or the concatenation of a
    /// group's flattened leaves.
    pub fn text(&self, id: NodeId) -> String {
        if let Some(tok) = self.token(id) {
            tok.text.clone()
        } else {
            self.flatten(id).into_iter().map(|leaf| self.token(leaf).unwrap().text.clone()).collect()
        }
    }

    /// True iff the token at `id` has lexical type `kind` (or a
    /// subtype) and, if given, a case-folded value in `values`.
    pub fn token_matches(&self, id: NodeId, kind: LexKind, values: Option<&[&str]>) -> bool {
        self.token(id).map(|t| t.matches(kind, values)).unwrap_or(false)
    }

    pub fn token_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// In-order leaves under `id` (spec.md Invariant 1).
    pub fn flatten(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.flatten_into(id, &mut out);
        out
    }

    fn flatten_into(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if self.is_group(id) {
            for &child in self.children(id) {
                self.flatten_into(child, out);
            }
        } else {
            out.push(id);
        }
    }

    /// Direct children of `id` that are themselves groups.
    pub fn get_sublists(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).iter().copied().filter(|&c| self.is_group(c)).collect()
    }

    /// True iff some ancestor of `id` has group kind `kind`.
    pub fn within(&self, id: NodeId, kind: GroupKind) -> bool {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if self.is_group_kind(p, kind) {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    /// Neighbor scan honoring whitespace/comment skip flags
    /// (spec.md §4.1 `token_next`/`token_prev`).
    pub fn token_next(&self, parent: NodeId, idx: Option<usize>, skip_ws: bool, skip_cm: bool, reverse: bool) -> Option<(usize, NodeId)> {
        let children = self.children(parent);
        if children.is_empty() {
            return None;
        }
        let start: isize = match idx {
            Some(i) => if reverse { i as isize - 1 } else { i as isize + 1 },
            None => if reverse { children.len() as isize - 1 } else { 0 },
        };
        let mut i = start;
        loop {
            if i < 0 || i as usize >= children.len() {
                return None;
            }
            let id = children[i as usize];
            let skip = (skip_ws && self.is_whitespace(id)) || (skip_cm && self.is_comment(id));
            if !skip {
                return Some((i as usize, id));
            }
            i += if reverse { -1 } else { 1 };
        }
    }

    pub fn token_prev(&self, parent: NodeId, idx: Option<usize>, skip_ws: bool, skip_cm: bool) -> Option<(usize, NodeId)> {
        self.token_next(parent, idx, skip_ws, skip_cm, true)
    }

    /// Finds the next (or, reverse, previous) child satisfying `pred`,
    /// scanning from just after/before `idx` (or an end, if `None`).
    /// Mirrors spec.md §4.1 `token_next_by`'s "matches any of" search,
    /// with the actual OR-of-matchers composed by the caller as a
    /// single predicate (see `tree::query`).
    pub fn token_next_by(&self, parent: NodeId, idx: Option<usize>, reverse: bool, pred: impl Fn(&Arena, NodeId) -> bool) -> Option<(usize, NodeId)> {
        let children = self.children(parent);
        if children.is_empty() {
            return None;
        }
        let start: isize = match idx {
            Some(i) => if reverse { i as isize - 1 } else { i as isize + 1 },
            None => if reverse { children.len() as isize - 1 } else { 0 },
        };
        let mut i = start;
        loop {
            if i < 0 || i as usize >= children.len() {
                return None;
            }
            let id = children[i as usize];
            if pred(self, id) {
                return Some((i as usize, id));
            }
            i += if reverse { -1 } else { 1 };
        }
    }

    /// Collapses `parent.children[from_idx..=to_idx]` into a new group
    /// of `kind`. If `extend` and the child at `from_idx` is already a
    /// group of `kind`, the span (minus that child) is appended to it
    /// instead of wrapping again (spec.md §4.1 `group_tokens`).
    pub fn group_tokens(&mut self, parent: NodeId, kind: GroupKind, from_idx: usize, to_idx: usize, extend: bool) -> NodeId {
        assert!(from_idx <= to_idx);
        let start_id = self.children(parent)[from_idx];

        if extend && self.is_group_kind(start_id, kind) {
            let rest: Vec<NodeId> = self.children(parent)[from_idx + 1..=to_idx].to_vec();
            {
                let group = self.group_mut(parent).unwrap();
                group.children.drain(from_idx + 1..=to_idx);
            }
            for &child in &rest {
                self.set_parent(child, Some(start_id));
            }
            let grp = self.group_mut(start_id).unwrap();
            grp.children.extend(rest);
            start_id
        } else {
            let span: Vec<NodeId> = self.children(parent)[from_idx..=to_idx].to_vec();
            let grp_id = self.push_node(NodeData::Group(Group { kind, children: span.clone(), attrs: Attrs::default() }), Some(parent));
            for &child in &span {
                self.set_parent(child, Some(grp_id));
            }
            let group = self.group_mut(parent).unwrap();
            group.children.splice(from_idx..=to_idx, [grp_id]);
            grp_id
        }
    }

    /// Normalizes a leaf's lexical type in place (e.g. `Wildcard` `*`
    /// reclassified as `Operator` once recognized as multiplication).
    pub fn set_token_kind(&mut self, id: NodeId, kind: LexKind) {
        if let NodeData::Token(t) = &mut self.nodes[id].data {
            t.kind = kind;
        }
    }

    pub fn push_token(&mut self, tok: Token) -> NodeId {
        self.push_node(NodeData::Token(tok), None)
    }

    /// Inserts `node` as a child of `parent` at position `idx`,
    /// shifting later children right.
    pub fn insert_child(&mut self, parent: NodeId, idx: usize, node: NodeId) {
        self.set_parent(node, Some(parent));
        self.group_mut(parent).unwrap().children.insert(idx, node);
    }

    pub fn push_child(&mut self, parent: NodeId, node: NodeId) {
        self.set_parent(node, Some(parent));
        self.group_mut(parent).unwrap().children.push(node);
    }

    /// Unlinks `parent`'s child at `idx` from the child list (used by
    /// the C5 filters to drop whitespace/comment tokens). The node
    /// itself stays in the arena, orphaned.
    pub fn remove_child(&mut self, parent: NodeId, idx: usize) {
        let removed = self.group_mut(parent).unwrap().children.remove(idx);
        self.set_parent(removed, None);
    }

    /// Overwrites a leaf token's verbatim text in place (used by the
    /// whitespace-collapsing filters).
    pub fn set_token_text(&mut self, id: NodeId, text: String) {
        if let NodeData::Token(t) = &mut self.nodes[id].data {
            t.text = text;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    #[test]
    fn wraps_tokens_as_root_statement() {
        let tokens = tokenize("SELECT a FROM t");
        let arena = Arena::from_tokens(tokens);
        assert!(arena.is_group_kind(arena.root, GroupKind::Statement));
        assert_eq!(arena.flatten(arena.root).len(), arena.children(arena.root).len());
    }

    #[test]
    fn group_tokens_collapses_span() {
        let tokens = tokenize("a . b");
        let mut arena = Arena::from_tokens(tokens);
        let root = arena.root;
        let grp = arena.group_tokens(root, GroupKind::Identifier, 0, 2, false);
        assert_eq!(arena.children(root), &[grp]);
        assert_eq!(arena.children(grp).len(), 3);
        assert_eq!(arena.parent(arena.children(grp)[0]), Some(grp));
    }

    #[test]
    fn group_tokens_extend_absorbs_into_existing_group() {
        let tokens = tokenize("a.b.c");
        let mut arena = Arena::from_tokens(tokens);
        let root = arena.root;
        // a . b -> Identifier
        let id1 = arena.group_tokens(root, GroupKind::Identifier, 0, 2, false);
        // now root children: [Identifier(a.b), ., c]
        let grp = arena.group_tokens(root, GroupKind::Identifier, 0, 2, true);
        assert_eq!(grp, id1);
        assert_eq!(arena.children(root), &[id1]);
        assert_eq!(arena.children(id1).len(), 5);
    }
}
