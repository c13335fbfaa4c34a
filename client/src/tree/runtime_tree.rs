use std::collections::HashMap;
use std::rc::Rc;

use simtree_shared::{NodePath, NodeRef};

/// The single owned root of the node graph.
///
/// Top-level entities keyed by id, plus a path index covering every node
/// reachable from them. The index is maintained alongside the tree on every
/// insert and remove; each reachable node appears under exactly one path.
#[derive(Default)]
pub struct RuntimeTree {
    root: HashMap<String, NodeRef>,
    index: HashMap<NodePath, NodeRef>,
}

impl RuntimeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a top-level entity. Replaces any previous entity with the
    /// same id; ids must be unique, insertion order carries no meaning.
    pub fn insert_root(&mut self, id: &str, node: NodeRef) {
        self.index_node(&node);
        self.root.insert(id.to_string(), node);
    }

    /// Register a node under its path.
    pub fn index_node(&mut self, node: &NodeRef) {
        let path = node.borrow().path().clone();
        self.index.insert(path, Rc::clone(node));
    }

    pub fn get_node_by_path(&self, path: &NodePath) -> Option<NodeRef> {
        self.index.get(path).map(Rc::clone)
    }

    pub fn root_entity(&self, id: &str) -> Option<NodeRef> {
        self.root.get(id).map(Rc::clone)
    }

    pub fn root_entities(&self) -> Vec<NodeRef> {
        self.root.values().map(Rc::clone).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Number of indexed nodes across the whole graph.
    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    /// Every indexed node, in no particular order.
    pub fn nodes(&self) -> Vec<NodeRef> {
        self.index.values().map(Rc::clone).collect()
    }

    /// Drop the whole graph. External `Weak` handles expire with it.
    pub fn clear(&mut self) {
        self.root.clear();
        self.index.clear();
    }
}
