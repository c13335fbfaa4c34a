use std::collections::HashMap;

use log::debug;
use serde_json::Value;

use simtree_shared::NodePath;

use super::RuntimeTree;

/// Callback invoked with a watched node's latest value after each
/// reconciliation pass.
pub type WatchCallback = Box<dyn FnMut(&Value)>;

/// Maps watched variable paths to callbacks.
///
/// Entries are added and removed explicitly; the whole registry is cleared
/// when the tree is discarded on reload or stop.
#[derive(Default)]
pub struct WatchRegistry {
    callbacks: HashMap<NodePath, WatchCallback>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in a path. A later registration for the same path
    /// replaces the earlier callback.
    pub fn watch(&mut self, path: NodePath, callback: WatchCallback) {
        self.callbacks.insert(path, callback);
    }

    /// Remove a watch. Removing a path that was never watched is a no-op.
    pub fn unwatch(&mut self, path: &NodePath) {
        self.callbacks.remove(path);
    }

    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Read each watched node's current value and invoke its callback.
    /// Paths with no live node are skipped; a reload may have removed them.
    /// Nodes without a scalar value (containers, or variables the server
    /// has not valued yet) are also skipped: callbacks take a concrete
    /// `&Value`, never a null placeholder.
    pub(crate) fn notify(&mut self, tree: &RuntimeTree) {
        for (path, callback) in self.callbacks.iter_mut() {
            let Some(node) = tree.get_node_by_path(path) else {
                debug!("watched path {path} has no live node");
                continue;
            };
            let value = node.borrow().value();
            if let Some(value) = value {
                callback(&value);
            }
        }
    }
}
