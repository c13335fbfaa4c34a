mod factory;
mod runtime_tree;
mod watch;

pub use factory::{SharedListener, TreeFactory};
pub use runtime_tree::RuntimeTree;
pub use watch::{WatchCallback, WatchRegistry};

/// External collaborators (widgets, visualizers) notified after every
/// reconciliation pass. Listeners read the tree; they never mutate it.
pub trait TreeListener {
    fn on_tree_updated(&mut self);
}
