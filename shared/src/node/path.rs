use std::fmt;

/// Hierarchical address of a node inside the runtime tree.
///
/// Dot-separated segments with bracket indices for array members
/// (`network.neuron[3].v`). The path is fixed at node construction, is
/// globally unique within one tree, and doubles as the mutation key for
/// reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(String);

impl NodePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Child address one dot-segment below this one.
    pub fn join(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            Self(segment.to_string())
        } else {
            Self(format!("{}.{}", self.0, segment))
        }
    }

    /// Indexed address of an array member (`base[3]`).
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{}]", self.0, index))
    }

    /// Address of the enclosing node, `None` at a root.
    pub fn parent(&self) -> Option<Self> {
        let cut = self.0.rfind(|c| c == '.' || c == '[')?;
        Some(Self(self.0[..cut].to_string()))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for NodePath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
