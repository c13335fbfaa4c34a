use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Deserialize;
use serde_json::Value;

use super::kind::{NodeKind, SubTreeKind};
use super::path::NodePath;

/// Shared handle to a live node.
///
/// The tree and its path index hold the strong references; everything else
/// should hold a [`NodeHandle`]. The graph is single-threaded by contract:
/// only the reconciler writes, on the event-loop thread.
pub type NodeRef = Rc<RefCell<Node>>;

/// Weak handle for external collaborators (widgets, listeners). Does not
/// keep the node alive across a reload; holders must tolerate the node
/// disappearing when the tree is discarded.
pub type NodeHandle = Weak<RefCell<Node>>;

/// A single node in the runtime tree.
///
/// `path`, `id` and the body's kind never change after construction; only
/// value-bearing fields are mutated by reconciliation.
#[derive(Debug)]
pub struct Node {
    path: NodePath,
    id: String,
    pub body: NodeBody,
}

impl Node {
    pub fn new(path: NodePath, id: impl Into<String>, body: NodeBody) -> NodeRef {
        Rc::new(RefCell::new(Self {
            path,
            id: id.into(),
            body,
        }))
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }

    /// Latest scalar value, as watch callbacks observe it. `None` for
    /// container nodes.
    pub fn value(&self) -> Option<Value> {
        match &self.body {
            NodeBody::Variable(q) | NodeBody::Parameter(q) | NodeBody::ParameterSpecification(q) => {
                q.value.clone()
            }
            NodeBody::DynamicsSpecification(d) => d.quantity.value.clone(),
            NodeBody::TextMetadata(t) => t.value.clone().map(Value::String),
            _ => None,
        }
    }

    /// Ordered children, for traversal by widgets and tooling.
    pub fn children(&self) -> Vec<NodeRef> {
        match &self.body {
            NodeBody::Entity(e) => {
                let mut all = Vec::new();
                all.extend(e.entities.iter().cloned());
                all.extend(e.aspects.iter().cloned());
                all.extend(e.connections.iter().cloned());
                all
            }
            NodeBody::Aspect(a) => [&a.visualization, &a.simulation, &a.model]
                .into_iter()
                .flatten()
                .cloned()
                .collect(),
            NodeBody::AspectSubTree(s) => s.children.clone(),
            NodeBody::Composite(c) => c.children.clone(),
            _ => Vec::new(),
        }
    }
}

/// Kind-specific node payload, tagged once at construction.
#[derive(Debug)]
pub enum NodeBody {
    Entity(EntityBody),
    Aspect(AspectBody),
    AspectSubTree(SubTreeBody),
    Composite(CompositeBody),
    Variable(QuantityBody),
    Parameter(QuantityBody),
    ParameterSpecification(QuantityBody),
    DynamicsSpecification(DynamicsBody),
    Function(FunctionBody),
    TextMetadata(TextBody),
    Connection(ConnectionBody),
}

impl NodeBody {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Entity(_) => NodeKind::Entity,
            Self::Aspect(_) => NodeKind::Aspect,
            Self::AspectSubTree(_) => NodeKind::AspectSubTree,
            Self::Composite(_) => NodeKind::Composite,
            Self::Variable(_) => NodeKind::Variable,
            Self::Parameter(_) => NodeKind::Parameter,
            Self::ParameterSpecification(_) => NodeKind::ParameterSpecification,
            Self::DynamicsSpecification(_) => NodeKind::DynamicsSpecification,
            Self::Function(_) => NodeKind::Function,
            Self::TextMetadata(_) => NodeKind::TextMetadata,
            Self::Connection(_) => NodeKind::Connection,
        }
    }
}

/// Spatial position of an entity in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Default)]
pub struct EntityBody {
    pub entities: Vec<NodeRef>,
    pub aspects: Vec<NodeRef>,
    pub connections: Vec<NodeRef>,
    pub position: Option<Position>,
}

#[derive(Debug, Default)]
pub struct AspectBody {
    pub simulator: Option<String>,
    pub model_interpreter: Option<String>,
    pub visualization: Option<NodeRef>,
    pub simulation: Option<NodeRef>,
    pub model: Option<NodeRef>,
}

impl AspectBody {
    pub fn subtree(&self, kind: SubTreeKind) -> Option<&NodeRef> {
        match kind {
            SubTreeKind::Visualization => self.visualization.as_ref(),
            SubTreeKind::Simulation => self.simulation.as_ref(),
            SubTreeKind::Model => self.model.as_ref(),
        }
    }

    pub fn set_subtree(&mut self, kind: SubTreeKind, node: NodeRef) {
        match kind {
            SubTreeKind::Visualization => self.visualization = Some(node),
            SubTreeKind::Simulation => self.simulation = Some(node),
            SubTreeKind::Model => self.model = Some(node),
        }
    }
}

#[derive(Debug)]
pub struct SubTreeBody {
    pub subtree_kind: SubTreeKind,
    pub children: Vec<NodeRef>,
    /// Raw visualization payload, replaced wholesale on updates.
    pub content: Option<Value>,
    /// True when freshly created from a snapshot; collaborators observe it
    /// before the next reconciliation pass clears it.
    pub dirty: bool,
}

impl SubTreeBody {
    pub fn new(subtree_kind: SubTreeKind) -> Self {
        Self {
            subtree_kind,
            children: Vec::new(),
            content: None,
            dirty: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct CompositeBody {
    pub children: Vec<NodeRef>,
}

#[derive(Debug, Default)]
pub struct QuantityBody {
    pub value: Option<Value>,
    pub unit: Option<String>,
    pub scaling_factor: Option<String>,
}

#[derive(Debug)]
pub struct DynamicsBody {
    pub quantity: QuantityBody,
    /// Evolution rule attached by the server.
    pub function: FunctionBody,
}

#[derive(Debug, Default)]
pub struct FunctionBody {
    pub expression: String,
    pub arguments: Vec<String>,
}

#[derive(Debug)]
pub struct TextBody {
    pub value: Option<String>,
}

#[derive(Debug)]
pub struct ConnectionBody {
    /// Path of the entity this connection points at.
    pub entity_path: NodePath,
    pub connection_type: Option<String>,
}
