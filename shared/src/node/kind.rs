/// Discriminator tag carried by every snapshot node. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Entity,
    Aspect,
    AspectSubTree,
    Composite,
    Variable,
    Parameter,
    ParameterSpecification,
    DynamicsSpecification,
    Function,
    TextMetadata,
    Connection,
}

impl NodeKind {
    /// Parse a snapshot discriminator. Unknown tags return `None`; the
    /// reconciler skips those subtrees without traversing their children.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Entity" => Some(Self::Entity),
            "Aspect" => Some(Self::Aspect),
            "AspectSubTree" => Some(Self::AspectSubTree),
            "Composite" => Some(Self::Composite),
            "Variable" => Some(Self::Variable),
            "Parameter" => Some(Self::Parameter),
            "ParameterSpecification" => Some(Self::ParameterSpecification),
            "DynamicsSpecification" => Some(Self::DynamicsSpecification),
            "Function" => Some(Self::Function),
            "TextMetadata" => Some(Self::TextMetadata),
            "Connection" => Some(Self::Connection),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Entity => "Entity",
            Self::Aspect => "Aspect",
            Self::AspectSubTree => "AspectSubTree",
            Self::Composite => "Composite",
            Self::Variable => "Variable",
            Self::Parameter => "Parameter",
            Self::ParameterSpecification => "ParameterSpecification",
            Self::DynamicsSpecification => "DynamicsSpecification",
            Self::Function => "Function",
            Self::TextMetadata => "TextMetadata",
            Self::Connection => "Connection",
        }
    }
}

/// The three named subtrees an aspect may own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubTreeKind {
    Visualization,
    Simulation,
    Model,
}

impl SubTreeKind {
    /// Parse the subtree `type` field. Long and short forms both appear on
    /// the wire.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "VisualizationTree" | "Visualization" => Some(Self::Visualization),
            "SimulationTree" | "Simulation" => Some(Self::Simulation),
            "ModelTree" | "Model" => Some(Self::Model),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Visualization => "VisualizationTree",
            Self::Simulation => "SimulationTree",
            Self::Model => "ModelTree",
        }
    }
}
