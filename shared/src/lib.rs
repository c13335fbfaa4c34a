//! # Simtree Shared
//! Wire protocol, frame codec and node model shared between the simtree
//! client and any tooling that speaks the same protocol.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod codec;
mod messages;
mod node;

pub use codec::{
    decoder::Decoder,
    encoder::encode_request,
    error::{DecoderError, EncoderError},
};
pub use messages::{
    command::ClientCommand,
    server_message::{RequestEnvelope, ServerMessage, ServerMessageKind},
};
pub use node::{
    kind::{NodeKind, SubTreeKind},
    node::{
        AspectBody, CompositeBody, ConnectionBody, DynamicsBody, EntityBody, FunctionBody, Node,
        NodeBody, NodeHandle, NodeRef, Position, QuantityBody, SubTreeBody, TextBody,
    },
    path::NodePath,
};
