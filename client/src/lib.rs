//! # Simtree Client
//! Keeps a local, typed mirror of a remote simulation's state tree in sync
//! over a persistent message connection. The host environment supplies the
//! socket; this crate supplies the codec, the transport state machine, the
//! runtime tree and the session lifecycle on top of them.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod error;
mod session;
mod transport;
mod tree;

pub use error::{SessionError, TransportError, TreeError};
pub use session::{Session, SessionEvent, SessionStatus};
pub use transport::{
    ConnectionState, FrameSender, GlobalHandler, HandlerContext, MessageHandler, MessageSocket,
    Notification, SendError, SharedHandler, SimulationHandler, Socket,
};
pub use tree::{
    RuntimeTree, SharedListener, TreeFactory, TreeListener, WatchCallback, WatchRegistry,
};

pub use simtree_shared::{
    ClientCommand, Decoder, DecoderError, EncoderError, Node, NodeBody, NodeHandle, NodeKind,
    NodePath, NodeRef, ServerMessage, ServerMessageKind, SubTreeKind,
};
