use thiserror::Error;

use simtree_shared::EncoderError;

/// Errors surfaced by the message transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No compatible socket implementation exists in the host environment.
    /// Fatal to startup; surfaced once at connect.
    #[error("No compatible socket implementation is available in this environment")]
    NoCompatibleSocket,

    /// A connection already exists; close it before connecting again
    #[error("Connection is already established or in progress")]
    AlreadyConnected,

    /// Operation requires an open connection
    #[error("Connection is not open")]
    NotConnected,

    /// The underlying connection refused or dropped the outbound frame
    #[error("Failed to hand frame to the underlying connection")]
    SendFailed,

    /// Encoding the outbound frame failed
    #[error("Encoder error: {0}")]
    Encoder(#[from] EncoderError),
}

/// Errors surfaced by the tree factory
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// `build_initial` called while a tree is already live; `discard()` must
    /// run first (simulation reload or stop)
    #[error("Runtime tree already built; discard() must run before another initial build")]
    AlreadyBuilt,

    /// Initial snapshot was not an object keyed by top-level entity id
    #[error("Initial snapshot is not an object keyed by top-level entity id")]
    MalformedSnapshot,
}

/// Errors from session-level command guards
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Command requires a loaded simulation
    #[error("Simulation is not loaded")]
    NotLoaded,

    /// Command requires a running simulation
    #[error("Simulation is not running")]
    NotRunning,

    /// Transport failure while issuing the command
    #[error(transparent)]
    Transport(#[from] TransportError),
}
