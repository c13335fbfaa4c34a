mod handlers;
mod message_socket;

pub use handlers::{GlobalHandler, HandlerContext, MessageHandler, SimulationHandler};
pub use message_socket::{MessageSocket, SharedHandler};

use crate::error::TransportError;

/// Connection lifecycle states.
///
/// Errors are orthogonal signals surfaced as [`Notification`]s, not states:
/// the connection stays `Open` unless the underlying socket also closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Connecting,
    Open,
}

/// Failed to hand a frame to the underlying connection.
pub struct SendError;

/// The connection primitive consumed by the transport, implemented by host
/// glue over whatever socket the environment provides. The inbound half is
/// push-driven: the host calls back into
/// [`MessageSocket::on_open`](MessageSocket::on_open) /
/// [`on_message`](MessageSocket::on_message) /
/// [`on_close`](MessageSocket::on_close) /
/// [`on_error`](MessageSocket::on_error).
pub trait Socket {
    /// Open the connection toward `endpoint`, returning the outbound half.
    ///
    /// Implementations must fail fast with
    /// [`TransportError::NoCompatibleSocket`] when the environment has no
    /// usable socket.
    fn open(self: Box<Self>, endpoint: &str) -> Result<Box<dyn FrameSender>, TransportError>;
}

/// Sends already-encoded text frames over the underlying connection.
pub trait FrameSender {
    fn send(&mut self, frame: &str) -> Result<(), SendError>;
}

/// User-visible connection notifications, drained by the embedding UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The connection finished opening
    Opened,
    /// The connection closed; handlers were dropped
    Closed,
    /// A frame could not be decoded; the connection stays open
    DecodeFailure { description: String },
    /// The underlying connection reported an error; the connection stays
    /// open unless the socket also closes
    ConnectionError { description: String },
}
