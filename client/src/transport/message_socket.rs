use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, info, warn};
use serde_json::Value;

use simtree_shared::{encode_request, ClientCommand, Decoder};

use crate::error::TransportError;

use super::{
    handlers::{HandlerContext, MessageHandler},
    ConnectionState, FrameSender, Notification, Socket,
};

/// Handlers are shared so the embedding code can keep hold of them after
/// registration; identity (`Rc::ptr_eq`) is what `remove_handler` matches on.
pub type SharedHandler = Rc<RefCell<dyn MessageHandler>>;

const DEFAULT_CLIENT_ID: &str = "client";

/// Owns the connection lifecycle: request correlation, busy-state tracking,
/// the decode pipeline and ordered fan-out of inbound messages.
///
/// All state is explicit and scoped to one connection; nothing here is
/// ambient or static. Single-threaded by contract, driven by host callbacks.
pub struct MessageSocket {
    state: ConnectionState,
    sender: Option<Box<dyn FrameSender>>,
    handlers: Vec<SharedHandler>,
    /// Default handlers staged by `connect`, installed when the socket opens.
    pending_handlers: Vec<SharedHandler>,
    decoder: Decoder,
    client_id: String,
    next_request: u64,
    awaiting_reload: bool,
    notifications: VecDeque<Notification>,
}

impl MessageSocket {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Closed,
            sender: None,
            handlers: Vec::new(),
            pending_handlers: Vec::new(),
            decoder: Decoder::new(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            next_request: 0,
            awaiting_reload: false,
            notifications: VecDeque::new(),
        }
    }

    /// Establish the connection.
    ///
    /// `default_handlers` are installed when the underlying socket reports
    /// open, in the order given; that order is the dispatch order for every
    /// subsequent message.
    pub fn connect(
        &mut self,
        socket: Box<dyn Socket>,
        endpoint: &str,
        default_handlers: Vec<SharedHandler>,
    ) -> Result<(), TransportError> {
        if self.state != ConnectionState::Closed {
            return Err(TransportError::AlreadyConnected);
        }
        self.state = ConnectionState::Connecting;
        match socket.open(endpoint) {
            Ok(sender) => {
                self.sender = Some(sender);
                self.pending_handlers = default_handlers;
                self.next_request = 0;
                self.awaiting_reload = false;
                debug!("connecting to {endpoint}");
                Ok(())
            }
            Err(err) => {
                self.state = ConnectionState::Closed;
                Err(err)
            }
        }
    }

    /// Host glue: the underlying connection finished opening.
    pub fn on_open(&mut self) {
        self.state = ConnectionState::Open;
        self.handlers.append(&mut self.pending_handlers);
        info!("connection open, {} default handlers installed", self.handlers.len());
        self.notifications.push_back(Notification::Opened);
    }

    /// Send a command to the server.
    ///
    /// Allocates a fresh request id (`<client_id>-<seq>`, never reused
    /// within a connection) and returns it. Reload-class commands set the
    /// busy flag; only the next inbound message clears it.
    pub fn send(
        &mut self,
        command: ClientCommand,
        payload: Option<&Value>,
    ) -> Result<String, TransportError> {
        if self.state != ConnectionState::Open {
            return Err(TransportError::NotConnected);
        }
        let request_id = self.next_request_id();
        let frame = encode_request(&request_id, command, payload)?;
        let sender = self.sender.as_mut().ok_or(TransportError::NotConnected)?;
        sender.send(&frame).map_err(|_| TransportError::SendFailed)?;
        if command.is_reload() {
            self.awaiting_reload = true;
        }
        debug!("sent {} as {}", command.name(), request_id);
        Ok(request_id)
    }

    /// Host glue: a raw binary frame arrived.
    ///
    /// Decodes and fans the message out to every registered handler in
    /// registration order (fan-out, not first-match). A decode failure
    /// surfaces a notification and reaches no handler; the connection
    /// remains open.
    pub fn on_message(&mut self, raw: &[u8]) {
        // any inbound frame, even an undecodable one, means the server
        // answered; the busy flag tracks receipt, not successful decode
        self.awaiting_reload = false;

        let message = match self.decoder.decode(raw) {
            Ok(message) => message,
            Err(err) => {
                warn!("dropping undecodable frame: {err}");
                self.notifications.push_back(Notification::DecodeFailure {
                    description: err.to_string(),
                });
                return;
            }
        };

        let mut context = HandlerContext {
            client_id: &mut self.client_id,
            notifications: &mut self.notifications,
        };
        for handler in &self.handlers {
            handler.borrow_mut().on_message(&message, &mut context);
        }
    }

    /// Host glue: the underlying connection closed. Drops all handlers;
    /// they must be re-registered on the next connect.
    pub fn on_close(&mut self) {
        self.state = ConnectionState::Closed;
        self.sender = None;
        self.handlers.clear();
        self.pending_handlers.clear();
        info!("connection closed");
        self.notifications.push_back(Notification::Closed);
    }

    /// Host glue: the underlying connection reported an error. Surfaces a
    /// notification; does not close the connection.
    pub fn on_error(&mut self, description: &str) {
        warn!("connection error: {description}");
        self.notifications.push_back(Notification::ConnectionError {
            description: description.to_string(),
        });
    }

    /// True while a reload-class command awaits any reply.
    ///
    /// There is no timeout: a reload the server never answers leaves this
    /// set until the next inbound message, however long that takes.
    pub fn is_busy(&self) -> bool {
        self.awaiting_reload
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Adopt the server-assigned client id used as the request-id prefix.
    pub fn set_client_id(&mut self, id: &str) {
        self.client_id = id.to_string();
    }

    pub fn add_handler(&mut self, handler: SharedHandler) {
        self.handlers.push(handler);
    }

    /// Remove a registered handler. Removing a handler that was never
    /// registered is a no-op.
    pub fn remove_handler(&mut self, handler: &SharedHandler) {
        self.handlers.retain(|registered| !Rc::ptr_eq(registered, handler));
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Drain queued user-visible notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    fn next_request_id(&mut self) -> String {
        let id = format!("{}-{}", self.client_id, self.next_request);
        self.next_request += 1;
        id
    }
}

impl Default for MessageSocket {
    fn default() -> Self {
        Self::new()
    }
}
