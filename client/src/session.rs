use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, info};
use serde_json::Value;

use simtree_shared::{ClientCommand, NodePath, NodeRef};

use crate::error::{SessionError, TransportError};
use crate::transport::{
    GlobalHandler, MessageSocket, Notification, SimulationHandler, Socket,
};
use crate::tree::{SharedListener, TreeFactory, WatchCallback};

/// Simulation lifecycle as acknowledged by the server. Commands are guarded
/// on this locally, but the status itself only advances on server messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Init,
    Loaded,
    Started,
    Paused,
    Stopped,
}

/// Ordered, user-consumable happenings of a session. Drained with
/// [`Session::drain_events`]; draining also applies status transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The runtime tree was built from a full snapshot.
    ModelLoaded,
    Loaded,
    Started,
    Paused,
    Stopped,
    RunScript { url: String },
    ObserverMode,
    ServerAvailable,
    ServerUnavailable,
    ServerError { description: String },
    Info { description: String },
}

/// Front door of the client: one transport, one runtime tree, one
/// lifecycle.
///
/// The session installs the two default message handlers on connect, wiring
/// tree-shaped messages into the factory and control-plane messages into
/// the event queue. The embedding code drives it with the host-glue
/// callbacks and polls [`drain_events`](Self::drain_events).
pub struct Session {
    socket: MessageSocket,
    factory: Rc<RefCell<TreeFactory>>,
    events: Rc<RefCell<VecDeque<SessionEvent>>>,
    status: SessionStatus,
}

impl Session {
    pub fn new() -> Self {
        Self {
            socket: MessageSocket::new(),
            factory: Rc::new(RefCell::new(TreeFactory::new())),
            events: Rc::new(RefCell::new(VecDeque::new())),
            status: SessionStatus::Init,
        }
    }

    /// Connect to the server, installing the simulation and control-plane
    /// handlers in that order.
    pub fn connect(
        &mut self,
        socket: Box<dyn Socket>,
        endpoint: &str,
    ) -> Result<(), TransportError> {
        let simulation = Rc::new(RefCell::new(SimulationHandler::new(
            Rc::clone(&self.factory),
            Rc::clone(&self.events),
        )));
        let global = Rc::new(RefCell::new(GlobalHandler::new(Rc::clone(&self.events))));
        self.socket.connect(socket, endpoint, vec![simulation, global])
    }

    // Lifecycle commands

    /// Load a simulation from a URL. Discards any live tree; the busy flag
    /// stays set until the server responds.
    pub fn load_url(&mut self, url: &str) -> Result<String, SessionError> {
        self.reset_for_load();
        let payload = Value::String(url.to_string());
        Ok(self.socket.send(ClientCommand::InitUrl, Some(&payload))?)
    }

    /// Load a simulation from inline content.
    pub fn load_content(&mut self, content: &str) -> Result<String, SessionError> {
        self.reset_for_load();
        let payload = Value::String(content.to_string());
        Ok(self.socket.send(ClientCommand::InitSim, Some(&payload))?)
    }

    pub fn start(&mut self) -> Result<String, SessionError> {
        self.require_loaded()?;
        Ok(self.socket.send(ClientCommand::Start, None)?)
    }

    pub fn pause(&mut self) -> Result<String, SessionError> {
        if self.status != SessionStatus::Started {
            return Err(SessionError::NotRunning);
        }
        Ok(self.socket.send(ClientCommand::Pause, None)?)
    }

    pub fn stop(&mut self) -> Result<String, SessionError> {
        if !matches!(self.status, SessionStatus::Started | SessionStatus::Paused) {
            return Err(SessionError::NotRunning);
        }
        Ok(self.socket.send(ClientCommand::Stop, None)?)
    }

    /// Join an already-full server as a read-only observer.
    pub fn observe(&mut self) -> Result<String, SessionError> {
        Ok(self.socket.send(ClientCommand::Observe, None)?)
    }

    // Watch commands. Server-side recording is driven by these; local
    // delivery of recorded values goes through `watch`.

    pub fn list_watch_vars(&mut self) -> Result<String, SessionError> {
        self.require_loaded()?;
        Ok(self.socket.send(ClientCommand::ListWatchVars, None)?)
    }

    pub fn list_force_vars(&mut self) -> Result<String, SessionError> {
        self.require_loaded()?;
        Ok(self.socket.send(ClientCommand::ListForceVars, None)?)
    }

    pub fn set_watch(&mut self, variables: &Value) -> Result<String, SessionError> {
        self.require_loaded()?;
        Ok(self.socket.send(ClientCommand::SetWatch, Some(variables))?)
    }

    pub fn get_watch(&mut self) -> Result<String, SessionError> {
        self.require_loaded()?;
        Ok(self.socket.send(ClientCommand::GetWatch, None)?)
    }

    pub fn start_watch(&mut self) -> Result<String, SessionError> {
        self.require_loaded()?;
        Ok(self.socket.send(ClientCommand::StartWatch, None)?)
    }

    pub fn stop_watch(&mut self) -> Result<String, SessionError> {
        self.require_loaded()?;
        Ok(self.socket.send(ClientCommand::StopWatch, None)?)
    }

    /// Clear the server-side watch lists and the local registry with them.
    pub fn clear_watch(&mut self) -> Result<String, SessionError> {
        self.require_loaded()?;
        let request_id = self.socket.send(ClientCommand::ClearWatch, None)?;
        self.factory.borrow_mut().clear_watches();
        Ok(request_id)
    }

    pub fn request_version(&mut self) -> Result<String, SessionError> {
        Ok(self.socket.send(ClientCommand::Version, None)?)
    }

    // Tree access

    pub fn get_node_by_path(&self, path: &NodePath) -> Option<NodeRef> {
        self.factory.borrow().get_node_by_path(path)
    }

    /// Register a local callback for a variable path; it fires after every
    /// reconciliation pass with the node's latest value.
    pub fn watch(&mut self, path: NodePath, callback: WatchCallback) {
        self.factory.borrow_mut().watch(path, callback);
    }

    pub fn unwatch(&mut self, path: &NodePath) {
        self.factory.borrow_mut().unwatch(path);
    }

    pub fn add_tree_listener(&mut self, listener: SharedListener) {
        self.factory.borrow_mut().add_listener(listener);
    }

    pub fn remove_tree_listener(&mut self, listener: &SharedListener) {
        self.factory.borrow_mut().remove_listener(listener);
    }

    pub fn factory(&self) -> Rc<RefCell<TreeFactory>> {
        Rc::clone(&self.factory)
    }

    // Host glue, forwarded to the transport.

    pub fn on_open(&mut self) {
        self.socket.on_open();
    }

    pub fn on_message(&mut self, raw: &[u8]) {
        self.socket.on_message(raw);
    }

    pub fn on_close(&mut self) {
        self.socket.on_close();
    }

    pub fn on_error(&mut self, description: &str) {
        self.socket.on_error(description);
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.socket.take_notifications()
    }

    // State

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_busy(&self) -> bool {
        self.socket.is_busy()
    }

    pub fn client_id(&self) -> &str {
        self.socket.client_id()
    }

    pub fn socket(&self) -> &MessageSocket {
        &self.socket
    }

    pub fn socket_mut(&mut self) -> &mut MessageSocket {
        &mut self.socket
    }

    /// Drain queued events in arrival order, applying lifecycle transitions
    /// as each acknowledgment passes through. A `Stopped` ack also discards
    /// the node graph and the watch registry; the next load rebuilds both.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let events: Vec<SessionEvent> = self.events.borrow_mut().drain(..).collect();
        for event in &events {
            match event {
                SessionEvent::Loaded => self.transition(SessionStatus::Loaded),
                SessionEvent::Started => self.transition(SessionStatus::Started),
                SessionEvent::Paused => self.transition(SessionStatus::Paused),
                SessionEvent::Stopped => {
                    self.transition(SessionStatus::Stopped);
                    self.factory.borrow_mut().discard();
                }
                _ => {}
            }
        }
        events
    }

    fn transition(&mut self, status: SessionStatus) {
        if self.status != status {
            info!("session status {:?} -> {:?}", self.status, status);
            self.status = status;
        }
    }

    fn require_loaded(&self) -> Result<(), SessionError> {
        if self.status == SessionStatus::Init {
            return Err(SessionError::NotLoaded);
        }
        Ok(())
    }

    fn reset_for_load(&mut self) {
        if self.factory.borrow().is_built() {
            debug!("discarding live tree before reload");
            self.factory.borrow_mut().discard();
        }
        self.status = SessionStatus::Init;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
