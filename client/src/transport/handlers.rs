use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, info, warn};

use simtree_shared::{ServerMessage, ServerMessageKind};

use crate::session::SessionEvent;
use crate::tree::TreeFactory;

use super::Notification;

/// Context handed to handlers during fan-out.
///
/// Lets a handler assign the transport's client id or queue a user-visible
/// notification without owning the socket.
pub struct HandlerContext<'a> {
    pub(crate) client_id: &'a mut String,
    pub(crate) notifications: &'a mut VecDeque<Notification>,
}

impl HandlerContext<'_> {
    /// Adopt the server-assigned client id used for request correlation.
    pub fn set_client_id(&mut self, id: &str) {
        *self.client_id = id.to_string();
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push_back(notification);
    }
}

/// An inbound message consumer.
///
/// Every registered handler observes every decoded message, in registration
/// order; a handler ignores the kinds it does not care about.
pub trait MessageHandler {
    fn on_message(&mut self, message: &ServerMessage, context: &mut HandlerContext<'_>);
}

/// Consumes tree-shaped messages: full snapshots rebuild the runtime tree,
/// scene updates are reconciled in place. Simulation acknowledgments become
/// session events.
pub struct SimulationHandler {
    factory: Rc<RefCell<TreeFactory>>,
    events: Rc<RefCell<VecDeque<SessionEvent>>>,
}

impl SimulationHandler {
    pub fn new(
        factory: Rc<RefCell<TreeFactory>>,
        events: Rc<RefCell<VecDeque<SessionEvent>>>,
    ) -> Self {
        Self { factory, events }
    }

    fn emit(&self, event: SessionEvent) {
        self.events.borrow_mut().push_back(event);
    }
}

impl MessageHandler for SimulationHandler {
    fn on_message(&mut self, message: &ServerMessage, _context: &mut HandlerContext<'_>) {
        match message.kind() {
            ServerMessageKind::LoadModel => {
                let Some(scene) = message.update_document() else {
                    warn!("load_model message carried no scene document");
                    return;
                };
                let mut factory = self.factory.borrow_mut();
                factory.discard();
                match factory.build_initial(&scene) {
                    Ok(()) => {
                        drop(factory);
                        self.emit(SessionEvent::ModelLoaded);
                    }
                    Err(err) => warn!("initial tree build failed: {err}"),
                }
            }
            ServerMessageKind::SceneUpdate => {
                let Some(scene) = message.update_document() else {
                    warn!("scene_update message carried no document");
                    return;
                };
                self.factory.borrow_mut().reconcile(&scene);
            }
            ServerMessageKind::SimulationLoaded => self.emit(SessionEvent::Loaded),
            ServerMessageKind::SimulationStarted => self.emit(SessionEvent::Started),
            ServerMessageKind::SimulationPaused => self.emit(SessionEvent::Paused),
            ServerMessageKind::SimulationStopped => self.emit(SessionEvent::Stopped),
            ServerMessageKind::FireSimScripts => {
                if let Some(scripts) = message.update_document() {
                    for script in scripts.as_array().into_iter().flatten() {
                        if let Some(url) = script.as_str() {
                            self.emit(SessionEvent::RunScript {
                                url: url.to_string(),
                            });
                        }
                    }
                }
            }
            ServerMessageKind::RunScript => {
                if let Some(url) = message.update_text() {
                    self.emit(SessionEvent::RunScript {
                        url: url.to_string(),
                    });
                }
            }
            _ => {}
        }
    }
}

/// Consumes control-plane messages: identity assignment, availability and
/// server-side errors.
pub struct GlobalHandler {
    events: Rc<RefCell<VecDeque<SessionEvent>>>,
}

impl GlobalHandler {
    pub fn new(events: Rc<RefCell<VecDeque<SessionEvent>>>) -> Self {
        Self { events }
    }

    fn emit(&self, event: SessionEvent) {
        self.events.borrow_mut().push_back(event);
    }
}

impl MessageHandler for GlobalHandler {
    fn on_message(&mut self, message: &ServerMessage, context: &mut HandlerContext<'_>) {
        match message.kind() {
            ServerMessageKind::ClientId => {
                if let Some(id) = message.update_text() {
                    info!("server assigned client id {id}");
                    context.set_client_id(id);
                }
            }
            ServerMessageKind::ServerAvailable => self.emit(SessionEvent::ServerAvailable),
            ServerMessageKind::ServerUnavailable | ServerMessageKind::SimulatorFull => {
                self.emit(SessionEvent::ServerUnavailable)
            }
            ServerMessageKind::ObserverMode => self.emit(SessionEvent::ObserverMode),
            ServerMessageKind::InfoMessage => {
                if let Some(text) = message.update_text() {
                    self.emit(SessionEvent::Info {
                        description: text.to_string(),
                    });
                }
            }
            ServerMessageKind::ErrorLoadingSimulation
            | ServerMessageKind::ErrorLoadingSimulationConfig
            | ServerMessageKind::ErrorAddingWatchList
            | ServerMessageKind::ErrorReadingScript => {
                self.emit(SessionEvent::ServerError {
                    description: message.raw_type().to_string(),
                });
            }
            ServerMessageKind::Unknown(tag) => {
                debug!("ignoring message with unknown type {tag:?}");
            }
            _ => {}
        }
    }
}
