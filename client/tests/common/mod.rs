#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};

use simtree_client::{
    FrameSender, HandlerContext, MessageHandler, SendError, ServerMessage, SharedHandler, Socket,
    TransportError,
};

/// Socket double whose sender records every outbound frame.
pub struct MockSocket {
    frames: Rc<RefCell<Vec<String>>>,
}

impl MockSocket {
    pub fn new() -> (Box<Self>, Rc<RefCell<Vec<String>>>) {
        let frames = Rc::new(RefCell::new(Vec::new()));
        let socket = Box::new(Self {
            frames: Rc::clone(&frames),
        });
        (socket, frames)
    }
}

impl Socket for MockSocket {
    fn open(self: Box<Self>, _endpoint: &str) -> Result<Box<dyn FrameSender>, TransportError> {
        Ok(Box::new(MockSender {
            frames: self.frames,
        }))
    }
}

struct MockSender {
    frames: Rc<RefCell<Vec<String>>>,
}

impl FrameSender for MockSender {
    fn send(&mut self, frame: &str) -> Result<(), SendError> {
        self.frames.borrow_mut().push(frame.to_string());
        Ok(())
    }
}

/// Socket double for a host environment with no usable connection
/// primitive.
pub struct UnavailableSocket;

impl Socket for UnavailableSocket {
    fn open(self: Box<Self>, _endpoint: &str) -> Result<Box<dyn FrameSender>, TransportError> {
        Err(TransportError::NoCompatibleSocket)
    }
}

/// Compress a textual frame the way the server does before transmission.
pub fn compress_frame(text: &str) -> Vec<u8> {
    lz4::block::compress(text.as_bytes(), None, true).unwrap()
}

/// A compressed server frame with the given type tag and update document.
pub fn server_frame(msg_type: &str, update: Value) -> Vec<u8> {
    compress_frame(&json!({ "type": msg_type, "update": update }).to_string())
}

/// Same, answering a specific request id.
pub fn server_reply(request_id: &str, msg_type: &str, update: Value) -> Vec<u8> {
    compress_frame(
        &json!({ "requestID": request_id, "type": msg_type, "update": update }).to_string(),
    )
}

/// Handler double that records `label:type` for every message it observes,
/// into a log shared across handlers so dispatch order is visible.
pub struct RecordingHandler {
    label: &'static str,
    seen: Rc<RefCell<Vec<String>>>,
}

impl RecordingHandler {
    pub fn new(label: &'static str, seen: &Rc<RefCell<Vec<String>>>) -> SharedHandler {
        Rc::new(RefCell::new(Self {
            label,
            seen: Rc::clone(seen),
        }))
    }
}

impl MessageHandler for RecordingHandler {
    fn on_message(&mut self, message: &ServerMessage, _context: &mut HandlerContext<'_>) {
        self.seen
            .borrow_mut()
            .push(format!("{}:{}", self.label, message.raw_type()));
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
