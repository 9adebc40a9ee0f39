//! Parent-frame channel.
//!
//! Posts land in an outbox the test can inspect; the test plays the
//! editor by delivering messages with [`MockDocument::deliver`].

use serde_json::Value;
use turbo_bridge::host::{ListenerId, MessageHandler, ParentChannel};
use turbo_bridge::{BridgeError, BridgeResult};

use crate::document::MockDocument;

impl MockDocument {
    /// Deliver a message from the parent frame to every handler.
    pub fn deliver(&self, message: Value) {
        let handlers: Vec<MessageHandler> = self
            .message_handlers
            .borrow()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(&message);
        }
    }

    /// Everything posted to the parent so far.
    pub fn posted(&self) -> Vec<Value> {
        self.outbox.borrow().clone()
    }

    /// Drain the outbox.
    pub fn take_posted(&self) -> Vec<Value> {
        std::mem::take(&mut *self.outbox.borrow_mut())
    }
}

impl ParentChannel for MockDocument {
    fn post_to_parent(&self, message: &Value) -> BridgeResult<()> {
        if self.faults.borrow().post_message {
            return Err(BridgeError::Channel("postMessage failed".to_string()));
        }
        self.outbox.borrow_mut().push(message.clone());
        Ok(())
    }

    fn on_message(&self, handler: MessageHandler) -> BridgeResult<ListenerId> {
        let id = ListenerId(self.next_id());
        self.message_handlers.borrow_mut().push((id, handler));
        Ok(id)
    }
}
