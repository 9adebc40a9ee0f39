//! A bridge wired to a mock document, with captured logs.

use std::rc::Rc;

use serde_json::Value;
use turbo_bridge::logging::MemorySink;
use turbo_bridge::{Bridge, BridgeConfig, BridgeResult};

use crate::document::MockDocument;

/// An attached bridge plus the document it drives.
pub struct BridgeHarness {
    pub doc: Rc<MockDocument>,
    pub bridge: Rc<Bridge<MockDocument>>,
    pub logs: Rc<MemorySink>,
}

impl BridgeHarness {
    /// Attach a bridge with default configuration.
    pub fn new(doc: MockDocument) -> BridgeResult<Self> {
        Self::with_config(doc, BridgeConfig::default())
    }

    pub fn with_config(doc: MockDocument, config: BridgeConfig) -> BridgeResult<Self> {
        config.validate()?;
        let doc = Rc::new(doc);
        let logs = Rc::new(MemorySink::new());
        let logger = config.logger("visual-edit").with_sink(logs.clone());
        let bridge = Rc::new(Bridge::new(doc.clone(), &config, logger));
        bridge.attach()?;
        Ok(Self { doc, bridge, logs })
    }

    /// Deliver a message as the editor frame would.
    pub fn send(&self, message: Value) {
        self.doc.deliver(message);
    }

    /// Drain replies posted to the editor frame.
    pub fn replies(&self) -> Vec<Value> {
        self.doc.take_posted()
    }
}
