//! Outbound message routing over the registry.
//!
//! Thin by design: resolution is the registry's, delivery is the native
//! window's. The router only decides who receives what, and stays quiet
//! when a target has already gone away.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::registry::{WindowRef, WindowRegistry};
use std::rc::Rc;

/// Sends channel messages to one window or to all of them.
pub struct Router {
    registry: Rc<WindowRegistry>,
}

impl Router {
    pub fn new(registry: Rc<WindowRegistry>) -> Self {
        Self { registry }
    }

    /// Send `data` on `channel` to the resolved target. An unavailable
    /// target is a logged no-op; only an ambiguous class reference errors.
    pub fn send_to(&self, target: impl Into<WindowRef>, channel: &str, data: Value) -> Result<()> {
        let target = target.into();
        match self.registry.resolve(&target)? {
            Some(meta) => {
                meta.native.send(channel, data);
                Ok(())
            }
            None => {
                warn!(channel, target = ?target, "route target unavailable; message dropped");
                Ok(())
            }
        }
    }

    /// Send `data` on `channel` to every live window, in registration order.
    /// Returns how many windows received it.
    pub fn broadcast(&self, channel: &str, data: Value) -> usize {
        let mut delivered = 0;
        for (id, meta) in self.registry.all_active() {
            if meta.native.is_destroyed() {
                debug!(instance = %id, channel, "skipping destroyed window in broadcast");
                continue;
            }
            meta.native.send(channel, data.clone());
            delivered += 1;
        }
        delivered
    }
}
