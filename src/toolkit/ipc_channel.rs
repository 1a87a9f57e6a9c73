use serde_json::Value;

use crate::config::{InvokeBinding, MessageBinding, MessageEvent};
use crate::context::{BuildContext, ConfigPatch};
use crate::shell::NativeHandle;

/// Inbound process-message binder.
///
/// Every binding registered here is scoped to the window being defined:
/// the controller gates dispatch on the sender's native id, so a message
/// arriving on the same channel from a different window never reaches
/// these callbacks.
///
/// ```rust,ignore
/// IpcChannel::new(ctx)
///     .on("note:save", |_msg, _win, payload| {
///         persist(payload)?;
///         Ok(())
///     })
///     .handle("note:list", |_msg, _win, _payload| Ok(load_notes()?));
/// ```
pub struct IpcChannel<'a> {
    ctx: &'a BuildContext,
}

impl<'a> IpcChannel<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        Self { ctx }
    }

    /// Bind a fire-and-forget message handler. A returned `Err` is logged
    /// and swallowed at the dispatch boundary; the sender is not notified.
    pub fn on(
        self,
        channel: impl Into<String>,
        callback: impl FnMut(&MessageEvent, &NativeHandle, Value) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.ctx.update(ConfigPatch::message(MessageBinding {
            channel: channel.into(),
            callback: Box::new(callback),
        }));
        self
    }

    /// Bind a request/response handler. The returned value travels back to
    /// the remote caller; a returned `Err` is logged and re-raised to the
    /// transport so the caller's request fails visibly.
    pub fn handle(
        self,
        channel: impl Into<String>,
        callback: impl FnMut(&MessageEvent, &NativeHandle, Value) -> anyhow::Result<Value> + 'static,
    ) -> Self {
        self.ctx.update(ConfigPatch::invoke(InvokeBinding {
            channel: channel.into(),
            callback: Box::new(callback),
        }));
        self
    }
}
