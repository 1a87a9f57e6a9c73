use crate::config::{NativeEventBinding, WindowEvent};
use crate::context::{BuildContext, ConfigPatch};
use crate::shell::NativeHandle;

/// Native lifecycle event binder.
///
/// Unlike [`IpcChannel`](super::IpcChannel) these events do not come from
/// the window's content; they come from the shell itself ('resize',
/// 'focus', 'closed', ...). The callback receives the triggering event and
/// the native handle, allowing direct manipulation of the window.
///
/// ```rust,ignore
/// WindowEvents::new(ctx)
///     .once("ready-to-show", |_event, win| win.focus())
///     .on("resize", |event, _win| tracing::debug!(?event.args, "resized"));
/// ```
pub struct WindowEvents<'a> {
    ctx: &'a BuildContext,
}

impl<'a> WindowEvents<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        Self { ctx }
    }

    /// Register a persistent listener, run every time the event fires.
    pub fn on(
        self,
        event: impl Into<String>,
        callback: impl FnMut(&WindowEvent, &NativeHandle) + 'static,
    ) -> Self {
        self.ctx.update(ConfigPatch::native_event(NativeEventBinding {
            event: event.into(),
            callback: Box::new(callback),
            once: false,
        }));
        self
    }

    /// Register a one-shot listener, removed after its first run. Useful
    /// for initialization events like 'ready-to-show'.
    pub fn once(
        self,
        event: impl Into<String>,
        callback: impl FnMut(&WindowEvent, &NativeHandle) + 'static,
    ) -> Self {
        self.ctx.update(ConfigPatch::native_event(NativeEventBinding {
            event: event.into(),
            callback: Box::new(callback),
            once: true,
        }));
        self
    }
}
