//! Native shell boundary.
//!
//! The orchestration core never talks to a GUI runtime directly; it goes
//! through these traits. A shell supplies two collaborators:
//!
//! - [`NativeWindow`]: one on-screen window resource (create happens via the
//!   shell, everything after through the handle)
//! - [`MessageTransport`]: process-wide channel messaging, where every
//!   inbound message carries the numeric id of the window that sent it
//!
//! [`headless`] provides a complete in-memory shell for tests and embedders
//! that want to exercise window lifecycles without a display server.

pub mod headless;

pub use headless::{HeadlessShell, HeadlessTransport, HeadlessWindow};

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use serde_json::Value;

use crate::config::{MessageEvent, WindowEvent, WindowOptions};

/// Shared reference to a live native window resource.
pub type NativeHandle = Rc<dyn NativeWindow>;

/// Opaque id for a registered listener, used to unbind it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(pub u64);

/// Handler for native lifecycle events on one window.
pub type EventHandler = Rc<RefCell<dyn FnMut(&WindowEvent)>>;

/// Handler for fire-and-forget transport messages.
pub type TransportMessageHandler = Rc<RefCell<dyn FnMut(&MessageEvent, Value)>>;

/// Handler for request/response transport messages. The returned value (or
/// error) travels back to the remote caller.
pub type TransportInvokeHandler =
    Rc<RefCell<dyn FnMut(&MessageEvent, Value) -> anyhow::Result<Value>>>;

/// Everything the shell needs to materialize one window.
pub struct CreateParams {
    pub options: WindowOptions,
    pub parent: Option<NativeHandle>,
    pub modal: bool,
}

/// One native window resource.
///
/// Mirrors the minimum surface the controller depends on: identity, content
/// loading, focus/close lifecycle, event listeners, and outbound sends.
pub trait NativeWindow {
    /// Stable numeric id of this window, also the sender identity on the
    /// transport. Valid for reverse lookup only while the window is open.
    fn id(&self) -> u64;

    fn load_file(&self, path: &Path) -> anyhow::Result<()>;
    fn load_url(&self, url: &str) -> anyhow::Result<()>;

    fn focus(&self);
    fn close(&self);
    fn is_destroyed(&self) -> bool;

    /// Attach a persistent listener for a named lifecycle event.
    fn on(&self, event: &str, handler: EventHandler) -> ListenerToken;
    /// Attach a one-shot listener, removed before its first invocation runs.
    fn once(&self, event: &str, handler: EventHandler) -> ListenerToken;
    fn remove_listener(&self, event: &str, token: ListenerToken);

    /// Send a message to this window's content on `channel`.
    fn send(&self, channel: &str, data: Value);
}

/// Process-wide messaging transport. Listeners are global per channel; the
/// controller layers per-window scoping on top by checking sender identity.
pub trait MessageTransport {
    fn on_message(&self, channel: &str, handler: TransportMessageHandler) -> ListenerToken;
    fn remove_message_listener(&self, channel: &str, token: ListenerToken);

    /// Register the request/response handler for a channel. One handler per
    /// channel; re-registering replaces the previous one (logged, not fatal).
    fn on_invoke(&self, channel: &str, handler: TransportInvokeHandler);
    fn remove_invoke_handler(&self, channel: &str);
}

/// The native window factory plus its associated transport.
pub trait WindowShell {
    fn create_window(&self, params: CreateParams) -> anyhow::Result<NativeHandle>;
    fn transport(&self) -> Rc<dyn MessageTransport>;
}
