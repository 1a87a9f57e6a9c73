//! In-memory shell implementation.
//!
//! Backs the test suite and lets embedders exercise full window lifecycles
//! (create, load, focus, message, close) without a display server. Windows
//! record what happened to them — focus counts, loaded content, outbound
//! sends — so tests can assert on orchestration behavior instead of pixels.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use anyhow::bail;
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    CreateParams, EventHandler, ListenerToken, MessageTransport, NativeHandle, NativeWindow,
    TransportInvokeHandler, TransportMessageHandler, WindowShell,
};
use crate::config::{LoadContent, MessageEvent, WindowEvent, WindowOptions};

struct Listener {
    token: ListenerToken,
    handler: EventHandler,
    once: bool,
}

/// An in-memory native window.
pub struct HeadlessWindow {
    id: u64,
    options: WindowOptions,
    parent_id: Option<u64>,
    modal: bool,
    destroyed: Cell<bool>,
    focus_count: Cell<u32>,
    next_token: Cell<u64>,
    listeners: RefCell<HashMap<String, Vec<Listener>>>,
    loaded: RefCell<Option<LoadContent>>,
    sent: RefCell<Vec<(String, Value)>>,
}

impl HeadlessWindow {
    fn new(id: u64, options: WindowOptions, parent_id: Option<u64>, modal: bool) -> Self {
        Self {
            id,
            options,
            parent_id,
            modal,
            destroyed: Cell::new(false),
            focus_count: Cell::new(0),
            next_token: Cell::new(0),
            listeners: RefCell::new(HashMap::new()),
            loaded: RefCell::new(None),
            sent: RefCell::new(Vec::new()),
        }
    }

    fn attach(&self, event: &str, handler: EventHandler, once: bool) -> ListenerToken {
        let token = ListenerToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.listeners
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push(Listener {
                token,
                handler,
                once,
            });
        token
    }

    /// Fire a lifecycle event on this window, as the real shell would.
    ///
    /// One-shot listeners are removed before their handler runs, so a
    /// handler re-emitting the same event cannot fire itself twice.
    pub fn emit(&self, event: &WindowEvent) {
        if self.destroyed.get() && event.name != "closed" {
            return;
        }

        // Snapshot outside the borrow: handlers may attach/detach listeners.
        let snapshot: Vec<EventHandler> = {
            let mut listeners = self.listeners.borrow_mut();
            match listeners.get_mut(&event.name) {
                Some(list) => {
                    let handlers = list.iter().map(|l| l.handler.clone()).collect();
                    list.retain(|l| !l.once);
                    handlers
                }
                None => Vec::new(),
            }
        };

        for handler in snapshot {
            (handler.borrow_mut())(event);
        }
    }

    /// Content this window was told to load, if any.
    pub fn loaded(&self) -> Option<LoadContent> {
        self.loaded.borrow().clone()
    }

    pub fn parent_id(&self) -> Option<u64> {
        self.parent_id
    }

    pub fn is_modal(&self) -> bool {
        self.modal
    }

    pub fn options(&self) -> &WindowOptions {
        &self.options
    }

    pub fn focus_count(&self) -> u32 {
        self.focus_count.get()
    }

    /// Messages sent to this window's content, in order.
    pub fn sent(&self) -> Vec<(String, Value)> {
        self.sent.borrow().clone()
    }

    /// Number of live listeners for an event name.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .get(event)
            .map_or(0, |list| list.len())
    }
}

impl NativeWindow for HeadlessWindow {
    fn id(&self) -> u64 {
        self.id
    }

    fn load_file(&self, path: &Path) -> anyhow::Result<()> {
        if self.destroyed.get() {
            bail!("window {} is destroyed", self.id);
        }
        *self.loaded.borrow_mut() = Some(LoadContent::File {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    fn load_url(&self, url: &str) -> anyhow::Result<()> {
        if self.destroyed.get() {
            bail!("window {} is destroyed", self.id);
        }
        *self.loaded.borrow_mut() = Some(LoadContent::Url {
            url: url.to_string(),
        });
        Ok(())
    }

    fn focus(&self) {
        if self.destroyed.get() {
            return;
        }
        self.focus_count.set(self.focus_count.get() + 1);
    }

    fn close(&self) {
        if self.destroyed.get() {
            return;
        }
        self.destroyed.set(true);
        debug!(window_id = self.id, "headless window closed");
        self.emit(&WindowEvent::new("closed"));
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    fn on(&self, event: &str, handler: EventHandler) -> ListenerToken {
        self.attach(event, handler, false)
    }

    fn once(&self, event: &str, handler: EventHandler) -> ListenerToken {
        self.attach(event, handler, true)
    }

    fn remove_listener(&self, event: &str, token: ListenerToken) {
        if let Some(list) = self.listeners.borrow_mut().get_mut(event) {
            list.retain(|l| l.token != token);
        }
    }

    fn send(&self, channel: &str, data: Value) {
        if self.destroyed.get() {
            warn!(window_id = self.id, channel, "send to destroyed headless window dropped");
            return;
        }
        self.sent.borrow_mut().push((channel.to_string(), data));
    }
}

/// An in-memory message transport with injection points for tests.
#[derive(Default)]
pub struct HeadlessTransport {
    next_token: Cell<u64>,
    listeners: RefCell<HashMap<String, Vec<(ListenerToken, TransportMessageHandler)>>>,
    invoke_handlers: RefCell<HashMap<String, TransportInvokeHandler>>,
}

impl HeadlessTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a fire-and-forget message as if `sender_id`'s window sent it.
    pub fn emit_from_window(&self, sender_id: u64, channel: &str, payload: Value) {
        let event = MessageEvent {
            sender_id,
            channel: channel.to_string(),
        };
        let snapshot: Vec<TransportMessageHandler> = self
            .listeners
            .borrow()
            .get(channel)
            .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();

        for handler in snapshot {
            (handler.borrow_mut())(&event, payload.clone());
        }
    }

    /// Deliver a request/response message as if `sender_id`'s window sent it,
    /// returning what the remote caller would receive.
    pub fn invoke_from_window(
        &self,
        sender_id: u64,
        channel: &str,
        payload: Value,
    ) -> anyhow::Result<Value> {
        let event = MessageEvent {
            sender_id,
            channel: channel.to_string(),
        };
        let handler = self.invoke_handlers.borrow().get(channel).cloned();
        match handler {
            Some(handler) => (handler.borrow_mut())(&event, payload),
            None => bail!("no invoke handler registered on channel '{channel}'"),
        }
    }

    pub fn message_listener_count(&self, channel: &str) -> usize {
        self.listeners
            .borrow()
            .get(channel)
            .map_or(0, |list| list.len())
    }

    pub fn has_invoke_handler(&self, channel: &str) -> bool {
        self.invoke_handlers.borrow().contains_key(channel)
    }
}

impl MessageTransport for HeadlessTransport {
    fn on_message(&self, channel: &str, handler: TransportMessageHandler) -> ListenerToken {
        let token = ListenerToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.listeners
            .borrow_mut()
            .entry(channel.to_string())
            .or_default()
            .push((token, handler));
        token
    }

    fn remove_message_listener(&self, channel: &str, token: ListenerToken) {
        if let Some(list) = self.listeners.borrow_mut().get_mut(channel) {
            list.retain(|(t, _)| *t != token);
        }
    }

    fn on_invoke(&self, channel: &str, handler: TransportInvokeHandler) {
        let previous = self
            .invoke_handlers
            .borrow_mut()
            .insert(channel.to_string(), handler);
        if previous.is_some() {
            warn!(channel, "invoke handler replaced an existing registration");
        }
    }

    fn remove_invoke_handler(&self, channel: &str) {
        self.invoke_handlers.borrow_mut().remove(channel);
    }
}

/// The in-memory window factory.
pub struct HeadlessShell {
    next_window_id: Cell<u64>,
    windows: RefCell<Vec<Rc<HeadlessWindow>>>,
    transport: Rc<HeadlessTransport>,
}

impl HeadlessShell {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            next_window_id: Cell::new(1),
            windows: RefCell::new(Vec::new()),
            transport: Rc::new(HeadlessTransport::new()),
        })
    }

    /// Concrete transport, for test injection.
    pub fn headless_transport(&self) -> Rc<HeadlessTransport> {
        Rc::clone(&self.transport)
    }

    /// Total windows ever created through this shell.
    pub fn created_count(&self) -> usize {
        self.windows.borrow().len()
    }

    pub fn window_by_id(&self, id: u64) -> Option<Rc<HeadlessWindow>> {
        self.windows.borrow().iter().find(|w| w.id == id).cloned()
    }
}

impl WindowShell for HeadlessShell {
    fn create_window(&self, params: CreateParams) -> anyhow::Result<NativeHandle> {
        let id = self.next_window_id.get();
        self.next_window_id.set(id + 1);

        let window = Rc::new(HeadlessWindow::new(
            id,
            params.options,
            params.parent.map(|p| p.id()),
            params.modal,
        ));
        debug!(window_id = id, parent_id = ?window.parent_id, modal = window.modal, "headless window created");
        self.windows.borrow_mut().push(Rc::clone(&window));
        Ok(window)
    }

    fn transport(&self) -> Rc<dyn MessageTransport> {
        self.transport.clone()
    }
}
