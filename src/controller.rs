//! The window controller: orchestrates construction, configuration capture,
//! message scoping, and lifecycle teardown.
//!
//! `open` is the single entry point for creating a window:
//!
//! 1. singleton short-circuit (focus the live window, purge stale entries)
//! 2. run the window definition against the build context, pop its
//!    configuration
//! 3. resolve the requested parent (soft-miss: warn and open undocked)
//! 4. create the native window with merged options
//!    (defaults < captured < call-site parent/modal)
//! 5. load the captured content
//! 6. bind native lifecycle events
//! 7. bind transport messages, gated on this window's sender id, recording
//!    an unbind action per listener
//! 8. register metadata; record singletons
//! 9. wire a one-shot `closed` teardown: unbind, deregister, drop the
//!    singleton entry
//!
//! The `closed` teardown is the only path that removes registry and
//! transport state; `close` merely asks the native window to close and lets
//! the notification drive cleanup.

use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::{LoadContent, MessageEvent, WindowEvent, WindowOptions};
use crate::context::BuildContext;
use crate::error::{Result, ResultExt, WindowKitError};
use crate::registry::{InstanceId, WindowMeta, WindowRef, WindowRegistry};
use crate::router::Router;
use crate::shell::{
    CreateParams, EventHandler, ListenerToken, MessageTransport, NativeHandle,
    TransportInvokeHandler, TransportMessageHandler, WindowShell,
};

/// An application-authored window definition.
///
/// `define` declares one window's appearance, content, and handlers by
/// driving the toolkit builders against the passed-in context, then returns
/// the application's own state object for that window.
pub trait WindowDefinition: 'static {
    fn define(ctx: &BuildContext) -> Self;
}

/// Strong, cloneable handle to an opened window's application object.
///
/// Dereferences to the definition type; convertible to a [`WindowRef`] for
/// `send`/`close`/parent targeting.
pub struct WindowHandle<W> {
    id: InstanceId,
    instance: Rc<W>,
}

impl<W> WindowHandle<W> {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn instance(&self) -> &Rc<W> {
        &self.instance
    }

    pub fn window_ref(&self) -> WindowRef {
        WindowRef::Instance(self.id)
    }
}

impl<W> Clone for WindowHandle<W> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            instance: Rc::clone(&self.instance),
        }
    }
}

// Manual impl: the instance type is application state with no Debug bound.
impl<W> fmt::Debug for WindowHandle<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowHandle")
            .field("id", &self.id)
            .field("class", &std::any::type_name::<W>())
            .finish()
    }
}

impl<W> Deref for WindowHandle<W> {
    type Target = W;

    fn deref(&self) -> &W {
        &self.instance
    }
}

impl<W> From<&WindowHandle<W>> for WindowRef {
    fn from(handle: &WindowHandle<W>) -> Self {
        handle.window_ref()
    }
}

/// Call-site options for `open`: an optional parent reference and the modal
/// flag, both applied with the highest merge precedence.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub parent: Option<WindowRef>,
    pub modal: bool,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parent(mut self, target: impl Into<WindowRef>) -> Self {
        self.parent = Some(target.into());
        self
    }

    pub fn modal(mut self, modal: bool) -> Self {
        self.modal = modal;
        self
    }
}

/// Live singleton entry. Holds a strong reference: a singleton stays alive
/// until its window closes even if the application drops every handle.
struct SingletonEntry {
    id: InstanceId,
    instance: Rc<dyn Any>,
}

type Unbind = Box<dyn FnOnce()>;

/// Orchestrates window lifecycles over a native shell.
pub struct WindowController {
    shell: Rc<dyn WindowShell>,
    transport: Rc<dyn MessageTransport>,
    registry: Rc<WindowRegistry>,
    ctx: BuildContext,
    singletons: Rc<RefCell<HashMap<TypeId, SingletonEntry>>>,
    defaults: WindowOptions,
    next_instance: Cell<u64>,
}

impl WindowController {
    pub fn new(shell: Rc<dyn WindowShell>) -> Self {
        Self::with_defaults(shell, WindowOptions::default())
    }

    /// Controller-wide default window options, merged beneath every
    /// window's captured options.
    pub fn with_defaults(shell: Rc<dyn WindowShell>, defaults: WindowOptions) -> Self {
        let transport = shell.transport();
        Self {
            shell,
            transport,
            registry: Rc::new(WindowRegistry::new()),
            ctx: BuildContext::new(),
            singletons: Rc::new(RefCell::new(HashMap::new())),
            defaults,
            next_instance: Cell::new(1),
        }
    }

    /// The registry backing this controller, shared with routers.
    pub fn registry(&self) -> Rc<WindowRegistry> {
        Rc::clone(&self.registry)
    }

    /// A router over this controller's registry.
    pub fn router(&self) -> Router {
        Router::new(Rc::clone(&self.registry))
    }

    /// Open a window of class `W`, or focus and return the live instance if
    /// `W` is a singleton that is already open.
    ///
    /// # Errors
    ///
    /// [`WindowKitError::MissingBuilderConfig`] if the definition never
    /// constructed a `WindowBuilder`; [`WindowKitError::AmbiguousWindowReference`]
    /// if `options.parent` is a class reference with more than one live
    /// instance; [`WindowKitError::WindowCreate`] if the shell fails.
    pub fn open<W: WindowDefinition>(&self, options: OpenOptions) -> Result<WindowHandle<W>> {
        let class_name = std::any::type_name::<W>();

        // 1. Singleton short-circuit
        if let Some(handle) = self.live_singleton::<W>() {
            debug!(class_name, instance = %handle.id, "singleton already open; focusing");
            return Ok(handle);
        }

        // 2. Instantiate the definition and consume its configuration
        let instance = Rc::new(W::define(&self.ctx));
        let config = self
            .ctx
            .end()
            .ok_or(WindowKitError::MissingBuilderConfig { class_name })?;
        let record = config.record();
        let is_singleton = config.is_singleton;

        // 3. Resolve the parent; a missing parent is soft, ambiguity is not
        let parent = match &options.parent {
            Some(target) => {
                let resolved = self.resolve_native(target)?;
                if resolved.is_none() {
                    warn!(
                        class_name,
                        parent = ?target,
                        "parent window not found or closed; opening undocked"
                    );
                }
                resolved
            }
            None => None,
        };

        // 4. Materialize with merged options
        let merged = self.defaults.clone().merged(&config.options);
        let native = self
            .shell
            .create_window(CreateParams {
                options: merged,
                parent,
                modal: options.modal,
            })
            .map_err(|e| WindowKitError::WindowCreate(e.to_string()))?;
        let native_id = native.id();

        // 5. Load content
        match &config.content {
            Some(LoadContent::File { path }) => {
                native.load_file(path).warn_on_err();
            }
            Some(LoadContent::Url { url }) => {
                native.load_url(url).warn_on_err();
            }
            None => {}
        }

        // 6. Native lifecycle events
        for binding in config.native_events {
            let weak = Rc::downgrade(&native);
            let mut callback = binding.callback;
            let handler: EventHandler = Rc::new(RefCell::new(move |event: &WindowEvent| {
                if let Some(window) = weak.upgrade() {
                    callback(event, &window);
                }
            }));
            if binding.once {
                native.once(&binding.event, handler);
            } else {
                native.on(&binding.event, handler);
            }
        }

        // 7. Transport bindings, scoped to this window's sender id
        let mut unbinds: Vec<Unbind> = Vec::new();

        for binding in config.messages {
            let channel = binding.channel;
            let weak = Rc::downgrade(&native);
            let mut callback = binding.callback;
            let handler: TransportMessageHandler =
                Rc::new(RefCell::new(move |event: &MessageEvent, payload: Value| {
                    if event.sender_id != native_id {
                        return;
                    }
                    let Some(window) = weak.upgrade() else { return };
                    if let Err(err) = callback(event, &window, payload) {
                        error!(
                            channel = %event.channel,
                            window_id = native_id,
                            error = %err,
                            "message handler failed; error contained"
                        );
                    }
                }));
            let token = self.transport.on_message(&channel, handler);
            let transport = Rc::clone(&self.transport);
            unbinds.push(Box::new(move || {
                transport.remove_message_listener(&channel, token)
            }));
        }

        for binding in config.invokes {
            let channel = binding.channel;
            let weak = Rc::downgrade(&native);
            let mut callback = binding.callback;
            let handler: TransportInvokeHandler = Rc::new(RefCell::new(
                move |event: &MessageEvent, payload: Value| -> anyhow::Result<Value> {
                    if event.sender_id != native_id {
                        anyhow::bail!(
                            "channel '{}' is bound to window {}, not to sender {}",
                            event.channel,
                            native_id,
                            event.sender_id
                        );
                    }
                    let Some(window) = weak.upgrade() else {
                        anyhow::bail!("window {} is gone", native_id);
                    };
                    callback(event, &window, payload).map_err(|err| {
                        error!(
                            channel = %event.channel,
                            window_id = native_id,
                            error = %err,
                            "invoke handler failed; propagating to caller"
                        );
                        err
                    })
                },
            ));
            self.transport.on_invoke(&channel, handler);
            let transport = Rc::clone(&self.transport);
            unbinds.push(Box::new(move || transport.remove_invoke_handler(&channel)));
        }

        // 8. Register
        let instance_id = InstanceId(self.next_instance.get());
        self.next_instance.set(instance_id.0 + 1);

        let any_instance: Rc<dyn Any> = Rc::clone(&instance) as Rc<dyn Any>;
        self.registry.register(
            instance_id,
            WindowMeta {
                native: Rc::clone(&native),
                native_id,
                record,
                instance: Rc::downgrade(&any_instance),
                class_id: TypeId::of::<W>(),
                class_name,
                opened_at: Utc::now(),
            },
        );
        if is_singleton {
            self.singletons.borrow_mut().insert(
                TypeId::of::<W>(),
                SingletonEntry {
                    id: instance_id,
                    instance: any_instance,
                },
            );
        }

        // 9. One-shot teardown on close; the sole cleanup path
        let unbinds = RefCell::new(unbinds);
        let registry = Rc::clone(&self.registry);
        let singletons = Rc::clone(&self.singletons);
        let class_id = TypeId::of::<W>();
        native.once(
            "closed",
            Rc::new(RefCell::new(move |_event: &WindowEvent| {
                for unbind in unbinds.borrow_mut().drain(..) {
                    unbind();
                }
                registry.remove(instance_id);
                if is_singleton {
                    let mut map = singletons.borrow_mut();
                    if map.get(&class_id).is_some_and(|entry| entry.id == instance_id) {
                        map.remove(&class_id);
                    }
                }
                debug!(instance = %instance_id, "window teardown complete");
            })),
        );

        info!(
            event_type = "window_open",
            class_name,
            instance = %instance_id,
            native_id,
            singleton = is_singleton,
            "window opened"
        );
        Ok(WindowHandle {
            id: instance_id,
            instance,
        })
    }

    /// Send `data` on `channel` to the resolved target window. Sending to a
    /// closed or unknown window is a logged no-op, not an error.
    ///
    /// # Errors
    ///
    /// Only [`WindowKitError::AmbiguousWindowReference`] for a class target
    /// with more than one live instance.
    pub fn send(&self, target: impl Into<WindowRef>, channel: &str, data: Value) -> Result<()> {
        let target = target.into();
        match self.resolve_native(&target)? {
            Some(native) if !native.is_destroyed() => {
                native.send(channel, data);
                Ok(())
            }
            _ => {
                warn!(channel, target = ?target, "send target unavailable; message dropped");
                Ok(())
            }
        }
    }

    /// Ask the resolved target's native window to close. Cleanup runs from
    /// the resulting `closed` notification.
    pub fn close(&self, target: impl Into<WindowRef>) -> Result<()> {
        let target = target.into();
        match self.resolve_native(&target)? {
            Some(native) => {
                native.close();
                Ok(())
            }
            None => {
                warn!(target = ?target, "close target unavailable; nothing to do");
                Ok(())
            }
        }
    }

    /// Register an unscoped, process-wide message listener. Unlike the
    /// per-window bindings this fires for every sender on the channel.
    /// Returns the token needed to unbind via [`remove_global_ipc`](Self::remove_global_ipc).
    pub fn global_ipc(
        &self,
        channel: &str,
        handler: impl FnMut(&MessageEvent, Value) + 'static,
    ) -> ListenerToken {
        self.transport
            .on_message(channel, Rc::new(RefCell::new(handler)))
    }

    pub fn remove_global_ipc(&self, channel: &str, token: ListenerToken) {
        self.transport.remove_message_listener(channel, token);
    }

    /// Live singleton lookup. Purges a stale entry (window already
    /// destroyed) so the caller falls through to a fresh open.
    fn live_singleton<W: WindowDefinition>(&self) -> Option<WindowHandle<W>> {
        let type_id = TypeId::of::<W>();
        let (id, any_instance) = {
            let map = self.singletons.borrow();
            let entry = map.get(&type_id)?;
            (entry.id, Rc::clone(&entry.instance))
        };

        if let Some(meta) = self.registry.get(id) {
            if !meta.native.is_destroyed() {
                if let Ok(instance) = any_instance.downcast::<W>() {
                    meta.native.focus();
                    return Some(WindowHandle { id, instance });
                }
            }
        }

        warn!(
            class_name = std::any::type_name::<W>(),
            instance = %id,
            "stale singleton entry purged"
        );
        self.singletons.borrow_mut().remove(&type_id);
        None
    }

    /// Shared reference resolution (one policy, used for parents and
    /// message targets). Registry-backed; singleton classes resolve the
    /// same way since they have at most one live instance.
    fn resolve_native(&self, target: &WindowRef) -> Result<Option<NativeHandle>> {
        Ok(self.registry.resolve(target)?.map(|meta| meta.native))
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
