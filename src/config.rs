//! Configuration data model for window construction.
//!
//! A `WindowConfig` is accumulated on the build-context stack while a window
//! definition runs its builders, then consumed exactly once by the
//! controller's `open`. After the callbacks are drained into live listeners,
//! a `ConfigRecord` snapshot stays behind in the registry for audit.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shell::NativeHandle;

/// Native-window construction properties as an open key/value map.
///
/// Merging is key-wise and additive: later writes override earlier ones per
/// key, untouched keys survive. Payload values are plain JSON so the shell
/// decides which keys it understands (size, flags, preload reference, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowOptions {
    entries: Map<String, Value>,
}

impl WindowOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent setter, for literal option blocks in window definitions.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Merge `later` into `self`, key-wise, later keys winning.
    pub fn merge(&mut self, later: &WindowOptions) {
        for (key, value) in &later.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Consuming variant of [`merge`](Self::merge) for chained precedence
    /// stacks (defaults < captured < call-site).
    pub fn merged(mut self, later: &WindowOptions) -> Self {
        self.merge(later);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

impl From<Map<String, Value>> for WindowOptions {
    fn from(entries: Map<String, Value>) -> Self {
        Self { entries }
    }
}

impl From<Value> for WindowOptions {
    /// Convenience for `serde_json::json!({...})` literals. Non-object
    /// values yield an empty option set.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(entries) => Self { entries },
            _ => Self::default(),
        }
    }
}

/// What a window loads once its native resource exists. Last write wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadContent {
    File { path: PathBuf },
    Url { url: String },
}

/// A native lifecycle event as delivered to bound callbacks: the event name
/// plus whatever arguments the shell supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowEvent {
    pub name: String,
    pub args: Vec<Value>,
}

impl WindowEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Envelope for an inbound process message: which native window sent it, on
/// which channel. Sender identity drives per-window scoping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub sender_id: u64,
    pub channel: String,
}

/// Callback for a native lifecycle event. Receives the triggering event and
/// the native handle of the window it was bound against.
pub type NativeEventCallback = Box<dyn FnMut(&WindowEvent, &NativeHandle)>;

/// Callback for a fire-and-forget inbound message. An `Err` is contained at
/// the dispatch boundary: logged and swallowed, the sender sees nothing.
pub type MessageCallback =
    Box<dyn FnMut(&MessageEvent, &NativeHandle, Value) -> anyhow::Result<()>>;

/// Callback for a request/response inbound message. An `Err` is logged and
/// re-raised to the transport so the remote caller's request fails visibly.
pub type InvokeCallback =
    Box<dyn FnMut(&MessageEvent, &NativeHandle, Value) -> anyhow::Result<Value>>;

pub struct NativeEventBinding {
    pub event: String,
    pub callback: NativeEventCallback,
    pub once: bool,
}

pub struct MessageBinding {
    pub channel: String,
    pub callback: MessageCallback,
}

pub struct InvokeBinding {
    pub channel: String,
    pub callback: InvokeCallback,
}

/// One in-progress window configuration, mutable until consumed by `open`.
pub struct WindowConfig {
    pub options: WindowOptions,
    pub content: Option<LoadContent>,
    /// Fixed at creation; `update` never touches it.
    pub is_singleton: bool,
    pub native_events: Vec<NativeEventBinding>,
    pub messages: Vec<MessageBinding>,
    pub invokes: Vec<InvokeBinding>,
}

impl WindowConfig {
    pub fn new(is_singleton: bool) -> Self {
        Self {
            options: WindowOptions::default(),
            content: None,
            is_singleton,
            native_events: Vec::new(),
            messages: Vec::new(),
            invokes: Vec::new(),
        }
    }

    /// Audit snapshot of this configuration, safe to retain after the
    /// callbacks have been drained into live listeners.
    pub fn record(&self) -> ConfigRecord {
        ConfigRecord {
            options: self.options.clone(),
            content: self.content.clone(),
            is_singleton: self.is_singleton,
            native_events: self
                .native_events
                .iter()
                .map(|b| RecordedEvent {
                    event: b.event.clone(),
                    once: b.once,
                })
                .collect(),
            message_channels: self.messages.iter().map(|b| b.channel.clone()).collect(),
            invoke_channels: self.invokes.iter().map(|b| b.channel.clone()).collect(),
        }
    }
}

/// A bound native event as it appears in the audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedEvent {
    pub event: String,
    pub once: bool,
}

/// The consumed configuration, minus its callbacks. Retained in registry
/// metadata for replay/audit; never fed back into window construction.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigRecord {
    pub options: WindowOptions,
    pub content: Option<LoadContent>,
    pub is_singleton: bool,
    pub native_events: Vec<RecordedEvent>,
    pub message_channels: Vec<String>,
    pub invoke_channels: Vec<String>,
}
