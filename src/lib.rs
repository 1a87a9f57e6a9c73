//! Window-lifecycle orchestration: declarative window definitions, an
//! instance registry, and scoped channel messaging over a pluggable native
//! shell.
//!
//! An application describes each window as a type implementing
//! [`WindowDefinition`]. Inside `define`, toolkit builders
//! ([`WindowBuilder`], [`WindowEvents`], [`IpcChannel`]) declare the
//! window's appearance, content, lifecycle hooks, and message channels
//! against a [`BuildContext`]. The [`WindowController`] consumes that
//! configuration to create the native window, scope its message bindings to
//! its own sender id, register it, and tear everything down when the window
//! closes.
//!
//! The native side lives behind the [`shell`] traits; the crate ships an
//! in-memory [`shell::HeadlessShell`] for tests and display-less use.
//!
//! ```rust,ignore
//! struct Prefs;
//!
//! impl WindowDefinition for Prefs {
//!     fn define(ctx: &BuildContext) -> Self {
//!         WindowBuilder::singleton(ctx)
//!             .setup(WindowOptions::new().set("width", 600))
//!             .file("prefs.html");
//!         WindowEvents::new(ctx).once("ready-to-show", |_ev, win| win.focus());
//!         Prefs
//!     }
//! }
//!
//! let controller = WindowController::new(shell);
//! let prefs = controller.open::<Prefs>(OpenOptions::new())?;
//! controller.send(&prefs, "theme:update", serde_json::json!("dark"))?;
//! ```

pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod logging;
pub mod registry;
pub mod router;
pub mod shell;
pub mod toolkit;

pub use config::{ConfigRecord, LoadContent, MessageEvent, WindowEvent, WindowOptions};
pub use context::BuildContext;
pub use controller::{OpenOptions, WindowController, WindowDefinition, WindowHandle};
pub use error::{Result, ResultExt, WindowKitError};
pub use registry::{InstanceId, WindowMeta, WindowRef, WindowRegistry};
pub use router::Router;
pub use shell::{
    CreateParams, ListenerToken, MessageTransport, NativeHandle, NativeWindow, WindowShell,
};
pub use toolkit::{IpcChannel, WindowBuilder, WindowEvents};
