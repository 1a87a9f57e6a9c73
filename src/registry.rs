//! The window registry: identity-keyed metadata for every live window.
//!
//! Three indexes, one per lookup the rest of the crate needs:
//!
//! - `windows`: [`InstanceId`] -> [`WindowMeta`], the primary association
//!   between an application window object and its native resource
//! - `by_native_id`: reverse numeric-id index. Inbound transport messages
//!   are labeled only with the sending window's native id, so routing a
//!   message back to "its" window needs this map.
//! - `order`: insertion order, so `all_active` and broadcast iterate
//!   deterministically
//!
//! The registry never owns the application's window object: metadata holds
//! a `Weak` reference, and entries are removed exactly once, synchronously,
//! from the close teardown — the only removal path.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::ConfigRecord;
use crate::error::{Result, WindowKitError};
use crate::shell::NativeHandle;

/// Identity key minted per opened window. Distinct instances of the same
/// class get distinct ids; an id is never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A reference to a window at a call site that accepts either shape:
/// a concrete opened instance, or a window-definition class resolved
/// through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRef {
    /// A window-definition class. Resolvable when the class has exactly one
    /// live instance; ambiguous when it has more.
    Class {
        type_id: TypeId,
        name: &'static str,
    },
    /// A specific opened instance.
    Instance(InstanceId),
}

impl WindowRef {
    pub fn class<W: 'static>() -> Self {
        Self::Class {
            type_id: TypeId::of::<W>(),
            name: std::any::type_name::<W>(),
        }
    }
}

/// Per-window metadata owned by the registry.
#[derive(Clone)]
pub struct WindowMeta {
    /// The native window resource.
    pub native: NativeHandle,
    /// Stable numeric id of the native resource; sender identity on the
    /// transport.
    pub native_id: u64,
    /// Audit snapshot of the configuration this window was built from.
    pub record: ConfigRecord,
    /// The application's window object. Weak: the registry must not extend
    /// its lifetime beyond the application's own references.
    pub instance: Weak<dyn Any>,
    pub class_id: TypeId,
    pub class_name: &'static str,
    pub opened_at: DateTime<Utc>,
}

// Manual impl: `native` and `instance` are trait objects with no Debug bound.
impl fmt::Debug for WindowMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowMeta")
            .field("native_id", &self.native_id)
            .field("class_name", &self.class_name)
            .field("is_singleton", &self.record.is_singleton)
            .field("opened_at", &self.opened_at)
            .finish()
    }
}

#[derive(Default)]
struct Inner {
    windows: HashMap<InstanceId, WindowMeta>,
    by_native_id: HashMap<u64, InstanceId>,
    order: Vec<InstanceId>,
}

/// Identity-keyed store for all currently open windows.
#[derive(Default)]
pub struct WindowRegistry {
    inner: RefCell<Inner>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a window's metadata. Re-registering an existing id overwrites
    /// the previous entry; log-worthy but not fatal (hot-reconfiguration).
    pub fn register(&self, id: InstanceId, meta: WindowMeta) {
        let mut inner = self.inner.borrow_mut();
        let inner = &mut *inner;
        if let Some(previous) = inner.windows.get(&id) {
            warn!(
                instance = %id,
                class_name = previous.class_name,
                "instance already registered; overwriting"
            );
            let stale_native_id = previous.native_id;
            inner.by_native_id.remove(&stale_native_id);
        } else {
            inner.order.push(id);
        }
        debug!(
            instance = %id,
            native_id = meta.native_id,
            class_name = meta.class_name,
            "window registered"
        );
        inner.by_native_id.insert(meta.native_id, id);
        inner.windows.insert(id, meta);
    }

    /// Remove a window from the registry. Idempotent: removing twice, or
    /// removing an id that was never registered, is a no-op.
    pub fn remove(&self, id: InstanceId) {
        let mut inner = self.inner.borrow_mut();
        if let Some(meta) = inner.windows.remove(&id) {
            let native_id = meta.native_id;
            inner.by_native_id.remove(&native_id);
            inner.order.retain(|entry| *entry != id);
            debug!(instance = %id, native_id, "window removed from registry");
        }
    }

    pub fn get(&self, id: InstanceId) -> Option<WindowMeta> {
        self.inner.borrow().windows.get(&id).cloned()
    }

    /// Reverse lookup: which instance owns the native window with this id.
    /// Only valid while that window is open.
    pub fn find_by_native_id(&self, native_id: u64) -> Option<InstanceId> {
        self.inner.borrow().by_native_id.get(&native_id).copied()
    }

    /// The application object behind a native id, if it is still alive.
    pub fn instance_by_native_id(&self, native_id: u64) -> Option<Rc<dyn Any>> {
        let inner = self.inner.borrow();
        let id = inner.by_native_id.get(&native_id)?;
        inner.windows.get(id)?.instance.upgrade()
    }

    /// Snapshot of all registered windows in registration order.
    pub fn all_active(&self) -> Vec<(InstanceId, WindowMeta)> {
        let inner = self.inner.borrow();
        inner
            .order
            .iter()
            .filter_map(|id| inner.windows.get(id).map(|meta| (*id, meta.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().windows.is_empty()
    }

    /// Shared reference resolution for parents and message targets.
    ///
    /// Instance references look up directly; destroyed windows resolve to
    /// `None`. Class references resolve to the single live instance of that
    /// class, to `None` when there is none, and error with
    /// [`WindowKitError::AmbiguousWindowReference`] when two or more are
    /// active — callers must then pass a specific instance.
    pub fn resolve(&self, target: &WindowRef) -> Result<Option<WindowMeta>> {
        match target {
            WindowRef::Instance(id) => Ok(self
                .get(*id)
                .filter(|meta| !meta.native.is_destroyed())),
            WindowRef::Class { type_id, name } => {
                let mut matches: Vec<WindowMeta> = self
                    .all_active()
                    .into_iter()
                    .map(|(_, meta)| meta)
                    .filter(|meta| meta.class_id == *type_id && !meta.native.is_destroyed())
                    .collect();
                match matches.len() {
                    0 => Ok(None),
                    1 => Ok(matches.pop()),
                    active_count => Err(WindowKitError::AmbiguousWindowReference {
                        class_name: name,
                        active_count,
                    }),
                }
            }
        }
    }
}
