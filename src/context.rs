//! The build context: a LIFO stack of in-progress window configurations.
//!
//! Builder calls happen inside a window definition, before the controller
//! knows which object they configure. The context bridges that gap: the
//! controller owns one `BuildContext`, passes it by reference into
//! [`WindowDefinition::define`](crate::controller::WindowDefinition), the
//! builders push and patch the top of the stack, and `open` pops the
//! finished record immediately after the definition returns.
//!
//! The stack discipline keeps strictly nested construction correct: if one
//! definition synchronously opens another window, the inner configuration is
//! pushed, completed, and popped before the outer definition's builder calls
//! resume. Interleaved (non-nested) construction is not supported.

use std::cell::RefCell;

use tracing::{debug, warn};

use crate::config::{
    InvokeBinding, LoadContent, MessageBinding, NativeEventBinding, WindowConfig, WindowOptions,
};

/// A partial update to the top-of-stack configuration, produced by one
/// fluent builder call. Options merge key-wise, binding lists append,
/// content replaces.
#[derive(Default)]
pub struct ConfigPatch {
    pub options: Option<WindowOptions>,
    pub content: Option<LoadContent>,
    pub native_events: Vec<NativeEventBinding>,
    pub messages: Vec<MessageBinding>,
    pub invokes: Vec<InvokeBinding>,
}

impl ConfigPatch {
    pub fn options(options: WindowOptions) -> Self {
        Self {
            options: Some(options),
            ..Self::default()
        }
    }

    pub fn content(content: LoadContent) -> Self {
        Self {
            content: Some(content),
            ..Self::default()
        }
    }

    pub fn native_event(binding: NativeEventBinding) -> Self {
        Self {
            native_events: vec![binding],
            ..Self::default()
        }
    }

    pub fn message(binding: MessageBinding) -> Self {
        Self {
            messages: vec![binding],
            ..Self::default()
        }
    }

    pub fn invoke(binding: InvokeBinding) -> Self {
        Self {
            invokes: vec![binding],
            ..Self::default()
        }
    }
}

/// LIFO stack of in-progress window configurations.
///
/// Exactly one configuration is open per in-progress window construction;
/// builders only ever touch the top record.
#[derive(Default)]
pub struct BuildContext {
    stack: RefCell<Vec<WindowConfig>>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a fresh configuration. The singleton flag is fixed here and
    /// never changed by later updates.
    pub fn begin(&self, singleton: bool) {
        debug!(singleton, depth = self.depth(), "begin window configuration");
        self.stack.borrow_mut().push(WindowConfig::new(singleton));
    }

    /// Merge a patch into the top configuration.
    ///
    /// Calling a configuration method without first starting a cycle must
    /// not crash the process, so an empty stack implicitly begins a
    /// default (non-singleton) configuration.
    pub fn update(&self, patch: ConfigPatch) {
        let mut stack = self.stack.borrow_mut();
        if stack.is_empty() {
            warn!("configuration update without an open cycle; beginning a default one");
            stack.push(WindowConfig::new(false));
        }
        // Non-empty by construction
        let current = stack.last_mut().expect("stack is non-empty");

        if let Some(options) = patch.options {
            current.options.merge(&options);
        }
        if let Some(content) = patch.content {
            current.content = Some(content);
        }
        current.native_events.extend(patch.native_events);
        current.messages.extend(patch.messages);
        current.invokes.extend(patch.invokes);
    }

    /// Pop and return the top configuration; `None` means nothing was
    /// produced since the last `end`.
    pub fn end(&self) -> Option<WindowConfig> {
        self.stack.borrow_mut().pop()
    }

    /// Number of configurations currently open. Diagnostics only.
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn begin_update_end_single_cycle() {
        let ctx = BuildContext::new();
        ctx.begin(true);
        ctx.update(ConfigPatch::options(
            WindowOptions::new().set("width", 800).set("height", 600),
        ));
        ctx.update(ConfigPatch::options(WindowOptions::new().set("width", 1024)));
        ctx.update(ConfigPatch::content(LoadContent::Url {
            url: "http://localhost:3000".into(),
        }));

        let config = ctx.end().expect("one open configuration");
        assert!(config.is_singleton);
        assert_eq!(config.options.get("width"), Some(&json!(1024)));
        assert_eq!(config.options.get("height"), Some(&json!(600)));
        assert!(matches!(config.content, Some(LoadContent::Url { .. })));
        assert_eq!(ctx.depth(), 0);
        assert!(ctx.end().is_none());
    }

    #[test]
    fn update_without_begin_implicitly_opens_default_cycle() {
        let ctx = BuildContext::new();
        ctx.update(ConfigPatch::options(WindowOptions::new().set("frame", false)));

        let config = ctx.end().expect("implicit configuration");
        assert!(!config.is_singleton);
        assert_eq!(config.options.get("frame"), Some(&json!(false)));
    }

    #[test]
    fn bindings_append_in_call_order() {
        let ctx = BuildContext::new();
        ctx.begin(false);
        for name in ["ready", "resize", "blur"] {
            ctx.update(ConfigPatch::native_event(NativeEventBinding {
                event: name.into(),
                callback: Box::new(|_, _| {}),
                once: name == "ready",
            }));
        }
        ctx.update(ConfigPatch::message(MessageBinding {
            channel: "save".into(),
            callback: Box::new(|_, _, _| Ok(())),
        }));
        ctx.update(ConfigPatch::invoke(InvokeBinding {
            channel: "query".into(),
            callback: Box::new(|_, _, payload| Ok(payload)),
        }));

        let config = ctx.end().unwrap();
        let events: Vec<_> = config.native_events.iter().map(|b| b.event.as_str()).collect();
        assert_eq!(events, ["ready", "resize", "blur"]);
        assert!(config.native_events[0].once);
        assert!(!config.native_events[1].once);
        assert_eq!(config.messages.len(), 1);
        assert_eq!(config.invokes.len(), 1);
    }

    #[test]
    fn nested_cycles_stay_separated_lifo() {
        let ctx = BuildContext::new();

        // Outer definition starts configuring
        ctx.begin(false);
        ctx.update(ConfigPatch::options(WindowOptions::new().set("title", "outer")));

        // A nested construction runs to completion before the outer resumes
        ctx.begin(true);
        ctx.update(ConfigPatch::options(WindowOptions::new().set("title", "inner")));
        let inner = ctx.end().unwrap();
        assert!(inner.is_singleton);
        assert_eq!(inner.options.get("title"), Some(&json!("inner")));

        // Outer builder calls continue against the outer record
        ctx.update(ConfigPatch::options(WindowOptions::new().set("width", 320)));
        let outer = ctx.end().unwrap();
        assert!(!outer.is_singleton);
        assert_eq!(outer.options.get("title"), Some(&json!("outer")));
        assert_eq!(outer.options.get("width"), Some(&json!(320)));
    }
}
