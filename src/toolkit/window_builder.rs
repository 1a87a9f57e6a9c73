use std::path::PathBuf;

use crate::config::{LoadContent, WindowOptions};
use crate::context::{BuildContext, ConfigPatch};

/// Visual builder for one window: appearance options and content source.
///
/// Constructing a `WindowBuilder` begins a new configuration cycle on the
/// build context; the controller consumes that configuration right after
/// the window definition returns.
///
/// ```rust,ignore
/// WindowBuilder::singleton(ctx)
///     .setup(WindowOptions::new().set("width", 800).set("frame", false))
///     .file("index.html");
/// ```
pub struct WindowBuilder<'a> {
    ctx: &'a BuildContext,
}

impl<'a> WindowBuilder<'a> {
    /// Begin configuring a multi-instance window.
    pub fn new(ctx: &'a BuildContext) -> Self {
        ctx.begin(false);
        Self { ctx }
    }

    /// Begin configuring a singleton window: the controller will refuse to
    /// create a second live instance of the defining class and focus the
    /// existing window instead.
    pub fn singleton(ctx: &'a BuildContext) -> Self {
        ctx.begin(true);
        Self { ctx }
    }

    /// Set native construction options, merged key-wise with anything set
    /// earlier in this cycle (later keys win) and with the controller-wide
    /// defaults at open time.
    pub fn setup(self, options: impl Into<WindowOptions>) -> Self {
        self.ctx.update(ConfigPatch::options(options.into()));
        self
    }

    /// Load a local file into the window. Replaces any earlier content
    /// choice; last write wins.
    pub fn file(self, path: impl Into<PathBuf>) -> Self {
        self.ctx
            .update(ConfigPatch::content(LoadContent::File { path: path.into() }));
        self
    }

    /// Load a URL into the window. Replaces any earlier content choice;
    /// last write wins.
    pub fn url(self, url: impl Into<String>) -> Self {
        self.ctx
            .update(ConfigPatch::content(LoadContent::Url { url: url.into() }));
        self
    }
}
