use thiserror::Error;
use tracing::{error, warn};

/// Domain-specific errors for window orchestration.
///
/// Both `MissingBuilderConfig` and `AmbiguousWindowReference` are programmer
/// errors surfaced synchronously to the caller of `open`/`send`/`close`.
/// Soft conditions (missing parent, unavailable send target) are logged and
/// degrade gracefully instead of producing one of these.
#[derive(Error, Debug)]
pub enum WindowKitError {
    /// A window definition finished constructing without ever driving a
    /// `WindowBuilder`, so there was no configuration to consume.
    #[error("window class '{class_name}' did not construct a WindowBuilder in its definition")]
    MissingBuilderConfig { class_name: &'static str },

    /// A class reference was used where a unique live window was required,
    /// but more than one instance of that class is currently open.
    #[error(
        "ambiguous reference: class '{class_name}' has {active_count} active instances; \
         pass a specific WindowHandle instead"
    )]
    AmbiguousWindowReference {
        class_name: &'static str,
        active_count: usize,
    },

    /// The native shell failed to create a window.
    #[error("native window creation failed: {0}")]
    WindowCreate(String),
}

pub type Result<T> = std::result::Result<T, WindowKitError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the caller doesn't need the error.
pub trait ResultExt<T> {
    /// Log the error with caller location and return `None`. Use for
    /// recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as a warning with caller location and return `None`. Use for
    /// expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
