//! Configuration toolkit: the fluent builders driven inside window
//! definitions.
//!
//! Each builder borrows the [`BuildContext`](crate::context::BuildContext)
//! the controller passed into the definition and pushes or patches the
//! top-of-stack configuration:
//!
//! - [`WindowBuilder`]: begins the cycle; appearance and content
//!   (`setup`, `file`, `url`)
//! - [`WindowEvents`]: native lifecycle listeners (`on`, `once`)
//! - [`IpcChannel`]: inbound process messaging (`on` fire-and-forget,
//!   `handle` request/response)
//!
//! A definition must construct a `WindowBuilder`; the other two are
//! optional. All methods chain.

mod ipc_channel;
mod window_builder;
mod window_events;

pub use ipc_channel::IpcChannel;
pub use window_builder::WindowBuilder;
pub use window_events::WindowEvents;
