//! Application-level orchestration.
//!
//! `sync` holds the status-sync controller that talks to the backend and emits
//! view events; `controller` runs the command loop that the interactive UI
//! drives. CLI and UI layers call into this module rather than the HTTP client.

#[cfg(feature = "tui")]
mod controller;
mod sync;

#[cfg(feature = "tui")]
pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use sync::Controller;
