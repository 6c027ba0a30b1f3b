//! Client side of the hotel maintenance system.
//!
//! [`HttpGateway`] talks to the backend; the [`SessionStore`] publishes who
//! is logged in; [`workflow`] applies the lifecycle rules from
//! `innkeep-core` on top of both. [`Notifier`] and [`TodayPoller`] are the
//! pieces a front end drives directly.

pub mod editor;
pub mod error;
pub mod http;
pub mod notify;
pub mod poller;
pub mod session;
pub mod workflow;

#[cfg(test)]
mod fake;

pub use editor::EditorMode;
pub use error::{Error, Result};
pub use http::{HttpConfig, HttpGateway};
pub use notify::{Level, Notice, Notifier};
pub use poller::{PollHandle, TodayPoller, TodaySnapshot};
pub use session::{FileStorage, MemoryStorage, SessionStorage, SessionStore, Subscription};
pub use workflow::Context;
