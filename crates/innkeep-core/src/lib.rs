//! Domain model and rules for the hotel maintenance client.
//!
//! This crate holds the entities, the access policy and the lifecycle rules
//! for work orders, tickets and availability schedules. It performs no I/O:
//! the [`gateway::Gateway`] trait describes the backend, and every rule is a
//! pure function over data the caller has already fetched.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod catalog;
pub mod clock;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod maintenance;
pub mod report;
pub mod schedule;
pub mod ticket;
mod wire;

pub use error::{Category, Error, Result, ValidationError};
pub use identity::{EditorGrant, Identity, Role};
