//! Error types for `innkeep-core`.

use thiserror::Error;

/// A local, pre-submission rejection tied to one input field.
///
/// Raised before any request is sent; the caller keeps its form state and
/// may resubmit after correcting `field`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
  pub field:   &'static str,
  pub message: String,
}

impl ValidationError {
  pub fn new(field: &'static str, message: impl Into<String>) -> Self {
    Self { field, message: message.into() }
  }

  /// Shorthand for the common "must not be empty" rejection.
  pub fn required(field: &'static str) -> Self {
    Self::new(field, "is required")
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationError),

  #[error("no active session")]
  Unauthenticated,

  #[error("not permitted: {0}")]
  Forbidden(String),

  #[error("cannot {action} a {entity} in state {from}")]
  InvalidTransition {
    entity: &'static str,
    action: &'static str,
    from:   String,
  },

  #[error("too late: tickets cannot be completed at or after {cutoff_hour}:00")]
  TooLate { cutoff_hour: u32 },

  #[error("authentication failed: {0}")]
  Auth(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("transport error: {0}")]
  Transport(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Coarse classification used when deciding how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
  /// Field-level input problem; no request was made.
  Validation,
  /// Login or session verification was rejected.
  Auth,
  /// A lifecycle or permission rule refused the action locally.
  Rule,
  /// The entity is missing or a referential constraint blocked the change.
  NotFoundOrConflict,
  /// The backend was unreachable or answered with an unexpected status.
  Transport,
}

impl Error {
  pub fn category(&self) -> Category {
    match self {
      Self::Validation(_) => Category::Validation,
      Self::Unauthenticated | Self::Auth(_) => Category::Auth,
      Self::Forbidden(_) | Self::InvalidTransition { .. } | Self::TooLate { .. } => {
        Category::Rule
      }
      Self::NotFound(_) | Self::Conflict(_) => Category::NotFoundOrConflict,
      Self::Transport(_) | Self::Serialization(_) => Category::Transport,
    }
  }

  pub(crate) fn forbidden(msg: impl Into<String>) -> Self {
    Self::Forbidden(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
