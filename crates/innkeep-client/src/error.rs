//! Error type for `innkeep-client`.

use innkeep_core::Category;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] innkeep_core::Error),

  #[error("client storage error for {key}: {source}")]
  Storage {
    key:    String,
    #[source]
    source: std::io::Error,
  },

  #[error("corrupt client state for {key}: {source}")]
  Json {
    key:    String,
    #[source]
    source: serde_json::Error,
  },
}

impl Error {
  /// The domain error underneath, if any.
  pub fn core(&self) -> Option<&innkeep_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }

  pub fn category(&self) -> Category {
    match self {
      Self::Core(e) => e.category(),
      Self::Storage { .. } | Self::Json { .. } => Category::Transport,
    }
  }
}

impl From<innkeep_core::ValidationError> for Error {
  fn from(e: innkeep_core::ValidationError) -> Self { Self::Core(e.into()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
