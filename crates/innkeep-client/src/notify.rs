//! Notification channel: short-lived messages for the operator.
//!
//! At most one notice is current. A new notice replaces the old one, and a
//! notice only clears itself if it is still current when its timer fires.

use std::{sync::Arc, time::Duration};

use innkeep_core::Category;
use serde::Serialize;
use strum::Display;
use tokio::sync::watch;
use uuid::Uuid;

use crate::Error;

pub const DEFAULT_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Level {
  Success,
  Error,
  Warning,
  Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
  pub id:       Uuid,
  pub message:  String,
  pub level:    Level,
  pub duration: Duration,
}

/// Publishes notices to any number of observers.
///
/// Cheap to clone; clones share the same channel.
#[derive(Debug, Clone)]
pub struct Notifier {
  tx:       Arc<watch::Sender<Option<Notice>>>,
  duration: Duration,
}

impl Default for Notifier {
  fn default() -> Self { Self::new(DEFAULT_DURATION) }
}

impl Notifier {
  pub fn new(duration: Duration) -> Self {
    let (tx, _) = watch::channel(None);
    Self { tx: Arc::new(tx), duration }
  }

  pub fn subscribe(&self) -> watch::Receiver<Option<Notice>> { self.tx.subscribe() }

  pub fn current(&self) -> Option<Notice> { self.tx.borrow().clone() }

  pub fn show(&self, message: impl Into<String>, level: Level) -> Uuid {
    self.show_for(message, level, self.duration)
  }

  /// Publish a notice that expires after `duration`.
  ///
  /// Expiry needs a tokio runtime; without one the notice stays until it is
  /// replaced or dismissed.
  pub fn show_for(&self, message: impl Into<String>, level: Level, duration: Duration) -> Uuid {
    let notice = Notice { id: Uuid::new_v4(), message: message.into(), level, duration };
    let id = notice.id;
    self.tx.send_replace(Some(notice));

    if let Ok(handle) = tokio::runtime::Handle::try_current() {
      let tx = Arc::downgrade(&self.tx);
      handle.spawn(async move {
        tokio::time::sleep(duration).await;
        if let Some(tx) = tx.upgrade() {
          clear_if_current(&tx, id);
        }
      });
    }
    id
  }

  pub fn success(&self, message: impl Into<String>) -> Uuid { self.show(message, Level::Success) }

  pub fn error(&self, message: impl Into<String>) -> Uuid { self.show(message, Level::Error) }

  pub fn warning(&self, message: impl Into<String>) -> Uuid { self.show(message, Level::Warning) }

  pub fn info(&self, message: impl Into<String>) -> Uuid { self.show(message, Level::Info) }

  /// Surface an error. Input problems are warnings; everything else is an
  /// error.
  pub fn report(&self, err: &Error) -> Uuid {
    let level = match err.category() {
      Category::Validation => Level::Warning,
      _ => Level::Error,
    };
    self.show(err.to_string(), level)
  }

  /// Clear the notice with `id` if it is still showing.
  pub fn dismiss(&self, id: Uuid) { clear_if_current(&self.tx, id); }
}

fn clear_if_current(tx: &watch::Sender<Option<Notice>>, id: Uuid) {
  tx.send_if_modified(|current| {
    if current.as_ref().is_some_and(|n| n.id == id) {
      *current = None;
      true
    } else {
      false
    }
  });
}
