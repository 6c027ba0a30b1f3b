//! Wall-clock access, swappable so time-gated rules can be tested.

use chrono::{DateTime, FixedOffset, Local, Utc};

/// Source of the current local time.
pub trait Clock: Send + Sync {
  /// Now, in the local time zone of the operator.
  fn now(&self) -> DateTime<FixedOffset>;

  fn now_utc(&self) -> DateTime<Utc> { self.now().with_timezone(&Utc) }
}

/// The host's clock and time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<FixedOffset> { Local::now().fixed_offset() }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
  fn now(&self) -> DateTime<FixedOffset> { self.0 }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
  fn now(&self) -> DateTime<FixedOffset> { (**self).now() }
}
