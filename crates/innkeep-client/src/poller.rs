//! Background refresh of "today's tickets" for the Today view.
//!
//! The poller is owned by whoever spawned it: dropping the [`PollHandle`]
//! cancels the task, so leaving the view never leaks a timer. It reads the
//! identity from a session [`Subscription`] on every load and stops by itself
//! once the session publishes a logout.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, FixedOffset};
use innkeep_core::{
  clock::Clock,
  gateway::Gateway,
  ticket::{self, Ticket},
};
use tokio::{
  sync::{Notify, watch},
  task::JoinHandle,
  time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::session::Subscription;

/// How often the view is refreshed unless configured otherwise.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// What the Today view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct TodaySnapshot {
  pub tickets:      Vec<Ticket>,
  /// Whether completion is still open at `refreshed_at`.
  pub can_complete: bool,
  pub refreshed_at: DateTime<FixedOffset>,
}

pub struct TodayPoller;

impl TodayPoller {
  /// Load immediately, then every `every`, until the handle is dropped or
  /// the session logs out.
  ///
  /// Failed loads are logged and leave the last snapshot in place.
  pub fn spawn<G>(
    gateway: Arc<G>,
    session: Subscription,
    clock: Arc<dyn Clock>,
    every: Duration,
  ) -> PollHandle
  where
    G: Gateway + 'static,
  {
    let cancel = CancellationToken::new();
    let refresh = Arc::new(Notify::new());
    let (tx, rx) = watch::channel(None);
    let task =
      tokio::spawn(run(gateway, session, clock, every, tx, refresh.clone(), cancel.clone()));
    PollHandle { cancel, refresh, rx, task }
  }
}

/// Owns a running poller. Dropping it stops the task.
pub struct PollHandle {
  cancel:  CancellationToken,
  refresh: Arc<Notify>,
  rx:      watch::Receiver<Option<TodaySnapshot>>,
  task:    JoinHandle<()>,
}

impl PollHandle {
  pub fn subscribe(&self) -> watch::Receiver<Option<TodaySnapshot>> { self.rx.clone() }

  /// The latest snapshot, `None` until the first load succeeds.
  pub fn latest(&self) -> Option<TodaySnapshot> { self.rx.borrow().clone() }

  /// Reload now instead of waiting for the next tick.
  pub fn refresh(&self) { self.refresh.notify_one(); }

  pub fn cancel(&self) { self.cancel.cancel(); }

  pub fn is_finished(&self) -> bool { self.task.is_finished() }
}

impl Drop for PollHandle {
  fn drop(&mut self) { self.cancel.cancel(); }
}

async fn run<G: Gateway>(
  gateway: Arc<G>,
  mut session: Subscription,
  clock: Arc<dyn Clock>,
  every: Duration,
  tx: watch::Sender<Option<TodaySnapshot>>,
  refresh: Arc<Notify>,
  cancel: CancellationToken,
) {
  info!(interval_secs = every.as_secs(), "today poller started");
  let mut ticker = tokio::time::interval(every);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

  loop {
    tokio::select! {
      _ = cancel.cancelled() => break,
      _ = ticker.tick() => {}
      _ = refresh.notified() => ticker.reset(),
      changed = session.changed() => match changed {
        Some(Some(_)) => ticker.reset(),
        Some(None) | None => break,
      },
    }

    let Some(actor) = session.current() else {
      break;
    };

    let loaded = tokio::select! {
      _ = cancel.cancelled() => break,
      loaded = gateway.tickets_assigned_to(&actor.username) => loaded,
    };
    match loaded {
      Ok(mine) => {
        let now = clock.now();
        let tickets: Vec<_> = ticket::due_today(&mine, &actor, &now).into_iter().cloned().collect();
        debug!(count = tickets.len(), "today's tickets refreshed");
        tx.send_replace(Some(TodaySnapshot {
          tickets,
          can_complete: ticket::can_complete_at(&now),
          refreshed_at: now,
        }));
      }
      Err(e) => warn!(username = %actor.username, error = %e, "today's tickets refresh failed"),
    }
  }
  info!("today poller stopped");
}
