//! Workflows: the lifecycle rules from `innkeep-core` applied through a
//! [`Gateway`].
//!
//! Each workflow reads the acting identity from the session at call time,
//! runs the pure rule, and only then talks to the backend. A rule rejection
//! never produces a request.

pub mod catalog;
pub mod maintenance;
pub mod schedule;
pub mod ticket;

use std::sync::Arc;

use innkeep_core::{EditorGrant, Error as CoreError, Identity, clock::Clock, gateway::Gateway};

use crate::{Result, editor::EditorMode, session::SessionStore};

pub use self::{
  catalog::CatalogWorkflow, maintenance::MaintenanceWorkflow, schedule::ScheduleWorkflow,
  ticket::TicketWorkflow,
};

/// Everything a workflow needs: who is acting, what they hold, and the time.
pub struct Context<G> {
  session: Arc<SessionStore<G>>,
  editor:  Arc<EditorMode<G>>,
  clock:   Arc<dyn Clock>,
}

// Derived `Clone` would require `G: Clone`.
impl<G> Clone for Context<G> {
  fn clone(&self) -> Self {
    Self {
      session: self.session.clone(),
      editor:  self.editor.clone(),
      clock:   self.clock.clone(),
    }
  }
}

impl<G: Gateway> Context<G> {
  pub fn new(
    session: Arc<SessionStore<G>>,
    editor: Arc<EditorMode<G>>,
    clock: Arc<dyn Clock>,
  ) -> Self {
    Self { session, editor, clock }
  }

  pub fn session(&self) -> &SessionStore<G> { &self.session }

  pub fn editor(&self) -> &EditorMode<G> { &self.editor }

  pub fn clock(&self) -> &dyn Clock { self.clock.as_ref() }

  pub fn gateway(&self) -> &G { self.session.gateway() }

  /// The identity acting right now.
  pub fn actor(&self) -> Result<Identity> {
    self.session.current().ok_or_else(|| CoreError::Unauthenticated.into())
  }

  /// The actor's editor grant, if one is active.
  pub fn grant_for(&self, actor: &Identity) -> Result<Option<EditorGrant>> {
    self.editor.active_for(actor, self.clock.now_utc())
  }
}

pub(crate) fn require_admin(actor: &Identity, action: &str) -> Result<()> {
  if actor.is_admin() {
    Ok(())
  } else {
    Err(CoreError::Forbidden(format!("only an admin may {action}")).into())
  }
}

#[cfg(test)]
pub(crate) mod testing {
  use chrono::{FixedOffset, TimeZone};
  use innkeep_core::{Role, clock::FixedClock};

  use super::*;
  use crate::{fake::FakeGateway, session::MemoryStorage};

  /// A context logged in as `username` with `role`, at 10:00 on
  /// 2025-06-02 in UTC-6.
  pub async fn logged_in(username: &str, role: Role) -> Context<FakeGateway> {
    at_hour(username, role, 10).await
  }

  pub async fn at_hour(username: &str, role: Role, hour: u32) -> Context<FakeGateway> {
    let offset = FixedOffset::west_opt(6 * 3600).unwrap();
    let now = offset.with_ymd_and_hms(2025, 6, 2, hour, 0, 0).unwrap();
    let gateway = Arc::new(FakeGateway::with_user(username, "pw", role));
    let storage = Arc::new(MemoryStorage::default());
    let session = Arc::new(SessionStore::open(gateway.clone(), storage.clone()).unwrap());
    session.login(username, "pw").await.unwrap();
    let editor = Arc::new(EditorMode::new(gateway, storage));
    Context::new(session, editor, Arc::new(FixedClock(now)))
  }

  #[tokio::test]
  async fn actor_requires_a_session() {
    let cx = logged_in("root", Role::Admin).await;
    assert_eq!(cx.actor().unwrap().username, "root");
    cx.session().logout().unwrap();
    let err = cx.actor().unwrap_err();
    assert!(matches!(err.core(), Some(CoreError::Unauthenticated)));
  }
}
