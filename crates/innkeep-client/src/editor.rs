//! Editor mode: a backend-issued capability that lets an admin edit
//! completed or cancelled work orders.
//!
//! The grant is persisted next to the session so it survives restarts, and
//! is read back from storage on every check so a logout elsewhere takes
//! effect immediately.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use innkeep_core::{EditorGrant, Error as CoreError, Identity, gateway::Gateway};
use tracing::{info, warn};

use crate::{
  Result,
  session::{EDITOR_GRANT_KEY, SessionStorage, load_json, save_json},
};

pub struct EditorMode<G> {
  gateway: Arc<G>,
  storage: Arc<dyn SessionStorage>,
}

impl<G: Gateway> EditorMode<G> {
  pub fn new(gateway: Arc<G>, storage: Arc<dyn SessionStorage>) -> Self {
    Self { gateway, storage }
  }

  /// Ask the backend for a grant on behalf of `identity` and store it.
  pub async fn activate(&self, identity: &Identity) -> Result<EditorGrant> {
    if !identity.is_admin() {
      return Err(CoreError::Forbidden("editor mode is restricted to admins".into()).into());
    }
    let grant = self.gateway.issue_editor_grant(&identity.username).await?;
    if grant.username != identity.username {
      return Err(
        CoreError::Auth(format!(
          "editor grant was issued for {}, not {}",
          grant.username, identity.username
        ))
        .into(),
      );
    }
    save_json(self.storage.as_ref(), EDITOR_GRANT_KEY, &grant)?;
    info!(username = %identity.username, expires_at = ?grant.expires_at, "editor mode on");
    Ok(grant)
  }

  pub fn deactivate(&self) -> Result<()> {
    self.storage.remove(EDITOR_GRANT_KEY)?;
    info!("editor mode off");
    Ok(())
  }

  /// The stored grant, if it is usable by `identity` at `now`.
  pub fn active_for(&self, identity: &Identity, now: DateTime<Utc>) -> Result<Option<EditorGrant>> {
    let grant = match load_json::<EditorGrant>(self.storage.as_ref(), EDITOR_GRANT_KEY) {
      Ok(grant) => grant,
      Err(e @ crate::Error::Json { .. }) => {
        warn!(error = %e, "discarding unreadable editor grant");
        self.storage.remove(EDITOR_GRANT_KEY)?;
        None
      }
      Err(e) => return Err(e),
    };
    Ok(grant.filter(|g| g.is_valid_for(identity, now)))
  }
}
