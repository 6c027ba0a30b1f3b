//! Identity: who is logged in and in which role.
//!
//! An identity is created by a successful login and stays immutable for the
//! life of the session. Every permission decision in this crate is a function
//! of the identity and the entity being acted upon.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Staff role as issued by the backend.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum Role {
  #[serde(rename = "admin")]
  #[strum(serialize = "admin")]
  Admin,
  #[serde(rename = "mantenimiento")]
  #[strum(serialize = "mantenimiento")]
  Maintenance,
  #[serde(rename = "amadellaves")]
  #[strum(serialize = "amadellaves")]
  Housekeeping,
}

/// The authenticated user, as returned by `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub username:     String,
  #[serde(rename = "nombre")]
  pub display_name: String,
  #[serde(rename = "rol")]
  pub role:         Role,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub area:         Option<String>,
}

impl Identity {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }

  pub fn has_role(&self, role: Role) -> bool { self.role == role }

  /// Whether a free-text assignee field refers to this identity.
  ///
  /// Work orders store the assignee as entered by the scheduler, which is
  /// either the login name or the display name.
  pub fn answers_to(&self, assignee: &str) -> bool {
    let assignee = assignee.trim();
    !assignee.is_empty() && (assignee == self.username || assignee == self.display_name)
  }
}

// ─── Editor mode ─────────────────────────────────────────────────────────────

/// A backend-issued capability that lets one admin edit locked work orders.
///
/// The grant is bound to the username it was issued for and may carry an
/// expiry; the client only stores and presents it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorGrant {
  pub username:   String,
  pub token:      String,
  pub issued_at:  DateTime<Utc>,
  #[serde(default)]
  pub expires_at: Option<DateTime<Utc>>,
}

impl EditorGrant {
  /// Whether `identity` may exercise this grant at `now`.
  pub fn is_valid_for(&self, identity: &Identity, now: DateTime<Utc>) -> bool {
    identity.is_admin()
      && identity.username == self.username
      && self.expires_at.is_none_or(|exp| now < exp)
  }
}
