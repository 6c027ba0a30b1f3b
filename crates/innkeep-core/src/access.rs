//! Access policy: may the current identity open a navigation target?
//!
//! The decision is a pure function of the identity (if any) and the target's
//! required-role set. It runs before a view fetches anything, so a denied
//! view never issues a request.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::identity::{Identity, Role};

// ─── Decision ────────────────────────────────────────────────────────────────

/// Outcome of evaluating a navigation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
  Allow,
  /// Nobody is logged in. `return_to` is the path originally requested, so
  /// the login view can resume there afterwards.
  RedirectToLogin { return_to: String },
  /// Logged in, but the role is not in the target's required set.
  RedirectToDashboard,
}

impl Decision {
  pub fn is_allowed(&self) -> bool { matches!(self, Self::Allow) }
}

/// Decide whether `identity` may open a target requiring `required`.
///
/// An empty `required` set means "any authenticated role".
pub fn evaluate(identity: Option<&Identity>, required: &[Role], requested: &str) -> Decision {
  let Some(identity) = identity else {
    return Decision::RedirectToLogin { return_to: requested.to_owned() };
  };
  if !required.is_empty() && !required.contains(&identity.role) {
    return Decision::RedirectToDashboard;
  }
  Decision::Allow
}

// ─── Targets ─────────────────────────────────────────────────────────────────

/// Every navigable view of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Target {
  Login,
  Dashboard,
  Maintenance,
  Calendar,
  Equipment,
  Reports,
  Settings,
  Schedules,
  TicketReport,
  Tickets,
  TicketsToday,
}

impl Target {
  pub fn path(self) -> &'static str {
    match self {
      Self::Login => "/login",
      Self::Dashboard => "/dashboard",
      Self::Maintenance => "/mantenimiento",
      Self::Calendar => "/calendario",
      Self::Equipment => "/equipos",
      Self::Reports => "/reportes",
      Self::Settings => "/configuracion",
      Self::Schedules => "/horarios",
      Self::TicketReport => "/reporte-tickets",
      Self::Tickets => "/tickets",
      Self::TicketsToday => "/para-hoy",
    }
  }

  /// Resolve a path to a target. Unknown paths (and the empty root) fall
  /// back to the login view.
  pub fn from_path(path: &str) -> Self {
    let trimmed = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = trimmed.trim_end_matches('/');
    match trimmed {
      "/dashboard" => Self::Dashboard,
      "/mantenimiento" => Self::Maintenance,
      "/calendario" => Self::Calendar,
      "/equipos" => Self::Equipment,
      "/reportes" => Self::Reports,
      "/configuracion" => Self::Settings,
      "/horarios" => Self::Schedules,
      "/reporte-tickets" => Self::TicketReport,
      "/tickets" => Self::Tickets,
      "/para-hoy" => Self::TicketsToday,
      _ => Self::Login,
    }
  }

  /// Whether the target is behind the policy at all.
  pub fn is_guarded(self) -> bool { self != Self::Login }

  /// Roles allowed to open the target; empty means any authenticated role.
  pub fn required_roles(self) -> &'static [Role] {
    match self {
      Self::Login | Self::Dashboard | Self::Maintenance | Self::Calendar => &[],
      Self::Equipment
      | Self::Reports
      | Self::Settings
      | Self::Schedules
      | Self::TicketReport => &[Role::Admin],
      Self::Tickets => &[Role::Housekeeping, Role::Admin],
      Self::TicketsToday => &[Role::Maintenance, Role::Admin],
    }
  }
}

/// Evaluate the policy for a known target. The login view is never guarded.
pub fn guard(identity: Option<&Identity>, target: Target) -> Decision {
  if !target.is_guarded() {
    return Decision::Allow;
  }
  evaluate(identity, target.required_roles(), target.path())
}

/// Where to land after a successful login, honouring a preserved target.
pub fn landing_after_login(identity: &Identity, return_to: Option<&str>) -> Target {
  let wanted = return_to.map(Target::from_path).unwrap_or(Target::Dashboard);
  match guard(Some(identity), wanted) {
    Decision::Allow if wanted.is_guarded() => wanted,
    _ => Target::Dashboard,
  }
}
