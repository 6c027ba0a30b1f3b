//! Housekeeping trouble tickets.
//!
//! ```text
//!   Pending ──start──▶ InProgress ──complete──▶ Completed
//!      │                   │
//!      └─────cancel────────┴──▶ Cancelled
//! ```
//!
//! Tickets never reopen. Completion is refused from [`CUTOFF_HOUR`] local
//! time onwards.

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::{
  Error, Result,
  error::ValidationError,
  identity::{Identity, Role},
};

/// Local hour from which tickets can no longer be completed.
pub const CUTOFF_HOUR: u32 = 20;

/// Ordered from least to most urgent.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
)]
pub enum Priority {
  #[serde(rename = "Baja")]
  #[strum(serialize = "Baja")]
  Low,
  #[default]
  #[serde(rename = "Media")]
  #[strum(serialize = "Media")]
  Medium,
  #[serde(rename = "Alta")]
  #[strum(serialize = "Alta")]
  High,
  #[serde(rename = "Urgente")]
  #[strum(serialize = "Urgente")]
  Urgent,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum TicketStatus {
  #[default]
  #[serde(rename = "Pendiente")]
  #[strum(serialize = "Pendiente")]
  Pending,
  #[serde(rename = "En Proceso", alias = "En proceso")]
  #[strum(serialize = "En Proceso")]
  InProgress,
  #[serde(rename = "Completado")]
  #[strum(serialize = "Completado")]
  Completed,
  #[serde(rename = "Cancelado")]
  #[strum(serialize = "Cancelado")]
  Cancelled,
}

impl TicketStatus {
  pub fn is_finished(self) -> bool { matches!(self, Self::Completed | Self::Cancelled) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
  #[serde(rename = "id_ticket")]
  pub id:                i64,
  pub area:              String,
  #[serde(rename = "piso")]
  pub floor:             String,
  #[serde(rename = "habitacion", default)]
  pub room:              Option<String>,
  #[serde(rename = "descripcion_problema")]
  pub description:       String,
  #[serde(rename = "prioridad", default)]
  pub priority:          Priority,
  #[serde(rename = "creado_por")]
  pub created_by:        String,
  #[serde(rename = "asignado_a", default)]
  pub assignee:          Option<String>,
  #[serde(rename = "estado", default)]
  pub status:            TicketStatus,
  #[serde(rename = "fecha_creacion", with = "crate::wire::timestamp")]
  pub created_at:        DateTime<Utc>,
  #[serde(rename = "fecha_limite", default, with = "crate::wire::opt_timestamp")]
  pub due_at:            Option<DateTime<Utc>>,
  #[serde(rename = "observaciones_mantenimiento", default)]
  pub maintenance_notes: Option<String>,
  #[serde(rename = "fecha_completado", default, with = "crate::wire::opt_timestamp")]
  pub completed_at:      Option<DateTime<Utc>>,
}

impl Ticket {
  pub fn is_assigned_to(&self, actor: &Identity) -> bool {
    self.assignee.as_deref().is_some_and(|a| actor.answers_to(a))
  }
}

// ─── Creation ────────────────────────────────────────────────────────────────

/// What a housekeeper fills in to report a problem.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketDraft {
  pub area:        String,
  pub floor:       String,
  pub room:        Option<String>,
  pub description: String,
  pub priority:    Priority,
  pub assignee:    Option<String>,
  pub due_at:      Option<DateTime<Utc>>,
}

impl TicketDraft {
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.area.trim().is_empty() {
      return Err(ValidationError::required("area"));
    }
    if self.floor.trim().is_empty() {
      return Err(ValidationError::required("piso"));
    }
    if self.description.trim().is_empty() {
      return Err(ValidationError::required("descripcion_problema"));
    }
    Ok(())
  }
}

/// The creation payload; creator and initial status are fixed here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTicket {
  pub area:        String,
  #[serde(rename = "piso")]
  pub floor:       String,
  #[serde(rename = "habitacion", skip_serializing_if = "Option::is_none")]
  pub room:        Option<String>,
  #[serde(rename = "descripcion_problema")]
  pub description: String,
  #[serde(rename = "prioridad")]
  pub priority:    Priority,
  #[serde(rename = "creado_por")]
  pub created_by:  String,
  #[serde(rename = "asignado_a", skip_serializing_if = "Option::is_none")]
  pub assignee:    Option<String>,
  #[serde(rename = "estado")]
  pub status:      TicketStatus,
  #[serde(rename = "fecha_creacion", with = "crate::wire::timestamp")]
  pub created_at:  DateTime<Utc>,
  #[serde(rename = "fecha_limite", with = "crate::wire::opt_timestamp")]
  pub due_at:      Option<DateTime<Utc>>,
}

/// Turn a draft into a creation payload on behalf of `actor`.
pub fn open(draft: &TicketDraft, actor: &Identity, now: DateTime<Utc>) -> Result<NewTicket> {
  if !actor.has_role(Role::Housekeeping) {
    return Err(Error::forbidden("only housekeeping staff may open tickets"));
  }
  draft.validate()?;
  let trimmed = |s: &str| s.trim().to_owned();
  Ok(NewTicket {
    area:        trimmed(&draft.area),
    floor:       trimmed(&draft.floor),
    room:        draft.room.as_deref().map(trimmed).filter(|r| !r.is_empty()),
    description: trimmed(&draft.description),
    priority:    draft.priority,
    created_by:  actor.username.clone(),
    assignee:    draft.assignee.as_deref().map(trimmed).filter(|a| !a.is_empty()),
    status:      TicketStatus::Pending,
    created_at:  now,
    due_at:      draft.due_at.or(Some(now)),
  })
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// A partial update; only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TicketPatch {
  #[serde(rename = "estado", skip_serializing_if = "Option::is_none")]
  pub status:            Option<TicketStatus>,
  #[serde(rename = "observaciones_mantenimiento", skip_serializing_if = "Option::is_none")]
  pub maintenance_notes: Option<String>,
  #[serde(
    rename = "fecha_completado",
    skip_serializing_if = "Option::is_none",
    with = "crate::wire::opt_timestamp"
  )]
  pub completed_at:      Option<DateTime<Utc>>,
}

impl TicketPatch {
  /// The ticket as it will look once the patch is applied.
  pub fn apply(&self, ticket: &Ticket) -> Ticket {
    let mut next = ticket.clone();
    if let Some(status) = self.status {
      next.status = status;
    }
    if let Some(notes) = &self.maintenance_notes {
      next.maintenance_notes = Some(notes.clone());
    }
    if self.completed_at.is_some() {
      next.completed_at = self.completed_at;
    }
    next
  }
}

const ENTITY: &str = "ticket";

fn invalid(action: &'static str, from: TicketStatus) -> Error {
  Error::InvalidTransition { entity: ENTITY, action, from: from.to_string() }
}

fn require_assignee(ticket: &Ticket, actor: &Identity, action: &str) -> Result<()> {
  if ticket.is_assigned_to(actor) {
    Ok(())
  } else {
    Err(Error::forbidden(format!(
      "only the assignee may {action} ticket {}",
      ticket.id
    )))
  }
}

/// Whether completion is still allowed at local time `now`.
pub fn can_complete_at(now: &DateTime<FixedOffset>) -> bool { now.hour() < CUTOFF_HOUR }

/// Pending → InProgress, by the assignee.
pub fn start(ticket: &Ticket, actor: &Identity) -> Result<TicketPatch> {
  require_assignee(ticket, actor, "start")?;
  if ticket.status != TicketStatus::Pending {
    return Err(invalid("start", ticket.status));
  }
  Ok(TicketPatch { status: Some(TicketStatus::InProgress), ..Default::default() })
}

/// InProgress → Completed, by the assignee, before the cutoff hour.
pub fn complete(ticket: &Ticket, actor: &Identity, now: &DateTime<FixedOffset>) -> Result<TicketPatch> {
  if !can_complete_at(now) {
    return Err(Error::TooLate { cutoff_hour: CUTOFF_HOUR });
  }
  require_assignee(ticket, actor, "complete")?;
  if ticket.status != TicketStatus::InProgress {
    return Err(invalid("complete", ticket.status));
  }
  Ok(TicketPatch {
    status: Some(TicketStatus::Completed),
    completed_at: Some(now.with_timezone(&Utc)),
    ..Default::default()
  })
}

/// Pending | InProgress → Cancelled, by the creator or an admin.
pub fn cancel(ticket: &Ticket, actor: &Identity) -> Result<TicketPatch> {
  if !(actor.is_admin() || ticket.created_by == actor.username) {
    return Err(Error::forbidden(format!(
      "only the creator or an admin may cancel ticket {}",
      ticket.id
    )));
  }
  if ticket.status.is_finished() {
    return Err(invalid("cancel", ticket.status));
  }
  Ok(TicketPatch { status: Some(TicketStatus::Cancelled), ..Default::default() })
}

/// Replace the maintenance notes without touching status.
pub fn save_notes(ticket: &Ticket, actor: &Identity, notes: &str) -> Result<TicketPatch> {
  if !(actor.is_admin() || ticket.is_assigned_to(actor)) {
    return Err(Error::forbidden(format!(
      "only the assignee or an admin may annotate ticket {}",
      ticket.id
    )));
  }
  Ok(TicketPatch { maintenance_notes: Some(notes.trim().to_owned()), ..Default::default() })
}

// ─── Derived views ───────────────────────────────────────────────────────────

/// Unfinished tickets assigned to `actor` that were opened on the local
/// calendar day of `now`.
pub fn due_today<'a>(
  tickets: &'a [Ticket],
  actor: &Identity,
  now: &DateTime<FixedOffset>,
) -> Vec<&'a Ticket> {
  let today = now.date_naive();
  let offset = now.offset();
  tickets
    .iter()
    .filter(|t| t.created_at.with_timezone(offset).date_naive() == today)
    .filter(|t| !t.status.is_finished())
    .filter(|t| t.is_assigned_to(actor))
    .collect()
}

/// Tickets the given user opened.
pub fn created_by<'a>(tickets: &'a [Ticket], username: &str) -> Vec<&'a Ticket> {
  tickets.iter().filter(|t| t.created_by == username).collect()
}

/// Pending and in-progress tickets, most urgent first, then oldest first.
pub fn incomplete(tickets: &[Ticket]) -> Vec<&Ticket> {
  let mut open: Vec<_> = tickets.iter().filter(|t| !t.status.is_finished()).collect();
  open.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.created_at.cmp(&b.created_at)));
  open
}
