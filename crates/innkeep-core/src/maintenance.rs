//! Maintenance work orders and their lifecycle.
//!
//! ```text
//!   Scheduled ──start──▶ InProgress ──finish──▶ Completed
//!       │                    │                     │
//!       └──────cancel────────┴───────cancel────────┴──▶ Cancelled
//!
//!   Completed | Cancelled ──reopen (admin + editor grant)──▶ Scheduled
//! ```
//!
//! Every transition is computed here as a pure function returning the
//! updated record plus the equipment status it implies. Applying the result
//! against the backend is the caller's job.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::{
  Error, Result,
  catalog::EquipmentStatus,
  error::ValidationError,
  identity::{EditorGrant, Identity},
};

// ─── Enumerations ────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum MaintenanceKind {
  #[default]
  #[serde(rename = "Preventivo")]
  #[strum(serialize = "Preventivo")]
  Preventive,
  #[serde(rename = "Correctivo")]
  #[strum(serialize = "Correctivo")]
  Corrective,
  #[serde(rename = "Inspección", alias = "Inspeccion")]
  #[strum(serialize = "Inspección")]
  Inspection,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum MaintenanceStatus {
  #[default]
  #[serde(rename = "Programado")]
  #[strum(serialize = "Programado")]
  Scheduled,
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

impl MaintenanceStatus {
  /// Completed and cancelled records only change through a reopen.
  pub fn is_locked(self) -> bool { matches!(self, Self::Completed | Self::Cancelled) }

  /// Scheduled or in progress: still work to do.
  pub fn is_open(self) -> bool { matches!(self, Self::Scheduled | Self::InProgress) }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A work order against one piece of equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
  #[serde(rename = "id_mantenimiento")]
  pub id:            i64,
  #[serde(rename = "id_equipo")]
  pub equipment_id:  i64,
  #[serde(rename = "fecha_programada", with = "crate::wire::date")]
  pub scheduled_for: NaiveDate,
  /// Set exactly when the record has been started.
  #[serde(rename = "fecha_inicio", default, with = "crate::wire::opt_timestamp")]
  pub started_at:    Option<DateTime<Utc>>,
  /// Set exactly when the record has been finished.
  #[serde(rename = "fecha_finalizacion", default, with = "crate::wire::opt_timestamp")]
  pub completed_at:  Option<DateTime<Utc>>,
  #[serde(rename = "tipo_mantenimiento", default)]
  pub kind:          MaintenanceKind,
  #[serde(rename = "descripcion", default)]
  pub description:   Option<String>,
  #[serde(rename = "responsable")]
  pub assignee:      String,
  #[serde(rename = "estado", default)]
  pub status:        MaintenanceStatus,
  #[serde(rename = "observaciones", default)]
  pub notes:         Option<String>,
  #[serde(rename = "costo", default)]
  pub cost:          Option<Decimal>,
  /// Spare parts, when the backend embeds them; otherwise fetched separately.
  #[serde(rename = "refacciones", default, skip_serializing)]
  pub spare_parts:   Vec<SparePart>,

  // Denormalised equipment details, read-only.
  #[serde(rename = "numero_serie", default, skip_serializing)]
  pub serial_number: Option<String>,
  #[serde(rename = "nombre_area", default, skip_serializing)]
  pub area_name:     Option<String>,
  #[serde(rename = "nombre_tipo", default, skip_serializing)]
  pub type_name:     Option<String>,
}

impl MaintenanceRecord {
  /// Hours between start and completion, when both are known.
  pub fn duration_hours(&self) -> Option<f64> {
    let (start, end) = (self.started_at?, self.completed_at?);
    Some((end - start).num_seconds() as f64 / 3600.0)
  }
}

/// Input to create or edit a work order.
///
/// `None`/empty fields are what an unfilled form produces; [`validate`]
/// rejects them before anything is sent.
///
/// [`validate`]: MaintenanceDraft::validate
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaintenanceDraft {
  #[serde(rename = "id_equipo")]
  pub equipment_id:  i64,
  #[serde(rename = "fecha_programada", with = "crate::wire::opt_date")]
  pub scheduled_for: Option<NaiveDate>,
  #[serde(rename = "tipo_mantenimiento")]
  pub kind:          MaintenanceKind,
  #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
  pub description:   Option<String>,
  #[serde(rename = "responsable")]
  pub assignee:      String,
  #[serde(rename = "observaciones", skip_serializing_if = "Option::is_none")]
  pub notes:         Option<String>,
  #[serde(rename = "costo", skip_serializing_if = "Option::is_none")]
  pub cost:          Option<Decimal>,
  /// New work orders always start out scheduled.
  #[serde(rename = "estado")]
  pub status:        MaintenanceStatus,
}

impl MaintenanceDraft {
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.equipment_id <= 0 {
      return Err(ValidationError::new("id_equipo", "a piece of equipment must be selected"));
    }
    if self.scheduled_for.is_none() {
      return Err(ValidationError::new("fecha_programada", "a scheduled date must be selected"));
    }
    if self.assignee.trim().is_empty() {
      return Err(ValidationError::new("responsable", "an assignee must be selected"));
    }
    Ok(())
  }

  /// Apply the editable fields of this draft onto an existing record,
  /// leaving status and timestamps alone.
  ///
  /// Work under way stays on its equipment: moving it would leave the old
  /// equipment in maintenance with no open order.
  pub fn apply_to(&self, record: &MaintenanceRecord) -> Result<MaintenanceRecord> {
    self.validate()?;
    if record.status == MaintenanceStatus::InProgress && self.equipment_id != record.equipment_id {
      return Err(
        ValidationError::new("id_equipo", "equipment cannot change while work is in progress")
          .into(),
      );
    }
    let mut next = record.clone();
    next.equipment_id = self.equipment_id;
    if let Some(date) = self.scheduled_for {
      next.scheduled_for = date;
    }
    next.kind = self.kind;
    next.description = self.description.clone();
    next.assignee = self.assignee.trim().to_owned();
    next.notes = self.notes.clone();
    next.cost = self.cost;
    Ok(next)
  }
}

// ─── Spare parts ─────────────────────────────────────────────────────────────

/// A spare part consumed by a work order. Owned by exactly one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparePart {
  #[serde(rename = "id_refaccion")]
  pub id:             i64,
  #[serde(rename = "id_mantenimiento")]
  pub maintenance_id: i64,
  #[serde(rename = "nombre_refaccion")]
  pub name:           String,
  #[serde(rename = "cantidad")]
  pub quantity:       i32,
  #[serde(rename = "costo_unitario", default)]
  pub unit_cost:      Option<Decimal>,
  #[serde(rename = "proveedor", default)]
  pub supplier:       Option<String>,
}

impl SparePart {
  pub fn subtotal(&self) -> Decimal {
    self.unit_cost.unwrap_or_default() * Decimal::from(self.quantity)
  }
}

/// Input to record spare-part usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SparePartDraft {
  #[serde(rename = "id_mantenimiento")]
  pub maintenance_id: i64,
  #[serde(rename = "nombre_refaccion")]
  pub name:           String,
  #[serde(rename = "cantidad")]
  pub quantity:       i32,
  #[serde(rename = "costo_unitario")]
  pub unit_cost:      Decimal,
  #[serde(rename = "proveedor", skip_serializing_if = "Option::is_none")]
  pub supplier:       Option<String>,
}

impl SparePartDraft {
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.name.trim().is_empty() {
      return Err(ValidationError::required("nombre_refaccion"));
    }
    if self.quantity <= 0 {
      return Err(ValidationError::new("cantidad", "must be greater than zero"));
    }
    if self.unit_cost <= Decimal::ZERO {
      return Err(ValidationError::new("costo_unitario", "must be greater than zero"));
    }
    Ok(())
  }
}

/// Σ quantity × unit cost over the given usages.
pub fn total_cost<'a>(parts: impl IntoIterator<Item = &'a SparePart>) -> Decimal {
  parts.into_iter().map(SparePart::subtotal).sum()
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// The result of a lifecycle transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
  /// The record as it must be written back.
  pub record:           MaintenanceRecord,
  /// New status for the linked equipment, when the transition implies one.
  pub equipment_status: Option<EquipmentStatus>,
}

const ENTITY: &str = "maintenance record";

fn invalid(action: &'static str, from: MaintenanceStatus) -> Error {
  Error::InvalidTransition { entity: ENTITY, action, from: from.to_string() }
}

fn require_assignee_or_admin(
  record: &MaintenanceRecord,
  actor: &Identity,
  action: &str,
) -> Result<()> {
  if actor.is_admin() || actor.answers_to(&record.assignee) {
    Ok(())
  } else {
    Err(Error::forbidden(format!(
      "only {} or an admin may {action} maintenance {}",
      record.assignee, record.id
    )))
  }
}

/// Scheduled → InProgress. Puts the equipment into maintenance.
pub fn start(
  record: &MaintenanceRecord,
  actor: &Identity,
  now: DateTime<Utc>,
) -> Result<Transition> {
  require_assignee_or_admin(record, actor, "start")?;
  if record.status != MaintenanceStatus::Scheduled {
    return Err(invalid("start", record.status));
  }
  let mut next = record.clone();
  next.status = MaintenanceStatus::InProgress;
  next.started_at = Some(now);
  next.completed_at = None;
  Ok(Transition {
    record:           next,
    equipment_status: Some(EquipmentStatus::InMaintenance),
  })
}

/// InProgress → Completed. Returns the equipment to service.
pub fn finish(
  record: &MaintenanceRecord,
  actor: &Identity,
  now: DateTime<Utc>,
) -> Result<Transition> {
  require_assignee_or_admin(record, actor, "finish")?;
  if record.status != MaintenanceStatus::InProgress {
    return Err(invalid("finish", record.status));
  }
  let mut next = record.clone();
  next.status = MaintenanceStatus::Completed;
  next.started_at = next.started_at.or(Some(now));
  next.completed_at = Some(now);
  Ok(Transition {
    record:           next,
    equipment_status: Some(EquipmentStatus::Operational),
  })
}

/// Scheduled | InProgress | Completed → Cancelled. Admin only.
///
/// Cancelling work that is under way returns the equipment to service.
pub fn cancel(record: &MaintenanceRecord, actor: &Identity) -> Result<Transition> {
  if !actor.is_admin() {
    return Err(Error::forbidden("only an admin may cancel maintenance"));
  }
  if record.status == MaintenanceStatus::Cancelled {
    return Err(invalid("cancel", record.status));
  }
  let equipment_status = (record.status == MaintenanceStatus::InProgress)
    .then_some(EquipmentStatus::Operational);
  let mut next = record.clone();
  next.status = MaintenanceStatus::Cancelled;
  Ok(Transition { record: next, equipment_status })
}

/// Completed | Cancelled → Scheduled, clearing both timestamps.
///
/// Requires an admin holding a valid editor grant.
pub fn reopen(
  record: &MaintenanceRecord,
  actor: &Identity,
  grant: Option<&EditorGrant>,
  now: DateTime<Utc>,
) -> Result<Transition> {
  if !actor.is_admin() {
    return Err(Error::forbidden("only an admin may reopen maintenance"));
  }
  if !grant.is_some_and(|g| g.is_valid_for(actor, now)) {
    return Err(Error::forbidden("editor mode is not active"));
  }
  if !record.status.is_locked() {
    return Err(invalid("reopen", record.status));
  }
  let mut next = record.clone();
  next.status = MaintenanceStatus::Scheduled;
  next.started_at = None;
  next.completed_at = None;
  Ok(Transition { record: next, equipment_status: None })
}

/// Replace description and notes without touching status.
pub fn update_observations(
  record: &MaintenanceRecord,
  actor: &Identity,
  description: Option<String>,
  notes: Option<String>,
) -> Result<MaintenanceRecord> {
  require_assignee_or_admin(record, actor, "annotate")?;
  let mut next = record.clone();
  next.description = description.filter(|s| !s.trim().is_empty());
  next.notes = notes.filter(|s| !s.trim().is_empty());
  Ok(next)
}

/// Check that `part` may be recorded against `record` right now.
pub fn check_spare_part(
  record: &MaintenanceRecord,
  actor: &Identity,
  part: &SparePartDraft,
) -> Result<()> {
  part.validate()?;
  require_assignee_or_admin(record, actor, "add spare parts to")?;
  if part.maintenance_id != record.id {
    return Err(ValidationError::new("id_mantenimiento", "does not match the work order").into());
  }
  if record.status != MaintenanceStatus::InProgress {
    return Err(invalid("add spare parts to", record.status));
  }
  Ok(())
}

/// Check that spare-part usage may be withdrawn from `record`.
///
/// Same window as adding: the assignee or an admin, while work is under way.
pub fn check_spare_part_removal(record: &MaintenanceRecord, actor: &Identity) -> Result<()> {
  require_assignee_or_admin(record, actor, "remove spare parts from")?;
  if record.status != MaintenanceStatus::InProgress {
    return Err(invalid("remove spare parts from", record.status));
  }
  Ok(())
}

/// Records the identity may see: admins see everything, others only their
/// own assignments.
pub fn visible_to<'a>(
  records: &'a [MaintenanceRecord],
  actor: &'a Identity,
) -> impl Iterator<Item = &'a MaintenanceRecord> + 'a {
  records
    .iter()
    .filter(move |r| actor.is_admin() || actor.answers_to(&r.assignee))
}

#[cfg(test)]
pub(crate) mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::identity::Role;

  pub(crate) fn who(username: &str, role: Role) -> Identity {
    Identity {
      username:     username.into(),
      display_name: username.to_uppercase(),
      role,
      area:         None,
    }
  }

  pub(crate) fn record(status: MaintenanceStatus) -> MaintenanceRecord {
    MaintenanceRecord {
      id:            11,
      equipment_id:  4,
      scheduled_for: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
      started_at:    None,
      completed_at:  None,
      kind:          MaintenanceKind::Preventive,
      description:   Some("Cambio de filtros".into()),
      assignee:      "mlopez".into(),
      status,
      notes:         None,
      cost:          None,
      spare_parts:   Vec::new(),
      serial_number: None,
      area_name:     None,
      type_name:     None,
    }
  }

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 6, 2, 15, 0, 0).unwrap() }

  fn grant_for(id: &Identity) -> EditorGrant {
    EditorGrant {
      username:   id.username.clone(),
      token:      "grant".into(),
      issued_at:  now(),
      expires_at: None,
    }
  }

  fn part(qty: i32, cost: Decimal) -> SparePartDraft {
    SparePartDraft {
      maintenance_id: 11,
      name:           "Filtro".into(),
      quantity:       qty,
      unit_cost:      cost,
      supplier:       None,
    }
  }

  // ── start / finish ──────────────────────────────────────────────────────

  #[test]
  fn start_sets_timestamp_and_puts_equipment_in_maintenance() {
    let t = start(&record(MaintenanceStatus::Scheduled), &who("mlopez", Role::Maintenance), now())
      .unwrap();
    assert_eq!(t.record.status, MaintenanceStatus::InProgress);
    assert_eq!(t.record.started_at, Some(now()));
    assert!(t.record.completed_at.is_none());
    assert_eq!(t.equipment_status, Some(EquipmentStatus::InMaintenance));
  }

  #[test]
  fn assignee_may_be_matched_by_display_name() {
    let mut r = record(MaintenanceStatus::Scheduled);
    r.assignee = "MLOPEZ".into();
    assert!(start(&r, &who("mlopez", Role::Maintenance), now()).is_ok());
  }

  #[test]
  fn non_assignee_cannot_start() {
    let err = start(&record(MaintenanceStatus::Scheduled), &who("other", Role::Maintenance), now())
      .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
  }

  #[test]
  fn admin_may_start_anyones_record() {
    assert!(start(&record(MaintenanceStatus::Scheduled), &who("root", Role::Admin), now()).is_ok());
  }

  #[test]
  fn start_requires_scheduled() {
    let err = start(&record(MaintenanceStatus::InProgress), &who("root", Role::Admin), now())
      .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { action: "start", .. }));
  }

  #[test]
  fn finish_sets_completion_and_restores_equipment() {
    let actor = who("mlopez", Role::Maintenance);
    let started = start(&record(MaintenanceStatus::Scheduled), &actor, now()).unwrap().record;
    let later = now() + chrono::Duration::minutes(90);
    let t = finish(&started, &actor, later).unwrap();
    assert_eq!(t.record.status, MaintenanceStatus::Completed);
    assert_eq!(t.record.started_at, Some(now()));
    assert_eq!(t.record.completed_at, Some(later));
    assert_eq!(t.equipment_status, Some(EquipmentStatus::Operational));
    assert_eq!(t.record.duration_hours(), Some(1.5));
  }

  #[test]
  fn finish_requires_in_progress() {
    let err = finish(&record(MaintenanceStatus::Scheduled), &who("mlopez", Role::Maintenance), now())
      .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { action: "finish", .. }));
  }

  // ── cancel ──────────────────────────────────────────────────────────────

  #[test]
  fn only_admin_cancels() {
    let err = cancel(&record(MaintenanceStatus::Scheduled), &who("mlopez", Role::Maintenance))
      .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
  }

  #[test]
  fn cancel_from_each_open_or_completed_state() {
    let admin = who("root", Role::Admin);
    for (from, equipment) in [
      (MaintenanceStatus::Scheduled, None),
      (MaintenanceStatus::InProgress, Some(EquipmentStatus::Operational)),
      (MaintenanceStatus::Completed, None),
    ] {
      let t = cancel(&record(from), &admin).unwrap();
      assert_eq!(t.record.status, MaintenanceStatus::Cancelled);
      assert_eq!(t.equipment_status, equipment, "from {from}");
    }
    assert!(cancel(&record(MaintenanceStatus::Cancelled), &admin).is_err());
  }

  // ── reopen ──────────────────────────────────────────────────────────────

  #[test]
  fn admin_with_grant_reopens_completed_and_clears_timestamps() {
    let admin = who("root", Role::Admin);
    let mut r = record(MaintenanceStatus::Completed);
    r.started_at = Some(now());
    r.completed_at = Some(now());
    let t = reopen(&r, &admin, Some(&grant_for(&admin)), now()).unwrap();
    assert_eq!(t.record.status, MaintenanceStatus::Scheduled);
    assert!(t.record.started_at.is_none());
    assert!(t.record.completed_at.is_none());
    assert!(t.equipment_status.is_none());
  }

  #[test]
  fn reopen_without_grant_is_forbidden() {
    let admin = who("root", Role::Admin);
    let err = reopen(&record(MaintenanceStatus::Cancelled), &admin, None, now()).unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
  }

  #[test]
  fn reopen_with_someone_elses_grant_is_forbidden() {
    let admin = who("root", Role::Admin);
    let other = who("boss", Role::Admin);
    let err = reopen(&record(MaintenanceStatus::Completed), &admin, Some(&grant_for(&other)), now())
      .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
  }

  #[test]
  fn reopen_only_applies_to_locked_records() {
    let admin = who("root", Role::Admin);
    let err = reopen(&record(MaintenanceStatus::InProgress), &admin, Some(&grant_for(&admin)), now())
      .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { action: "reopen", .. }));
  }

  // ── drafts and observations ─────────────────────────────────────────────

  #[test]
  fn draft_validation_is_field_specific() {
    let mut d = MaintenanceDraft {
      equipment_id: 4,
      scheduled_for: NaiveDate::from_ymd_opt(2025, 6, 2),
      assignee: "mlopez".into(),
      ..Default::default()
    };
    assert!(d.validate().is_ok());

    d.assignee = " ".into();
    assert_eq!(d.validate().unwrap_err().field, "responsable");
    d.scheduled_for = None;
    assert_eq!(d.validate().unwrap_err().field, "fecha_programada");
    d.equipment_id = 0;
    assert_eq!(d.validate().unwrap_err().field, "id_equipo");
  }

  #[test]
  fn draft_apply_keeps_status_and_timestamps() {
    let mut r = record(MaintenanceStatus::InProgress);
    r.started_at = Some(now());
    let d = MaintenanceDraft {
      equipment_id: 4,
      scheduled_for: NaiveDate::from_ymd_opt(2025, 7, 1),
      kind: MaintenanceKind::Corrective,
      assignee: "jperez".into(),
      ..Default::default()
    };
    let next = d.apply_to(&r).unwrap();
    assert_eq!(next.status, MaintenanceStatus::InProgress);
    assert_eq!(next.started_at, Some(now()));
    assert_eq!(next.assignee, "jperez");
    assert_eq!(next.kind, MaintenanceKind::Corrective);
  }

  #[test]
  fn equipment_is_fixed_once_work_has_started() {
    let d = MaintenanceDraft {
      equipment_id: 9,
      scheduled_for: NaiveDate::from_ymd_opt(2025, 6, 2),
      assignee: "mlopez".into(),
      ..Default::default()
    };
    let err = d.apply_to(&record(MaintenanceStatus::InProgress)).unwrap_err();
    assert!(matches!(err, Error::Validation(ref v) if v.field == "id_equipo"), "{err}");

    for status in [MaintenanceStatus::Scheduled, MaintenanceStatus::Completed] {
      assert_eq!(d.apply_to(&record(status)).unwrap().equipment_id, 9);
    }
  }

  #[test]
  fn observations_update_leaves_status_alone() {
    let r = record(MaintenanceStatus::Completed);
    let next = update_observations(
      &r,
      &who("mlopez", Role::Maintenance),
      Some("Se cambió la banda".into()),
      Some("Revisar en 3 meses".into()),
    )
    .unwrap();
    assert_eq!(next.status, MaintenanceStatus::Completed);
    assert_eq!(next.notes.as_deref(), Some("Revisar en 3 meses"));
  }

  // ── spare parts ─────────────────────────────────────────────────────────

  #[test]
  fn spare_parts_only_while_in_progress() {
    let actor = who("mlopez", Role::Maintenance);
    let ok = part(2, Decimal::new(1550, 2));
    assert!(check_spare_part(&record(MaintenanceStatus::InProgress), &actor, &ok).is_ok());
    for status in [
      MaintenanceStatus::Scheduled,
      MaintenanceStatus::Completed,
      MaintenanceStatus::Cancelled,
    ] {
      assert!(check_spare_part(&record(status), &actor, &ok).is_err(), "{status}");
    }
  }

  #[test]
  fn spare_parts_are_withdrawn_by_assignee_while_in_progress() {
    let r = record(MaintenanceStatus::InProgress);
    assert!(check_spare_part_removal(&r, &who("mlopez", Role::Maintenance)).is_ok());
    assert!(check_spare_part_removal(&r, &who("jperez", Role::Maintenance)).is_err());
    let done = record(MaintenanceStatus::Completed);
    assert!(check_spare_part_removal(&done, &who("root", Role::Admin)).is_err());
  }

  #[test]
  fn spare_part_with_bad_quantity_cost_or_name_is_rejected() {
    let r = record(MaintenanceStatus::InProgress);
    let actor = who("mlopez", Role::Maintenance);
    for bad in [part(0, Decimal::ONE), part(-3, Decimal::ONE), part(1, Decimal::ZERO)] {
      let err = check_spare_part(&r, &actor, &bad).unwrap_err();
      assert!(matches!(err, Error::Validation(_)));
    }
    let mut nameless = part(1, Decimal::ONE);
    nameless.name = String::new();
    let err = check_spare_part(&r, &actor, &nameless).unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError { field: "nombre_refaccion", .. })));
  }

  #[test]
  fn total_cost_is_sum_of_quantity_times_unit_cost() {
    let parts = [
      SparePart {
        id:             1,
        maintenance_id: 11,
        name:           "Banda".into(),
        quantity:       2,
        unit_cost:      Some(Decimal::new(12550, 2)),
        supplier:       None,
      },
      SparePart {
        id:             2,
        maintenance_id: 11,
        name:           "Tornillo".into(),
        quantity:       10,
        unit_cost:      Some(Decimal::new(75, 2)),
        supplier:       Some("Ferretería".into()),
      },
      SparePart {
        id:             3,
        maintenance_id: 11,
        name:           "Donado".into(),
        quantity:       1,
        unit_cost:      None,
        supplier:       None,
      },
    ];
    assert_eq!(total_cost(&parts), Decimal::new(25850, 2));
    assert_eq!(total_cost(&[]), Decimal::ZERO);
  }

  // ── wire format ─────────────────────────────────────────────────────────

  #[test]
  fn record_decodes_backend_payload() {
    let raw = r#"{
      "id_mantenimiento": 3, "id_equipo": 7, "fecha_programada": "2025-05-30T00:00:00.000Z",
      "fecha_inicio": "2025-05-30T14:00:00.000Z", "fecha_finalizacion": null,
      "tipo_mantenimiento": "Inspección", "responsable": "mlopez",
      "estado": "En Proceso", "costo": 150.5, "nombre_area": "Lobby"
    }"#;
    let r: MaintenanceRecord = serde_json::from_str(raw).unwrap();
    assert_eq!(r.status, MaintenanceStatus::InProgress);
    assert_eq!(r.kind, MaintenanceKind::Inspection);
    assert_eq!(r.scheduled_for, NaiveDate::from_ymd_opt(2025, 5, 30).unwrap());
    assert!(r.started_at.is_some());
    assert!(r.completed_at.is_none());
    assert_eq!(r.cost, Some(Decimal::new(1505, 1)));
  }

  #[test]
  fn reopened_record_serialises_explicit_nulls() {
    let json = serde_json::to_value(record(MaintenanceStatus::Scheduled)).unwrap();
    assert!(json["fecha_inicio"].is_null());
    assert!(json["fecha_finalizacion"].is_null());
    assert_eq!(json["estado"], "Programado");
    assert!(json.get("nombre_area").is_none());
  }

  #[test]
  fn visible_records_are_scoped_to_assignee_unless_admin() {
    let mut mine = record(MaintenanceStatus::Scheduled);
    mine.assignee = "mlopez".into();
    let mut theirs = record(MaintenanceStatus::Scheduled);
    theirs.assignee = "jperez".into();
    let all = [mine, theirs];

    let maint = who("mlopez", Role::Maintenance);
    assert_eq!(visible_to(&all, &maint).count(), 1);
    let admin = who("root", Role::Admin);
    assert_eq!(visible_to(&all, &admin).count(), 2);
  }
}
