//! In-memory [`Gateway`] for tests.
//!
//! Behaves like a well-mannered backend: ids are assigned on create, missing
//! entities are `NotFound`, deleting an area that still has equipment is a
//! `Conflict`. Failures can be injected per operation.

use std::{
  collections::{HashMap, HashSet},
  sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::{Duration, NaiveDate, Utc};
use innkeep_core::{
  EditorGrant, Error, Identity, Result, Role,
  catalog::{Area, AreaDraft, Equipment, EquipmentDraft, EquipmentType, EquipmentTypeDraft},
  gateway::{Gateway, SupplierSpending},
  maintenance::{MaintenanceDraft, MaintenanceRecord, SparePart, SparePartDraft},
  report::{DateRange, Stats},
  schedule::{Schedule, ScheduleDraft},
  ticket::{NewTicket, Ticket, TicketPatch},
};

#[derive(Default)]
struct State {
  users:        HashMap<String, (String, Identity)>,
  revoked:      HashSet<String>,
  offline:      bool,
  calls:        HashMap<&'static str, usize>,
  failures:     HashMap<&'static str, Error>,
  next_id:      i64,
  areas:        Vec<Area>,
  types:        Vec<EquipmentType>,
  equipment:    Vec<Equipment>,
  maintenance:  Vec<MaintenanceRecord>,
  parts:        Vec<SparePart>,
  tickets:      Vec<Ticket>,
  schedules:    Vec<Schedule>,
  busy_people:  HashSet<String>,
  grants:       HashSet<String>,
  presented:    Vec<Option<String>>,
}

impl State {
  fn id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }
}

#[derive(Default)]
pub struct FakeGateway {
  state: Mutex<State>,
}

fn missing(what: &str, id: impl std::fmt::Display) -> Error {
  Error::NotFound(format!("{what} {id}"))
}

pub fn equipment_from(id: i64, draft: &EquipmentDraft) -> Equipment {
  Equipment {
    id,
    serial_number: draft.serial_number.clone(),
    area_id: draft.area_id,
    type_id: draft.type_id,
    brand: draft.brand.clone(),
    model: draft.model.clone(),
    acquired_on: draft.acquired_on,
    status: draft.status,
    location: draft.location.clone(),
    acquisition_cost: draft.acquisition_cost,
    service_years: draft.service_years,
    notes: draft.notes.clone(),
    area_name: None,
    type_name: None,
  }
}

impl FakeGateway {
  fn state(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Count the call and apply any injected failure.
  fn enter(&self, op: &'static str) -> Result<MutexGuard<'_, State>> {
    let mut state = self.state();
    *state.calls.entry(op).or_default() += 1;
    if state.offline {
      return Err(Error::Transport(format!("{op}: connection refused")));
    }
    if let Some(e) = state.failures.remove(op) {
      return Err(e);
    }
    Ok(state)
  }

  // ── Test controls ───────────────────────────────────────────────────────

  pub fn with_user(username: &str, password: &str, role: Role) -> Self {
    let fake = Self::default();
    fake.add_user(username, password, role);
    fake
  }

  pub fn add_user(&self, username: &str, password: &str, role: Role) {
    let identity = Identity {
      username:     username.into(),
      display_name: username.to_uppercase(),
      role,
      area:         None,
    };
    self.state().users.insert(username.into(), (password.into(), identity));
  }

  pub fn calls(&self, op: &str) -> usize { self.state().calls.get(op).copied().unwrap_or(0) }

  pub fn total_calls(&self) -> usize { self.state().calls.values().sum() }

  pub fn revoke(&self, username: &str) { self.state().revoked.insert(username.into()); }

  pub fn go_offline(&self) { self.state().offline = true; }

  /// Make the next call to `op` fail with `error`.
  pub fn fail_next(&self, op: &'static str, error: Error) {
    self.state().failures.insert(op, error);
  }

  /// Grant tokens sent with each `update_maintenance`, oldest first.
  pub fn presented_grants(&self) -> Vec<Option<String>> { self.state().presented.clone() }

  /// Refuse every schedule created for `username`.
  pub fn refuse_schedules_for(&self, username: &str) {
    self.state().busy_people.insert(username.into());
  }

  pub fn seed_area(&self, name: &str) -> i64 {
    let mut s = self.state();
    let id = s.id();
    s.areas.push(Area { id, name: name.into(), description: None });
    id
  }

  pub fn seed_equipment(&self, draft: EquipmentDraft) -> i64 {
    let mut s = self.state();
    let id = s.id();
    s.equipment.push(equipment_from(id, &draft));
    id
  }

  pub fn seed_maintenance(&self, record: MaintenanceRecord) { self.state().maintenance.push(record); }

  pub fn seed_ticket(&self, ticket: Ticket) { self.state().tickets.push(ticket); }

  pub fn equipment(&self, id: i64) -> Option<Equipment> {
    self.state().equipment.iter().find(|e| e.id == id).cloned()
  }

  pub fn maintenance(&self, id: i64) -> Option<MaintenanceRecord> {
    self.state().maintenance.iter().find(|m| m.id == id).cloned()
  }

  pub fn ticket(&self, id: i64) -> Option<Ticket> {
    self.state().tickets.iter().find(|t| t.id == id).cloned()
  }

  pub fn schedules(&self) -> Vec<Schedule> { self.state().schedules.clone() }
}

impl Gateway for FakeGateway {
  async fn login(&self, username: &str, password: &str) -> Result<Identity> {
    let s = self.enter("login")?;
    match s.users.get(username) {
      Some((pw, identity)) if pw == password => Ok(identity.clone()),
      _ => Err(Error::Auth("invalid credentials".into())),
    }
  }

  async fn verify_session(&self, username: &str) -> Result<()> {
    let s = self.enter("verify_session")?;
    if s.users.contains_key(username) && !s.revoked.contains(username) {
      Ok(())
    } else {
      Err(Error::Auth("session expired".into()))
    }
  }

  async fn issue_editor_grant(&self, username: &str) -> Result<EditorGrant> {
    let mut s = self.enter("issue_editor_grant")?;
    let now = Utc::now();
    let token = format!("grant-{username}");
    s.grants.insert(token.clone());
    Ok(EditorGrant {
      username: username.into(),
      token,
      issued_at: now,
      expires_at: Some(now + Duration::hours(1)),
    })
  }

  async fn list_areas(&self) -> Result<Vec<Area>> { Ok(self.enter("list_areas")?.areas.clone()) }

  async fn create_area(&self, draft: AreaDraft) -> Result<()> {
    let mut s = self.enter("create_area")?;
    let id = s.id();
    s.areas.push(Area { id, name: draft.name, description: draft.description });
    Ok(())
  }

  async fn update_area(&self, id: i64, draft: AreaDraft) -> Result<()> {
    let mut s = self.enter("update_area")?;
    let area = s.areas.iter_mut().find(|a| a.id == id).ok_or_else(|| missing("area", id))?;
    area.name = draft.name;
    area.description = draft.description;
    Ok(())
  }

  async fn delete_area(&self, id: i64) -> Result<()> {
    let mut s = self.enter("delete_area")?;
    if s.equipment.iter().any(|e| e.area_id == id) {
      return Err(Error::Conflict(format!("area {id} still has equipment")));
    }
    let before = s.areas.len();
    s.areas.retain(|a| a.id != id);
    if s.areas.len() == before { Err(missing("area", id)) } else { Ok(()) }
  }

  async fn list_types(&self) -> Result<Vec<EquipmentType>> {
    Ok(self.enter("list_types")?.types.clone())
  }

  async fn create_type(&self, draft: EquipmentTypeDraft) -> Result<()> {
    let mut s = self.enter("create_type")?;
    let id = s.id();
    s.types.push(EquipmentType { id, name: draft.name, description: draft.description });
    Ok(())
  }

  async fn update_type(&self, id: i64, draft: EquipmentTypeDraft) -> Result<()> {
    let mut s = self.enter("update_type")?;
    let ty = s.types.iter_mut().find(|t| t.id == id).ok_or_else(|| missing("type", id))?;
    ty.name = draft.name;
    ty.description = draft.description;
    Ok(())
  }

  async fn delete_type(&self, id: i64) -> Result<()> {
    let mut s = self.enter("delete_type")?;
    s.types.retain(|t| t.id != id);
    Ok(())
  }

  async fn list_equipment(&self) -> Result<Vec<Equipment>> {
    Ok(self.enter("list_equipment")?.equipment.clone())
  }

  async fn get_equipment(&self, id: i64) -> Result<Equipment> {
    let s = self.enter("get_equipment")?;
    s.equipment.iter().find(|e| e.id == id).cloned().ok_or_else(|| missing("equipment", id))
  }

  async fn create_equipment(&self, draft: EquipmentDraft) -> Result<()> {
    let mut s = self.enter("create_equipment")?;
    let id = s.id();
    s.equipment.push(equipment_from(id, &draft));
    Ok(())
  }

  async fn update_equipment(&self, id: i64, draft: EquipmentDraft) -> Result<()> {
    let mut s = self.enter("update_equipment")?;
    let slot = s.equipment.iter_mut().find(|e| e.id == id).ok_or_else(|| missing("equipment", id))?;
    *slot = equipment_from(id, &draft);
    Ok(())
  }

  async fn delete_equipment(&self, id: i64) -> Result<()> {
    let mut s = self.enter("delete_equipment")?;
    s.equipment.retain(|e| e.id != id);
    Ok(())
  }

  async fn list_maintenance(&self) -> Result<Vec<MaintenanceRecord>> {
    Ok(self.enter("list_maintenance")?.maintenance.clone())
  }

  async fn get_maintenance(&self, id: i64) -> Result<MaintenanceRecord> {
    let s = self.enter("get_maintenance")?;
    s.maintenance.iter().find(|m| m.id == id).cloned().ok_or_else(|| missing("maintenance", id))
  }

  async fn create_maintenance(&self, draft: MaintenanceDraft) -> Result<()> {
    let mut s = self.enter("create_maintenance")?;
    let id = s.id();
    let scheduled_for = draft
      .scheduled_for
      .ok_or_else(|| Error::Validation(innkeep_core::ValidationError::required("fecha_programada")))?;
    s.maintenance.push(MaintenanceRecord {
      id,
      equipment_id: draft.equipment_id,
      scheduled_for,
      started_at: None,
      completed_at: None,
      kind: draft.kind,
      description: draft.description,
      assignee: draft.assignee,
      status: draft.status,
      notes: draft.notes,
      cost: draft.cost,
      spare_parts: Vec::new(),
      serial_number: None,
      area_name: None,
      type_name: None,
    });
    Ok(())
  }

  async fn update_maintenance(
    &self,
    record: MaintenanceRecord,
    grant: Option<&EditorGrant>,
  ) -> Result<()> {
    let mut s = self.enter("update_maintenance")?;
    s.presented.push(grant.map(|g| g.token.clone()));
    if grant.is_some_and(|g| !s.grants.contains(&g.token)) {
      return Err(Error::Forbidden("editor grant was not issued by this server".into()));
    }
    let slot = s
      .maintenance
      .iter_mut()
      .find(|m| m.id == record.id)
      .ok_or_else(|| missing("maintenance", record.id))?;
    *slot = record;
    Ok(())
  }

  async fn delete_maintenance(&self, id: i64) -> Result<()> {
    let mut s = self.enter("delete_maintenance")?;
    s.maintenance.retain(|m| m.id != id);
    s.parts.retain(|p| p.maintenance_id != id);
    Ok(())
  }

  async fn list_spare_parts(&self, maintenance_id: i64) -> Result<Vec<SparePart>> {
    let s = self.enter("list_spare_parts")?;
    Ok(s.parts.iter().filter(|p| p.maintenance_id == maintenance_id).cloned().collect())
  }

  async fn create_spare_part(&self, draft: SparePartDraft) -> Result<()> {
    let mut s = self.enter("create_spare_part")?;
    let id = s.id();
    s.parts.push(SparePart {
      id,
      maintenance_id: draft.maintenance_id,
      name: draft.name,
      quantity: draft.quantity,
      unit_cost: Some(draft.unit_cost),
      supplier: draft.supplier,
    });
    Ok(())
  }

  async fn delete_spare_part(&self, id: i64) -> Result<()> {
    let mut s = self.enter("delete_spare_part")?;
    let before = s.parts.len();
    s.parts.retain(|p| p.id != id);
    if s.parts.len() == before { Err(missing("spare part", id)) } else { Ok(()) }
  }

  async fn list_suppliers(&self) -> Result<Vec<String>> {
    let s = self.enter("list_suppliers")?;
    let mut names: Vec<_> = s.parts.iter().filter_map(|p| p.supplier.clone()).collect();
    names.sort();
    names.dedup();
    Ok(names)
  }

  async fn supplier_spending(&self, _range: Option<DateRange>) -> Result<Vec<SupplierSpending>> {
    let _s = self.enter("supplier_spending")?;
    Ok(Vec::new())
  }

  async fn list_tickets(&self) -> Result<Vec<Ticket>> { Ok(self.enter("list_tickets")?.tickets.clone()) }

  async fn tickets_assigned_to(&self, username: &str) -> Result<Vec<Ticket>> {
    let s = self.enter("tickets_assigned_to")?;
    Ok(
      s.tickets
        .iter()
        .filter(|t| t.assignee.as_deref() == Some(username))
        .cloned()
        .collect(),
    )
  }

  async fn incomplete_tickets(&self) -> Result<Vec<Ticket>> {
    let s = self.enter("incomplete_tickets")?;
    Ok(s.tickets.iter().filter(|t| !t.status.is_finished()).cloned().collect())
  }

  async fn get_ticket(&self, id: i64) -> Result<Ticket> {
    let s = self.enter("get_ticket")?;
    s.tickets.iter().find(|t| t.id == id).cloned().ok_or_else(|| missing("ticket", id))
  }

  async fn create_ticket(&self, ticket: NewTicket) -> Result<()> {
    let mut s = self.enter("create_ticket")?;
    let id = s.id();
    s.tickets.push(Ticket {
      id,
      area: ticket.area,
      floor: ticket.floor,
      room: ticket.room,
      description: ticket.description,
      priority: ticket.priority,
      created_by: ticket.created_by,
      assignee: ticket.assignee,
      status: ticket.status,
      created_at: ticket.created_at,
      due_at: ticket.due_at,
      maintenance_notes: None,
      completed_at: None,
    });
    Ok(())
  }

  async fn update_ticket(&self, id: i64, patch: TicketPatch) -> Result<()> {
    let mut s = self.enter("update_ticket")?;
    let slot = s.tickets.iter_mut().find(|t| t.id == id).ok_or_else(|| missing("ticket", id))?;
    *slot = patch.apply(slot);
    Ok(())
  }

  async fn list_schedules(&self) -> Result<Vec<Schedule>> {
    Ok(self.enter("list_schedules")?.schedules.clone())
  }

  async fn schedules_on(&self, date: NaiveDate) -> Result<Vec<Schedule>> {
    let s = self.enter("schedules_on")?;
    Ok(s.schedules.iter().filter(|e| e.date == date).cloned().collect())
  }

  async fn create_schedule(&self, draft: ScheduleDraft) -> Result<()> {
    let mut s = self.enter("create_schedule")?;
    if s.busy_people.contains(&draft.username) {
      return Err(Error::Conflict(format!("{} cannot be scheduled", draft.username)));
    }
    let date = draft
      .date
      .ok_or_else(|| Error::Validation(innkeep_core::ValidationError::required("fecha")))?;
    let id = s.id();
    s.schedules.push(Schedule {
      id: id.to_string(),
      username: draft.username,
      date,
      available: draft.available,
      reason: draft.reason,
    });
    Ok(())
  }

  async fn update_schedule(&self, id: &str, draft: ScheduleDraft) -> Result<()> {
    let mut s = self.enter("update_schedule")?;
    let slot = s.schedules.iter_mut().find(|e| e.id == id).ok_or_else(|| missing("schedule", id))?;
    slot.username = draft.username;
    if let Some(date) = draft.date {
      slot.date = date;
    }
    slot.available = draft.available;
    slot.reason = draft.reason;
    Ok(())
  }

  async fn delete_schedule(&self, id: &str) -> Result<()> {
    let mut s = self.enter("delete_schedule")?;
    s.schedules.retain(|e| e.id != id);
    Ok(())
  }

  async fn stats(&self) -> Result<Stats> {
    let s = self.enter("stats")?;
    Ok(Stats {
      total_equipment: s.equipment.len() as u64,
      maintenance_scheduled: s.maintenance.iter().filter(|m| m.status.is_open()).count() as u64,
      ..Stats::default()
    })
  }
}
