//! The `Gateway` trait: request/response access to the backend's
//! collections.
//!
//! The trait is implemented by `innkeep-client`'s HTTP gateway and by
//! in-memory fakes in tests. It keeps no cache; every call is a round trip.
//! Writes report success only: callers that need the new state reload it or
//! derive it from what they sent.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  Result,
  catalog::{Area, AreaDraft, Equipment, EquipmentDraft, EquipmentType, EquipmentTypeDraft},
  identity::{EditorGrant, Identity},
  maintenance::{MaintenanceDraft, MaintenanceRecord, SparePart, SparePartDraft},
  report::{DateRange, Stats},
  schedule::{Schedule, ScheduleDraft},
  ticket::{NewTicket, Ticket, TicketPatch},
};

/// Spending per supplier, as aggregated by the backend.
pub type SupplierSpending = serde_json::Value;

/// Abstraction over the maintenance backend.
///
/// Errors are reported with the crate's own taxonomy: a rejected login or
/// session check is [`Error::Auth`](crate::Error::Auth), a missing entity
/// [`Error::NotFound`](crate::Error::NotFound), a referential block
/// [`Error::Conflict`](crate::Error::Conflict), anything else
/// [`Error::Transport`](crate::Error::Transport).
pub trait Gateway: Send + Sync {
  // ── Auth ──────────────────────────────────────────────────────────────

  /// Exchange credentials for an identity.
  fn login<'a>(
    &'a self,
    username: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Identity>> + Send + 'a;

  /// Ask the backend whether `username` still has a valid session.
  fn verify_session<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  /// Request an editor-mode grant for an admin.
  fn issue_editor_grant<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<EditorGrant>> + Send + 'a;

  // ── Areas and equipment types ─────────────────────────────────────────

  fn list_areas(&self) -> impl Future<Output = Result<Vec<Area>>> + Send + '_;

  fn create_area(&self, draft: AreaDraft) -> impl Future<Output = Result<()>> + Send + '_;

  fn update_area(
    &self,
    id: i64,
    draft: AreaDraft,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Fails with `Conflict` while equipment still references the area.
  fn delete_area(&self, id: i64) -> impl Future<Output = Result<()>> + Send + '_;

  fn list_types(&self) -> impl Future<Output = Result<Vec<EquipmentType>>> + Send + '_;

  fn create_type(
    &self,
    draft: EquipmentTypeDraft,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  fn update_type(
    &self,
    id: i64,
    draft: EquipmentTypeDraft,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  fn delete_type(&self, id: i64) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Equipment ─────────────────────────────────────────────────────────

  fn list_equipment(&self) -> impl Future<Output = Result<Vec<Equipment>>> + Send + '_;

  fn get_equipment(&self, id: i64) -> impl Future<Output = Result<Equipment>> + Send + '_;

  fn create_equipment(
    &self,
    draft: EquipmentDraft,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  fn update_equipment(
    &self,
    id: i64,
    draft: EquipmentDraft,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  fn delete_equipment(&self, id: i64) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Maintenance ───────────────────────────────────────────────────────

  fn list_maintenance(
    &self,
  ) -> impl Future<Output = Result<Vec<MaintenanceRecord>>> + Send + '_;

  fn get_maintenance(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<MaintenanceRecord>> + Send + '_;

  fn create_maintenance(
    &self,
    draft: MaintenanceDraft,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Overwrite a record with `record`, including status and timestamps.
  ///
  /// Writes that reopen or edit a completed or cancelled record carry the
  /// editor grant; the backend checks its token and answers `Forbidden`
  /// when it did not issue it.
  fn update_maintenance<'a>(
    &'a self,
    record: MaintenanceRecord,
    grant: Option<&'a EditorGrant>,
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  fn delete_maintenance(&self, id: i64) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Spare parts and suppliers ─────────────────────────────────────────

  fn list_spare_parts(
    &self,
    maintenance_id: i64,
  ) -> impl Future<Output = Result<Vec<SparePart>>> + Send + '_;

  fn create_spare_part(
    &self,
    draft: SparePartDraft,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  fn delete_spare_part(&self, id: i64) -> impl Future<Output = Result<()>> + Send + '_;

  fn list_suppliers(&self) -> impl Future<Output = Result<Vec<String>>> + Send + '_;

  fn supplier_spending(
    &self,
    range: Option<DateRange>,
  ) -> impl Future<Output = Result<Vec<SupplierSpending>>> + Send + '_;

  // ── Tickets ───────────────────────────────────────────────────────────

  fn list_tickets(&self) -> impl Future<Output = Result<Vec<Ticket>>> + Send + '_;

  fn tickets_assigned_to<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Vec<Ticket>>> + Send + 'a;

  fn incomplete_tickets(&self) -> impl Future<Output = Result<Vec<Ticket>>> + Send + '_;

  fn get_ticket(&self, id: i64) -> impl Future<Output = Result<Ticket>> + Send + '_;

  fn create_ticket(&self, ticket: NewTicket) -> impl Future<Output = Result<()>> + Send + '_;

  fn update_ticket(
    &self,
    id: i64,
    patch: TicketPatch,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Schedules ─────────────────────────────────────────────────────────

  fn list_schedules(&self) -> impl Future<Output = Result<Vec<Schedule>>> + Send + '_;

  fn schedules_on(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Schedule>>> + Send + '_;

  fn create_schedule(
    &self,
    draft: ScheduleDraft,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  fn update_schedule<'a>(
    &'a self,
    id: &'a str,
    draft: ScheduleDraft,
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  fn delete_schedule<'a>(&'a self, id: &'a str)
  -> impl Future<Output = Result<()>> + Send + 'a;

  // ── Dashboard ─────────────────────────────────────────────────────────

  fn stats(&self) -> impl Future<Output = Result<Stats>> + Send + '_;
}
