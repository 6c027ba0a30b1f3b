//! [`HttpGateway`]: the reqwest implementation of [`Gateway`].

use std::time::Duration;

use chrono::NaiveDate;
use innkeep_core::{
  Error, Identity, Result,
  catalog::{Area, AreaDraft, Equipment, EquipmentDraft, EquipmentType, EquipmentTypeDraft},
  gateway::{Gateway, SupplierSpending},
  identity::EditorGrant,
  maintenance::{MaintenanceDraft, MaintenanceRecord, SparePart, SparePartDraft},
  report::{DateRange, Stats},
  schedule::{Schedule, ScheduleDraft},
  ticket::{NewTicket, Ticket, TicketPatch},
};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::debug;

/// Header carrying the editor grant token on locked-record writes.
pub const EDITOR_GRANT_HEADER: &str = "x-editor-grant";

/// Connection settings for the backend.
#[derive(Debug, Clone)]
pub struct HttpConfig {
  /// Server root; the `/api` prefix is added per request.
  pub base_url: String,
  pub timeout:  Duration,
}

impl Default for HttpConfig {
  fn default() -> Self {
    Self {
      base_url: "https://api-mantenimiento-hotel.onrender.com".to_owned(),
      timeout:  Duration::from_secs(30),
    }
  }
}

/// JSON-over-HTTPS access to the maintenance backend.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct HttpGateway {
  client: Client,
  base:   Url,
}

fn transport(what: &str, e: reqwest::Error) -> Error { Error::Transport(format!("{what}: {e}")) }

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
  let value: Value = serde_json::from_str(body).ok()?;
  ["error", "message", "mensaje"]
    .iter()
    .find_map(|k| value.get(k).and_then(Value::as_str))
    .map(str::to_owned)
}

impl HttpGateway {
  pub fn new(config: &HttpConfig) -> Result<Self> {
    let base = Url::parse(&config.base_url)
      .map_err(|e| Error::Transport(format!("invalid base URL {:?}: {e}", config.base_url)))?;
    if base.cannot_be_a_base() {
      return Err(Error::Transport(format!("invalid base URL {:?}", config.base_url)));
    }
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| transport("building HTTP client", e))?;
    Ok(Self { client, base })
  }

  /// `<base>/api/<segments...>`, each segment percent-encoded.
  fn url(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().push("api").extend(segments);
    }
    url
  }

  async fn send(
    &self,
    method: Method,
    segments: &[&str],
    query: &[(&str, String)],
    body: Option<Value>,
    grant: Option<&EditorGrant>,
  ) -> Result<(Response, String)> {
    let url = self.url(segments);
    let what = format!("{method} {}", url.path());
    let mut req = self.client.request(method, url);
    if !query.is_empty() {
      req = req.query(query);
    }
    if let Some(grant) = grant {
      req = req.header(EDITOR_GRANT_HEADER, &grant.token);
    }
    if let Some(body) = body {
      req = req.json(&body);
    }
    let resp = req.send().await.map_err(|e| transport(&what, e))?;
    debug!(status = %resp.status(), "{what}");
    Ok((resp, what))
  }

  /// Map a non-success response onto the error taxonomy. On auth endpoints
  /// every client error is a rejection of the credentials or session.
  async fn check(resp: Response, what: &str, auth: bool) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = error_message(&body)
      .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_owned());
    Err(match status {
      s if auth && s.is_client_error() => Error::Auth(message),
      StatusCode::UNAUTHORIZED => Error::Auth(message),
      StatusCode::FORBIDDEN => Error::Forbidden(message),
      StatusCode::NOT_FOUND => Error::NotFound(format!("{what}: {message}")),
      StatusCode::CONFLICT => Error::Conflict(message),
      _ => Error::Transport(format!("{what} → {status}: {message}")),
    })
  }

  async fn call(
    &self,
    method: Method,
    segments: &[&str],
    query: &[(&str, String)],
    body: Option<Value>,
  ) -> Result<Response> {
    let (resp, what) = self.send(method, segments, query, body, None).await?;
    Self::check(resp, &what, false).await
  }

  async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    let bytes = resp.bytes().await.map_err(|e| transport(what, e))?;
    Ok(serde_json::from_slice(&bytes)?)
  }

  async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
    let resp = self.call(Method::GET, segments, &[], None).await?;
    Self::decode(resp, &segments.join("/")).await
  }

  async fn write<B: Serialize>(&self, method: Method, segments: &[&str], body: &B) -> Result<()> {
    let body = serde_json::to_value(body)?;
    self.call(method, segments, &[], Some(body)).await?;
    Ok(())
  }

  async fn delete(&self, segments: &[&str]) -> Result<()> {
    self.call(Method::DELETE, segments, &[], None).await?;
    Ok(())
  }

  async fn auth_call(&self, segments: &[&str], body: Value) -> Result<Response> {
    let (resp, what) = self.send(Method::POST, segments, &[], Some(body), None).await?;
    Self::check(resp, &what, true).await
  }
}

fn id(n: i64) -> String { n.to_string() }

impl Gateway for HttpGateway {
  // ── Auth ──────────────────────────────────────────────────────────────

  async fn login(&self, username: &str, password: &str) -> Result<Identity> {
    let body = json!({ "username": username, "password": password });
    let resp = self.auth_call(&["auth", "login"], body).await?;
    let value: Value = Self::decode(resp, "login").await?;
    // Some deployments wrap the user in `{ "user": {...} }`.
    let user = match value.get("user") {
      Some(inner) if inner.is_object() => inner.clone(),
      _ => value,
    };
    serde_json::from_value(user).map_err(|e| Error::Auth(format!("unexpected login reply: {e}")))
  }

  async fn verify_session(&self, username: &str) -> Result<()> {
    let body = json!({ "username": username });
    self.auth_call(&["auth", "verify"], body).await?;
    Ok(())
  }

  async fn issue_editor_grant(&self, username: &str) -> Result<EditorGrant> {
    let body = json!({ "username": username });
    let resp = self.auth_call(&["auth", "editor-mode"], body).await?;
    Self::decode(resp, "editor-mode").await
  }

  // ── Areas and equipment types ─────────────────────────────────────────

  async fn list_areas(&self) -> Result<Vec<Area>> { self.get(&["areas"]).await }

  async fn create_area(&self, draft: AreaDraft) -> Result<()> {
    self.write(Method::POST, &["areas"], &draft).await
  }

  async fn update_area(&self, area_id: i64, draft: AreaDraft) -> Result<()> {
    self.write(Method::PUT, &["areas", &id(area_id)], &draft).await
  }

  async fn delete_area(&self, area_id: i64) -> Result<()> {
    self.delete(&["areas", &id(area_id)]).await
  }

  async fn list_types(&self) -> Result<Vec<EquipmentType>> { self.get(&["tipos"]).await }

  async fn create_type(&self, draft: EquipmentTypeDraft) -> Result<()> {
    self.write(Method::POST, &["tipos"], &draft).await
  }

  async fn update_type(&self, type_id: i64, draft: EquipmentTypeDraft) -> Result<()> {
    self.write(Method::PUT, &["tipos", &id(type_id)], &draft).await
  }

  async fn delete_type(&self, type_id: i64) -> Result<()> {
    self.delete(&["tipos", &id(type_id)]).await
  }

  // ── Equipment ─────────────────────────────────────────────────────────

  async fn list_equipment(&self) -> Result<Vec<Equipment>> { self.get(&["equipos"]).await }

  async fn get_equipment(&self, equipment_id: i64) -> Result<Equipment> {
    self.get(&["equipos", &id(equipment_id)]).await
  }

  async fn create_equipment(&self, draft: EquipmentDraft) -> Result<()> {
    self.write(Method::POST, &["equipos"], &draft).await
  }

  async fn update_equipment(&self, equipment_id: i64, draft: EquipmentDraft) -> Result<()> {
    self.write(Method::PUT, &["equipos", &id(equipment_id)], &draft).await
  }

  async fn delete_equipment(&self, equipment_id: i64) -> Result<()> {
    self.delete(&["equipos", &id(equipment_id)]).await
  }

  // ── Maintenance ───────────────────────────────────────────────────────

  async fn list_maintenance(&self) -> Result<Vec<MaintenanceRecord>> {
    self.get(&["mantenimientos"]).await
  }

  async fn get_maintenance(&self, maintenance_id: i64) -> Result<MaintenanceRecord> {
    self.get(&["mantenimientos", &id(maintenance_id)]).await
  }

  async fn create_maintenance(&self, draft: MaintenanceDraft) -> Result<()> {
    self.write(Method::POST, &["mantenimientos"], &draft).await
  }

  async fn update_maintenance(
    &self,
    record: MaintenanceRecord,
    grant: Option<&EditorGrant>,
  ) -> Result<()> {
    let body = serde_json::to_value(&record)?;
    let record_id = id(record.id);
    let segments = ["mantenimientos", record_id.as_str()];
    let (resp, what) = self.send(Method::PUT, &segments, &[], Some(body), grant).await?;
    Self::check(resp, &what, false).await?;
    Ok(())
  }

  async fn delete_maintenance(&self, maintenance_id: i64) -> Result<()> {
    self.delete(&["mantenimientos", &id(maintenance_id)]).await
  }

  // ── Spare parts and suppliers ─────────────────────────────────────────

  async fn list_spare_parts(&self, maintenance_id: i64) -> Result<Vec<SparePart>> {
    self.get(&["refacciones", "mantenimiento", &id(maintenance_id)]).await
  }

  async fn create_spare_part(&self, draft: SparePartDraft) -> Result<()> {
    self.write(Method::POST, &["refacciones"], &draft).await
  }

  async fn delete_spare_part(&self, part_id: i64) -> Result<()> {
    self.delete(&["refacciones", &id(part_id)]).await
  }

  async fn list_suppliers(&self) -> Result<Vec<String>> { self.get(&["proveedores"]).await }

  async fn supplier_spending(&self, range: Option<DateRange>) -> Result<Vec<SupplierSpending>> {
    let query: Vec<(&str, String)> = range
      .map(|r| {
        vec![
          ("fechaInicio", r.from.format("%Y-%m-%d").to_string()),
          ("fechaFin", r.to.format("%Y-%m-%d").to_string()),
        ]
      })
      .unwrap_or_default();
    let resp = self.call(Method::GET, &["proveedores", "gastos"], &query, None).await?;
    Self::decode(resp, "proveedores/gastos").await
  }

  // ── Tickets ───────────────────────────────────────────────────────────

  async fn list_tickets(&self) -> Result<Vec<Ticket>> { self.get(&["tickets"]).await }

  async fn tickets_assigned_to(&self, username: &str) -> Result<Vec<Ticket>> {
    self.get(&["tickets", "responsable", username]).await
  }

  async fn incomplete_tickets(&self) -> Result<Vec<Ticket>> {
    self.get(&["tickets", "incompletos"]).await
  }

  async fn get_ticket(&self, ticket_id: i64) -> Result<Ticket> {
    self.get(&["tickets", &id(ticket_id)]).await
  }

  async fn create_ticket(&self, ticket: NewTicket) -> Result<()> {
    self.write(Method::POST, &["tickets"], &ticket).await
  }

  async fn update_ticket(&self, ticket_id: i64, patch: TicketPatch) -> Result<()> {
    self.write(Method::PUT, &["tickets", &id(ticket_id)], &patch).await
  }

  // ── Schedules ─────────────────────────────────────────────────────────

  async fn list_schedules(&self) -> Result<Vec<Schedule>> { self.get(&["horarios"]).await }

  async fn schedules_on(&self, date: NaiveDate) -> Result<Vec<Schedule>> {
    self.get(&["horarios", "fecha", &date.format("%Y-%m-%d").to_string()]).await
  }

  async fn create_schedule(&self, draft: ScheduleDraft) -> Result<()> {
    self.write(Method::POST, &["horarios"], &draft).await
  }

  async fn update_schedule(&self, schedule_id: &str, draft: ScheduleDraft) -> Result<()> {
    self.write(Method::PUT, &["horarios", schedule_id], &draft).await
  }

  async fn delete_schedule(&self, schedule_id: &str) -> Result<()> {
    self.delete(&["horarios", schedule_id]).await
  }

  // ── Dashboard ─────────────────────────────────────────────────────────

  async fn stats(&self) -> Result<Stats> { self.get(&["estadisticas"]).await }
}
