//! Work orders: scheduling, the start/finish/cancel/reopen lifecycle, and
//! spare-part usage.

use innkeep_core::{
  EditorGrant, Error as CoreError, Identity,
  catalog::EquipmentStatus,
  gateway::Gateway,
  maintenance::{self, MaintenanceDraft, MaintenanceRecord, SparePart, SparePartDraft, Transition},
};
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use super::{Context, require_admin};
use crate::Result;

pub struct MaintenanceWorkflow<G> {
  cx: Context<G>,
}

impl<G: Gateway> MaintenanceWorkflow<G> {
  pub fn new(cx: Context<G>) -> Self { Self { cx } }

  /// Work orders the actor may see: all of them for an admin, otherwise the
  /// ones assigned to the actor.
  pub async fn list_visible(&self) -> Result<Vec<MaintenanceRecord>> {
    let actor = self.cx.actor()?;
    let all = self.cx.gateway().list_maintenance().await?;
    Ok(maintenance::visible_to(&all, &actor).cloned().collect())
  }

  pub async fn get(&self, id: i64) -> Result<MaintenanceRecord> {
    Ok(self.cx.gateway().get_maintenance(id).await?)
  }

  /// Create a work order (`id == None`) or edit an existing one.
  ///
  /// Completed and cancelled work orders can only be edited in editor mode.
  pub async fn save(&self, id: Option<i64>, draft: MaintenanceDraft) -> Result<()> {
    draft.validate()?;
    let actor = self.cx.actor()?;
    require_admin(&actor, "schedule maintenance")?;
    let gateway = self.cx.gateway();

    let Some(id) = id else {
      let equipment_id = draft.equipment_id;
      gateway
        .create_maintenance(MaintenanceDraft { status: Default::default(), ..draft })
        .await?;
      info!(equipment_id, "work order scheduled");
      return Ok(());
    };

    let current = gateway.get_maintenance(id).await?;
    let next = draft.apply_to(&current)?;
    let grant = if current.status.is_locked() {
      let grant = self.cx.grant_for(&actor)?.ok_or_else(|| {
        CoreError::Forbidden(format!(
          "maintenance {id} is {}; enable editor mode to change it",
          current.status
        ))
      })?;
      Some(grant)
    } else {
      None
    };
    gateway.update_maintenance(next, grant.as_ref()).await?;
    info!(maintenance_id = id, "work order edited");
    Ok(())
  }

  pub async fn delete(&self, id: i64) -> Result<()> {
    let actor = self.cx.actor()?;
    require_admin(&actor, "delete maintenance")?;
    self.cx.gateway().delete_maintenance(id).await?;
    info!(maintenance_id = id, "work order deleted");
    Ok(())
  }

  // ── Lifecycle ───────────────────────────────────────────────────────────

  pub async fn start(&self, id: i64) -> Result<MaintenanceRecord> {
    let (actor, record) = self.load(id).await?;
    let t = maintenance::start(&record, &actor, self.cx.clock().now_utc())?;
    self.apply(&record, t, None).await
  }

  pub async fn finish(&self, id: i64) -> Result<MaintenanceRecord> {
    let (actor, record) = self.load(id).await?;
    let t = maintenance::finish(&record, &actor, self.cx.clock().now_utc())?;
    self.apply(&record, t, None).await
  }

  pub async fn cancel(&self, id: i64) -> Result<MaintenanceRecord> {
    let (actor, record) = self.load(id).await?;
    let t = maintenance::cancel(&record, &actor)?;
    self.apply(&record, t, None).await
  }

  pub async fn reopen(&self, id: i64) -> Result<MaintenanceRecord> {
    let (actor, record) = self.load(id).await?;
    let grant = self.cx.grant_for(&actor)?;
    let t = maintenance::reopen(&record, &actor, grant.as_ref(), self.cx.clock().now_utc())?;
    self.apply(&record, t, grant.as_ref()).await
  }

  /// Replace description and notes, leaving the status alone.
  pub async fn update_observations(
    &self,
    id: i64,
    description: Option<String>,
    notes: Option<String>,
  ) -> Result<MaintenanceRecord> {
    let (actor, record) = self.load(id).await?;
    let next = maintenance::update_observations(&record, &actor, description, notes)?;
    self.cx.gateway().update_maintenance(next.clone(), None).await?;
    info!(maintenance_id = id, "observations updated");
    Ok(next)
  }

  // ── Spare parts ─────────────────────────────────────────────────────────

  pub async fn spare_parts(&self, maintenance_id: i64) -> Result<Vec<SparePart>> {
    Ok(self.cx.gateway().list_spare_parts(maintenance_id).await?)
  }

  pub async fn add_spare_part(&self, draft: SparePartDraft) -> Result<()> {
    draft.validate()?;
    let (actor, record) = self.load(draft.maintenance_id).await?;
    maintenance::check_spare_part(&record, &actor, &draft)?;
    let (maintenance_id, quantity) = (draft.maintenance_id, draft.quantity);
    self.cx.gateway().create_spare_part(draft).await?;
    info!(maintenance_id, quantity, "spare part recorded");
    Ok(())
  }

  pub async fn remove_spare_part(&self, maintenance_id: i64, part_id: i64) -> Result<()> {
    let (actor, record) = self.load(maintenance_id).await?;
    maintenance::check_spare_part_removal(&record, &actor)?;
    self.cx.gateway().delete_spare_part(part_id).await?;
    info!(maintenance_id, part_id, "spare part removed");
    Ok(())
  }

  pub async fn total_cost(&self, maintenance_id: i64) -> Result<Decimal> {
    let parts = self.spare_parts(maintenance_id).await?;
    Ok(maintenance::total_cost(&parts))
  }

  // ── Internals ───────────────────────────────────────────────────────────

  async fn load(&self, id: i64) -> Result<(Identity, MaintenanceRecord)> {
    let actor = self.cx.actor()?;
    let record = self.cx.gateway().get_maintenance(id).await?;
    Ok((actor, record))
  }

  /// Write the record, then the equipment status it implies. If the second
  /// write fails the first is rolled back.
  async fn apply(
    &self,
    before: &MaintenanceRecord,
    t: Transition,
    grant: Option<&EditorGrant>,
  ) -> Result<MaintenanceRecord> {
    let gateway = self.cx.gateway();
    let Transition { record, equipment_status } = t;
    gateway.update_maintenance(record.clone(), grant).await?;

    let equipment_write = match equipment_status {
      Some(status) => self.set_equipment_status(record.equipment_id, status).await,
      None => Ok(()),
    };
    if let Err(e) = equipment_write {
      warn!(
        maintenance_id = record.id,
        equipment_id = record.equipment_id,
        error = %e,
        "equipment update failed, restoring work order"
      );
      if let Err(undo) = gateway.update_maintenance(before.clone(), grant).await {
        error!(maintenance_id = record.id, error = %undo, "could not restore work order");
      }
      return Err(e.into());
    }

    info!(
      maintenance_id = record.id,
      from = %before.status,
      to = %record.status,
      "work order transitioned"
    );
    Ok(record)
  }

  async fn set_equipment_status(&self, id: i64, status: EquipmentStatus) -> innkeep_core::Result<()> {
    let gateway = self.cx.gateway();
    let mut draft = gateway.get_equipment(id).await?.to_draft();
    draft.status = status;
    gateway.update_equipment(id, draft).await
  }
}
