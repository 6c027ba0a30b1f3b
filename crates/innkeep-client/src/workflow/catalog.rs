//! Areas, equipment types and the equipment inventory.
//!
//! Reads are open to any logged-in user; changes are for admins.

use innkeep_core::{
  catalog::{
    Area, AreaDraft, Equipment, EquipmentDraft, EquipmentStatus, EquipmentType,
    EquipmentTypeDraft,
  },
  gateway::Gateway,
};
use tracing::info;

use super::{Context, require_admin};
use crate::Result;

pub struct CatalogWorkflow<G> {
  cx: Context<G>,
}

impl<G: Gateway> CatalogWorkflow<G> {
  pub fn new(cx: Context<G>) -> Self { Self { cx } }

  fn require_admin(&self) -> Result<()> { require_admin(&self.cx.actor()?, "change the catalog") }

  // ── Areas ───────────────────────────────────────────────────────────────

  pub async fn areas(&self) -> Result<Vec<Area>> { Ok(self.cx.gateway().list_areas().await?) }

  pub async fn save_area(&self, id: Option<i64>, draft: AreaDraft) -> Result<()> {
    draft.validate()?;
    self.require_admin()?;
    let gateway = self.cx.gateway();
    match id {
      Some(id) => gateway.update_area(id, draft).await?,
      None => gateway.create_area(draft).await?,
    }
    info!(area_id = ?id, "area saved");
    Ok(())
  }

  /// Refused by the backend with `Conflict` while equipment is still there.
  pub async fn delete_area(&self, id: i64) -> Result<()> {
    self.require_admin()?;
    self.cx.gateway().delete_area(id).await?;
    info!(area_id = id, "area deleted");
    Ok(())
  }

  // ── Equipment types ─────────────────────────────────────────────────────

  pub async fn types(&self) -> Result<Vec<EquipmentType>> {
    Ok(self.cx.gateway().list_types().await?)
  }

  pub async fn save_type(&self, id: Option<i64>, draft: EquipmentTypeDraft) -> Result<()> {
    draft.validate()?;
    self.require_admin()?;
    let gateway = self.cx.gateway();
    match id {
      Some(id) => gateway.update_type(id, draft).await?,
      None => gateway.create_type(draft).await?,
    }
    info!(type_id = ?id, "equipment type saved");
    Ok(())
  }

  pub async fn delete_type(&self, id: i64) -> Result<()> {
    self.require_admin()?;
    self.cx.gateway().delete_type(id).await?;
    info!(type_id = id, "equipment type deleted");
    Ok(())
  }

  // ── Equipment ───────────────────────────────────────────────────────────

  pub async fn equipment(&self) -> Result<Vec<Equipment>> {
    Ok(self.cx.gateway().list_equipment().await?)
  }

  pub async fn get_equipment(&self, id: i64) -> Result<Equipment> {
    Ok(self.cx.gateway().get_equipment(id).await?)
  }

  /// Create or edit equipment. The status in `draft` is ignored: new
  /// equipment starts operational and edits keep the stored status, which
  /// only the maintenance lifecycle moves.
  pub async fn save_equipment(&self, id: Option<i64>, draft: EquipmentDraft) -> Result<()> {
    draft.validate()?;
    self.require_admin()?;
    let gateway = self.cx.gateway();
    match id {
      Some(id) => {
        let status = gateway.get_equipment(id).await?.status;
        gateway.update_equipment(id, EquipmentDraft { status, ..draft }).await?
      }
      None => {
        let draft = EquipmentDraft { status: EquipmentStatus::Operational, ..draft };
        gateway.create_equipment(draft).await?
      }
    }
    info!(equipment_id = ?id, "equipment saved");
    Ok(())
  }

  pub async fn delete_equipment(&self, id: i64) -> Result<()> {
    self.require_admin()?;
    self.cx.gateway().delete_equipment(id).await?;
    info!(equipment_id = id, "equipment deleted");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use innkeep_core::{Category, Role};

  use super::*;
  use crate::workflow::testing::logged_in;

  fn area(name: &str) -> AreaDraft { AreaDraft { name: name.into(), description: None } }

  #[tokio::test]
  async fn blank_names_are_rejected_locally() {
    let wf = CatalogWorkflow::new(logged_in("root", Role::Admin).await);
    let err = wf.save_area(None, area("   ")).await.unwrap_err();
    assert_eq!(err.category(), Category::Validation);
    let err = wf
      .save_type(None, EquipmentTypeDraft { name: String::new(), description: None })
      .await
      .unwrap_err();
    assert_eq!(err.category(), Category::Validation);
    let err = wf.save_equipment(None, EquipmentDraft::default()).await.unwrap_err();
    assert_eq!(err.category(), Category::Validation);
    assert_eq!(wf.cx.gateway().total_calls(), 1, "only the login call");
  }

  #[tokio::test]
  async fn area_with_equipment_cannot_be_deleted() {
    let wf = CatalogWorkflow::new(logged_in("root", Role::Admin).await);
    let lobby = wf.cx.gateway().seed_area("Lobby");
    wf.save_equipment(
      None,
      EquipmentDraft { serial_number: "EL-01".into(), area_id: lobby, type_id: 1, ..Default::default() },
    )
    .await
    .unwrap();

    let err = wf.delete_area(lobby).await.unwrap_err();
    assert_eq!(err.category(), Category::NotFoundOrConflict);
    assert_eq!(wf.areas().await.unwrap().len(), 1);

    let id = wf.equipment().await.unwrap()[0].id;
    wf.delete_equipment(id).await.unwrap();
    wf.delete_area(lobby).await.unwrap();
    assert!(wf.areas().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn staff_can_read_but_not_change_the_catalog() {
    let wf = CatalogWorkflow::new(logged_in("mlopez", Role::Maintenance).await);
    wf.cx.gateway().seed_area("Cocina");
    assert_eq!(wf.areas().await.unwrap().len(), 1);
    let err = wf.save_area(None, area("Spa")).await.unwrap_err();
    assert_eq!(err.category(), Category::Rule);
  }

  #[tokio::test]
  async fn catalog_edits_never_move_equipment_status() {
    let wf = CatalogWorkflow::new(logged_in("root", Role::Admin).await);
    let draft = EquipmentDraft {
      serial_number: "CAL-7".into(),
      area_id: 1,
      type_id: 1,
      status: EquipmentStatus::Decommissioned,
      ..Default::default()
    };
    wf.save_equipment(None, draft.clone()).await.unwrap();
    let created = wf.equipment().await.unwrap().remove(0);
    assert_eq!(created.status, EquipmentStatus::Operational);

    let fake = wf.cx.gateway();
    let mut in_service = created.to_draft();
    in_service.status = EquipmentStatus::InMaintenance;
    fake.update_equipment(created.id, in_service).await.unwrap();

    let edit = EquipmentDraft {
      brand: Some("Bosch".into()),
      status: EquipmentStatus::Operational,
      ..draft
    };
    wf.save_equipment(Some(created.id), edit).await.unwrap();
    let stored = wf.get_equipment(created.id).await.unwrap();
    assert_eq!(stored.status, EquipmentStatus::InMaintenance);
    assert_eq!(stored.brand.as_deref(), Some("Bosch"));
  }

  #[tokio::test]
  async fn areas_can_be_renamed() {
    let wf = CatalogWorkflow::new(logged_in("root", Role::Admin).await);
    wf.save_area(None, area("Alberca")).await.unwrap();
    let id = wf.areas().await.unwrap()[0].id;
    wf.save_area(Some(id), area("Alberca techada")).await.unwrap();
    assert_eq!(wf.areas().await.unwrap()[0].name, "Alberca techada");
  }
}
