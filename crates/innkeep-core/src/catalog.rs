//! Catalog entities: areas, equipment types, and the equipment itself.
//!
//! Field names follow the backend's JSON shapes; Rust-side names are English.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::error::ValidationError;

// ─── Areas and types ─────────────────────────────────────────────────────────

/// A physical area of the hotel (lobby, kitchen, floor 3, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
  #[serde(rename = "id_area")]
  pub id:          i64,
  #[serde(rename = "nombre_area")]
  pub name:        String,
  #[serde(rename = "descripcion", default)]
  pub description: Option<String>,
}

/// Input to create or rename an area.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AreaDraft {
  #[serde(rename = "nombre_area")]
  pub name:        String,
  #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl AreaDraft {
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.name.trim().is_empty() {
      return Err(ValidationError::required("nombre_area"));
    }
    Ok(())
  }
}

/// A category of equipment (boiler, elevator, air handler, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentType {
  #[serde(rename = "id_tipo")]
  pub id:          i64,
  #[serde(rename = "nombre_tipo", default)]
  pub name:        String,
  #[serde(rename = "descripcion", default)]
  pub description: Option<String>,
}

/// Input to create or rename an equipment type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EquipmentTypeDraft {
  #[serde(rename = "nombre_tipo")]
  pub name:        String,
  #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl EquipmentTypeDraft {
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.name.trim().is_empty() {
      return Err(ValidationError::required("nombre_tipo"));
    }
    Ok(())
  }
}

// ─── Equipment ───────────────────────────────────────────────────────────────

/// Operational state of a piece of equipment.
///
/// Only maintenance transitions move it; catalog edits keep whatever is
/// stored, and new equipment starts `Operational`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum EquipmentStatus {
  #[default]
  #[serde(rename = "Operativo")]
  #[strum(serialize = "Operativo")]
  Operational,
  #[serde(rename = "Fuera de Servicio")]
  #[strum(serialize = "Fuera de Servicio")]
  OutOfService,
  #[serde(rename = "En Mantenimiento", alias = "En mantenimiento")]
  #[strum(serialize = "En Mantenimiento")]
  InMaintenance,
  #[serde(rename = "Dado de Baja")]
  #[strum(serialize = "Dado de Baja")]
  Decommissioned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
  #[serde(rename = "id_equipo")]
  pub id:               i64,
  #[serde(rename = "numero_serie", default)]
  pub serial_number:    String,
  #[serde(rename = "id_area")]
  pub area_id:          i64,
  #[serde(rename = "id_tipo")]
  pub type_id:          i64,
  #[serde(rename = "marca", default)]
  pub brand:            Option<String>,
  #[serde(rename = "modelo", default)]
  pub model:            Option<String>,
  #[serde(rename = "fecha_adquisicion", default, with = "crate::wire::opt_date")]
  pub acquired_on:      Option<NaiveDate>,
  #[serde(rename = "estado", default)]
  pub status:           EquipmentStatus,
  #[serde(rename = "ubicacion_especifica", default)]
  pub location:         Option<String>,
  #[serde(rename = "costo_adquisicion", default)]
  pub acquisition_cost: Option<Decimal>,
  #[serde(rename = "vida_util_anos", default)]
  pub service_years:    Option<u32>,
  #[serde(rename = "observaciones", default)]
  pub notes:            Option<String>,
  /// Denormalised area name; read-only, filled in by the backend.
  #[serde(rename = "nombre_area", default, skip_serializing)]
  pub area_name:        Option<String>,
  /// Denormalised type name; read-only, filled in by the backend.
  #[serde(rename = "nombre_tipo", default, skip_serializing)]
  pub type_name:        Option<String>,
}

impl Equipment {
  /// Human label: "brand model" when both are known, else the serial number.
  pub fn display_name(&self) -> String {
    match (self.brand.as_deref(), self.model.as_deref()) {
      (Some(b), Some(m)) if !b.is_empty() && !m.is_empty() => format!("{b} {m}"),
      _ if !self.serial_number.is_empty() => self.serial_number.clone(),
      _ => "N/A".to_owned(),
    }
  }

  /// The editable part of this equipment, e.g. to write back a new status.
  pub fn to_draft(&self) -> EquipmentDraft {
    EquipmentDraft {
      serial_number:    self.serial_number.clone(),
      area_id:          self.area_id,
      type_id:          self.type_id,
      brand:            self.brand.clone(),
      model:            self.model.clone(),
      acquired_on:      self.acquired_on,
      status:           self.status,
      location:         self.location.clone(),
      acquisition_cost: self.acquisition_cost,
      service_years:    self.service_years,
      notes:            self.notes.clone(),
    }
  }
}

/// Input to create or update equipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EquipmentDraft {
  #[serde(rename = "numero_serie")]
  pub serial_number:    String,
  #[serde(rename = "id_area")]
  pub area_id:          i64,
  #[serde(rename = "id_tipo")]
  pub type_id:          i64,
  #[serde(rename = "marca", skip_serializing_if = "Option::is_none")]
  pub brand:            Option<String>,
  #[serde(rename = "modelo", skip_serializing_if = "Option::is_none")]
  pub model:            Option<String>,
  #[serde(rename = "fecha_adquisicion", with = "crate::wire::opt_date")]
  pub acquired_on:      Option<NaiveDate>,
  #[serde(rename = "estado")]
  pub status:           EquipmentStatus,
  #[serde(rename = "ubicacion_especifica", skip_serializing_if = "Option::is_none")]
  pub location:         Option<String>,
  #[serde(rename = "costo_adquisicion", skip_serializing_if = "Option::is_none")]
  pub acquisition_cost: Option<Decimal>,
  #[serde(rename = "vida_util_anos", skip_serializing_if = "Option::is_none")]
  pub service_years:    Option<u32>,
  #[serde(rename = "observaciones", skip_serializing_if = "Option::is_none")]
  pub notes:            Option<String>,
}

impl EquipmentDraft {
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.serial_number.trim().is_empty() {
      return Err(ValidationError::required("numero_serie"));
    }
    if self.area_id <= 0 {
      return Err(ValidationError::new("id_area", "an area must be selected"));
    }
    if self.type_id <= 0 {
      return Err(ValidationError::new("id_tipo", "an equipment type must be selected"));
    }
    Ok(())
  }
}
