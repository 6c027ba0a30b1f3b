//! Read-only derivations over fetched maintenance data: report filters and
//! summaries, dashboard widgets and calendar slices.
//!
//! Nothing here talks to the backend; callers fetch records and equipment
//! and hand them in.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{
  catalog::Equipment,
  error::ValidationError,
  maintenance::{MaintenanceKind, MaintenanceRecord, MaintenanceStatus},
};

// ─── Date ranges ─────────────────────────────────────────────────────────────

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
  pub from: NaiveDate,
  pub to:   NaiveDate,
}

impl DateRange {
  pub fn contains(&self, date: NaiveDate) -> bool { self.from <= date && date <= self.to }
}

/// First and last day of `month` in `year`.
fn month_bounds(year: i32, month: u32) -> Option<DateRange> {
  let from = NaiveDate::from_ymd_opt(year, month, 1)?;
  let to = from.checked_add_months(Months::new(1))?.checked_sub_days(Days::new(1))?;
  Some(DateRange { from, to })
}

/// How the report period is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePreset {
  Today,
  /// Week `week` (1-based, seven-day blocks from the 1st) of `month` in the
  /// current year. The last block is clipped to the end of the month.
  Week { month: u32, week: u32 },
  /// A whole month of the current year.
  Month(u32),
  /// The whole current year.
  Year,
  Custom(DateRange),
}

impl DatePreset {
  pub fn resolve(self, today: NaiveDate) -> Result<DateRange, ValidationError> {
    let bad_month = || ValidationError::new("mes", "month must be between 1 and 12");
    match self {
      Self::Today => Ok(DateRange { from: today, to: today }),
      Self::Week { month, week } => {
        let month = month_bounds(today.year(), month).ok_or_else(bad_month)?;
        if !(1..=5).contains(&week) {
          return Err(ValidationError::new("semana", "week must be between 1 and 5"));
        }
        let from = month
          .from
          .checked_add_days(Days::new(u64::from(week - 1) * 7))
          .filter(|d| *d <= month.to)
          .ok_or_else(|| ValidationError::new("semana", "week lies past the end of the month"))?;
        let to = from.checked_add_days(Days::new(6)).map_or(month.to, |d| d.min(month.to));
        Ok(DateRange { from, to })
      }
      Self::Month(month) => month_bounds(today.year(), month).ok_or_else(bad_month),
      Self::Year => {
        let from = NaiveDate::from_ymd_opt(today.year(), 1, 1);
        let to = NaiveDate::from_ymd_opt(today.year(), 12, 31);
        from
          .zip(to)
          .map(|(from, to)| DateRange { from, to })
          .ok_or_else(|| ValidationError::new("anio", "year out of range"))
      }
      Self::Custom(range) => {
        if range.from > range.to {
          return Err(ValidationError::new("fechaFin", "end date precedes start date"));
        }
        Ok(range)
      }
    }
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Criteria for the maintenance report. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
  pub range:   Option<DateRange>,
  pub area_id: Option<i64>,
  pub type_id: Option<i64>,
  pub status:  Option<MaintenanceStatus>,
  pub kind:    Option<MaintenanceKind>,
}

impl ReportFilter {
  /// Records matching every criterion. Area and type are looked up through
  /// the record's equipment; a record whose equipment is unknown never
  /// matches an area or type criterion.
  pub fn apply<'a>(
    &self,
    records: &'a [MaintenanceRecord],
    equipment: &[Equipment],
  ) -> Vec<&'a MaintenanceRecord> {
    let by_id: HashMap<i64, &Equipment> = equipment.iter().map(|e| (e.id, e)).collect();
    records
      .iter()
      .filter(|m| self.range.is_none_or(|r| r.contains(m.scheduled_for)))
      .filter(|m| {
        self.area_id.is_none_or(|area| {
          by_id.get(&m.equipment_id).is_some_and(|e| e.area_id == area)
        })
      })
      .filter(|m| {
        self.type_id.is_none_or(|ty| {
          by_id.get(&m.equipment_id).is_some_and(|e| e.type_id == ty)
        })
      })
      .filter(|m| self.status.is_none_or(|s| m.status == s))
      .filter(|m| self.kind.is_none_or(|k| m.kind == k))
      .collect()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
  pub total:               usize,
  pub completed:           usize,
  pub in_progress:         usize,
  pub cancelled:           usize,
  pub total_cost:          Decimal,
  /// Mean start-to-finish time over completed records with both
  /// timestamps; `None` when there are none.
  pub mean_duration_hours: Option<f64>,
}

impl ReportSummary {
  pub fn of<'a>(records: impl IntoIterator<Item = &'a MaintenanceRecord>) -> Self {
    let mut summary = Self::default();
    let mut hours = Vec::new();
    for m in records {
      summary.total += 1;
      match m.status {
        MaintenanceStatus::Completed => {
          summary.completed += 1;
          hours.extend(m.duration_hours());
        }
        MaintenanceStatus::InProgress => summary.in_progress += 1,
        MaintenanceStatus::Cancelled => summary.cancelled += 1,
        MaintenanceStatus::Scheduled => {}
      }
      summary.total_cost += m.cost.unwrap_or_default();
    }
    if !hours.is_empty() {
      summary.mean_duration_hours = Some(hours.iter().sum::<f64>() / hours.len() as f64);
    }
    summary
  }
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

/// Pre-computed counters from the backend's statistics endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
  #[serde(rename = "totalEquipos")]
  pub total_equipment:       u64,
  #[serde(rename = "equiposOperativos")]
  pub operational:           u64,
  #[serde(rename = "equiposFueraServicio")]
  pub out_of_service:        u64,
  #[serde(rename = "mantenimientosProgramados")]
  pub maintenance_scheduled: u64,
  #[serde(rename = "mantenimientosPendientes")]
  pub maintenance_pending:   u64,
  #[serde(rename = "mantenimientosRealizados")]
  pub maintenance_done:      u64,
  #[serde(rename = "costoTotal")]
  pub total_cost:            Decimal,
}

/// The next `limit` open work orders by scheduled date.
pub fn upcoming(records: &[MaintenanceRecord], limit: usize) -> Vec<&MaintenanceRecord> {
  let mut open: Vec<_> = records.iter().filter(|m| m.status.is_open()).collect();
  open.sort_by_key(|m| m.scheduled_for);
  open.truncate(limit);
  open
}

pub const NO_AREA: &str = "(no area)";

/// Work orders per area name.
pub fn counts_by_area(records: &[MaintenanceRecord]) -> BTreeMap<String, usize> {
  let mut counts = BTreeMap::new();
  for m in records {
    let area = m.area_name.as_deref().filter(|a| !a.is_empty()).unwrap_or(NO_AREA);
    *counts.entry(area.to_owned()).or_default() += 1;
  }
  counts
}

/// Work orders per kind, every kind listed even when zero.
pub fn counts_by_kind(records: &[MaintenanceRecord]) -> Vec<(MaintenanceKind, usize)> {
  MaintenanceKind::iter()
    .map(|kind| (kind, records.iter().filter(|m| m.kind == kind).count()))
    .collect()
}

// ─── Calendar ────────────────────────────────────────────────────────────────

pub fn on_day(records: &[MaintenanceRecord], date: NaiveDate) -> Vec<&MaintenanceRecord> {
  records.iter().filter(|m| m.scheduled_for == date).collect()
}

/// Records scheduled in the given month, earliest first.
pub fn in_month(records: &[MaintenanceRecord], year: i32, month: u32) -> Vec<&MaintenanceRecord> {
  let mut hits: Vec<_> = records
    .iter()
    .filter(|m| m.scheduled_for.year() == year && m.scheduled_for.month() == month)
    .collect();
  hits.sort_by_key(|m| m.scheduled_for);
  hits
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::maintenance::tests::record;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

  fn on(date: NaiveDate, status: MaintenanceStatus) -> MaintenanceRecord {
    let mut r = record(status);
    r.scheduled_for = date;
    r
  }

  fn equipment(id: i64, area_id: i64, type_id: i64) -> Equipment {
    serde_json::from_value(serde_json::json!({
      "id_equipo": id, "numero_serie": format!("S{id}"),
      "id_area": area_id, "id_tipo": type_id
    }))
    .unwrap()
  }

  #[test]
  fn week_preset_clips_to_month_end() {
    let today = d(2025, 3, 10);
    let w1 = DatePreset::Week { month: 2, week: 1 }.resolve(today).unwrap();
    assert_eq!((w1.from, w1.to), (d(2025, 2, 1), d(2025, 2, 7)));
    let w4 = DatePreset::Week { month: 2, week: 4 }.resolve(today).unwrap();
    assert_eq!((w4.from, w4.to), (d(2025, 2, 22), d(2025, 2, 28)));
    assert!(DatePreset::Week { month: 2, week: 5 }.resolve(today).is_err());
    let w5 = DatePreset::Week { month: 3, week: 5 }.resolve(today).unwrap();
    assert_eq!((w5.from, w5.to), (d(2025, 3, 29), d(2025, 3, 31)));
  }

  #[test]
  fn month_year_and_custom_presets() {
    let today = d(2024, 6, 15);
    let feb = DatePreset::Month(2).resolve(today).unwrap();
    assert_eq!(feb.to, d(2024, 2, 29));
    let dec = DatePreset::Month(12).resolve(today).unwrap();
    assert_eq!(dec.to, d(2024, 12, 31));
    assert!(DatePreset::Month(13).resolve(today).is_err());

    let year = DatePreset::Year.resolve(today).unwrap();
    assert_eq!((year.from, year.to), (d(2024, 1, 1), d(2024, 12, 31)));

    let backwards = DateRange { from: d(2024, 2, 1), to: d(2024, 1, 1) };
    assert!(DatePreset::Custom(backwards).resolve(today).is_err());
  }

  #[test]
  fn filter_joins_equipment_for_area_and_type() {
    let mut a = on(d(2025, 1, 5), MaintenanceStatus::Completed);
    a.equipment_id = 1;
    let mut b = on(d(2025, 1, 6), MaintenanceStatus::Scheduled);
    b.equipment_id = 2;
    let mut orphan = on(d(2025, 1, 7), MaintenanceStatus::Scheduled);
    orphan.equipment_id = 99;
    let records = [a, b, orphan];
    let equipment = [equipment(1, 10, 100), equipment(2, 20, 100)];

    let by_area = ReportFilter { area_id: Some(10), ..Default::default() };
    assert_eq!(by_area.apply(&records, &equipment).len(), 1);

    let by_type = ReportFilter { type_id: Some(100), ..Default::default() };
    assert_eq!(by_type.apply(&records, &equipment).len(), 2);

    let everything = ReportFilter::default();
    assert_eq!(everything.apply(&records, &equipment).len(), 3);

    let range = ReportFilter {
      range: Some(DateRange { from: d(2025, 1, 6), to: d(2025, 1, 7) }),
      status: Some(MaintenanceStatus::Scheduled),
      ..Default::default()
    };
    assert_eq!(range.apply(&records, &equipment).len(), 2);
  }

  #[test]
  fn summary_counts_costs_and_mean_duration() {
    let mut done_a = record(MaintenanceStatus::Completed);
    done_a.started_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap());
    done_a.completed_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap());
    done_a.cost = Some(Decimal::new(100, 0));
    let mut done_b = done_a.clone();
    done_b.completed_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap());
    done_b.cost = Some(Decimal::new(5050, 2));
    // Completed without timestamps does not count towards the mean.
    let done_c = record(MaintenanceStatus::Completed);
    let running = record(MaintenanceStatus::InProgress);
    let dropped = record(MaintenanceStatus::Cancelled);

    let all = [done_a, done_b, done_c, running, dropped];
    let s = ReportSummary::of(&all);
    assert_eq!(s.total, 5);
    assert_eq!(s.completed, 3);
    assert_eq!(s.in_progress, 1);
    assert_eq!(s.cancelled, 1);
    assert_eq!(s.total_cost, Decimal::new(15050, 2));
    assert_eq!(s.mean_duration_hours, Some(3.0));

    assert_eq!(ReportSummary::of(std::iter::empty()).mean_duration_hours, None);
  }

  #[test]
  fn upcoming_takes_first_open_records_by_date() {
    let mut records: Vec<_> = (1..=8)
      .rev()
      .map(|day| on(d(2025, 4, day), MaintenanceStatus::Scheduled))
      .collect();
    records.push(on(d(2025, 3, 1), MaintenanceStatus::Completed));
    records.push(on(d(2025, 3, 2), MaintenanceStatus::InProgress));

    let next = upcoming(&records, 5);
    let days: Vec<_> = next.iter().map(|m| m.scheduled_for).collect();
    assert_eq!(days, [d(2025, 3, 2), d(2025, 4, 1), d(2025, 4, 2), d(2025, 4, 3), d(2025, 4, 4)]);
  }

  #[test]
  fn counts_by_area_and_kind() {
    let mut lobby = record(MaintenanceStatus::Scheduled);
    lobby.area_name = Some("Lobby".into());
    let mut fix = lobby.clone();
    fix.kind = MaintenanceKind::Corrective;
    let nowhere = record(MaintenanceStatus::Scheduled);
    let all = [lobby, fix, nowhere];

    let areas = counts_by_area(&all);
    assert_eq!(areas["Lobby"], 2);
    assert_eq!(areas[NO_AREA], 1);

    let kinds = counts_by_kind(&all);
    assert_eq!(kinds, [
      (MaintenanceKind::Preventive, 2),
      (MaintenanceKind::Corrective, 1),
      (MaintenanceKind::Inspection, 0),
    ]);
  }

  #[test]
  fn calendar_slices() {
    let records = [
      on(d(2025, 5, 20), MaintenanceStatus::Scheduled),
      on(d(2025, 5, 2), MaintenanceStatus::Scheduled),
      on(d(2025, 6, 2), MaintenanceStatus::Scheduled),
    ];
    assert_eq!(on_day(&records, d(2025, 5, 2)).len(), 1);
    let may: Vec<_> = in_month(&records, 2025, 5).iter().map(|m| m.scheduled_for).collect();
    assert_eq!(may, [d(2025, 5, 2), d(2025, 5, 20)]);
  }

  #[test]
  fn stats_decode_with_missing_counters() {
    let s: Stats =
      serde_json::from_str(r#"{"totalEquipos": 12, "equiposOperativos": 9, "costoTotal": 1520.5}"#)
        .unwrap();
    assert_eq!(s.total_equipment, 12);
    assert_eq!(s.maintenance_pending, 0);
    assert_eq!(s.total_cost, Decimal::new(15205, 1));
  }
}
