//! Staff availability: one on/off-duty entry per employee per day.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Number of consecutive days covered by a week plan.
pub const WEEK_DAYS: u64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
  /// The backend hands out either numeric or string identifiers here.
  #[serde(rename = "id_horario", deserialize_with = "id_as_string")]
  pub id:        String,
  pub username:  String,
  #[serde(rename = "fecha", with = "crate::wire::date")]
  pub date:      NaiveDate,
  #[serde(rename = "disponible", default = "available_by_default")]
  pub available: bool,
  #[serde(rename = "motivo", default)]
  pub reason:    Option<String>,
}

fn available_by_default() -> bool { true }

fn id_as_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Id {
    Num(i64),
    Str(String),
  }
  Ok(match Id::deserialize(d)? {
    Id::Num(n) => n.to_string(),
    Id::Str(s) => s,
  })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleDraft {
  pub username:  String,
  #[serde(rename = "fecha", with = "crate::wire::opt_date")]
  pub date:      Option<NaiveDate>,
  #[serde(rename = "disponible")]
  pub available: bool,
  #[serde(rename = "motivo", skip_serializing_if = "Option::is_none")]
  pub reason:    Option<String>,
}

impl Default for ScheduleDraft {
  fn default() -> Self {
    Self { username: String::new(), date: None, available: true, reason: None }
  }
}

impl ScheduleDraft {
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.username.trim().is_empty() {
      return Err(ValidationError::required("username"));
    }
    if self.date.is_none() {
      return Err(ValidationError::required("fecha"));
    }
    Ok(())
  }
}

impl From<&Schedule> for ScheduleDraft {
  fn from(s: &Schedule) -> Self {
    Self {
      username:  s.username.clone(),
      date:      Some(s.date),
      available: s.available,
      reason:    s.reason.clone(),
    }
  }
}

// ─── Week batch ──────────────────────────────────────────────────────────────

/// One employee's availability for a whole week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekEmployee {
  pub username:  String,
  pub available: bool,
  pub reason:    Option<String>,
}

/// Availability for a set of employees over seven days from `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekPlan {
  pub start:     NaiveDate,
  pub employees: Vec<WeekEmployee>,
}

impl WeekPlan {
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.employees.is_empty() {
      return Err(ValidationError::new("empleados", "at least one employee is required"));
    }
    if self.employees.iter().any(|e| e.username.trim().is_empty()) {
      return Err(ValidationError::required("username"));
    }
    Ok(())
  }

  /// One draft per employee per day, day-major.
  pub fn entries(&self) -> Vec<ScheduleDraft> {
    (0..WEEK_DAYS)
      .filter_map(|offset| self.start.checked_add_days(Days::new(offset)))
      .flat_map(|date| {
        self.employees.iter().map(move |e| ScheduleDraft {
          username:  e.username.trim().to_owned(),
          date:      Some(date),
          available: e.available,
          reason:    e.reason.clone().filter(|r| !r.trim().is_empty()),
        })
      })
      .collect()
  }
}

/// An entry of a batch the backend refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
  pub username: String,
  pub date:     NaiveDate,
  pub reason:   String,
}

/// Aggregate result of a non-atomic batch: entries that were created stay
/// created even when others fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
  pub created: usize,
  pub failed:  Vec<BatchFailure>,
}

impl BatchOutcome {
  pub fn is_complete(&self) -> bool { self.failed.is_empty() }

  pub fn attempted(&self) -> usize { self.created + self.failed.len() }
}

/// Entries on a given day, in username order.
pub fn on_date(schedules: &[Schedule], date: NaiveDate) -> Vec<&Schedule> {
  let mut day: Vec<_> = schedules.iter().filter(|s| s.date == date).collect();
  day.sort_by(|a, b| a.username.cmp(&b.username));
  day
}
