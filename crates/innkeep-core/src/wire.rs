//! Lenient date codecs for the backend's JSON.
//!
//! The backend is inconsistent about dates: calendar dates arrive either as
//! `YYYY-MM-DD` or as a full RFC 3339 timestamp at midnight UTC, and
//! timestamps occasionally arrive without an offset. Everything is written
//! back in canonical form.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer, de::Error as DeError};

const DATE_FMT: &str = "%Y-%m-%d";

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  if let Ok(d) = NaiveDate::parse_from_str(raw, DATE_FMT) {
    return Some(d);
  }
  parse_timestamp(raw).map(|ts| ts.date_naive())
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  let raw = raw.trim();
  if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
    return Some(ts.with_timezone(&Utc));
  }
  ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|naive| naive.and_utc())
}

/// Required calendar date.
pub mod date {
  use super::*;

  pub fn serialize<S: Serializer>(value: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&value.format(DATE_FMT).to_string())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(d)?;
    parse_date(&raw).ok_or_else(|| DeError::custom(format!("invalid date: {raw:?}")))
  }
}

/// Optional calendar date; empty strings read as absent.
pub mod opt_date {
  use super::*;

  pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
    match value {
      Some(d) => s.serialize_str(&d.format(DATE_FMT).to_string()),
      None => s.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    match Option::<String>::deserialize(d)? {
      None => Ok(None),
      Some(raw) if raw.trim().is_empty() => Ok(None),
      Some(raw) => parse_date(&raw)
        .map(Some)
        .ok_or_else(|| DeError::custom(format!("invalid date: {raw:?}"))),
    }
  }
}

/// Required timestamp.
pub mod timestamp {
  use super::*;

  pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_rfc3339())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    parse_timestamp(&raw).ok_or_else(|| DeError::custom(format!("invalid timestamp: {raw:?}")))
  }
}

/// Optional timestamp. Absent values are written as explicit `null` so that
/// clearing a timestamp (e.g. on reopen) reaches the backend.
pub mod opt_timestamp {
  use super::*;

  pub fn serialize<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    s: S,
  ) -> Result<S::Ok, S::Error> {
    match value {
      Some(ts) => s.serialize_str(&ts.to_rfc3339()),
      None => s.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    d: D,
  ) -> Result<Option<DateTime<Utc>>, D::Error> {
    match Option::<String>::deserialize(d)? {
      None => Ok(None),
      Some(raw) if raw.trim().is_empty() => Ok(None),
      Some(raw) => parse_timestamp(&raw)
        .map(Some)
        .ok_or_else(|| DeError::custom(format!("invalid timestamp: {raw:?}"))),
    }
  }
}
