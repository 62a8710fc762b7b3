//! Mapping of raw upstream records into stable entity shapes.
//!
//! A record missing a required field is dropped and logged; the rest of the
//! batch is kept.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::cache::Family;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

/// A normalized, immutable upstream entity.
pub trait Entity: Clone + Send + Sync + Serialize + 'static {
    const FAMILY: Family;

    /// Stable identifier used by `get_by_key`.
    fn id(&self) -> &str;

    /// Whether this entity is the one `key` names.
    fn matches_key(&self, key: &str) -> bool {
        self.id() == key.trim()
    }

    /// Build the entity from a raw record, enforcing required fields.
    fn from_raw(raw: &mut RawRecord) -> Result<Self, NormalizeError>;
}

/// One upstream record as a JSON object.
///
/// Upstream systems disagree on field naming, so fields are looked up by a
/// list of accepted names; the first one present wins.
#[derive(Debug, Default)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn take(&mut self, names: &[&str]) -> Option<Value> {
        names
            .iter()
            .find_map(|name| self.0.remove(*name).filter(|v| !v.is_null()))
    }

    /// Nested object, e.g. `{ "address": { "city": ... } }`.
    pub fn take_object(&mut self, names: &[&str]) -> Option<RawRecord> {
        match self.take(names)? {
            Value::Object(map) => Some(RawRecord(map)),
            _ => None,
        }
    }
}

impl TryFrom<Value> for RawRecord {
    type Error = NormalizeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(RawRecord(map)),
            _ => Err(NormalizeError::NotAnObject),
        }
    }
}

/// Normalize a single raw record.
pub fn normalize<T: Entity>(record: Value) -> Result<T, NormalizeError> {
    let mut raw = RawRecord::try_from(record)?;
    T::from_raw(&mut raw)
}

/// Normalize a batch, preserving upstream order and dropping bad rows.
pub fn normalize_batch<T: Entity>(records: Vec<Value>) -> Vec<T> {
    let total = records.len();
    let entities: Vec<T> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match normalize::<T>(record) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(family = %T::FAMILY, index, error = %e, "Dropping upstream record");
                None
            }
        })
        .collect();

    if entities.len() < total {
        warn!(
            family = %T::FAMILY,
            kept = entities.len(),
            dropped = total - entities.len(),
            "Upstream batch partially normalized"
        );
    }
    entities
}

/// Read a loosely typed scalar as text. Blank strings count as absent.
pub fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Like [`text`] but the field must be present.
pub fn required(value: Option<Value>, field: &'static str) -> Result<String, NormalizeError> {
    text(value).ok_or(NormalizeError::MissingField(field))
}

/// Read a loosely typed number (numbers or numeric strings).
pub fn number(value: Option<Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a loosely typed flag (`true`, `1`, `"active"`, `"Y"`...).
pub fn flag(value: Option<Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "y" | "yes" | "active" => Some(true),
            "false" | "0" | "n" | "no" | "inactive" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_trims_and_rejects_blank() {
        assert_eq!(text(Some(json!("  ACME "))), Some("ACME".to_string()));
        assert_eq!(text(Some(json!("   "))), None);
        assert_eq!(text(Some(json!(42))), Some("42".to_string()));
        assert_eq!(text(Some(json!(null))), None);
        assert_eq!(text(None), None);
    }

    #[test]
    fn test_required_reports_field() {
        assert_eq!(required(None, "name"), Err(NormalizeError::MissingField("name")));
    }

    #[test]
    fn test_raw_record_takes_first_present_name() {
        let mut raw = RawRecord::try_from(json!({ "companyId": "C1", "id": null, "name": "ACME" })).unwrap();
        assert_eq!(raw.take(&["id", "companyId"]), Some(json!("C1")));
        assert_eq!(raw.take(&["companyId"]), None);
        assert!(RawRecord::try_from(json!([1, 2])).is_err());
    }

    #[test]
    fn test_number_and_flag() {
        assert_eq!(number(Some(json!("10.5"))), Some(10.5));
        assert_eq!(number(Some(json!(3))), Some(3.0));
        assert_eq!(flag(Some(json!("Active"))), Some(true));
        assert_eq!(flag(Some(json!(0))), Some(false));
        assert_eq!(flag(Some(json!("maybe"))), None);
    }
}
