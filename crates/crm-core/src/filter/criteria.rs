//! Filter criteria and the predicate evaluator.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{Contact, Deal, Lead};
use crate::utils::{coerce_amount, contains_ignore_case, end_of_day, option_amount, option_date, start_of_day};

/// Inclusive calendar-date bounds. The end date covers its whole day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
    #[serde(with = "option_date")]
    pub start: Option<NaiveDate>,
    #[serde(with = "option_date")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    fn contains(&self, timestamp: Option<DateTime<Utc>>) -> bool {
        if self.is_empty() {
            return true;
        }
        let Some(ts) = timestamp else {
            return false;
        };
        self.start.is_none_or(|start| ts >= start_of_day(start))
            && self.end.is_none_or(|end| ts <= end_of_day(end))
    }
}

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueRange {
    #[serde(with = "option_amount")]
    pub min: Option<f64>,
    #[serde(with = "option_amount")]
    pub max: Option<f64>,
}

impl ValueRange {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// A missing amount is compared as 0.
    fn contains(&self, amount: Option<f64>) -> bool {
        let amount = coerce_amount(amount);
        self.min.is_none_or(|min| amount >= min) && self.max.is_none_or(|max| amount <= max)
    }
}

/// Independent predicate groups, AND-ed together.
///
/// The default value matches every record. Serialized in the shape filter
/// presets are stored in; empty strings read as unset bounds:
///
/// ```json
/// { "dateRange": { "start": "", "end": "" },
///   "valueRange": { "min": "150", "max": "" },
///   "lastContactDate": "",
///   "customFields": { "notes": "renewal" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    pub date_range: DateRange,
    pub value_range: ValueRange,
    #[serde(with = "option_date")]
    pub last_contact_date: Option<NaiveDate>,
    pub custom_fields: BTreeMap<String, String>,
}

impl FilterSpec {
    /// True when no group is active.
    pub fn is_empty(&self) -> bool {
        self.date_range.is_empty()
            && self.value_range.is_empty()
            && self.last_contact_date.is_none()
            && self.custom_fields.is_empty()
    }

    pub fn date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.date_range = DateRange { start, end };
        self
    }

    pub fn value_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.value_range = ValueRange { min, max };
        self
    }

    pub fn last_contact_since(mut self, date: NaiveDate) -> Self {
        self.last_contact_date = Some(date);
        self
    }

    pub fn custom_field(mut self, key: impl Into<String>, needle: impl Into<String>) -> Self {
        self.custom_fields.insert(key.into(), needle.into());
        self
    }

    /// Whether `record` passes every active group.
    pub fn matches<T: Filterable>(&self, record: &T) -> bool {
        self.date_range.contains(record.timestamp())
            && (self.value_range.is_empty() || self.value_range.contains(record.amount()))
            && self.last_contact_date.is_none_or(|threshold| {
                record
                    .last_contact()
                    .is_some_and(|ts| ts >= start_of_day(threshold))
            })
            && self.custom_fields.iter().all(|(key, needle)| {
                record
                    .field_text(key)
                    .is_some_and(|text| contains_ignore_case(&text, needle))
            })
    }
}

/// A record the evaluator can inspect.
///
/// Custom-field lookups use the record's serialized field names
/// (`jobTitle`, `stage`, ...).
pub trait Filterable: Serialize {
    /// Timestamp the date range applies to.
    fn timestamp(&self) -> Option<DateTime<Utc>>;

    /// Amount the value range applies to.
    fn amount(&self) -> Option<f64> {
        None
    }

    fn last_contact(&self) -> Option<DateTime<Utc>>;

    /// String form of the field named `key`; `None` when absent or null.
    fn field_text(&self, key: &str) -> Option<String> {
        let value = serde_json::to_value(self).ok()?;
        match value.get(key)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl Filterable for Deal {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }

    fn amount(&self) -> Option<f64> {
        self.value
    }

    fn last_contact(&self) -> Option<DateTime<Utc>> {
        self.last_contact_date
    }
}

impl Filterable for Lead {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }

    fn amount(&self) -> Option<f64> {
        self.value
    }

    fn last_contact(&self) -> Option<DateTime<Utc>> {
        self.last_contact_date
    }
}

impl Filterable for Contact {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }

    fn last_contact(&self) -> Option<DateTime<Utc>> {
        self.last_contact_date
    }
}

/// Records matching `spec`, in input order.
pub fn apply<T: Filterable + Clone>(records: &[T], spec: &FilterSpec) -> Vec<T> {
    records
        .iter()
        .filter(|record| spec.matches(*record))
        .cloned()
        .collect()
}
