//! Column-to-field mapping and header auto-detection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use super::schema::ContactField;

/// Which CSV column feeds each contact field.
///
/// Unmapped fields have no entry; mapping a field to `""` unmaps it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    columns: BTreeMap<ContactField, String>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `field` to `column`. An empty column name clears the mapping.
    pub fn set(&mut self, field: ContactField, column: impl Into<String>) {
        let column = column.into();
        if column.is_empty() {
            self.columns.remove(&field);
        } else {
            self.columns.insert(field, column);
        }
    }

    pub fn clear(&mut self, field: ContactField) {
        self.columns.remove(&field);
    }

    /// The column mapped to `field`, if any.
    pub fn column(&self, field: ContactField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    pub fn is_mapped(&self, field: ContactField) -> bool {
        self.columns.contains_key(&field)
    }

    /// Mapped fields in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (ContactField, &str)> {
        self.columns.iter().map(|(field, column)| (*field, column.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Overlay `other` onto this mapping; fields mapped in `other` win.
    pub fn merge(&mut self, other: &FieldMapping) {
        for (field, column) in other.iter() {
            self.set(field, column);
        }
    }

    /// Check the mapping against the parsed headers.
    ///
    /// Reports every required field left unmapped and every mapped column
    /// that is not among `headers`.
    pub fn validate(&self, headers: &[String]) -> Result<(), Vec<MappingIssue>> {
        let mut issues: Vec<MappingIssue> = ContactField::required()
            .filter(|field| !self.is_mapped(*field))
            .map(MappingIssue::RequiredFieldUnmapped)
            .collect();

        issues.extend(
            self.iter()
                .filter(|(_, column)| !headers.iter().any(|h| h == column))
                .map(|(field, column)| MappingIssue::UnknownColumn {
                    field,
                    column: column.to_string(),
                }),
        );

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

/// A field-level problem that blocks moving past the mapping step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappingIssue {
    RequiredFieldUnmapped(ContactField),
    UnknownColumn { field: ContactField, column: String },
}

impl fmt::Display for MappingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequiredFieldUnmapped(field) => write!(f, "{field} must be mapped to a column"),
            Self::UnknownColumn { field, column } => {
                write!(f, "{field} is mapped to '{column}', which is not in the file")
            }
        }
    }
}

/// How a header has to look to match a rule.
enum Keywords {
    Any(&'static [&'static str]),
    All(&'static [&'static str]),
}

impl Keywords {
    fn matches(&self, header: &str) -> bool {
        match self {
            Self::Any(words) => words.iter().any(|w| header.contains(w)),
            Self::All(words) => words.iter().all(|w| header.contains(w)),
        }
    }
}

/// Ordered auto-mapping rules; the first rule a header matches decides its field.
const AUTO_MAP_RULES: [(Keywords, ContactField); 13] = [
    (Keywords::Any(&["name"]), ContactField::Name),
    (Keywords::Any(&["email"]), ContactField::Email),
    (Keywords::Any(&["phone"]), ContactField::Phone),
    (Keywords::All(&["company", "id"]), ContactField::CompanyId),
    (Keywords::Any(&["job", "title"]), ContactField::JobTitle),
    (Keywords::Any(&["street"]), ContactField::Street),
    (Keywords::Any(&["city"]), ContactField::City),
    (Keywords::Any(&["state"]), ContactField::State),
    (Keywords::Any(&["zip"]), ContactField::Zip),
    (Keywords::Any(&["note"]), ContactField::Notes),
    (Keywords::Any(&["type"]), ContactField::Type),
    (Keywords::Any(&["status"]), ContactField::Status),
    (Keywords::Any(&["source"]), ContactField::Source),
];

/// The field a single header would be auto-mapped to.
pub fn detect_field(header: &str) -> Option<ContactField> {
    let lower = header.to_lowercase();
    AUTO_MAP_RULES
        .iter()
        .find(|(keywords, _)| keywords.matches(&lower))
        .map(|(_, field)| *field)
}

/// Guess a mapping from header names.
///
/// Each header maps to at most one field. When several headers match the
/// same field, the later header wins (e.g. `Name` then `Company Name` maps
/// `name` to `Company Name`).
pub fn auto_map(headers: &[String]) -> FieldMapping {
    let mut mapping = FieldMapping::new();
    for header in headers {
        if let Some(field) = detect_field(header) {
            if let Some(previous) = mapping.column(field) {
                debug!(field = field.key(), previous, header = header.as_str(), "auto-map overwrote earlier column");
            }
            mapping.set(field, header.clone());
        }
    }
    mapping
}
