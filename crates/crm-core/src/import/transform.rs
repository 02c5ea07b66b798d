//! Row-to-candidate transformation and import preview.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::mapper::FieldMapping;
use super::parser::{CsvRow, ParsedCsv};
use super::schema::ContactField;

/// A mapped row, still all strings. Unmapped or empty fields are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateRecord {
    fields: BTreeMap<ContactField, String>,
}

impl CandidateRecord {
    pub fn get(&self, field: ContactField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn has(&self, field: ContactField) -> bool {
        self.fields.contains_key(&field)
    }

    /// Set a value directly; an empty value is ignored.
    pub fn insert(&mut self, field: ContactField, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.fields.insert(field, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContactField, &str)> {
        self.fields.iter().map(|(field, value)| (*field, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The first required field this candidate lacks.
    pub fn missing_required(&self) -> Option<ContactField> {
        ContactField::required().find(|field| !self.has(*field))
    }
}

/// Copy every mapped, non-empty value of `row` into a candidate.
pub fn map_row(row: &CsvRow, mapping: &FieldMapping) -> CandidateRecord {
    let mut candidate = CandidateRecord::default();
    for (field, column) in mapping.iter() {
        candidate.insert(field, row.value(column));
    }
    candidate
}

/// Map every row of a parsed file, keeping file order.
pub fn map_rows(parsed: &ParsedCsv, mapping: &FieldMapping) -> Vec<CandidateRecord> {
    parsed.rows.iter().map(|row| map_row(row, mapping)).collect()
}

/// A value that will import but looks wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWarning {
    /// 1-based data row number.
    pub row: usize,
    pub field: ContactField,
    pub message: String,
}

/// What the preview step shows before anything is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportPreview {
    /// The first few mapped rows.
    pub candidates: Vec<CandidateRecord>,
    /// Number of rows the import would create.
    pub total_rows: usize,
    /// Shape warnings for the previewed rows.
    pub warnings: Vec<FieldWarning>,
}

/// Build a preview of the first `limit` rows.
pub fn preview(parsed: &ParsedCsv, mapping: &FieldMapping, limit: usize) -> ImportPreview {
    let candidates: Vec<CandidateRecord> = parsed
        .rows
        .iter()
        .take(limit)
        .map(|row| map_row(row, mapping))
        .collect();

    let warnings = candidates
        .iter()
        .enumerate()
        .flat_map(|(index, candidate)| {
            candidate.iter().filter_map(move |(field, value)| {
                field.validate(value).err().map(|message| FieldWarning {
                    row: index + 1,
                    field,
                    message,
                })
            })
        })
        .collect();

    ImportPreview {
        candidates,
        total_rows: parsed.row_count(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{auto_map, parse_csv};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_map_row_omits_unmapped_and_empty() {
        let parsed = parse_csv("Name,Email,Phone,Fax\nAda,ada@x.com,,555-0100");
        let mapping = auto_map(&parsed.headers);
        let candidate = map_row(&parsed.rows[0], &mapping);

        assert_eq!(candidate.get(ContactField::Name), Some("Ada"));
        assert_eq!(candidate.get(ContactField::Email), Some("ada@x.com"));
        assert!(!candidate.has(ContactField::Phone));
        assert_eq!(candidate.len(), 2);
    }

    #[test]
    fn test_values_stay_strings() {
        let parsed = parse_csv("Name,Email,Company ID\nAda,ada@x.com,0042");
        let mapping = auto_map(&parsed.headers);
        let candidate = map_row(&parsed.rows[0], &mapping);
        assert_eq!(candidate.get(ContactField::CompanyId), Some("0042"));
    }

    #[test]
    fn test_short_row_maps_missing_as_absent() {
        let parsed = parse_csv("Name,Email,City\nAda,ada@x.com");
        let candidate = map_row(&parsed.rows[0], &auto_map(&parsed.headers));
        assert!(!candidate.has(ContactField::City));
        assert_eq!(candidate.missing_required(), None);
    }

    #[test]
    fn test_missing_required_reports_first_gap() {
        let mut candidate = CandidateRecord::default();
        candidate.insert(ContactField::Email, "ada@x.com");
        assert_eq!(candidate.missing_required(), Some(ContactField::Name));
    }

    #[test]
    fn test_preview_limits_rows_and_warns() {
        let text = "Name,Email,Company ID\n\
                    A,a@x.com,1\n\
                    B,not-an-email,2\n\
                    C,c@x.com,Acme\n\
                    D,d@x.com,4\n";
        let parsed = parse_csv(text);
        let result = preview(&parsed, &auto_map(&parsed.headers), 3);

        assert_eq!(result.candidates.len(), 3);
        assert_eq!(result.total_rows, 4);
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(result.warnings[0].row, 2);
        assert_eq!(result.warnings[0].field, ContactField::Email);
        assert_eq!(result.warnings[1].row, 3);
        assert_eq!(result.warnings[1].field, ContactField::CompanyId);
    }
}
