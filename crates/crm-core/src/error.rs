//! Error types for the CRM core.
//!
//! All fallible operations in the library return [`CrmError`]. Errors carry a
//! stable code (see [`CrmError::error_code`]) and serialize as
//! `{ "code", "message" }` so a front end can show them directly.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::import::MappingIssue;

/// The main error type for the CRM core.
#[derive(Error, Debug)]
pub enum CrmError {
    /// A file was offered for import that is not a `.csv` file.
    #[error("Please select a CSV file (got '{0}')")]
    InvalidFileType(String),

    /// The column mapping cannot be used for an import.
    #[error("Invalid field mapping: {}", format_issues(.0))]
    InvalidMapping(Vec<MappingIssue>),

    /// An import candidate is missing a required field.
    #[error("Row {row}: {field} is required (Name and Email are required for all contacts)")]
    MissingRequiredField { row: usize, field: &'static str },

    /// An import was committed before any file was loaded.
    #[error("No CSV data loaded")]
    NoDataLoaded,

    /// The import session is not in a state that allows the operation.
    #[error("Import session is at step '{current}', expected '{expected}'")]
    InvalidStep {
        current: &'static str,
        expected: &'static str,
    },

    /// A record was not found in its table.
    #[error("{table} record {id} not found")]
    NotFound { table: &'static str, id: i64 },

    /// The storage collaborator rejected an operation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A filter preset name is blank.
    #[error("Preset name cannot be empty")]
    EmptyPresetName,

    /// An email draft is missing its subject or message.
    #[error("Please fill in both subject and message")]
    IncompleteEmail,

    /// An email recipient address is malformed.
    #[error("Invalid email address format: '{0}'")]
    InvalidRecipient(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CrmError>,
    },
}

fn format_issues(issues: &[MappingIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CrmError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CrmError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidFileType(_) => "INVALID_FILE_TYPE",
            Self::InvalidMapping(_) => "INVALID_MAPPING",
            Self::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            Self::NoDataLoaded => "NO_DATA_LOADED",
            Self::InvalidStep { .. } => "INVALID_STEP",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::EmptyPresetName => "EMPTY_PRESET_NAME",
            Self::IncompleteEmail => "INCOMPLETE_EMAIL",
            Self::InvalidRecipient(_) => "INVALID_RECIPIENT",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Csv(_) => "CSV_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if the user can recover by correcting their input.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidFileType(_)
            | Self::InvalidMapping(_)
            | Self::MissingRequiredField { .. }
            | Self::NoDataLoaded
            | Self::InvalidStep { .. }
            | Self::EmptyPresetName
            | Self::IncompleteEmail
            | Self::InvalidRecipient(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for CrmError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CrmError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for CRM operations.
pub type Result<T> = std::result::Result<T, CrmError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CrmError::Io(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::ContactField;

    #[test]
    fn test_error_code() {
        assert_eq!(CrmError::NoDataLoaded.error_code(), "NO_DATA_LOADED");
        assert_eq!(
            CrmError::NotFound { table: "deals", id: 4 }.error_code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn test_is_recoverable() {
        assert!(CrmError::InvalidFileType("a.txt".to_string()).is_recoverable());
        assert!(
            CrmError::MissingRequiredField { row: 1, field: "email" }.is_recoverable()
        );
        assert!(!CrmError::Storage("down".to_string()).is_recoverable());
    }

    #[test]
    fn test_mapping_error_lists_issues() {
        let error = CrmError::InvalidMapping(vec![
            MappingIssue::RequiredFieldUnmapped(ContactField::Name),
            MappingIssue::RequiredFieldUnmapped(ContactField::Email),
        ]);
        let message = error.to_string();
        assert!(message.contains("Name"));
        assert!(message.contains("Email"));
    }

    #[test]
    fn test_error_serialization() {
        let error = CrmError::NotFound { table: "contacts", id: 12 };
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("NOT_FOUND"));
        assert!(json.contains("contacts record 12"));
    }

    #[test]
    fn test_with_context() {
        let error = CrmError::Storage("constraint violation".to_string())
            .with_context("Importing row 3");
        assert!(error.to_string().contains("Importing row 3"));
        assert_eq!(error.error_code(), "STORAGE_ERROR");
    }
}
