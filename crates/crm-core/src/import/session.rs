//! The three-step import flow: upload, mapping, preview.

use serde::Serialize;
use tracing::{debug, info};

use super::mapper::{FieldMapping, auto_map};
use super::orchestrator::{BulkImporter, ImportReport};
use super::parser::{ParsedCsv, parse_csv};
use super::schema::ContactField;
use super::transform::{CandidateRecord, ImportPreview, map_rows, preview};
use crate::error::{CrmError, Result};
use crate::model::Contact;
use crate::repository::Repository;

/// Where an import session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStep {
    Upload,
    Mapping,
    Preview,
}

impl ImportStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Mapping => "mapping",
            Self::Preview => "preview",
        }
    }
}

/// State for one file import. Owns the parsed file and its mapping.
#[derive(Debug, Clone)]
pub struct ImportSession {
    step: ImportStep,
    preview_rows: usize,
    file_name: Option<String>,
    parsed: Option<ParsedCsv>,
    mapping: FieldMapping,
}

impl ImportSession {
    /// A fresh session whose preview shows `preview_rows` rows.
    pub fn new(preview_rows: usize) -> Self {
        Self {
            step: ImportStep::Upload,
            preview_rows,
            file_name: None,
            parsed: None,
            mapping: FieldMapping::new(),
        }
    }

    pub fn step(&self) -> ImportStep {
        self.step
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn parsed(&self) -> Option<&ParsedCsv> {
        self.parsed.as_ref()
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    /// Accept an uploaded file, parse it and auto-map its headers.
    ///
    /// Replaces any file loaded earlier and moves to the mapping step.
    ///
    /// # Errors
    ///
    /// [`CrmError::InvalidFileType`] when `file_name` does not end in `.csv`.
    /// Nothing is parsed in that case and the session is unchanged.
    pub fn load(&mut self, file_name: &str, text: &str) -> Result<&ParsedCsv> {
        if !file_name.ends_with(".csv") {
            return Err(CrmError::InvalidFileType(file_name.to_string()));
        }

        let parsed = parse_csv(text);
        self.mapping = auto_map(&parsed.headers);
        info!(
            file = file_name,
            rows = parsed.row_count(),
            mapped = self.mapping.len(),
            "Loaded CSV for import"
        );

        self.file_name = Some(file_name.to_string());
        self.step = ImportStep::Mapping;
        Ok(self.parsed.insert(parsed))
    }

    /// Point `field` at `column`. An empty column unmaps the field.
    pub fn set_mapping(&mut self, field: ContactField, column: &str) -> Result<()> {
        self.expect_step(ImportStep::Mapping)?;
        debug!(field = field.key(), column, "Mapping changed");
        self.mapping.set(field, column);
        Ok(())
    }

    pub fn clear_mapping(&mut self, field: ContactField) -> Result<()> {
        self.expect_step(ImportStep::Mapping)?;
        self.mapping.clear(field);
        Ok(())
    }

    /// Apply several mapping overrides at once.
    pub fn apply_mapping(&mut self, overrides: &FieldMapping) -> Result<()> {
        self.expect_step(ImportStep::Mapping)?;
        self.mapping.merge(overrides);
        Ok(())
    }

    /// Validate the mapping and show the first rows as they would import.
    ///
    /// On a mapping error the session stays on the mapping step.
    pub fn preview(&mut self) -> Result<ImportPreview> {
        if self.step == ImportStep::Upload {
            return Err(self.step_error(ImportStep::Mapping));
        }
        let parsed = self.validated()?;
        let result = preview(parsed, &self.mapping, self.preview_rows);
        self.step = ImportStep::Preview;
        Ok(result)
    }

    /// Every row mapped to a candidate, for a dry run or a custom import.
    pub fn candidates(&self) -> Result<Vec<CandidateRecord>> {
        let parsed = self.validated()?;
        Ok(map_rows(parsed, &self.mapping))
    }

    /// Step back once. Going back to upload keeps the loaded file.
    pub fn back(&mut self) {
        self.step = match self.step {
            ImportStep::Preview => ImportStep::Mapping,
            ImportStep::Mapping | ImportStep::Upload => ImportStep::Upload,
        };
    }

    /// Import every row. A successful commit resets the session.
    pub fn commit(
        &mut self,
        repo: &dyn Repository<Contact>,
        importer: &BulkImporter<'_>,
    ) -> Result<ImportReport> {
        self.expect_step(ImportStep::Preview)?;
        let candidates = self.candidates()?;
        let report = importer.run(repo, &candidates)?;
        self.reset();
        Ok(report)
    }

    /// Drop the file and mapping and return to upload.
    pub fn reset(&mut self) {
        self.step = ImportStep::Upload;
        self.file_name = None;
        self.parsed = None;
        self.mapping = FieldMapping::new();
    }

    fn validated(&self) -> Result<&ParsedCsv> {
        let parsed = self.parsed.as_ref().ok_or(CrmError::NoDataLoaded)?;
        self.mapping
            .validate(&parsed.headers)
            .map_err(CrmError::InvalidMapping)?;
        Ok(parsed)
    }

    fn expect_step(&self, expected: ImportStep) -> Result<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(self.step_error(expected))
        }
    }

    fn step_error(&self, expected: ImportStep) -> CrmError {
        CrmError::InvalidStep {
            current: self.step.name(),
            expected: expected.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrmConfig;
    use crate::repository::InMemoryRepository;
    use pretty_assertions::assert_eq;

    const PEOPLE: &str = "Full Name,Email,Phone\n\
                          Ada Lovelace,ada@x.com,555-0100\n\
                          \"Bell, Taylor\",bell@x.com,\n";

    #[test]
    fn test_rejects_non_csv_before_parsing() {
        let mut session = ImportSession::new(5);
        let err = session.load("people.xlsx", PEOPLE).unwrap_err();
        assert!(matches!(err, CrmError::InvalidFileType(_)));
        assert_eq!(session.step(), ImportStep::Upload);
        assert!(session.parsed().is_none());
    }

    #[test]
    fn test_suffix_check_is_case_sensitive() {
        let mut session = ImportSession::new(5);
        assert!(session.load("PEOPLE.CSV", PEOPLE).is_err());
    }

    #[test]
    fn test_load_auto_maps_and_moves_to_mapping() {
        let mut session = ImportSession::new(5);
        let parsed = session.load("people.csv", PEOPLE).unwrap();
        assert_eq!(parsed.row_count(), 2);
        assert_eq!(session.step(), ImportStep::Mapping);
        assert_eq!(session.mapping().column(ContactField::Name), Some("Full Name"));
    }

    #[test]
    fn test_preview_blocked_until_required_fields_mapped() {
        let mut session = ImportSession::new(5);
        session.load("people.csv", PEOPLE).unwrap();
        session.set_mapping(ContactField::Email, "").unwrap();

        let err = session.preview().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_MAPPING");
        assert_eq!(session.step(), ImportStep::Mapping);

        session.set_mapping(ContactField::Email, "Email").unwrap();
        let result = session.preview().unwrap();
        assert_eq!(session.step(), ImportStep::Preview);
        assert_eq!(result.total_rows, 2);
        assert_eq!(result.candidates[1].get(ContactField::Name), Some("Bell, Taylor"));
        assert!(!result.candidates[1].has(ContactField::Phone));
    }

    #[test]
    fn test_preview_limit() {
        let mut session = ImportSession::new(1);
        session.load("people.csv", PEOPLE).unwrap();
        assert_eq!(session.preview().unwrap().candidates.len(), 1);
    }

    #[test]
    fn test_mapping_edits_require_mapping_step() {
        let mut session = ImportSession::new(5);
        assert!(matches!(
            session.set_mapping(ContactField::Name, "Name").unwrap_err(),
            CrmError::InvalidStep { current: "upload", expected: "mapping" }
        ));
    }

    #[test]
    fn test_back_steps() {
        let mut session = ImportSession::new(5);
        session.load("people.csv", PEOPLE).unwrap();
        session.preview().unwrap();
        session.back();
        assert_eq!(session.step(), ImportStep::Mapping);
        session.back();
        assert_eq!(session.step(), ImportStep::Upload);
        assert!(session.parsed().is_some());
    }

    #[test]
    fn test_commit_imports_and_resets() {
        let config = CrmConfig::default();
        let repo: InMemoryRepository<Contact> = InMemoryRepository::new();
        let mut session = ImportSession::new(config.preview_rows);
        session.load("people.csv", PEOPLE).unwrap();
        session.preview().unwrap();

        let report = session.commit(&repo, &BulkImporter::new(&config)).unwrap();
        assert_eq!(report.created_count(), 2);
        assert_eq!(repo.list().unwrap()[1].name, "Bell, Taylor");
        assert_eq!(repo.list().unwrap()[1].source, "Import");
        assert_eq!(session.step(), ImportStep::Upload);
        assert!(session.parsed().is_none());
    }

    #[test]
    fn test_commit_requires_preview() {
        let config = CrmConfig::default();
        let repo: InMemoryRepository<Contact> = InMemoryRepository::new();
        let mut session = ImportSession::new(5);
        session.load("people.csv", PEOPLE).unwrap();
        assert!(session.commit(&repo, &BulkImporter::new(&config)).is_err());
        assert!(repo.is_empty());
    }
}
