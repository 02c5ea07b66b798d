//! Bulk creation of contacts from mapped candidates.
//!
//! The importer validates every candidate before touching storage, then
//! creates records one at a time. The first storage failure stops the batch;
//! records created before it stay in place.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::progress::{ImportStage, ProgressReporter, ProgressUpdate};
use super::schema::ContactField;
use super::transform::CandidateRecord;
use crate::config::CrmConfig;
use crate::error::{CrmError, Result};
use crate::events::{CrmEvent, EventBus};
use crate::model::{Address, Contact};
use crate::repository::Repository;
use crate::utils::parse_id;

/// Result of a completed import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    /// Created contacts with their assigned ids, in row order.
    pub created: Vec<Contact>,
    /// Values that were dropped while coercing rows.
    pub warnings: Vec<String>,
}

impl ImportReport {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }
}

/// Runs one bulk import against a contact repository.
pub struct BulkImporter<'a> {
    import_source: &'a str,
    progress: Option<&'a dyn ProgressReporter>,
    events: Option<&'a EventBus>,
    now: DateTime<Utc>,
}

impl<'a> BulkImporter<'a> {
    pub fn new(config: &'a CrmConfig) -> Self {
        Self {
            import_source: &config.import_source,
            progress: None,
            events: None,
            now: Utc::now(),
        }
    }

    pub fn with_progress(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.progress = Some(reporter);
        self
    }

    pub fn with_events(mut self, bus: &'a EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Timestamp used as `createdAt` for every imported contact.
    pub fn created_at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Validate, coerce and create every candidate.
    ///
    /// # Errors
    ///
    /// - [`CrmError::MissingRequiredField`] when any candidate lacks a name
    ///   or email. No record is created in that case.
    /// - The repository's error for the first rejected create.
    pub fn run(
        &self,
        repo: &dyn Repository<Contact>,
        candidates: &[CandidateRecord],
    ) -> Result<ImportReport> {
        let _loading = self.events.map(|bus| bus.loading("Importing contacts..."));

        let result = self.run_inner(repo, candidates);
        match &result {
            Ok(report) => {
                self.report(ProgressUpdate::complete(format!(
                    "Imported {} contacts",
                    report.created_count()
                )));
                self.emit(CrmEvent::ImportCompleted {
                    created: report.created_count(),
                });
            }
            Err(e) => {
                self.report(ProgressUpdate::failed(e.to_string()));
                self.emit(CrmEvent::error(e));
            }
        }
        result
    }

    fn run_inner(
        &self,
        repo: &dyn Repository<Contact>,
        candidates: &[CandidateRecord],
    ) -> Result<ImportReport> {
        let total = candidates.len();
        self.report(ProgressUpdate::with_items(
            ImportStage::Validating,
            0,
            total,
            format!("Validating {total} rows"),
        ));
        validate_candidates(candidates)?;

        let mut warnings = Vec::new();
        let mut created = Vec::with_capacity(total);
        for (index, candidate) in candidates.iter().enumerate() {
            let row = index + 1;
            let (contact, warning) = coerce_candidate(candidate, self.import_source, self.now);
            if let Some(warning) = warning {
                warn!(row, "{warning}");
                warnings.push(format!("Row {row}: {warning}"));
            }

            let record = repo.create(contact).map_err(|e| {
                warn!(row, created = created.len(), "Import aborted: {e}");
                e.with_context(format!("Creating contact from row {row}"))
            })?;
            created.push(record);

            self.report(ProgressUpdate::with_items(
                ImportStage::Creating,
                row,
                total,
                format!("Created {row}/{total}"),
            ));
        }

        info!(created = created.len(), warnings = warnings.len(), "Import finished");
        Ok(ImportReport { created, warnings })
    }

    fn report(&self, update: ProgressUpdate) {
        if let Some(reporter) = self.progress {
            reporter.report(update);
        }
    }

    fn emit(&self, event: CrmEvent) {
        if let Some(bus) = self.events {
            bus.emit(event);
        }
    }
}

/// Reject the batch if any candidate lacks a required field.
pub fn validate_candidates(candidates: &[CandidateRecord]) -> Result<()> {
    for (index, candidate) in candidates.iter().enumerate() {
        if let Some(field) = candidate.missing_required() {
            return Err(CrmError::MissingRequiredField {
                row: index + 1,
                field: field.key(),
            });
        }
    }
    Ok(())
}

/// Turn a candidate into a contact ready for `create`.
///
/// Returns a warning when a value could not be coerced and was dropped.
pub fn coerce_candidate(
    candidate: &CandidateRecord,
    import_source: &str,
    created_at: DateTime<Utc>,
) -> (Contact, Option<String>) {
    let text = |field: ContactField| candidate.get(field).unwrap_or_default().to_string();

    let mut contact = Contact::new(text(ContactField::Name), text(ContactField::Email), created_at);
    contact.phone = text(ContactField::Phone);
    contact.job_title = text(ContactField::JobTitle);
    contact.notes = text(ContactField::Notes);
    contact.address = Address {
        street: text(ContactField::Street),
        city: text(ContactField::City),
        state: text(ContactField::State),
        zip: text(ContactField::Zip),
    };
    if let Some(kind) = candidate.get(ContactField::Type) {
        contact.contact_type = kind.to_string();
    }
    if let Some(status) = candidate.get(ContactField::Status) {
        contact.status = status.to_string();
    }
    contact.source = candidate
        .get(ContactField::Source)
        .unwrap_or(import_source)
        .to_string();

    let mut warning = None;
    if let Some(raw) = candidate.get(ContactField::CompanyId) {
        contact.company_id = parse_id(raw);
        if contact.company_id.is_none() {
            warning = Some(format!("company id '{raw}' is not a number and was left empty"));
        }
    }

    (contact, warning)
}
