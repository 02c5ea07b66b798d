//! Integration tests for the CRM core.
//!
//! These tests drive the public API end to end: CSV import through the
//! session, export and re-import, filtering, the pipeline board and the
//! JSON snapshot.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use crm_core::aggregate::{DashboardMetrics, PipelineBoard, move_deal};
use crm_core::filter::{FilterPresets, FilterSpec, MemoryStore, Selection, apply, search_deals};
use crm_core::import::{ContactField, ImportStep, parse_csv};
use crm_core::{
    BulkImporter, Contact, CrmConfig, CrmError, CrmEvent, CrmStore, Deal, DealStage, EventBus,
    ImportSession, InMemoryRepository, Repository, contacts_to_csv,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(filename: &str) -> String {
    std::fs::read_to_string(fixtures_path().join(filename)).expect("Failed to read fixture")
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, 10, 0, 0).unwrap()
}

fn two_deals() -> Vec<Deal> {
    let mut first = Deal::new("Starter plan", 100.0, DealStage::New, at(1));
    first.id = 1;
    let mut second = Deal::new("Enterprise plan", 200.0, DealStage::Won, at(2));
    second.id = 2;
    vec![first, second]
}

/// Contact repository that counts create calls.
#[derive(Default)]
struct CountingRepository {
    inner: InMemoryRepository<Contact>,
    creates: AtomicUsize,
}

impl Repository<Contact> for CountingRepository {
    fn list(&self) -> crm_core::CrmResult<Vec<Contact>> {
        self.inner.list()
    }

    fn get(&self, id: i64) -> crm_core::CrmResult<Option<Contact>> {
        self.inner.get(id)
    }

    fn create(&self, record: Contact) -> crm_core::CrmResult<Contact> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(record)
    }

    fn update(&self, record: Contact) -> crm_core::CrmResult<Contact> {
        self.inner.update(record)
    }

    fn delete(&self, id: i64) -> crm_core::CrmResult<()> {
        self.inner.delete(id)
    }
}

// ============================================================================
// CSV Import
// ============================================================================

#[test]
fn test_quoted_comma_survives_parsing() {
    let parsed = parse_csv("Name,Email\nAda Lovelace,ada@x.com\n\"Bell, Taylor\",bell@x.com");

    assert_eq!(parsed.headers, vec!["Name", "Email"]);
    assert_eq!(parsed.row_count(), 2);
    assert_eq!(parsed.rows[1].value("Name"), "Bell, Taylor");
    assert_eq!(parsed.rows[1].value("Email"), "bell@x.com");
}

#[test]
fn test_fixture_import_through_session() {
    let config = CrmConfig::default();
    let repo: InMemoryRepository<Contact> = InMemoryRepository::new();
    let mut session = ImportSession::new(config.preview_rows);

    let parsed = session
        .load("contacts.csv", &load_fixture("contacts.csv"))
        .expect("Fixture should load");
    assert_eq!(parsed.row_count(), 3, "Blank line should be skipped");
    assert_eq!(session.step(), ImportStep::Mapping);
    assert_eq!(session.mapping().column(ContactField::Name), Some("Full Name"));
    assert_eq!(session.mapping().column(ContactField::CompanyId), Some("Company ID"));

    let preview = session.preview().expect("Required fields are mapped");
    assert_eq!(preview.total_rows, 3);
    assert_eq!(preview.candidates.len(), 3);
    assert!(
        preview
            .warnings
            .iter()
            .any(|w| w.row == 3 && w.field == ContactField::CompanyId),
        "Non-numeric company id should be flagged: {:?}",
        preview.warnings
    );

    let importer = BulkImporter::new(&config).created_at(at(15));
    let report = session.commit(&repo, &importer).expect("Import should succeed");

    assert_eq!(report.created_count(), 3);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(session.step(), ImportStep::Upload);

    let contacts = repo.list().unwrap();
    let ids: Vec<i64> = contacts.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(contacts[0].notes, "Met at \"Engines\" meetup");
    assert_eq!(contacts[0].company_id, Some(1));
    assert_eq!(contacts[1].name, "Bell, Taylor");
    assert_eq!(contacts[1].source, config.import_source);
    assert_eq!(contacts[2].company_id, None);
    assert!(contacts.iter().all(|c| c.created_at == at(15)));
}

#[test]
fn test_missing_email_creates_nothing() {
    let config = CrmConfig::default();
    let repo = CountingRepository::default();
    let events = EventBus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    events.subscribe(move |event| sink.lock().push(event.clone()));

    let mut session = ImportSession::new(config.preview_rows);
    session
        .load("missing_email.csv", &load_fixture("missing_email.csv"))
        .unwrap();
    session.preview().unwrap();

    let importer = BulkImporter::new(&config).with_events(&events);
    let err = session.commit(&repo, &importer).unwrap_err();

    assert!(matches!(
        err,
        CrmError::MissingRequiredField { row: 2, field: "email" }
    ));
    assert_eq!(repo.creates.load(Ordering::SeqCst), 0);
    assert!(repo.list().unwrap().is_empty());
    assert_eq!(session.step(), ImportStep::Preview, "Failed commit keeps the session");

    let seen = seen.lock();
    assert!(seen.iter().any(|e| matches!(e, CrmEvent::Error { code, .. } if code == "MISSING_REQUIRED_FIELD")));
    assert_eq!(
        seen.last(),
        Some(&CrmEvent::loading(false, None)),
        "Loading indicator should be cleared last"
    );
}

#[test]
fn test_non_csv_file_rejected() {
    let mut session = ImportSession::new(5);
    let err = session.load("contacts.xlsx", "Name,Email\n").unwrap_err();
    assert!(matches!(err, CrmError::InvalidFileType(_)));
    assert_eq!(session.step(), ImportStep::Upload);
}

// ============================================================================
// Export Round Trip
// ============================================================================

#[test]
fn test_export_reimports_with_auto_mapping() {
    let mut ada = Contact::new("Ada Lovelace", "ada@example.com", at(1));
    ada.phone = "555-0100".to_string();
    ada.company_id = Some(7);
    ada.job_title = "Analyst".to_string();
    ada.address.street = "12 St James's Square".to_string();
    ada.address.city = "London".to_string();
    ada.address.zip = "SW1Y".to_string();
    ada.notes = "Likes \"engines\", hates fog".to_string();
    ada.status = "Inactive".to_string();
    let bell = Contact::new("Bell, Taylor", "bell@example.com", at(2));

    let csv = contacts_to_csv(&[ada.clone(), bell]).expect("Export should succeed");

    let config = CrmConfig::default();
    let repo: InMemoryRepository<Contact> = InMemoryRepository::new();
    let mut session = ImportSession::new(config.preview_rows);
    session.load("contacts_2024-06-15.csv", &csv).unwrap();
    assert_eq!(session.mapping().len(), ContactField::ALL.len(), "Every exported column maps");

    session.preview().unwrap();
    let report = session
        .commit(&repo, &BulkImporter::new(&config))
        .unwrap();
    assert!(report.warnings.is_empty());

    let imported = repo.list().unwrap();
    assert_eq!(imported.len(), 2);
    assert_eq!(imported[0].name, ada.name);
    assert_eq!(imported[0].notes, ada.notes);
    assert_eq!(imported[0].address, ada.address);
    assert_eq!(imported[0].company_id, Some(7));
    assert_eq!(imported[0].status, "Inactive");
    assert_eq!(imported[1].name, "Bell, Taylor");
}

// ============================================================================
// Filtering and Search
// ============================================================================

#[test]
fn test_min_value_keeps_only_large_deal() {
    let spec = FilterSpec::default().value_range(Some(150.0), None);
    let filtered = apply(&two_deals(), &spec);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].stage, DealStage::Won);
}

#[test]
fn test_adding_criteria_never_grows_result() {
    let mut deals = two_deals();
    let mut third = Deal::new("Renewal", 500.0, DealStage::Proposal, at(20));
    third.id = 3;
    third.notes = "renewal for Acme".to_string();
    deals.push(third);

    let steps = [
        FilterSpec::default(),
        FilterSpec::default().value_range(Some(150.0), None),
        FilterSpec::default()
            .value_range(Some(150.0), None)
            .date_range(NaiveDate::from_ymd_opt(2024, 6, 2), None),
        FilterSpec::default()
            .value_range(Some(150.0), None)
            .date_range(NaiveDate::from_ymd_opt(2024, 6, 2), None)
            .custom_field("notes", "acme"),
    ];

    let sizes: Vec<usize> = steps.iter().map(|spec| apply(&deals, spec).len()).collect();
    assert_eq!(sizes, vec![3, 2, 2, 1]);
}

#[test]
fn test_search_then_filter_with_preset() {
    let mut presets = FilterPresets::load(MemoryStore::new()).unwrap();
    presets
        .save("Big deals", FilterSpec::default().value_range(Some(150.0), None))
        .unwrap();

    let deals = two_deals();
    let searched = search_deals(&deals, "plan", Selection::All);
    assert_eq!(searched.len(), 2);

    let spec = &presets.get("Big deals").unwrap().filters;
    let names: Vec<String> = apply(&searched, spec).into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["Enterprise plan"]);

    let won_only = search_deals(&deals, "", Selection::Only(DealStage::Won));
    assert_eq!(won_only.len(), 1);
}

// ============================================================================
// Pipeline and Dashboard
// ============================================================================

#[test]
fn test_board_totals() {
    let deals = two_deals();
    let board = PipelineBoard::from_deals(&deals);

    assert_eq!(board.stage_total_value(DealStage::Won), 200.0);
    assert_eq!(board.stage_deals(DealStage::New), &deals[..1]);

    let per_stage: f64 = DealStage::ALL
        .into_iter()
        .map(|stage| board.stage_total_value(stage))
        .sum();
    assert_eq!(per_stage, 300.0);
    assert_eq!(board.deal_count(), deals.len());
}

#[test]
fn test_moving_deal_updates_board_and_dashboard() {
    let store = CrmStore::default();
    for deal in two_deals() {
        store.deals.create(deal).unwrap();
    }

    let moved = move_deal(&store.deals, 1, DealStage::Won, None).unwrap();
    assert_eq!(moved.stage, DealStage::Won);

    let board = PipelineBoard::from_deals(&store.deals.list().unwrap());
    assert_eq!(board.stage_total_value(DealStage::Won), 300.0);
    assert!(board.stage_deals(DealStage::New).is_empty());

    let metrics = DashboardMetrics::from_store(&store, at(15), &CrmConfig::default()).unwrap();
    assert_eq!(metrics.win_rate, 1.0);
    assert_eq!(metrics.active_deal_count, 0);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_snapshot_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let config = CrmConfig::builder()
        .data_dir(dir.path())
        .build()
        .unwrap();

    let store = CrmStore::load(&config.snapshot_path()).unwrap();
    assert!(store.contacts.is_empty());

    let mut session = ImportSession::new(config.preview_rows);
    session
        .load("contacts.csv", &load_fixture("contacts.csv"))
        .unwrap();
    session.preview().unwrap();
    session
        .commit(&store.contacts, &BulkImporter::new(&config))
        .unwrap();
    for deal in two_deals() {
        store.deals.create(deal).unwrap();
    }
    store.save(&config.snapshot_path()).unwrap();

    let reloaded = CrmStore::load(&config.snapshot_path()).unwrap();
    assert_eq!(reloaded.contacts.len(), 3);
    assert_eq!(reloaded.deals.list().unwrap(), store.deals.list().unwrap());

    let next = reloaded
        .contacts
        .create(Contact::new("Late", "late@example.com", at(20)))
        .unwrap();
    assert_eq!(next.id, 4, "Ids continue after the highest stored id");
}
