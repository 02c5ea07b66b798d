//! CRM Core Library
//!
//! Contacts, companies, leads, deals, tasks and activity logs, with CSV
//! import/export, a kanban deal pipeline and dashboard metrics.
//!
//! # Overview
//!
//! - **CSV Import**: tolerant tokenizer, header auto-mapping, preview and a
//!   bulk importer that validates every row before creating anything
//! - **CSV Export**: contacts written with the same headers the importer maps
//! - **Filtering**: date/value/last-contact/custom-field criteria, list search
//!   and named presets kept in local storage
//! - **Aggregation**: per-stage counts and sums, the pipeline board and the
//!   dashboard KPIs
//! - **Email**: stored templates with a `[Contact Name]` placeholder and
//!   draft checks ahead of an injected sender
//! - **Storage**: a [`Repository`] trait with an in-memory implementation
//!   persisted as a JSON snapshot
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use crm_core::{BulkImporter, CrmConfig, CrmStore, ImportSession};
//!
//! let config = CrmConfig::default();
//! let store = CrmStore::load(&config.snapshot_path())?;
//!
//! let mut session = ImportSession::new(config.preview_rows);
//! session.load("contacts.csv", &std::fs::read_to_string("contacts.csv")?)?;
//! let preview = session.preview()?;
//! println!("{} rows, {} warnings", preview.total_rows, preview.warnings.len());
//!
//! let report = session.commit(&store.contacts, &BulkImporter::new(&config))?;
//! store.save(&config.snapshot_path())?;
//! ```
//!
//! # Filtering
//!
//! ```rust,ignore
//! use crm_core::filter::{FilterSpec, apply};
//!
//! let spec = FilterSpec::default().value_range(Some(150.0), None);
//! let big_deals = apply(&store.deals.list()?, &spec);
//! ```

pub mod aggregate;
pub mod config;
pub mod email;
pub mod error;
pub mod events;
pub mod export;
pub mod filter;
pub mod import;
pub mod model;
pub mod repository;
pub mod utils;

// Re-exports for convenient access
pub use aggregate::{DashboardMetrics, PipelineBoard, move_deal};
pub use config::{ConfigValidationError, CrmConfig, CrmConfigBuilder};
pub use email::{EmailDraft, EmailSender, render_template};
pub use error::{CrmError, Result as CrmResult, ResultExt};
pub use events::{CrmEvent, EventBus, LoadingGuard, View};
pub use export::{contacts_to_csv, export_file_name, write_contacts};
pub use filter::{FilterPreset, FilterPresets, FilterSpec};
pub use import::{
    BulkImporter, ContactField, FieldMapping, ImportReport, ImportSession, ParsedCsv, auto_map,
    parse_csv,
};
pub use model::{
    Activity, ActivityType, Company, Contact, Deal, DealStage, EmailTemplate, EntityKind, Lead,
    LeadStatus, RecordId, Task, TaskPriority,
};
pub use repository::{CrmStore, InMemoryRepository, Repository, Snapshot};
