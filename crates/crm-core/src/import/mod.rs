//! CSV contact import.
//!
//! ```text
//! text ──► parse_csv ──► auto_map ──► map_row ──► BulkImporter ──► Repository
//!          (parser)      (mapper)     (transform)  (orchestrator)
//! ```
//!
//! [`ImportSession`] drives the same stages as an upload → mapping →
//! preview step machine.

mod mapper;
mod orchestrator;
mod parser;
mod progress;
mod schema;
mod session;
mod transform;

pub use mapper::{FieldMapping, MappingIssue, auto_map, detect_field};
pub use orchestrator::{BulkImporter, ImportReport, coerce_candidate, validate_candidates};
pub use parser::{CsvRow, ParsedCsv, parse_csv, split_fields};
pub use progress::{ClosureProgressReporter, ImportStage, ProgressReporter, ProgressUpdate};
pub use schema::ContactField;
pub use session::{ImportSession, ImportStep};
pub use transform::{CandidateRecord, FieldWarning, ImportPreview, map_row, map_rows, preview};
