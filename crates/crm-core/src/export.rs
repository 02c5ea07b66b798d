//! Contact export to CSV.
//!
//! Exported files use the same column names the importer auto-maps, so an
//! export can be re-imported without touching the mapping.

use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{CrmError, Result, ResultExt};
use crate::model::{Contact, DEFAULT_CONTACT_SOURCE, DEFAULT_CONTACT_STATUS, DEFAULT_CONTACT_TYPE};

/// Header row of an export, in column order.
pub const EXPORT_HEADERS: [&str; 13] = [
    "Name",
    "Email",
    "Phone",
    "Company ID",
    "Job Title",
    "Street",
    "City",
    "State",
    "ZIP",
    "Notes",
    "Type",
    "Status",
    "Source",
];

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

fn export_row(contact: &Contact) -> [String; 13] {
    [
        contact.name.clone(),
        contact.email.clone(),
        contact.phone.clone(),
        contact.company_id.map(|id| id.to_string()).unwrap_or_default(),
        contact.job_title.clone(),
        contact.address.street.clone(),
        contact.address.city.clone(),
        contact.address.state.clone(),
        contact.address.zip.clone(),
        contact.notes.clone(),
        or_default(&contact.contact_type, DEFAULT_CONTACT_TYPE).to_string(),
        or_default(&contact.status, DEFAULT_CONTACT_STATUS).to_string(),
        or_default(&contact.source, DEFAULT_CONTACT_SOURCE).to_string(),
    ]
}

/// Write `contacts` as CSV to `writer`.
///
/// Values containing a comma, quote or line break are quoted and inner
/// quotes doubled; everything else is written bare.
pub fn write_contacts<W: Write>(contacts: &[Contact], writer: W) -> Result<()> {
    let mut csv = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(EXPORT_HEADERS)?;
    for contact in contacts {
        csv.write_record(export_row(contact))?;
    }
    csv.flush()?;
    Ok(())
}

/// Render `contacts` as CSV text.
pub fn contacts_to_csv(contacts: &[Contact]) -> Result<String> {
    let mut buffer = Vec::new();
    write_contacts(contacts, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| {
        CrmError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// `<prefix>_<YYYY-MM-DD>.csv`
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}.csv", date.format("%Y-%m-%d"))
}

/// Export to `<dir>/<prefix>_<date>.csv` and return the written path.
pub fn export_to_dir(
    contacts: &[Contact],
    dir: &Path,
    prefix: &str,
    date: NaiveDate,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).context(format!("Creating {}", dir.display()))?;
    let path = dir.join(export_file_name(prefix, date));
    let file = std::fs::File::create(&path).context(format!("Creating {}", path.display()))?;
    write_contacts(contacts, file)?;
    info!(contacts = contacts.len(), "Exported contacts to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn contact(name: &str, email: &str) -> Contact {
        Contact::new(name, email, Utc::now())
    }

    #[test]
    fn test_header_and_defaults() {
        let mut ada = contact("Ada", "ada@x.com");
        ada.contact_type.clear();
        ada.status.clear();
        ada.source.clear();
        let text = contacts_to_csv(&[ada]).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Name,Email,Phone,Company ID,Job Title,Street,City,State,ZIP,Notes,Type,Status,Source"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Ada,ada@x.com,,,,,,,,,Customer,Active,Direct"
        );
    }

    #[test]
    fn test_special_characters_are_quoted() {
        let mut bell = contact("Bell, Taylor", "bell@x.com");
        bell.notes = "Said \"call me\"".to_string();
        bell.company_id = Some(7);
        let text = contacts_to_csv(&[bell]).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.starts_with("\"Bell, Taylor\",bell@x.com,,7,"));
        assert!(row.contains("\"Said \"\"call me\"\"\""));
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(export_file_name("contacts", date), "contacts_2024-03-09.csv");
    }

    #[test]
    fn test_export_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let path = export_to_dir(&[contact("Ada", "ada@x.com")], dir.path(), "contacts", date).unwrap();
        assert!(path.ends_with("contacts_2024-03-09.csv"));
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
