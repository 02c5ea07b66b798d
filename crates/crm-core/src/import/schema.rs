//! The fixed set of contact fields a CSV column can be mapped onto.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::{is_valid_email, parse_id};

/// An import target field.
///
/// Serializes with the camelCase keys the contact record uses
/// (`companyId`, `jobTitle`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContactField {
    Name,
    Email,
    Phone,
    CompanyId,
    JobTitle,
    Street,
    City,
    State,
    Zip,
    Notes,
    Type,
    Status,
    Source,
}

impl ContactField {
    /// Every field, in the order the mapping form lists them.
    pub const ALL: [ContactField; 13] = [
        Self::Name,
        Self::Email,
        Self::Phone,
        Self::CompanyId,
        Self::JobTitle,
        Self::Street,
        Self::City,
        Self::State,
        Self::Zip,
        Self::Notes,
        Self::Type,
        Self::Status,
        Self::Source,
    ];

    /// Record key (`companyId`).
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::CompanyId => "companyId",
            Self::JobTitle => "jobTitle",
            Self::Street => "street",
            Self::City => "city",
            Self::State => "state",
            Self::Zip => "zip",
            Self::Notes => "notes",
            Self::Type => "type",
            Self::Status => "status",
            Self::Source => "source",
        }
    }

    /// Human label (`Company ID`).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::CompanyId => "Company ID",
            Self::JobTitle => "Job Title",
            Self::Street => "Street Address",
            Self::City => "City",
            Self::State => "State",
            Self::Zip => "ZIP Code",
            Self::Notes => "Notes",
            Self::Type => "Type",
            Self::Status => "Status",
            Self::Source => "Source",
        }
    }

    /// Name and email must be mapped and present on every row.
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Name | Self::Email)
    }

    pub fn required() -> impl Iterator<Item = ContactField> {
        Self::ALL.into_iter().filter(ContactField::is_required)
    }

    /// Check a raw value's shape. Used for preview warnings; never blocks an import.
    pub fn validate(&self, value: &str) -> Result<(), String> {
        match self {
            Self::Email if !is_valid_email(value) => {
                Err(format!("'{value}' does not look like an email address"))
            }
            Self::CompanyId if parse_id(value).is_none() => {
                Err(format!("'{value}' is not a numeric company id"))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ContactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ContactField {
    type Err = String;

    /// Accepts the record key (`jobTitle`) or label (`Job Title`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.key().to_lowercase() == wanted || field.label().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown contact field '{s}'"))
    }
}
