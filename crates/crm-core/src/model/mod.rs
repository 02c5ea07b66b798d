//! Typed CRM records.
//!
//! Every record carries an integer `Id` (serialized as `"Id"`) assigned by
//! the storage layer. Field names serialize in camelCase so snapshots stay
//! compatible with the JSON the web client produces.

mod activity;
mod company;
mod contact;
mod deal;
mod lead;
mod task;
mod template;

pub use activity::{Activity, ActivityType, NewActivity};
pub use company::Company;
pub use contact::{Address, Contact, DEFAULT_CONTACT_SOURCE, DEFAULT_CONTACT_STATUS, DEFAULT_CONTACT_TYPE};
pub use deal::{Deal, DealStage};
pub use lead::{Lead, LeadStatus};
pub use task::{Task, TaskPriority};
pub use template::{DEFAULT_TEMPLATE_CATEGORY, EmailTemplate};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the storage layer.
pub type RecordId = i64;

/// A record type stored in its own table.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Storage table name, used in logs and not-found errors.
    const TABLE: &'static str;

    /// The record's identifier.
    fn id(&self) -> RecordId;

    /// Overwrite the identifier. Only the storage layer calls this.
    fn set_id(&mut self, id: RecordId);
}

/// The kinds of record that other records can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Contact,
    Company,
    Lead,
    Deal,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Contact => "contact",
            Self::Company => "company",
            Self::Lead => "lead",
            Self::Deal => "deal",
        };
        f.write_str(name)
    }
}

/// Records that keep an activity log inline (contacts and leads).
pub trait HasActivities: Entity {
    /// Kind tag used when activities are merged into one timeline.
    const KIND: EntityKind;

    fn display_name(&self) -> &str;
    fn activities(&self) -> &[Activity];
    fn activities_mut(&mut self) -> &mut Vec<Activity>;
}
