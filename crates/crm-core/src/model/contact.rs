use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Activity, Entity, EntityKind, HasActivities, RecordId};
use crate::utils::{option_timestamp, timestamp};

pub const DEFAULT_CONTACT_TYPE: &str = "Customer";
pub const DEFAULT_CONTACT_STATUS: &str = "Active";
pub const DEFAULT_CONTACT_SOURCE: &str = "Direct";

/// Postal address nested inside a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// A person the team is in touch with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(rename = "Id", default)]
    pub id: RecordId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company_id: Option<RecordId>,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "type", default = "default_type")]
    pub contact_type: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default, with = "option_timestamp")]
    pub last_contact_date: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

fn default_type() -> String {
    DEFAULT_CONTACT_TYPE.to_string()
}

fn default_status() -> String {
    DEFAULT_CONTACT_STATUS.to_string()
}

fn default_source() -> String {
    DEFAULT_CONTACT_SOURCE.to_string()
}

impl Contact {
    /// A contact with every optional field at its default.
    pub fn new(name: impl Into<String>, email: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            email: email.into(),
            phone: String::new(),
            company_id: None,
            job_title: String::new(),
            address: Address::default(),
            notes: String::new(),
            contact_type: default_type(),
            status: default_status(),
            source: default_source(),
            activities: Vec::new(),
            last_contact_date: None,
            created_at,
        }
    }
}

impl Entity for Contact {
    const TABLE: &'static str = "contacts";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

impl HasActivities for Contact {
    const KIND: EntityKind = EntityKind::Contact;

    fn display_name(&self) -> &str {
        &self.name
    }

    fn activities(&self) -> &[Activity] {
        &self.activities
    }

    fn activities_mut(&mut self) -> &mut Vec<Activity> {
        &mut self.activities
    }
}
