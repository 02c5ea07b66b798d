use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Activity, Entity, EntityKind, HasActivities, RecordId};
use crate::utils::{option_amount, option_timestamp, timestamp};

/// Qualification status of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Proposal,
    Negotiation,
    Won,
    Lost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 7] = [
        Self::New,
        Self::Contacted,
        Self::Qualified,
        Self::Proposal,
        Self::Negotiation,
        Self::Won,
        Self::Lost,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Contacted => "Contacted",
            Self::Qualified => "Qualified",
            Self::Proposal => "Proposal",
            Self::Negotiation => "Negotiation",
            Self::Won => "Won",
            Self::Lost => "Lost",
        }
    }

    /// Leads at or past qualification count as converted.
    pub fn is_converted(&self) -> bool {
        matches!(
            self,
            Self::Qualified | Self::Proposal | Self::Negotiation | Self::Won
        )
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.label().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown lead status '{s}'"))
    }
}

/// A prospective customer not yet converted into a contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(rename = "Id", default)]
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub status: LeadStatus,
    #[serde(default)]
    pub source: String,
    #[serde(default, with = "option_amount")]
    pub value: Option<f64>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default, with = "option_timestamp")]
    pub last_contact_date: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(name: impl Into<String>, status: LeadStatus, created_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            company: String::new(),
            email: String::new(),
            phone: String::new(),
            status,
            source: String::new(),
            value: None,
            notes: String::new(),
            activities: Vec::new(),
            last_contact_date: None,
            created_at,
        }
    }
}

impl Entity for Lead {
    const TABLE: &'static str = "leads";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

impl HasActivities for Lead {
    const KIND: EntityKind = EntityKind::Lead;

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
