use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Entity, RecordId};
use crate::utils::{option_amount, option_date, option_timestamp, timestamp};

/// Pipeline stage of a deal, in board order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum DealStage {
    #[default]
    New,
    Contacted,
    Qualified,
    Proposal,
    Negotiation,
    #[serde(alias = "Closed Won")]
    Won,
    #[serde(alias = "Closed Lost")]
    Lost,
}

impl DealStage {
    /// Every stage, in the order the pipeline board shows them.
    pub const ALL: [DealStage; 7] = [
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

    /// Won and lost deals no longer count towards the open pipeline.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for DealStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        let wanted = wanted.strip_prefix("closed ").unwrap_or(&wanted);
        Self::ALL
            .into_iter()
            .find(|stage| stage.label().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown deal stage '{s}'"))
    }
}

/// A sales opportunity tracked on the pipeline board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    #[serde(rename = "Id", default)]
    pub id: RecordId,
    pub name: String,
    #[serde(default, with = "option_amount")]
    pub value: Option<f64>,
    #[serde(default)]
    pub stage: DealStage,
    #[serde(default)]
    pub contact_id: Option<RecordId>,
    #[serde(default, with = "option_date")]
    pub close_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, with = "option_timestamp")]
    pub last_contact_date: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Deal {
    pub fn new(name: impl Into<String>, value: f64, stage: DealStage, created_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            value: Some(value),
            stage,
            contact_id: None,
            close_date: None,
            notes: String::new(),
            last_contact_date: None,
            created_at,
        }
    }
}

impl Entity for Deal {
    const TABLE: &'static str = "deals";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}
