use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordId;
use crate::utils::timestamp;

/// What kind of interaction an activity records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
    #[default]
    Note,
    #[serde(other)]
    Other,
}

/// One logged interaction, stored inside its parent contact or lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "type", default)]
    pub activity_type: ActivityType,
    #[serde(with = "timestamp")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, alias = "contactId_c")]
    pub contact_id: Option<RecordId>,
    #[serde(default, alias = "dealId_c")]
    pub deal_id: Option<RecordId>,
}

/// Input for logging a new activity; the id is assigned on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    #[serde(rename = "type", default)]
    pub activity_type: ActivityType,
    #[serde(with = "timestamp")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub contact_id: Option<RecordId>,
    #[serde(default)]
    pub deal_id: Option<RecordId>,
}

impl NewActivity {
    pub fn into_activity(self, id: RecordId) -> Activity {
        Activity {
            id,
            activity_type: self.activity_type,
            date: self.date,
            notes: self.notes,
            contact_id: self.contact_id,
            deal_id: self.deal_id,
        }
    }
}
