use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, RecordId};
use crate::utils::timestamp;

/// An organisation contacts belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(rename = "Id", default)]
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub employee_count: u32,
    #[serde(default)]
    pub annual_revenue: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

fn default_country() -> String {
    "USA".to_string()
}

impl Company {
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            industry: String::new(),
            website: String::new(),
            phone: String::new(),
            email: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: default_country(),
            employee_count: 0,
            annual_revenue: 0.0,
            notes: String::new(),
            created_at,
        }
    }
}

impl Entity for Company {
    const TABLE: &'static str = "companies";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}
