use serde::{Deserialize, Serialize};

use super::{Entity, RecordId};

/// Category given to templates saved without one.
pub const DEFAULT_TEMPLATE_CATEGORY: &str = "general";

/// A reusable email subject and body.
///
/// The body may contain the `[Contact Name]` placeholder, filled in when the
/// template is applied to a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    #[serde(rename = "Id", default)]
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    DEFAULT_TEMPLATE_CATEGORY.to_string()
}

impl EmailTemplate {
    pub fn new(name: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            subject: subject.into(),
            body: body.into(),
            category: default_category(),
        }
    }
}

impl Entity for EmailTemplate {
    const TABLE: &'static str = "templates";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }
}
