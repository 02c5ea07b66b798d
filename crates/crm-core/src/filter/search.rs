//! Free-text search and stage/status selection for list views.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::{Deal, DealStage, Lead, LeadStatus};
use crate::utils::contains_ignore_case;

/// Either every value or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }
}

impl<T: FromStr<Err = String>> FromStr for Selection<T> {
    type Err = String;

    /// `"all"` (any case) or a value `T` parses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Only(value) => fmt::Display::fmt(value, f),
        }
    }
}

/// Deals whose name or notes contain `query`, limited to `stage`.
///
/// An empty query matches every deal.
pub fn search_deals(deals: &[Deal], query: &str, stage: Selection<DealStage>) -> Vec<Deal> {
    let query = query.trim();
    deals
        .iter()
        .filter(|deal| stage.accepts(&deal.stage))
        .filter(|deal| {
            query.is_empty()
                || contains_ignore_case(&deal.name, query)
                || contains_ignore_case(&deal.notes, query)
        })
        .cloned()
        .collect()
}

/// Leads whose name, company or email contain `query`, limited to `status`.
pub fn search_leads(leads: &[Lead], query: &str, status: Selection<LeadStatus>) -> Vec<Lead> {
    let query = query.trim();
    leads
        .iter()
        .filter(|lead| status.accepts(&lead.status))
        .filter(|lead| {
            query.is_empty()
                || contains_ignore_case(&lead.name, query)
                || contains_ignore_case(&lead.company, query)
                || contains_ignore_case(&lead.email, query)
        })
        .cloned()
        .collect()
}
