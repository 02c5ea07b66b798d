//! Dashboard metrics computed from every record table.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::activities::{TimelineEntry, timeline};
use super::reduce::{count_by, ratio, total};
use super::tasks::overdue;
use crate::config::CrmConfig;
use crate::error::Result;
use crate::model::{Company, Contact, Deal, DealStage, Lead, LeadStatus, RecordId, Task};
use crate::repository::{CrmStore, Repository};

/// Borrowed view of the record tables the dashboard reads.
#[derive(Debug, Clone, Copy)]
pub struct DashboardData<'a> {
    pub contacts: &'a [Contact],
    pub companies: &'a [Company],
    pub leads: &'a [Lead],
    pub deals: &'a [Deal],
    pub tasks: &'a [Task],
}

/// Record counts per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub contacts: usize,
    pub companies: usize,
    pub leads: usize,
    pub deals: usize,
    pub tasks: usize,
}

/// Contacts and deals attributed to one company.
///
/// A deal belongs to the company of its contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRollup {
    pub company_id: RecordId,
    pub company_name: String,
    pub contact_count: usize,
    pub deal_count: usize,
    pub deal_value: f64,
    /// Deals not yet won or lost.
    pub active_deal_count: usize,
    pub won_deal_count: usize,
    pub won_deal_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub counts: EntityCounts,
    pub total_deal_value: f64,
    /// Value of deals not yet won or lost.
    pub active_deal_value: f64,
    pub active_deal_count: usize,
    pub lead_status_counts: BTreeMap<LeadStatus, usize>,
    pub deal_stage_counts: BTreeMap<DealStage, usize>,
    /// Fraction of all deals in each stage (0..=1).
    pub deal_stage_share: BTreeMap<DealStage, f64>,
    /// Leads at or past qualification over all leads (0..=1).
    pub conversion_rate: f64,
    pub average_deal_size: f64,
    /// Won deals over all deals (0..=1).
    pub win_rate: f64,
    pub recent_activities: Vec<TimelineEntry>,
    pub upcoming_follow_ups: Vec<TimelineEntry>,
    pub overdue_tasks: Vec<Task>,
    pub company_rollups: Vec<CompanyRollup>,
}

impl DashboardMetrics {
    /// Compute every metric as of `now`.
    ///
    /// List lengths and the follow-up window come from `config`.
    pub fn compute(data: DashboardData<'_>, now: DateTime<Utc>, config: &CrmConfig) -> Self {
        let limit = config.dashboard_list_limit;
        let deal_count = data.deals.len();

        let deal_stage_counts = count_by(data.deals, |d| d.stage);
        let deal_stage_share = deal_stage_counts
            .iter()
            .map(|(stage, count)| (*stage, ratio(*count as f64, deal_count as f64)))
            .collect();

        let active: Vec<Deal> = data
            .deals
            .iter()
            .filter(|d| !d.stage.is_closed())
            .cloned()
            .collect();

        let total_deal_value = total(data.deals, |d| d.value);
        let converted = data.leads.iter().filter(|l| l.status.is_converted()).count();
        let won = deal_stage_counts.get(&DealStage::Won).copied().unwrap_or(0);

        let mut activities = timeline(data.contacts);
        activities.extend(timeline(data.leads));

        let mut recent_activities = activities.clone();
        recent_activities.sort_by(|a, b| b.activity.date.cmp(&a.activity.date));
        recent_activities.truncate(limit);

        let horizon = now + Duration::days(config.follow_up_window_days);
        let mut upcoming_follow_ups: Vec<TimelineEntry> = activities
            .into_iter()
            .filter(|entry| entry.activity.date > now && entry.activity.date < horizon)
            .collect();
        upcoming_follow_ups.sort_by_key(|entry| entry.activity.date);
        upcoming_follow_ups.truncate(limit);

        let mut overdue_tasks = overdue(data.tasks, now);
        overdue_tasks.truncate(limit);

        Self {
            counts: EntityCounts {
                contacts: data.contacts.len(),
                companies: data.companies.len(),
                leads: data.leads.len(),
                deals: deal_count,
                tasks: data.tasks.len(),
            },
            total_deal_value,
            active_deal_value: total(&active, |d| d.value),
            active_deal_count: active.len(),
            lead_status_counts: count_by(data.leads, |l| l.status),
            deal_stage_counts,
            deal_stage_share,
            conversion_rate: ratio(converted as f64, data.leads.len() as f64),
            average_deal_size: ratio(total_deal_value, deal_count as f64),
            win_rate: ratio(won as f64, deal_count as f64),
            recent_activities,
            upcoming_follow_ups,
            overdue_tasks,
            company_rollups: company_rollups(data.companies, data.contacts, data.deals),
        }
    }

    /// Read every table of `store` and compute the metrics.
    pub fn from_store(store: &CrmStore, now: DateTime<Utc>, config: &CrmConfig) -> Result<Self> {
        let contacts = store.contacts.list()?;
        let companies = store.companies.list()?;
        let leads = store.leads.list()?;
        let deals = store.deals.list()?;
        let tasks = store.tasks.list()?;
        let data = DashboardData {
            contacts: &contacts,
            companies: &companies,
            leads: &leads,
            deals: &deals,
            tasks: &tasks,
        };
        Ok(Self::compute(data, now, config))
    }
}

/// Per-company contact and deal totals, in company order.
pub fn company_rollups(companies: &[Company], contacts: &[Contact], deals: &[Deal]) -> Vec<CompanyRollup> {
    let company_of: HashMap<RecordId, RecordId> = contacts
        .iter()
        .filter_map(|c| c.company_id.map(|company| (c.id, company)))
        .collect();

    companies
        .iter()
        .map(|company| {
            let company_deals: Vec<Deal> = deals
                .iter()
                .filter(|d| {
                    d.contact_id
                        .and_then(|contact| company_of.get(&contact))
                        .is_some_and(|owner| *owner == company.id)
                })
                .cloned()
                .collect();
            let won: Vec<Deal> = company_deals
                .iter()
                .filter(|d| d.stage == DealStage::Won)
                .cloned()
                .collect();
            CompanyRollup {
                company_id: company.id,
                company_name: company.name.clone(),
                contact_count: contacts
                    .iter()
                    .filter(|c| c.company_id == Some(company.id))
                    .count(),
                deal_count: company_deals.len(),
                deal_value: total(&company_deals, |d| d.value),
                active_deal_count: company_deals.iter().filter(|d| !d.stage.is_closed()).count(),
                won_deal_count: won.len(),
                won_deal_value: total(&won, |d| d.value),
            }
        })
        .collect()
}
