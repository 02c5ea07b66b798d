//! Activity logs kept inside contacts and leads.

use serde::Serialize;
use tracing::debug;

use crate::error::{CrmError, Result};
use crate::model::{Activity, EntityKind, HasActivities, NewActivity, RecordId};
use crate::repository::Repository;

const ACTIVITIES_TABLE: &str = "activities";

/// An activity tagged with the record it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub entity_type: EntityKind,
    pub entity_id: RecordId,
    pub entity_name: String,
    #[serde(flatten)]
    pub activity: Activity,
}

/// Every activity of `records`, tagged with its parent.
pub fn timeline<T: HasActivities>(records: &[T]) -> Vec<TimelineEntry> {
    records
        .iter()
        .flat_map(|record| {
            record.activities().iter().map(move |activity| TimelineEntry {
                entity_type: T::KIND,
                entity_id: record.id(),
                entity_name: record.display_name().to_string(),
                activity: activity.clone(),
            })
        })
        .collect()
}

/// Activities of the record `id`, in logged order.
pub fn activities_for<T: HasActivities>(repo: &dyn Repository<T>, id: RecordId) -> Result<Vec<Activity>> {
    Ok(repo.require(id)?.activities().to_vec())
}

/// Append an activity to the record `id`.
///
/// The new activity's id is one more than the highest id already logged on
/// that record, or 1 for its first activity.
pub fn log_activity<T: HasActivities>(
    repo: &dyn Repository<T>,
    id: RecordId,
    input: NewActivity,
) -> Result<Activity> {
    let mut record = repo.require(id)?;
    let next_id = record.activities().iter().map(|a| a.id).max().unwrap_or(0) + 1;
    let activity = input.into_activity(next_id);
    record.activities_mut().push(activity.clone());
    repo.update(record)?;
    debug!(table = T::TABLE, id, activity_id = next_id, "Activity logged");
    Ok(activity)
}

/// Replace the fields of one logged activity, keeping its id.
pub fn update_activity<T: HasActivities>(
    repo: &dyn Repository<T>,
    id: RecordId,
    activity_id: RecordId,
    input: NewActivity,
) -> Result<Activity> {
    let mut record = repo.require(id)?;
    let slot = record
        .activities_mut()
        .iter_mut()
        .find(|a| a.id == activity_id)
        .ok_or(CrmError::NotFound {
            table: ACTIVITIES_TABLE,
            id: activity_id,
        })?;
    *slot = input.into_activity(activity_id);
    let updated = slot.clone();
    repo.update(record)?;
    Ok(updated)
}

/// Remove one logged activity. Returns `false` when the record had no such activity.
pub fn delete_activity<T: HasActivities>(
    repo: &dyn Repository<T>,
    id: RecordId,
    activity_id: RecordId,
) -> Result<bool> {
    let mut record = repo.require(id)?;
    let before = record.activities().len();
    record.activities_mut().retain(|a| a.id != activity_id);
    if record.activities().len() == before {
        return Ok(false);
    }
    repo.update(record)?;
    Ok(true)
}
