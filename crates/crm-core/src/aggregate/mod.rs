//! Aggregation over record collections.
//!
//! [`reduce`] holds the generic group-by reducers; the pipeline board,
//! dashboard, task and activity views are built on top of them.

pub mod activities;
pub mod board;
pub mod dashboard;
pub mod reduce;
pub mod tasks;

pub use activities::{TimelineEntry, activities_for, delete_activity, log_activity, timeline, update_activity};
pub use board::{BoardColumn, PipelineBoard, move_deal};
pub use dashboard::{CompanyRollup, DashboardData, DashboardMetrics, EntityCounts, company_rollups};
pub use reduce::{count_by, ratio, sum_by, total};
