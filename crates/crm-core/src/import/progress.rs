//! Progress reporting for bulk imports.
//!
//! # Example
//!
//! ```rust,ignore
//! use crm_core::import::{BulkImporter, ClosureProgressReporter};
//!
//! let reporter = ClosureProgressReporter::new(|update| {
//!     println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//! });
//! BulkImporter::new(&config).with_progress(&reporter).run(&store.contacts, &candidates)?;
//! ```

use serde::{Deserialize, Serialize};

/// Phases of a bulk import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStage {
    /// Checking every candidate for required fields
    Validating,
    /// Creating records one at a time
    Creating,
    /// All records created
    Complete,
    /// Validation or storage failed
    Failed,
}

impl ImportStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Validating => "Validating Rows",
            Self::Creating => "Creating Contacts",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall import this stage accounts for.
    fn weight(&self) -> f32 {
        match self {
            Self::Validating => 0.05,
            Self::Creating => 0.95,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    fn base_progress(&self) -> f32 {
        match self {
            Self::Validating => 0.0,
            Self::Creating => 0.05,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: ImportStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Human-readable message describing current activity
    pub message: String,

    /// Rows handled so far in the current stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    /// Rows in the current stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    /// An update at the start of `stage`.
    pub fn new(stage: ImportStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: stage.base_progress(),
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// An update with item counts.
    pub fn with_items(
        stage: ImportStage,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        let progress = stage.base_progress() + stage.weight() * stage_progress;
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            message: message.into(),
            items_processed: Some(current),
            items_total: Some(total),
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(ImportStage::Complete, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(ImportStage::Failed, message)
    }
}

/// Receives progress updates during an import.
///
/// Implementations must be `Send + Sync` so an import can run on a worker
/// thread while the caller renders progress.
pub trait ProgressReporter: Send + Sync {
    /// Called once per stage change and once per created record.
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
