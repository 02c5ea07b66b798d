//! One repository per record table, persisted as a JSON snapshot.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use super::InMemoryRepository;
use crate::error::{Result, ResultExt};
use crate::model::{Company, Contact, Deal, EmailTemplate, Lead, RecordId, Task};

/// Id high-water mark of each table.
///
/// Missing entries (older snapshots) read as 0 and fall back to the highest
/// stored id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NextIds {
    pub contacts: RecordId,
    pub companies: RecordId,
    pub leads: RecordId,
    pub deals: RecordId,
    pub tasks: RecordId,
    pub templates: RecordId,
}

/// Serialized form of a [`CrmStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snapshot {
    pub contacts: Vec<Contact>,
    pub companies: Vec<Company>,
    pub leads: Vec<Lead>,
    pub deals: Vec<Deal>,
    pub tasks: Vec<Task>,
    pub templates: Vec<EmailTemplate>,
    pub next_ids: NextIds,
}

/// The record tables of one CRM workspace.
#[derive(Default)]
pub struct CrmStore {
    pub contacts: InMemoryRepository<Contact>,
    pub companies: InMemoryRepository<Company>,
    pub leads: InMemoryRepository<Lead>,
    pub deals: InMemoryRepository<Deal>,
    pub tasks: InMemoryRepository<Task>,
    pub templates: InMemoryRepository<EmailTemplate>,
}

impl CrmStore {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let next = snapshot.next_ids;
        Self {
            contacts: InMemoryRepository::with_next_id(snapshot.contacts, next.contacts),
            companies: InMemoryRepository::with_next_id(snapshot.companies, next.companies),
            leads: InMemoryRepository::with_next_id(snapshot.leads, next.leads),
            deals: InMemoryRepository::with_next_id(snapshot.deals, next.deals),
            tasks: InMemoryRepository::with_next_id(snapshot.tasks, next.tasks),
            templates: InMemoryRepository::with_next_id(snapshot.templates, next.templates),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            contacts: self.contacts.records(),
            companies: self.companies.records(),
            leads: self.leads.records(),
            deals: self.deals.records(),
            tasks: self.tasks.records(),
            templates: self.templates.records(),
            next_ids: NextIds {
                contacts: self.contacts.next_id(),
                companies: self.companies.next_id(),
                leads: self.leads.next_id(),
                deals: self.deals.next_id(),
                tasks: self.tasks.next_id(),
                templates: self.templates.next_id(),
            },
        }
    }

    /// Load a snapshot file. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No snapshot at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .context(format!("Reading snapshot {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&text)?;
        info!(
            contacts = snapshot.contacts.len(),
            deals = snapshot.deals.len(),
            "Loaded snapshot from {}",
            path.display()
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Write the store to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .context(format!("Creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path, json).context(format!("Writing snapshot {}", path.display()))?;
        debug!("Saved snapshot to {}", path.display());
        Ok(())
    }

    /// Save the store whether or not `outcome` succeeded, then return it.
    ///
    /// Records written before a failure (e.g. the rows of an import that
    /// aborted midway) are kept. When both fail, `outcome`'s error wins and
    /// the save error is logged.
    pub fn save_with<T>(&self, path: &Path, outcome: Result<T>) -> Result<T> {
        match (self.save(path), outcome) {
            (Ok(()), outcome) => outcome,
            (Err(save_error), Ok(_)) => Err(save_error),
            (Err(save_error), Err(error)) => {
                warn!("Snapshot not saved after failure: {save_error}");
                Err(error)
            }
        }
    }
}
