//! Typed in-process events.
//!
//! Components publish [`CrmEvent`]s on an [`EventBus`] instead of raising
//! global notifications; front ends subscribe to the ones they render.
//!
//! # Event Flow
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  add button          ──► "ui:add-requested"    AddRequested(View) │
//! │  import / export     ──► "app:loading"         Loading            │
//! │  bulk import         ──► "import:completed"    ImportCompleted    │
//! │  board move_deal     ──► "deal:stage-changed"  DealStageChanged   │
//! │  preset save/delete  ──► "presets:changed"     PresetsChanged     │
//! │  any failure         ──► "app:error"           Error              │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::CrmError;
use crate::model::{DealStage, RecordId};

// ============================================================================
// EVENT NAME CONSTANTS
// ============================================================================

/// Payload: the [`View`] whose add form should open.
pub const EVENT_ADD_REQUESTED: &str = "ui:add-requested";

/// Payload: loading flag and optional message.
pub const EVENT_LOADING: &str = "app:loading";

/// Payload: number of contacts created.
pub const EVENT_IMPORT_COMPLETED: &str = "import:completed";

/// Payload: deal id with old and new stage.
pub const EVENT_DEAL_STAGE_CHANGED: &str = "deal:stage-changed";

/// Payload: number of presets after the change.
pub const EVENT_PRESETS_CHANGED: &str = "presets:changed";

/// Payload: error code and message.
pub const EVENT_ERROR: &str = "app:error";

// ============================================================================
// EVENTS
// ============================================================================

/// The record list a view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Contacts,
    Companies,
    Leads,
    Deals,
    Tasks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum CrmEvent {
    AddRequested(View),
    Loading {
        is_loading: bool,
        message: Option<String>,
    },
    ImportCompleted {
        created: usize,
    },
    DealStageChanged {
        deal_id: RecordId,
        from: DealStage,
        to: DealStage,
    },
    PresetsChanged {
        count: usize,
    },
    Error {
        code: String,
        message: String,
    },
}

impl CrmEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddRequested(_) => EVENT_ADD_REQUESTED,
            Self::Loading { .. } => EVENT_LOADING,
            Self::ImportCompleted { .. } => EVENT_IMPORT_COMPLETED,
            Self::DealStageChanged { .. } => EVENT_DEAL_STAGE_CHANGED,
            Self::PresetsChanged { .. } => EVENT_PRESETS_CHANGED,
            Self::Error { .. } => EVENT_ERROR,
        }
    }

    pub fn loading(is_loading: bool, message: Option<&str>) -> Self {
        Self::Loading {
            is_loading,
            message: message.map(String::from),
        }
    }

    /// Error event carrying the error's stable code.
    pub fn error(error: &CrmError) -> Self {
        Self::Error {
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

// ============================================================================
// BUS
// ============================================================================

/// Handle returned by [`EventBus::subscribe`].
pub type SubscriptionId = u64;

type Handler = Arc<dyn Fn(&CrmEvent) + Send + Sync>;

/// Synchronous publish/subscribe hub.
///
/// Handlers run on the emitting thread in subscription order. A handler may
/// subscribe or unsubscribe while an event is being delivered; the change
/// applies to the next emit.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<Vec<(SubscriptionId, Handler)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&CrmEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.handlers.write().push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    pub fn emit(&self, event: CrmEvent) {
        tracing::trace!(event = event.name(), "emit");
        let handlers: Vec<Handler> = self
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Emit `Loading { true }` now and `Loading { false }` when the guard drops.
    pub fn loading(&self, message: &str) -> LoadingGuard<'_> {
        self.emit(CrmEvent::loading(true, Some(message)));
        LoadingGuard { bus: self }
    }
}

/// Clears the loading flag on drop, on every exit path.
#[must_use = "dropping the guard immediately clears the loading flag"]
pub struct LoadingGuard<'a> {
    bus: &'a EventBus,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.bus.emit(CrmEvent::loading(false, None));
    }
}

static_assertions::assert_impl_all!(EventBus: Send, Sync);
static_assertions::assert_impl_all!(CrmEvent: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recording_bus() -> (EventBus, Arc<Mutex<Vec<CrmEvent>>>) {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(move |event| sink.lock().push(event.clone()));
        (bus, seen)
    }

    #[test]
    fn test_emit_reaches_subscribers() {
        let (bus, seen) = recording_bus();
        bus.emit(CrmEvent::AddRequested(View::Deals));
        assert_eq!(*seen.lock(), vec![CrmEvent::AddRequested(View::Deals)]);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let id = bus.subscribe(|_| {});
        assert_eq!(bus.subscriber_count(), 1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_loading_guard_clears_on_error_path() {
        let (bus, seen) = recording_bus();
        let result: Result<(), CrmError> = (|| {
            let _guard = bus.loading("Importing contacts...");
            Err(CrmError::Storage("offline".to_string()))
        })();
        assert!(result.is_err());

        let events = seen.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], CrmEvent::loading(true, Some("Importing contacts...")));
        assert_eq!(events[1], CrmEvent::loading(false, None));
    }

    #[test]
    fn test_error_event_uses_error_code() {
        let event = CrmEvent::error(&CrmError::EmptyPresetName);
        assert_eq!(event.name(), EVENT_ERROR);
        assert!(matches!(event, CrmEvent::Error { ref code, .. } if code == "EMPTY_PRESET_NAME"));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(CrmEvent::ImportCompleted { created: 3 }).unwrap();
        assert_eq!(json["event"], "import_completed");
        assert_eq!(json["payload"]["created"], 3);
    }
}
