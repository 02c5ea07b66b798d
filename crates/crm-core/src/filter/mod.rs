//! Record filtering: composable criteria, list search and saved presets.

mod criteria;
mod presets;
mod search;

pub use criteria::{DateRange, FilterSpec, Filterable, ValueRange, apply};
pub use presets::{FileStore, FilterPreset, FilterPresets, KeyValueStore, MemoryStore, PRESETS_KEY};
pub use search::{Selection, search_deals, search_leads};
