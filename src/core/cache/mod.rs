// Athlete performance cache (memory + durable JSON files)

pub mod entry;
pub mod store;

pub use entry::CacheEntry;
pub use store::{CacheStats, EntityCache, FillGuard};
