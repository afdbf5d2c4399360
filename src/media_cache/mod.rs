//! Local durable cache of fetched media payloads.
//!
//! A single SQLite-backed collection of records keyed by media id. The cache
//! is agnostic to what the payload bytes represent; metadata is round-tripped
//! unchanged. Records are overwritten wholesale, never partially mutated, and
//! removed only by a whole-store clear (or the optional byte-budget pruning).

mod cache;
mod models;
mod schema;
mod store;

pub use cache::MediaCache;
pub use models::{CacheStats, MediaRecord};
pub use store::{MediaStore, SqliteMediaStore, StoreError};
