//! Media cache database schema.
//!
//! A schema change requires a full cache clear: records carry no version
//! field, and the cache is safe to rebuild from the media backend at any
//! time.

use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

const MEDIA_RECORDS_TABLE: Table = Table {
    name: "media_records",
    columns: &[
        Column {
            name: "id",
            sql_type: SqlType::Text,
            is_primary_key: true,
            non_null: false,
        },
        Column {
            name: "payload",
            sql_type: SqlType::Blob,
            is_primary_key: false,
            non_null: true,
        },
        Column {
            name: "metadata",
            sql_type: SqlType::Text,
            is_primary_key: false,
            non_null: true,
        },
        Column {
            name: "cached_at",
            sql_type: SqlType::Integer,
            is_primary_key: false,
            non_null: true,
        },
    ],
    // Pruning and diagnostics walk records oldest-first.
    indices: &[("idx_media_records_cached_at", "cached_at")],
};

pub const MEDIA_CACHE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[MEDIA_RECORDS_TABLE],
    migration: None,
}];
