//! Template registry implementations for Nexus.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryTemplateStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteTemplateStore;

/// Join declared field names for a single text column.
pub(crate) fn join_fields(fields: &[String]) -> String {
    fields.join(",")
}

/// Split a comma-joined field column back into names.
pub(crate) fn split_fields(column: &str) -> Vec<String> {
    column
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
