//! The built-in Kotlin expression schema.

use once_cell::sync::OnceCell;

use crate::errors::SchemaError;
use crate::schema::Schema;

/// Schema text the built-in registry is built from.
pub const KOTLIN_SCHEMA_SOURCE: &str = include_str!("kotlin.schema");

static KOTLIN: OnceCell<Schema> = OnceCell::new();

/// Returns the process-wide Kotlin registry, building it on first use.
pub fn kotlin() -> Result<&'static Schema, SchemaError> {
    KOTLIN.get_or_try_init(|| Schema::from_source("kotlin.schema", KOTLIN_SCHEMA_SOURCE))
}
