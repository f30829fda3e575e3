//! Schema validation
//!
//! Runs once per session, before any other query, and rejects databases
//! written by application versions this reader does not understand.

use crate::storage::{Store, schema};
use crate::{Error, Result};

const UNSUPPORTED_VERSION: &str = "It seems like you tried to open a database from an older app version. \
     Please use an older viewer release for this database";

/// Check that every required table and column is present.
pub fn validate(store: &Store) -> Result<()> {
    for table in schema::REQUIRED_TABLES {
        if !store.has_table(table)? {
            return Err(incompatible(&format!("table {}", table)));
        }
    }

    for (table, column) in schema::REQUIRED_COLUMNS {
        if !store.has_column(table, column)? {
            return Err(incompatible(&format!("column {}.{}", table, column)));
        }
    }

    tracing::debug!("Schema of {} is compatible", store.path().display());
    Ok(())
}

fn incompatible(missing: &str) -> Error {
    tracing::warn!("Rejecting database: missing {}", missing);
    Error::IncompatibleSchema(format!("{} (missing {})", UNSUPPORTED_VERSION, missing))
}
