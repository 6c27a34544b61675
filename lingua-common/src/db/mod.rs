//! Database layer
//!
//! SQLite via sqlx. One repository module per entity; all timestamps are
//! stored as RFC3339 text, nested payloads (attempt history, exchanges,
//! error lists) as JSON text columns.

pub mod activities;
pub mod grammar;
pub mod init;
pub mod pronunciation;
pub mod schedule;
pub mod sessions;
pub mod users;
pub mod vocabulary;

use crate::{Error, Result};
use chrono::{DateTime, Utc};

/// Parse an RFC3339 timestamp column
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp in database: {}", e)))
}

/// Parse a nullable RFC3339 timestamp column
pub(crate) fn parse_opt_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(s) => Ok(Some(parse_timestamp(&s)?)),
        None => Ok(None),
    }
}
