//! Column conversion helpers shared by the query modules.

use jiff::Timestamp;
use rusqlite::{types::Type, Row};
use serde::de::DeserializeOwned;

/// Reads a TEXT column holding JSON.
pub(super) fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Reads a TEXT column holding a timestamp.
pub(super) fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<Timestamp> {
    row.get::<_, String>(idx)?
        .parse::<Timestamp>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Reads a nullable TEXT column holding a timestamp.
pub(super) fn optional_timestamp_column(
    row: &Row,
    idx: usize,
) -> rusqlite::Result<Option<Timestamp>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(text) => text
            .parse::<Timestamp>()
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(None),
    }
}
