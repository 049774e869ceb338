//! Row-mapping helpers shared by the repositories.
//!
//! Ids are stored in canonical text form and timestamps as RFC 3339 strings with microsecond
//! precision, so lexical order in SQL matches chronological order.

use caremap_uuid::RecordId;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

/// Current time truncated to the precision the store keeps.
///
/// Truncating up front means a record returned from `create` compares equal to the same
/// record read back later.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn timestamp_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn id_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<RecordId> {
    let raw: String = row.get(idx)?;
    RecordId::parse(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_text_round_trips_at_stored_precision() {
        let ts = now();
        let text = timestamp_to_sql(&ts);
        let parsed = DateTime::parse_from_rfc3339(&text)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parsed, ts);
        assert!(text.ends_with('Z'));
    }
}
