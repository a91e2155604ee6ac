use super::helpers::deterministic_argsort_by;
use crate::domain::{
    CANONICAL_TIMESTAMP_FORMAT, Cell, Column, ExtractedTable, SensorLogError, SensorLogResult,
    Table,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::{info, warn};

const DATETIME_LAYOUTS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
const DATE_LAYOUTS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Projects `merged` onto `targets`, in target order.
pub fn extract(merged: &Table, targets: &[String]) -> SensorLogResult<Table> {
    let columns = targets
        .iter()
        .map(|name| {
            merged.column(name).cloned().ok_or_else(|| {
                SensorLogError::unknown_column(
                    "INPUT.EXTRACT_COLUMN",
                    format!("column '{}' is not present in the merged table", name),
                )
            })
        })
        .collect::<SensorLogResult<Vec<Column>>>()?;
    Table::new(columns)
}

/// Parses a timestamp in any accepted layout, truncated to whole seconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(trimmed, layout).ok())
        .or_else(|| {
            DATE_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(trimmed, layout).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .map(canonicalize)
}

/// Rounds a timestamp through the canonical layout, which keeps whole seconds.
fn canonicalize(value: NaiveDateTime) -> NaiveDateTime {
    value.with_nanosecond(0).unwrap_or(value)
}

fn cell_timestamp(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::Text(raw) => parse_timestamp(raw),
        Cell::Timestamp(value) => Some(canonicalize(*value)),
        Cell::Missing | Cell::Number(_) => None,
    }
}

/// Promotes `timestamp_column` to the row index. Unparseable values become
/// missing index entries; rows are stably sorted by index with missing
/// entries last so the index supports range slicing.
pub fn normalize_timestamp(table: &Table, timestamp_column: &str) -> SensorLogResult<ExtractedTable> {
    let position = table.require_column(timestamp_column, "INPUT.TIMESTAMP_COLUMN")?;
    let index = table.columns()[position]
        .cells
        .iter()
        .map(cell_timestamp)
        .collect::<Vec<_>>();

    let invalid = index.iter().filter(|value| value.is_none()).count();
    if invalid > 0 {
        warn!(
            rows = invalid,
            "'{}' values could not be parsed as timestamps and were left missing",
            timestamp_column
        );
    }

    let data = Table::new(
        table
            .columns()
            .iter()
            .enumerate()
            .filter(|(column, _)| *column != position)
            .map(|(_, column)| column.clone())
            .collect(),
    )?;

    let order = deterministic_argsort_by(&index, |lhs, rhs| match (lhs, rhs) {
        (Some(lhs), Some(rhs)) => lhs.cmp(rhs),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let unsorted = ExtractedTable::new(timestamp_column, index, data)?;
    Ok(unsorted.select_rows(&order))
}

/// Projection followed by timestamp indexing.
pub fn extract_indexed(
    merged: &Table,
    targets: &[String],
    timestamp_column: &str,
) -> SensorLogResult<ExtractedTable> {
    let projected = extract(merged, targets)?;
    let extracted = normalize_timestamp(&projected, timestamp_column)?;
    info!(
        rows = extracted.row_count(),
        columns = extracted.data().column_count(),
        "extracted columns indexed by '{}' ({})",
        timestamp_column,
        CANONICAL_TIMESTAMP_FORMAT
    );
    Ok(extracted)
}
