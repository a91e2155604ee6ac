mod join;

pub use join::{outer_join, outer_join_step};

use super::loader::load_source;
use crate::domain::{GroupKey, SensorLogError, SensorLogResult, SourceFile, Table};
use std::path::Path;
use tracing::info;

/// Tables sharing one group key, in upload order.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceGroup {
    pub key: GroupKey,
    pub tables: Vec<Table>,
}

/// The character immediately before the extension, e.g. `B` for
/// `2024-05-01_B.csv`. Directory components are ignored.
pub fn group_key(filename: &str) -> SensorLogResult<GroupKey> {
    let base_name = Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("");

    let Some((stem, extension)) = base_name.rsplit_once('.') else {
        return Err(SensorLogError::invalid_filename(
            "INPUT.GROUP_KEY",
            format!("file name '{}' has no extension", filename),
        ));
    };
    if extension.is_empty() {
        return Err(SensorLogError::invalid_filename(
            "INPUT.GROUP_KEY",
            format!("file name '{}' has an empty extension", filename),
        ));
    }

    stem.chars().next_back().map(GroupKey).ok_or_else(|| {
        SensorLogError::invalid_filename(
            "INPUT.GROUP_KEY",
            format!("file name '{}' is empty before its extension", filename),
        )
    })
}

/// Loads every source and buckets it by group key, keeping groups in order of
/// first appearance.
pub fn group_sources(sources: &[SourceFile]) -> SensorLogResult<Vec<SourceGroup>> {
    let mut groups: Vec<SourceGroup> = Vec::new();
    for source in sources {
        let key = group_key(&source.filename)?;
        let table = load_source(source)?;
        match groups.iter_mut().find(|group| group.key == key) {
            Some(group) => group.tables.push(table),
            None => groups.push(SourceGroup {
                key,
                tables: vec![table],
            }),
        }
    }
    Ok(groups)
}

/// Row-wise union of tables with the same column set. Later tables are
/// aligned to the first table's column order.
pub fn concatenate(tables: &[Table]) -> SensorLogResult<Table> {
    let Some(first) = tables.first() else {
        return Ok(Table::default());
    };
    let names = first.column_names();

    let mut columns = first.columns().to_vec();
    for (position, table) in tables.iter().enumerate().skip(1) {
        let mut other = table.column_names();
        let mut expected = names.clone();
        other.sort_unstable();
        expected.sort_unstable();
        if other != expected {
            return Err(SensorLogError::schema_mismatch(
                "INPUT.CONCAT_SCHEMA",
                format!(
                    "table {} has columns [{}] but the group expects [{}]",
                    position + 1,
                    table.column_names().join(", "),
                    names.join(", ")
                ),
            ));
        }

        for column in &mut columns {
            if let Some(source) = table.column(&column.name) {
                column.cells.extend(source.cells.iter().cloned());
            }
        }
    }

    Table::new(columns)
}

/// Concatenates each group's tables, keeping the group order.
pub fn concatenate_groups(groups: &[SourceGroup]) -> SensorLogResult<Vec<(GroupKey, Table)>> {
    groups
        .iter()
        .map(|group| {
            concatenate(&group.tables)
                .map(|table| (group.key, table))
                .map_err(|error| error.for_source(&format!("group '{}'", group.key)))
        })
        .collect()
}

/// Groups, concatenates and outer-joins the uploaded sources on `join_column`.
pub fn merge_sources(sources: &[SourceFile], join_column: &str) -> SensorLogResult<Table> {
    let groups = group_sources(sources)?;
    info!(
        files = sources.len(),
        groups = groups.len(),
        "grouped source files"
    );
    let concatenated = concatenate_groups(&groups)?;
    let merged = outer_join(&concatenated, join_column)?;
    info!(
        rows = merged.row_count(),
        columns = merged.column_count(),
        "merged groups on '{}'",
        join_column
    );
    Ok(merged)
}
