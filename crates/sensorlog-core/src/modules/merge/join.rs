use crate::domain::{Cell, Column, GroupKey, SensorLogError, SensorLogResult, Table};
use crate::modules::helpers::deterministic_argsort_by;
use std::collections::HashMap;
use tracing::debug;

/// Folds the concatenated group tables into one table with successive outer
/// joins on `join_column`. The first group seeds the result; group order
/// decides column order and collision suffixes.
pub fn outer_join(groups: &[(GroupKey, Table)], join_column: &str) -> SensorLogResult<Table> {
    let merged = groups
        .iter()
        .try_fold(None::<Table>, |accumulator, (key, table)| {
            let next = match accumulator {
                None => {
                    table
                        .require_column(join_column, "INPUT.JOIN_COLUMN")
                        .map_err(|error| error.for_source(&format!("group '{}'", key)))?;
                    table.clone()
                }
                Some(accumulator) => outer_join_step(&accumulator, table, join_column, *key)?,
            };
            Ok::<_, SensorLogError>(Some(next))
        })?;
    Ok(merged.unwrap_or_default())
}

/// One outer join of `right` into `left`.
///
/// Rows with equal keys pair up as a cross product; unmatched rows on either
/// side are kept with missing cells for the other side. Missing keys match
/// each other like any other value. Output rows are stably ordered by key. A
/// right column whose name is already taken is renamed `{name}_{key}`.
pub fn outer_join_step(
    left: &Table,
    right: &Table,
    join_column: &str,
    right_key: GroupKey,
) -> SensorLogResult<Table> {
    let left_join = left
        .require_column(join_column, "INPUT.JOIN_COLUMN")
        .map_err(|error| error.for_source("merged table"))?;
    let right_join = right
        .require_column(join_column, "INPUT.JOIN_COLUMN")
        .map_err(|error| error.for_source(&format!("group '{}'", right_key)))?;

    let left_keys = &left.columns()[left_join].cells;
    let right_keys = &right.columns()[right_join].cells;

    let mut right_index: HashMap<Option<String>, Vec<usize>> = HashMap::new();
    for (row, key) in right_keys.iter().enumerate() {
        right_index.entry(join_key(key)).or_default().push(row);
    }

    let mut pairs: Vec<(Option<usize>, Option<usize>)> = Vec::with_capacity(left_keys.len());
    let mut right_matched = vec![false; right_keys.len()];
    for (left_row, key) in left_keys.iter().enumerate() {
        match right_index.get(&join_key(key)) {
            Some(rows) => {
                for &right_row in rows {
                    right_matched[right_row] = true;
                    pairs.push((Some(left_row), Some(right_row)));
                }
            }
            None => pairs.push((Some(left_row), None)),
        }
    }
    pairs.extend(
        right_matched
            .iter()
            .enumerate()
            .filter(|(_, matched)| !**matched)
            .map(|(right_row, _)| (None, Some(right_row))),
    );

    let keys = pairs
        .iter()
        .map(|pair| match pair {
            (Some(left_row), _) => left_keys[*left_row].clone(),
            (None, Some(right_row)) => right_keys[*right_row].clone(),
            (None, None) => Cell::Missing,
        })
        .collect::<Vec<_>>();
    let order = deterministic_argsort_by(&keys, Cell::sort_cmp);

    let take = |cells: &[Cell], row: Option<usize>| row.map_or(Cell::Missing, |row| cells[row].clone());

    let mut columns = Vec::with_capacity(left.column_count() + right.column_count());
    for (position, column) in left.columns().iter().enumerate() {
        let cells = if position == left_join {
            order.iter().map(|&row| keys[row].clone()).collect()
        } else {
            order
                .iter()
                .map(|&row| take(&column.cells, pairs[row].0))
                .collect()
        };
        columns.push(Column::new(column.name.clone(), cells));
    }

    for (position, column) in right.columns().iter().enumerate() {
        if position == right_join {
            continue;
        }
        let name = unique_name(&columns, &column.name, right_key);
        let cells = order
            .iter()
            .map(|&row| take(&column.cells, pairs[row].1))
            .collect();
        columns.push(Column::new(name, cells));
    }

    debug!(
        left_rows = left.row_count(),
        right_rows = right.row_count(),
        rows = order.len(),
        group = %right_key,
        "outer join step"
    );
    Table::new(columns)
}

/// Missing cells share the `None` key so they pair up with each other.
fn join_key(cell: &Cell) -> Option<String> {
    (!cell.is_missing()).then(|| cell.to_field())
}

fn unique_name(existing: &[Column], name: &str, key: GroupKey) -> String {
    let taken = |candidate: &str| existing.iter().any(|column| column.name == candidate);
    if !taken(name) {
        return name.to_string();
    }

    let suffixed = format!("{}_{}", name, key);
    if !taken(&suffixed) {
        return suffixed;
    }

    (2..)
        .map(|counter| format!("{}_{}", suffixed, counter))
        .find(|candidate| !taken(candidate))
        .unwrap_or(suffixed)
}
