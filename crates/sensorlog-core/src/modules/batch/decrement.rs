use crate::domain::{Cell, SensorLogError, SensorLogResult, Table};
use crate::modules::archive::BatchKind;
use crate::modules::traits::BatchGenerator;
use tracing::{debug, info};

/// Relative slack, scaled by the initial maximum, under which a quotient or a
/// residue counts as exact.
const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Repeatedly lowers one column by a fixed step until its maximum reaches zero.
#[derive(Debug, Clone)]
pub struct DecrementJob<'a> {
    pub table: &'a Table,
    pub column: &'a str,
    pub step: f64,
    pub max_snapshots: usize,
}

impl BatchGenerator for DecrementJob<'_> {
    fn kind(&self) -> BatchKind {
        BatchKind::Decrement
    }

    fn generate(&self) -> SensorLogResult<Vec<Table>> {
        run_decrement(self.table, self.column, self.step, self.max_snapshots)
    }
}

/// Snapshots after each decrement of `column`, where every non-missing value
/// becomes `max(0, value - step)`. The input table itself is not included.
pub fn run_decrement(
    table: &Table,
    column: &str,
    step: f64,
    max_snapshots: usize,
) -> SensorLogResult<Vec<Table>> {
    let position = table.require_column(column, "INPUT.DECREMENT_COLUMN")?;
    if !step.is_finite() || step <= 0.0 {
        return Err(SensorLogError::invalid_parameter(
            "INPUT.DECREMENT_STEP",
            format!("decrement step must be a positive number, got {}", step),
        ));
    }

    let target = &table.columns()[position];
    if let Some((row, cell)) = target
        .cells
        .iter()
        .enumerate()
        .find(|(_, cell)| matches!(cell, Cell::Text(_) | Cell::Timestamp(_)))
    {
        return Err(SensorLogError::parse(
            "INPUT.DECREMENT_VALUE",
            format!(
                "column '{}' row {} holds non-numeric value '{}'",
                column,
                row + 1,
                cell
            ),
        ));
    }

    let Some(initial_max) = target.numeric_max().filter(|max| *max > 0.0) else {
        info!(column, "column maximum is already at or below zero; no snapshots");
        return Ok(Vec::new());
    };

    let count = snapshot_count(initial_max, step);
    if count > max_snapshots as f64 {
        return Err(SensorLogError::invalid_parameter(
            "INPUT.DECREMENT_STEP",
            format!(
                "step {} would need {} snapshots to bring '{}' from {} to zero; limit is {}",
                step, count, column, initial_max, max_snapshots
            ),
        ));
    }
    let count = count as usize;
    let residue = initial_max * RELATIVE_TOLERANCE;

    let snapshots = (1..=count)
        .map(|index| {
            let offset = if index == count {
                f64::INFINITY
            } else {
                index as f64 * step
            };
            let mut snapshot = table.clone();
            if let Some(target) = snapshot.column_mut(position) {
                for cell in &mut target.cells {
                    if let Cell::Number(value) = cell {
                        *value = lowered(*value, offset, residue);
                    }
                }
            }
            debug!(snapshot = index, "decremented '{}'", column);
            snapshot
        })
        .collect::<Vec<_>>();

    info!(
        snapshots = snapshots.len(),
        initial_max,
        step,
        "generated decrement batch for '{}'",
        column
    );
    Ok(snapshots)
}

/// `ceil(max / step)`, treating a quotient within rounding error of an
/// integer as that integer.
fn snapshot_count(max: f64, step: f64) -> f64 {
    let quotient = max / step;
    let nearest = quotient.round();
    if nearest >= 1.0 && (quotient - nearest).abs() <= nearest * RELATIVE_TOLERANCE {
        nearest
    } else {
        quotient.ceil()
    }
}

/// Each snapshot is computed from the input value, so error does not build up
/// across steps. The last snapshot passes an infinite offset and is all zeros.
fn lowered(value: f64, offset: f64, residue: f64) -> f64 {
    let next = value - offset;
    if next <= residue { 0.0 } else { next }
}
