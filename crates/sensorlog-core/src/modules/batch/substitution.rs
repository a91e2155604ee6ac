use crate::domain::{Cell, SensorLogError, SensorLogResult, Table};
use crate::modules::archive::BatchKind;
use crate::modules::traits::BatchGenerator;
use tracing::info;

/// One template copy per replacement row. The first replacement field feeds
/// the control column, the second the limit column.
#[derive(Debug, Clone)]
pub struct SubstitutionJob<'a> {
    pub template: &'a Table,
    pub replacements: &'a Table,
    pub control_column: &'a str,
    pub limit_column: &'a str,
}

impl BatchGenerator for SubstitutionJob<'_> {
    fn kind(&self) -> BatchKind {
        BatchKind::Substitution
    }

    fn generate(&self) -> SensorLogResult<Vec<Table>> {
        run_substitution(
            self.template,
            self.replacements,
            self.control_column,
            self.limit_column,
        )
    }
}

pub fn run_substitution(
    template: &Table,
    replacements: &Table,
    control_column: &str,
    limit_column: &str,
) -> SensorLogResult<Vec<Table>> {
    let control = template_column(template, control_column)?;
    let limit = template_column(template, limit_column)?;
    if replacements.column_count() < 2 {
        return Err(SensorLogError::missing_column(
            "INPUT.REPLACEMENT_FIELDS",
            format!(
                "replacement table needs at least two fields, found {}",
                replacements.column_count()
            ),
        ));
    }

    let mut outputs = Vec::with_capacity(replacements.row_count());
    for row in 0..replacements.row_count() {
        let control_value = replacement_field(replacements, row, 0)?;
        let limit_value = replacement_field(replacements, row, 1)?;

        let mut output = template.clone();
        if let Some(column) = output.column_mut(control) {
            for cell in column.cells.iter_mut().filter(|cell| !cell.is_missing()) {
                *cell = control_value.clone();
            }
        }
        if let Some(column) = output.column_mut(limit) {
            column.cells.fill(limit_value.clone());
        }
        outputs.push(output);
    }

    info!(
        outputs = outputs.len(),
        template_rows = template.row_count(),
        "generated substitution batch"
    );
    Ok(outputs)
}

fn template_column(template: &Table, name: &str) -> SensorLogResult<usize> {
    template.column_index(name).ok_or_else(|| {
        SensorLogError::missing_column(
            "INPUT.TEMPLATE_COLUMN",
            format!("template table has no '{}' column", name),
        )
    })
}

fn replacement_field(replacements: &Table, row: usize, field: usize) -> SensorLogResult<&Cell> {
    match replacements.cell(row, field) {
        Some(cell) if !cell.is_missing() => Ok(cell),
        _ => Err(SensorLogError::missing_column(
            "INPUT.REPLACEMENT_FIELDS",
            format!(
                "replacement row {} is missing field {}",
                row + 1,
                field + 1
            ),
        )),
    }
}
