use crate::common::ToolSettings;
use crate::domain::{Cell, SensorLogError, SensorLogResult, Table};
use tracing::info;

/// One configuration row: which power supply and which sample type to pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfigEntry {
    pub power_index: String,
    pub sample_type: String,
}

impl ExtractionConfigEntry {
    pub fn normalized_sample_type(&self, settings: &ToolSettings) -> String {
        settings
            .label_replacements
            .iter()
            .fold(self.sample_type.clone(), |label, replacement| {
                label.replace(&replacement.from, &replacement.to)
            })
    }

    pub fn target_column(&self, settings: &ToolSettings) -> String {
        format!(
            "{}{}{}{}",
            settings.name_prefix,
            self.power_index,
            self.normalized_sample_type(settings),
            settings.name_suffix
        )
    }
}

pub fn read_config_entries(
    tables: &[Table],
    settings: &ToolSettings,
) -> SensorLogResult<Vec<ExtractionConfigEntry>> {
    let mut entries = Vec::new();
    for (table_position, table) in tables.iter().enumerate() {
        let sample_type = config_field(table, &settings.sample_type_field, table_position)?;
        let power_index = config_field(table, &settings.power_index_field, table_position)?;

        for row in 0..table.row_count() {
            let read = |column: usize, field: &str| {
                match &table.columns()[column].cells[row] {
                    Cell::Missing => Err(SensorLogError::missing_field(
                        "INPUT.CONFIG_VALUE",
                        format!(
                            "configuration table {} row {} has no value for '{}'",
                            table_position + 1,
                            row + 1,
                            field
                        ),
                    )),
                    cell => Ok(cell.to_field()),
                }
            };
            entries.push(ExtractionConfigEntry {
                power_index: read(power_index, &settings.power_index_field)?,
                sample_type: read(sample_type, &settings.sample_type_field)?,
            });
        }
    }
    Ok(entries)
}

/// Turns the configuration tables into the ordered list of columns to
/// extract. The timestamp column always comes first.
pub fn parse_config(tables: &[Table], settings: &ToolSettings) -> SensorLogResult<Vec<String>> {
    let entries = read_config_entries(tables, settings)?;
    let plan = std::iter::once(settings.timestamp_column.clone())
        .chain(entries.iter().map(|entry| entry.target_column(settings)))
        .collect::<Vec<_>>();
    info!(
        tables = tables.len(),
        columns = plan.len() - 1,
        "planned extraction columns"
    );
    Ok(plan)
}

fn config_field(table: &Table, field: &str, table_position: usize) -> SensorLogResult<usize> {
    table.column_index(field).ok_or_else(|| {
        SensorLogError::missing_field(
            "INPUT.CONFIG_FIELD",
            format!(
                "configuration table {} has no '{}' column (found: {})",
                table_position + 1,
                field,
                table.column_names().join(", ")
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::parse_config;
    use crate::common::ToolSettings;
    use crate::domain::ErrorKind;
    use crate::modules::loader::parse_csv_text;

    #[test]
    fn synthesizes_names_with_label_normalization() {
        let config = parse_csv_text("采样类型,对应电源号\n黑温,1\n腔体,2\n").expect("config");
        let plan = parse_config(&[config], &ToolSettings::default()).expect("plan");
        assert_eq!(plan, vec!["时间", "电源1黑片温度", "电源2腔体温度"]);
    }

    #[test]
    fn timestamp_column_is_first_across_tables() {
        let first = parse_csv_text("对应电源号,采样类型,备注\n3,腔体,x\n").expect("config");
        let second = parse_csv_text("采样类型,对应电源号\n黑片,1\n").expect("config");
        let plan = parse_config(&[first, second], &ToolSettings::default()).expect("plan");
        assert_eq!(plan[0], "时间");
        assert_eq!(&plan[1..], &["电源3腔体温度", "电源1黑片温度"]);
    }

    #[test]
    fn no_configuration_yields_only_the_timestamp() {
        let plan = parse_config(&[], &ToolSettings::default()).expect("plan");
        assert_eq!(plan, vec!["时间"]);
    }

    #[test]
    fn missing_config_column_is_a_missing_field() {
        let config = parse_csv_text("采样类型\n黑温\n").expect("config");
        let error = parse_config(&[config], &ToolSettings::default()).expect_err("field absent");
        assert_eq!(error.kind(), ErrorKind::MissingField);
        assert!(error.message().contains("对应电源号"));
    }

    #[test]
    fn blank_config_value_is_a_missing_field() {
        let config = parse_csv_text("采样类型,对应电源号\n黑温,\n").expect("config");
        let error = parse_config(&[config], &ToolSettings::default()).expect_err("value absent");
        assert_eq!(error.placeholder(), "INPUT.CONFIG_VALUE");
    }
}
