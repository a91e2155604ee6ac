//! Tool-wide settings for the merge, extraction and batch pipelines.
//!
//! Defaults reproduce the column names and naming rules of the sensor-log
//! exports this tool was built around. A JSON settings file may override any
//! subset of fields; unspecified fields keep their defaults.

use crate::domain::{SensorLogError, SensorLogResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_TIMESTAMP_COLUMN: &str = "时间";
pub const DEFAULT_SAMPLE_TYPE_FIELD: &str = "采样类型";
pub const DEFAULT_POWER_INDEX_FIELD: &str = "对应电源号";
pub const DEFAULT_NAME_PREFIX: &str = "电源";
pub const DEFAULT_NAME_SUFFIX: &str = "温度";
pub const DEFAULT_CONTROL_COLUMN: &str = "设定值";
pub const DEFAULT_LIMIT_COLUMN: &str = "限值";
pub const DEFAULT_MAX_DECREMENT_SNAPSHOTS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelReplacement {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolSettings {
    pub timestamp_column: String,
    pub sample_type_field: String,
    pub power_index_field: String,
    pub name_prefix: String,
    pub name_suffix: String,
    pub label_replacements: Vec<LabelReplacement>,
    pub control_column: String,
    pub limit_column: String,
    pub max_decrement_snapshots: usize,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            timestamp_column: DEFAULT_TIMESTAMP_COLUMN.to_string(),
            sample_type_field: DEFAULT_SAMPLE_TYPE_FIELD.to_string(),
            power_index_field: DEFAULT_POWER_INDEX_FIELD.to_string(),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            name_suffix: DEFAULT_NAME_SUFFIX.to_string(),
            label_replacements: vec![LabelReplacement {
                from: "黑温".to_string(),
                to: "黑片".to_string(),
            }],
            control_column: DEFAULT_CONTROL_COLUMN.to_string(),
            limit_column: DEFAULT_LIMIT_COLUMN.to_string(),
            max_decrement_snapshots: DEFAULT_MAX_DECREMENT_SNAPSHOTS,
        }
    }
}

impl ToolSettings {
    pub fn from_json_str(source: &str) -> SensorLogResult<Self> {
        let settings = serde_json::from_str::<Self>(source).map_err(|source| {
            SensorLogError::parse(
                "INPUT.SETTINGS_PARSE",
                format!("failed to parse settings JSON: {}", source),
            )
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> SensorLogResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| {
            SensorLogError::io_system(
                "IO.SETTINGS_READ",
                format!("failed to read settings '{}': {}", path.display(), source),
            )
        })?;
        Self::from_json_str(&source)
    }

    pub fn validate(&self) -> SensorLogResult<()> {
        let required = [
            ("timestampColumn", &self.timestamp_column),
            ("sampleTypeField", &self.sample_type_field),
            ("powerIndexField", &self.power_index_field),
            ("controlColumn", &self.control_column),
            ("limitColumn", &self.limit_column),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(SensorLogError::invalid_parameter(
                "INPUT.SETTINGS_FIELD",
                format!("settings field '{}' must not be empty", field),
            ));
        }
        if self.max_decrement_snapshots == 0 {
            return Err(SensorLogError::invalid_parameter(
                "INPUT.SETTINGS_FIELD",
                "settings field 'maxDecrementSnapshots' must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ToolSettings;
    use crate::domain::ErrorKind;

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let settings = ToolSettings::from_json_str(r#"{ "controlColumn": "控温" }"#)
            .expect("partial settings should parse");
        assert_eq!(settings.control_column, "控温");
        assert_eq!(settings.timestamp_column, "时间");
        assert_eq!(settings.max_decrement_snapshots, 10_000);
        assert_eq!(settings.label_replacements.len(), 1);
    }

    #[test]
    fn empty_column_names_are_rejected() {
        let error = ToolSettings::from_json_str(r#"{ "timestampColumn": " " }"#)
            .expect_err("blank timestamp column should fail");
        assert_eq!(error.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let error = ToolSettings::from_json_str("{").expect_err("truncated JSON should fail");
        assert_eq!(error.kind(), ErrorKind::Parse);
        assert_eq!(error.placeholder(), "INPUT.SETTINGS_PARSE");
    }
}
