use crate::domain::{SensorLogError, SensorLogResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

pub const LINE_WIDTH_RANGE: RangeInclusive<u32> = 1..=10;
pub const MARKER_SIZE_RANGE: RangeInclusive<u32> = 1..=20;
pub const FONT_SIZE_RANGE: RangeInclusive<u32> = 10..=50;

pub const X_AXIS_TITLE: &str = "时间";
pub const Y_AXIS_TITLE: &str = "值";
pub const TRACE_MODE: &str = "lines+markers";
pub const DEFAULT_TICK_COUNT: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartStyle {
    pub line_width: u32,
    pub marker_size: u32,
    pub axis_font_size: u32,
    pub legend_font_size: u32,
    pub title_font_size: u32,
    pub title: String,
    pub y_range: Option<AxisRange>,
    /// Legend label per column; unlisted columns use the column name.
    pub legend_labels: BTreeMap<String, String>,
    pub tick_count: usize,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            line_width: 4,
            marker_size: 1,
            axis_font_size: 20,
            legend_font_size: 20,
            title_font_size: 20,
            title: " ".to_string(),
            y_range: None,
            legend_labels: BTreeMap::new(),
            tick_count: DEFAULT_TICK_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StyleError {
    #[error("{field} {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
    #[error("tick count must be at least 1")]
    NoTicks,
    #[error("Y-axis range [{min}, {max}] must be finite with min <= max")]
    InvalidYRange { min: f64, max: f64 },
}

impl From<StyleError> for SensorLogError {
    fn from(error: StyleError) -> Self {
        SensorLogError::invalid_parameter("INPUT.CHART_STYLE", error.to_string())
    }
}

impl ChartStyle {
    pub fn validate(&self) -> SensorLogResult<()> {
        self.check().map_err(SensorLogError::from)
    }

    fn check(&self) -> Result<(), StyleError> {
        check_range("line width", self.line_width, &LINE_WIDTH_RANGE)?;
        check_range("marker size", self.marker_size, &MARKER_SIZE_RANGE)?;
        check_range("axis font size", self.axis_font_size, &FONT_SIZE_RANGE)?;
        check_range("legend font size", self.legend_font_size, &FONT_SIZE_RANGE)?;
        check_range("title font size", self.title_font_size, &FONT_SIZE_RANGE)?;

        if self.tick_count == 0 {
            return Err(StyleError::NoTicks);
        }
        if let Some(AxisRange { min, max }) = self.y_range {
            if !min.is_finite() || !max.is_finite() || min > max {
                return Err(StyleError::InvalidYRange { min, max });
            }
        }
        Ok(())
    }

    pub fn legend_label(&self, column: &str) -> String {
        self.legend_labels
            .get(column)
            .cloned()
            .unwrap_or_else(|| column.to_string())
    }
}

fn check_range(
    field: &'static str,
    value: u32,
    range: &RangeInclusive<u32>,
) -> Result<(), StyleError> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(StyleError::OutOfRange {
        field,
        value,
        min: *range.start(),
        max: *range.end(),
    })
}

/// Everything the caller chooses for one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub columns: Vec<String>,
    pub window: TimeWindow,
    pub style: ChartStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub x: NaiveDateTime,
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub column: String,
    pub label: String,
    pub mode: &'static str,
    pub line_width: u32,
    pub marker_size: u32,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisTick {
    pub position: usize,
    pub value: NaiveDateTime,
    pub label: String,
}

/// Render-ready chart handed to the plotting front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedChart {
    pub title: String,
    pub title_font_size: u32,
    pub x_axis_title: &'static str,
    pub y_axis_title: &'static str,
    pub axis_font_size: u32,
    pub legend_font_size: u32,
    pub range_slider: bool,
    pub x_range: Option<TimeWindow>,
    pub y_range: Option<AxisRange>,
    pub ticks: Vec<AxisTick>,
    pub series: Vec<ChartSeries>,
}

impl RenderedChart {
    pub fn to_json(&self) -> SensorLogResult<String> {
        serde_json::to_string_pretty(self).map_err(|source| {
            SensorLogError::internal(
                "SYS.CHART_JSON",
                format!("failed to serialize chart: {}", source),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AxisRange, ChartStyle, DEFAULT_TICK_COUNT};
    use crate::domain::ErrorKind;

    #[test]
    fn default_style_is_valid() {
        let style = ChartStyle::default();
        style.validate().expect("defaults should validate");
        assert_eq!(style.tick_count, DEFAULT_TICK_COUNT);
    }

    #[test]
    fn out_of_range_sizes_are_rejected() {
        let cases = [
            ChartStyle { line_width: 0, ..ChartStyle::default() },
            ChartStyle { line_width: 11, ..ChartStyle::default() },
            ChartStyle { marker_size: 21, ..ChartStyle::default() },
            ChartStyle { axis_font_size: 9, ..ChartStyle::default() },
            ChartStyle { legend_font_size: 51, ..ChartStyle::default() },
            ChartStyle { tick_count: 0, ..ChartStyle::default() },
            ChartStyle {
                y_range: Some(AxisRange { min: 5.0, max: 1.0 }),
                ..ChartStyle::default()
            },
        ];
        for style in cases {
            let error = style.validate().expect_err("style should be rejected");
            assert_eq!(error.kind(), ErrorKind::InvalidParameter);
        }
    }

    #[test]
    fn style_errors_name_the_offending_field() {
        let style = ChartStyle {
            marker_size: 30,
            ..ChartStyle::default()
        };
        let error = style.validate().expect_err("marker too large");
        assert_eq!(error.placeholder(), "INPUT.CHART_STYLE");
        assert_eq!(error.message(), "marker size 30 is outside 1..=20");
    }

    #[test]
    fn legend_label_falls_back_to_column_name() {
        let mut style = ChartStyle::default();
        style
            .legend_labels
            .insert("电源1黑片温度".to_string(), "黑片 #1".to_string());
        assert_eq!(style.legend_label("电源1黑片温度"), "黑片 #1");
        assert_eq!(style.legend_label("电源2腔体温度"), "电源2腔体温度");
    }
}
