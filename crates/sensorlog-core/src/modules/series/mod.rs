mod model;

pub use model::{
    AxisRange, AxisTick, ChartSeries, ChartSpec, ChartStyle, FONT_SIZE_RANGE, LINE_WIDTH_RANGE,
    MARKER_SIZE_RANGE, RenderedChart, SeriesPoint, StyleError, TimeWindow, X_AXIS_TITLE,
    Y_AXIS_TITLE,
};

use super::helpers::linear_positions;
use crate::domain::{
    CANONICAL_TIMESTAMP_FORMAT, ExtractedTable, SensorLogError, SensorLogResult,
};
use chrono::NaiveDateTime;
use tracing::debug;

/// Earliest and latest index values, ignoring missing entries.
pub fn time_bounds(table: &ExtractedTable) -> Option<TimeWindow> {
    let mut present = table.index().iter().flatten();
    let first = *present.next()?;
    let (start, end) = present.fold((first, first), |(start, end), value| {
        (start.min(*value), end.max(*value))
    });
    Some(TimeWindow { start, end })
}

/// Rows whose index lies in `[start, end]`, in table order.
pub fn filter_window(
    table: &ExtractedTable,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> SensorLogResult<ExtractedTable> {
    if start > end {
        return Err(SensorLogError::invalid_range(
            "INPUT.CHART_WINDOW",
            format!(
                "window start {} is later than window end {}",
                start.format(CANONICAL_TIMESTAMP_FORMAT),
                end.format(CANONICAL_TIMESTAMP_FORMAT)
            ),
        ));
    }

    let rows = table
        .index()
        .iter()
        .enumerate()
        .filter(|(_, value)| matches!(value, Some(ts) if *ts >= start && *ts <= end))
        .map(|(row, _)| row)
        .collect::<Vec<_>>();
    debug!(
        rows = rows.len(),
        total = table.row_count(),
        "filtered rows to chart window"
    );
    Ok(table.select_rows(&rows))
}

/// Builds one series per selected column plus the subsampled tick labels.
/// Cells that are not numbers become gaps in their series.
pub fn build_series(
    filtered: &ExtractedTable,
    columns: &[String],
    style: &ChartStyle,
) -> SensorLogResult<RenderedChart> {
    style.validate()?;
    if columns.is_empty() {
        return Err(SensorLogError::invalid_parameter(
            "INPUT.CHART_COLUMNS",
            "select at least one column to chart",
        ));
    }

    let data = filtered.data();
    let series = columns
        .iter()
        .map(|name| {
            let column = data.column(name).ok_or_else(|| {
                SensorLogError::unknown_column(
                    "INPUT.CHART_COLUMNS",
                    format!("column '{}' is not present in the extracted table", name),
                )
            })?;
            let points = filtered
                .index()
                .iter()
                .zip(&column.cells)
                .filter_map(|(x, cell)| {
                    x.map(|x| SeriesPoint {
                        x,
                        y: cell.as_f64(),
                    })
                })
                .collect();
            Ok(ChartSeries {
                column: name.clone(),
                label: style.legend_label(name),
                mode: model::TRACE_MODE,
                line_width: style.line_width,
                marker_size: style.marker_size,
                points,
            })
        })
        .collect::<SensorLogResult<Vec<_>>>()?;

    let ticks = linear_positions(filtered.row_count(), style.tick_count)
        .into_iter()
        .filter_map(|position| {
            filtered.index()[position].map(|value| AxisTick {
                position,
                value,
                label: value.format(CANONICAL_TIMESTAMP_FORMAT).to_string(),
            })
        })
        .collect();

    Ok(RenderedChart {
        title: style.title.clone(),
        title_font_size: style.title_font_size,
        x_axis_title: X_AXIS_TITLE,
        y_axis_title: Y_AXIS_TITLE,
        axis_font_size: style.axis_font_size,
        legend_font_size: style.legend_font_size,
        range_slider: true,
        x_range: time_bounds(filtered),
        y_range: style.y_range.or_else(|| value_range(&series)),
        ticks,
        series,
    })
}

/// Filters to the requested window and builds the chart.
pub fn render_chart(table: &ExtractedTable, spec: &ChartSpec) -> SensorLogResult<RenderedChart> {
    let filtered = filter_window(table, spec.window.start, spec.window.end)?;
    build_series(&filtered, &spec.columns, &spec.style)
}

fn value_range(series: &[ChartSeries]) -> Option<AxisRange> {
    series
        .iter()
        .flat_map(|series| series.points.iter().filter_map(|point| point.y))
        .fold(None, |range, value| match range {
            None => Some(AxisRange {
                min: value,
                max: value,
            }),
            Some(AxisRange { min, max }) => Some(AxisRange {
                min: min.min(value),
                max: max.max(value),
            }),
        })
}

#[cfg(test)]
mod tests {
    use super::{AxisRange, ChartStyle, build_series, filter_window, time_bounds};
    use crate::domain::ErrorKind;
    use crate::modules::extract::normalize_timestamp;
    use crate::modules::loader::parse_csv_text;
    use chrono::NaiveDateTime;

    fn at(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").expect("fixture timestamp")
    }

    fn extracted(rows: usize) -> crate::domain::ExtractedTable {
        let mut text = String::from("时间,a,b\n");
        for row in 0..rows {
            text.push_str(&format!("2024-01-01 00:{:02}:00,{},x\n", row, row));
        }
        let table = parse_csv_text(&text).expect("fixture table");
        normalize_timestamp(&table, "时间").expect("fixture index")
    }

    #[test]
    fn window_is_inclusive_on_both_ends() {
        let table = extracted(10);
        let filtered =
            filter_window(&table, at("2024-01-01 00:02:00"), at("2024-01-01 00:05:00")).expect("window");
        assert_eq!(filtered.row_count(), 4);
        assert_eq!(filtered.index()[0], Some(at("2024-01-01 00:02:00")));
        assert_eq!(filtered.index()[3], Some(at("2024-01-01 00:05:00")));
    }

    #[test]
    fn window_outside_the_data_is_empty_not_an_error() {
        let table = extracted(5);
        let filtered =
            filter_window(&table, at("2030-01-01 00:00:00"), at("2030-01-02 00:00:00")).expect("window");
        assert!(filtered.is_empty());
        assert_eq!(time_bounds(&filtered), None);
    }

    #[test]
    fn reversed_window_is_an_invalid_range() {
        let table = extracted(5);
        let error = filter_window(&table, at("2024-01-02 00:00:00"), at("2024-01-01 00:00:00"))
            .expect_err("start after end");
        assert_eq!(error.kind(), ErrorKind::InvalidRange);
    }

    #[test]
    fn ticks_are_subsampled_without_touching_series_data() {
        let table = extracted(59);
        let style = ChartStyle {
            tick_count: 5,
            ..ChartStyle::default()
        };
        let chart = build_series(&table, &["a".to_string()], &style).expect("chart");

        assert_eq!(chart.series[0].points.len(), 59);
        let positions = chart.ticks.iter().map(|tick| tick.position).collect::<Vec<_>>();
        assert_eq!(positions, vec![0, 14, 29, 43, 58]);
        assert_eq!(chart.ticks[0].label, "2024-01-01 00:00:00");
    }

    #[test]
    fn ticks_clip_to_row_count_and_text_cells_are_gaps() {
        let table = extracted(3);
        let chart = build_series(&table, &["a".to_string(), "b".to_string()], &ChartStyle::default())
            .expect("chart");
        assert_eq!(chart.ticks.len(), 3);
        assert!(chart.series[1].points.iter().all(|point| point.y.is_none()));
        assert_eq!(chart.y_range, Some(AxisRange { min: 0.0, max: 2.0 }));
        assert_eq!(chart.series[0].label, "a");
    }

    #[test]
    fn unknown_chart_column_is_reported() {
        let table = extracted(3);
        let error = build_series(&table, &["nope".to_string()], &ChartStyle::default())
            .expect_err("column absent");
        assert_eq!(error.kind(), ErrorKind::UnknownColumn);
    }
}
