use super::CliError;
use super::helpers::*;
use sensorlog_core::common::ToolSettings;
use sensorlog_core::domain::SensorLogError;
use sensorlog_core::modules::serialization::{extracted_to_csv_bytes, table_to_csv_bytes};
use sensorlog_core::modules::series::{AxisRange, time_bounds};
use sensorlog_core::modules::{
    BatchGenerator, BatchPackager, ChartSpec, ChartStyle, DecrementJob, SubstitutionJob,
    TimeWindow, extract_indexed, merge_sources, normalize_timestamp, parse_config, render_chart,
};
use std::path::PathBuf;

const DEFAULT_MERGE_OUTPUT: &str = "合并文件.csv";
const DEFAULT_EXTRACT_OUTPUT: &str = "信息提取结果.csv";

#[derive(clap::Args)]
pub(super) struct InputSelection {
    /// Source CSV files; the character before the extension picks the group
    #[arg(value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Directory to scan for additional source files
    #[arg(long)]
    dir: Option<PathBuf>,

    /// File-name glob applied inside --dir
    #[arg(long, default_value = "*.csv")]
    pattern: String,
}

#[derive(clap::Args)]
pub(super) struct MergeArgs {
    #[command(flatten)]
    selection: InputSelection,

    /// Merged CSV output path
    #[arg(long, default_value = DEFAULT_MERGE_OUTPUT)]
    output: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct ExtractArgs {
    /// Merged CSV produced by `merge`
    merged: PathBuf,

    /// Configuration CSV with sample type and power index fields; repeatable
    #[arg(long = "config", value_name = "FILE", required = true)]
    configs: Vec<PathBuf>,

    /// Extracted CSV output path
    #[arg(long, default_value = DEFAULT_EXTRACT_OUTPUT)]
    output: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct ChartArgs {
    /// Extracted CSV produced by `extract`
    input: PathBuf,

    /// Columns to plot, comma separated or repeated
    #[arg(long, value_delimiter = ',', required = true)]
    columns: Vec<String>,

    /// Window start; defaults to the earliest timestamp
    #[arg(long)]
    start: Option<String>,

    /// Window end; defaults to the latest timestamp
    #[arg(long)]
    end: Option<String>,

    /// Line width (1-10)
    #[arg(long)]
    line_width: Option<u32>,

    /// Marker size (1-20)
    #[arg(long)]
    marker_size: Option<u32>,

    /// Axis title font size (10-50)
    #[arg(long)]
    axis_font_size: Option<u32>,

    /// Legend font size (10-50)
    #[arg(long)]
    legend_font_size: Option<u32>,

    /// Chart title font size (10-50)
    #[arg(long)]
    title_font_size: Option<u32>,

    /// Number of time-axis tick labels
    #[arg(long)]
    ticks: Option<usize>,

    /// Chart title
    #[arg(long)]
    title: Option<String>,

    /// Fixed Y-axis minimum
    #[arg(long, requires = "y_max", allow_hyphen_values = true)]
    y_min: Option<f64>,

    /// Fixed Y-axis maximum
    #[arg(long, requires = "y_min", allow_hyphen_values = true)]
    y_max: Option<f64>,

    /// Legend label override; repeatable
    #[arg(long = "label", value_name = "COLUMN=LABEL")]
    labels: Vec<String>,

    /// Write chart JSON here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
#[command(group(clap::ArgGroup::new("destination").required(true).args(["archive", "out_dir"])))]
pub(super) struct BatchOutputArgs {
    /// Prefix for generated file names
    #[arg(long, default_value = "")]
    prefix: String,

    /// Write all generated tables into one zip archive
    #[arg(long)]
    archive: Option<PathBuf>,

    /// Write generated tables as individual files into this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct DecrementArgs {
    /// Table to decrement
    input: PathBuf,

    /// Column lowered on every step
    #[arg(long)]
    column: String,

    /// Amount subtracted per step
    #[arg(long, allow_hyphen_values = true)]
    step: f64,

    #[command(flatten)]
    output: BatchOutputArgs,
}

#[derive(clap::Args)]
pub(super) struct SubstituteArgs {
    /// Standard template table
    #[arg(long)]
    standard: PathBuf,

    /// Replacement table; first field feeds the control column, second the limit column
    #[arg(long)]
    replacement: PathBuf,

    #[command(flatten)]
    output: BatchOutputArgs,
}

impl ChartArgs {
    fn style(&self) -> Result<ChartStyle, CliError> {
        let defaults = ChartStyle::default();
        let legend_labels = self
            .labels
            .iter()
            .map(|raw| parse_legend_label(raw))
            .collect::<Result<_, _>>()?;
        let y_range = match (self.y_min, self.y_max) {
            (Some(min), Some(max)) => Some(AxisRange { min, max }),
            _ => None,
        };

        Ok(ChartStyle {
            line_width: self.line_width.unwrap_or(defaults.line_width),
            marker_size: self.marker_size.unwrap_or(defaults.marker_size),
            axis_font_size: self.axis_font_size.unwrap_or(defaults.axis_font_size),
            legend_font_size: self.legend_font_size.unwrap_or(defaults.legend_font_size),
            title_font_size: self.title_font_size.unwrap_or(defaults.title_font_size),
            title: self.title.clone().unwrap_or(defaults.title),
            y_range,
            legend_labels,
            tick_count: self.ticks.unwrap_or(defaults.tick_count),
        })
    }
}

pub(super) fn run_merge_command(args: MergeArgs, settings: &ToolSettings) -> Result<i32, CliError> {
    let paths = collect_inputs(
        &args.selection.inputs,
        args.selection.dir.as_deref(),
        &args.selection.pattern,
    )?;
    let sources = read_sources(&paths)?;
    let merged = merge_sources(&sources, &settings.timestamp_column)?;
    let bytes = table_to_csv_bytes(&merged)?;
    write_output(&args.output, &bytes)?;

    println!(
        "Merged {} files into '{}' ({} rows, {} columns).",
        sources.len(),
        args.output.display(),
        merged.row_count(),
        merged.column_count()
    );
    Ok(0)
}

pub(super) fn run_extract_command(
    args: ExtractArgs,
    settings: &ToolSettings,
) -> Result<i32, CliError> {
    let merged = read_table(&args.merged)?;
    let configs = args
        .configs
        .iter()
        .map(|path| read_table(path))
        .collect::<Result<Vec<_>, _>>()?;

    let targets = parse_config(&configs, settings)?;
    let extracted = extract_indexed(&merged, &targets, &settings.timestamp_column)?;
    let bytes = extracted_to_csv_bytes(&extracted)?;
    write_output(&args.output, &bytes)?;

    println!(
        "Extracted {} columns over {} rows into '{}'.",
        extracted.data().column_count(),
        extracted.row_count(),
        args.output.display()
    );
    Ok(0)
}

pub(super) fn run_chart_command(args: ChartArgs, settings: &ToolSettings) -> Result<i32, CliError> {
    let style = args.style()?;
    let table = read_table(&args.input)?;
    let extracted = normalize_timestamp(&table, &settings.timestamp_column)?;

    let bounds = time_bounds(&extracted);
    let start = match &args.start {
        Some(raw) => parse_window_bound("--start", raw)?,
        None => bounds.map(|window| window.start).ok_or_else(no_timestamps)?,
    };
    let end = match &args.end {
        Some(raw) => parse_window_bound("--end", raw)?,
        None => bounds.map(|window| window.end).ok_or_else(no_timestamps)?,
    };

    let spec = ChartSpec {
        columns: args.columns,
        window: TimeWindow { start, end },
        style,
    };
    let chart = render_chart(&extracted, &spec)?;
    let json = chart.to_json()?;

    match &args.output {
        Some(path) => {
            write_output(path, json.as_bytes())?;
            println!(
                "Wrote chart with {} series to '{}'.",
                chart.series.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(0)
}

fn no_timestamps() -> SensorLogError {
    SensorLogError::invalid_range(
        "INPUT.CHART_WINDOW",
        "table has no valid timestamps; pass --start and --end",
    )
}

pub(super) fn run_decrement_command(
    args: DecrementArgs,
    settings: &ToolSettings,
) -> Result<i32, CliError> {
    let table = read_table(&args.input)?;
    let job = DecrementJob {
        table: &table,
        column: &args.column,
        step: args.step,
        max_snapshots: settings.max_decrement_snapshots,
    };
    write_batch(&job, &args.output)
}

pub(super) fn run_substitute_command(
    args: SubstituteArgs,
    settings: &ToolSettings,
) -> Result<i32, CliError> {
    let template = read_table(&args.standard)?;
    let replacements = read_table(&args.replacement)?;
    let job = SubstitutionJob {
        template: &template,
        replacements: &replacements,
        control_column: &settings.control_column,
        limit_column: &settings.limit_column,
    };
    write_batch(&job, &args.output)
}

fn write_batch<G>(job: &G, output: &BatchOutputArgs) -> Result<i32, CliError>
where
    G: BatchGenerator,
{
    match (&output.archive, &output.out_dir) {
        (Some(path), _) => {
            let archive = job.generate_archive(&output.prefix)?;
            write_output(path, &archive)?;
            println!(
                "Wrote {} batch archive '{}' ({} bytes).",
                job.kind().as_str(),
                path.display(),
                archive.len()
            );
        }
        (None, Some(dir)) => {
            let written = job.generate_files(dir, &output.prefix)?;
            println!(
                "Wrote {} {} files to '{}'.",
                written.len(),
                job.kind().as_str(),
                dir.display()
            );
        }
        (None, None) => {
            return Err(CliError::Usage(
                "pass --archive or --out-dir".to_string(),
            ));
        }
    }
    Ok(0)
}
