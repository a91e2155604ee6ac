use super::CliError;
use anyhow::Context;
use chrono::NaiveDateTime;
use globset::Glob;
use sensorlog_core::common::ToolSettings;
use sensorlog_core::domain::{SourceFile, Table};
use sensorlog_core::modules::loader::load_source;
use sensorlog_core::modules::parse_timestamp;
use sensorlog_core::modules::serialization::write_binary_artifact;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub(super) fn load_settings(path: Option<&Path>) -> Result<ToolSettings, CliError> {
    let settings = match path {
        Some(path) => ToolSettings::load(path)?,
        None => ToolSettings::default(),
    };
    settings.validate()?;
    debug!(
        timestamp_column = %settings.timestamp_column,
        control_column = %settings.control_column,
        limit_column = %settings.limit_column,
        "resolved tool settings"
    );
    Ok(settings)
}

/// Explicit paths first, then directory matches in name order.
pub(super) fn collect_inputs(
    paths: &[PathBuf],
    dir: Option<&Path>,
    pattern: &str,
) -> Result<Vec<PathBuf>, CliError> {
    let mut selected = paths.to_vec();

    if let Some(dir) = dir {
        let matcher = Glob::new(pattern)
            .map_err(|error| CliError::Usage(format!("invalid --pattern '{}': {}", pattern, error)))?
            .compile_matcher();
        let mut matched = fs::read_dir(dir)
            .with_context(|| format!("failed to list input directory '{}'", dir.display()))?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("failed to list input directory '{}'", dir.display()))?;
        matched.retain(|path| {
            path.is_file()
                && path
                    .file_name()
                    .is_some_and(|name| matcher.is_match(Path::new(name)))
        });
        matched.sort();
        selected.extend(matched);
    }

    if selected.is_empty() {
        return Err(CliError::Usage(
            "no input files selected; pass file paths or --dir".to_string(),
        ));
    }
    Ok(selected)
}

pub(super) fn read_source(path: &Path) -> Result<SourceFile, CliError> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read input file '{}'", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceFile::new(filename, bytes))
}

pub(super) fn read_sources(paths: &[PathBuf]) -> Result<Vec<SourceFile>, CliError> {
    paths.iter().map(|path| read_source(path)).collect()
}

pub(super) fn read_table(path: &Path) -> Result<Table, CliError> {
    let source = read_source(path)?;
    Ok(load_source(&source)?)
}

pub(super) fn write_output(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    Ok(write_binary_artifact(path, bytes)?)
}

pub(super) fn parse_window_bound(flag: &str, raw: &str) -> Result<NaiveDateTime, CliError> {
    parse_timestamp(raw).ok_or_else(|| {
        CliError::Usage(format!(
            "invalid {} '{}'; expected a timestamp such as 2024-05-01 08:30:00",
            flag, raw
        ))
    })
}

/// Splits a `COLUMN=LABEL` legend override.
pub(super) fn parse_legend_label(raw: &str) -> Result<(String, String), CliError> {
    match raw.split_once('=') {
        Some((column, label)) if !column.is_empty() => Ok((column.to_string(), label.to_string())),
        _ => Err(CliError::Usage(format!(
            "invalid --label '{}'; expected COLUMN=LABEL",
            raw
        ))),
    }
}
