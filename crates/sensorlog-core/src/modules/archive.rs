use super::serialization::{table_to_csv_bytes, write_binary_artifact};
use crate::domain::{SensorLogError, SensorLogResult, Table};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Which batch produced the tables; decides where entry numbering starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchKind {
    Substitution,
    Decrement,
}

impl BatchKind {
    /// Decrement snapshots start at 2 because entry 1 is the untouched input.
    pub const fn first_entry_index(self) -> usize {
        match self {
            Self::Substitution => 1,
            Self::Decrement => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Substitution => "substitution",
            Self::Decrement => "decrement",
        }
    }
}

pub fn entry_name(prefix: &str, index: usize) -> String {
    format!("{}{}.csv", prefix, index)
}

/// Pairs each table with its sequential entry name.
pub fn number_entries<'a>(
    tables: &'a [Table],
    prefix: &str,
    first_index: usize,
) -> Vec<(String, &'a Table)> {
    tables
        .iter()
        .enumerate()
        .map(|(offset, table)| (entry_name(prefix, first_index + offset), table))
        .collect()
}

/// Encodes every entry up front so a failing table aborts before anything is
/// written.
fn encode_entries(entries: &[(String, &Table)]) -> SensorLogResult<Vec<(String, Vec<u8>)>> {
    entries
        .iter()
        .map(|(name, table)| {
            table_to_csv_bytes(table)
                .map(|bytes| (name.clone(), bytes))
                .map_err(|error| error.for_source(name))
        })
        .collect()
}

/// Deflate-compressed zip holding one legacy-encoded CSV per entry.
pub fn pack_named(entries: &[(String, &Table)]) -> SensorLogResult<Vec<u8>> {
    let encoded = encode_entries(entries)?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in &encoded {
        writer
            .start_file(name.as_str(), options)
            .map_err(|source| archive_error(name, source))?;
        writer.write_all(bytes).map_err(|source| {
            SensorLogError::io_system(
                "IO.ARCHIVE_WRITE",
                format!("failed to write archive entry '{}': {}", name, source),
            )
        })?;
    }
    let cursor = writer
        .finish()
        .map_err(|source| archive_error("central directory", source))?;
    Ok(cursor.into_inner())
}

pub fn pack(tables: &[Table], prefix: &str, kind: BatchKind) -> SensorLogResult<Vec<u8>> {
    let entries = number_entries(tables, prefix, kind.first_entry_index());
    let archive = pack_named(&entries)?;
    info!(
        entries = entries.len(),
        bytes = archive.len(),
        batch = kind.as_str(),
        "packed archive"
    );
    Ok(archive)
}

/// Writes the entries as individual files under `dir` instead of an archive.
pub fn write_entries(
    dir: &Path,
    tables: &[Table],
    prefix: &str,
    kind: BatchKind,
) -> SensorLogResult<Vec<PathBuf>> {
    let entries = number_entries(tables, prefix, kind.first_entry_index());
    let encoded = encode_entries(&entries)?;

    let mut written = Vec::with_capacity(encoded.len());
    for (name, bytes) in encoded {
        let path = dir.join(&name);
        if let Err(error) = write_binary_artifact(&path, &bytes) {
            remove_written(&written);
            return Err(error);
        }
        written.push(path);
    }
    info!(
        files = written.len(),
        dir = %dir.display(),
        batch = kind.as_str(),
        "wrote batch files"
    );
    Ok(written)
}

/// Removes files from a batch that failed partway so none of it is left behind.
fn remove_written(paths: &[PathBuf]) {
    for path in paths {
        if let Err(source) = fs::remove_file(path) {
            warn!(path = %path.display(), %source, "failed to remove partial batch file");
        }
    }
}

fn archive_error(name: &str, source: zip::result::ZipError) -> SensorLogError {
    SensorLogError::io_system(
        "IO.ARCHIVE_WRITE",
        format!("failed to write archive entry '{}': {}", name, source),
    )
}
