use super::loader::legacy_encoding;
use crate::domain::{ExtractedTable, SensorLogError, SensorLogResult, Table};
use std::fs;
use std::path::Path;

pub fn table_to_csv_text(table: &Table) -> SensorLogResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(table.column_names())
        .map_err(csv_write_error)?;
    for row in 0..table.row_count() {
        writer
            .write_record(table.row(row).into_iter().map(|cell| cell.to_field()))
            .map_err(csv_write_error)?;
    }

    let bytes = writer.into_inner().map_err(|source| {
        SensorLogError::internal(
            "SYS.CSV_FLUSH",
            format!("failed to flush CSV writer: {}", source),
        )
    })?;
    String::from_utf8(bytes).map_err(|source| {
        SensorLogError::internal("SYS.CSV_UTF8", format!("CSV writer produced invalid UTF-8: {}", source))
    })
}

pub fn encode_legacy(text: &str) -> SensorLogResult<Vec<u8>> {
    let encoding = legacy_encoding();
    let (bytes, _, had_unmappable) = encoding.encode(text);
    if had_unmappable {
        let offending = text
            .chars()
            .find(|ch| encoding.encode(ch.encode_utf8(&mut [0; 4])).2)
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        return Err(SensorLogError::encode(
            "RUN.ENCODE",
            format!(
                "character '{}' cannot be represented in {}",
                offending,
                encoding.name()
            ),
        ));
    }
    Ok(bytes.into_owned())
}

/// Serializes a table as legacy-encoded CSV, the inverse of
/// [`super::loader::load_table`].
pub fn table_to_csv_bytes(table: &Table) -> SensorLogResult<Vec<u8>> {
    encode_legacy(&table_to_csv_text(table)?)
}

/// Serializes an extracted table with its timestamp index as the first column.
pub fn extracted_to_csv_bytes(extracted: &ExtractedTable) -> SensorLogResult<Vec<u8>> {
    table_to_csv_bytes(&extracted.to_table())
}

pub fn write_binary_artifact(path: &Path, bytes: &[u8]) -> SensorLogResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| {
            SensorLogError::io_system(
                "IO.OUTPUT_DIRECTORY",
                format!("failed to create directory '{}': {}", parent.display(), source),
            )
        })?;
    }
    fs::write(path, bytes).map_err(|source| {
        SensorLogError::io_system(
            "IO.OUTPUT_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

fn csv_write_error(source: csv::Error) -> SensorLogError {
    SensorLogError::internal("SYS.CSV_WRITE", format!("failed to write CSV record: {}", source))
}

#[cfg(test)]
mod tests {
    use super::{encode_legacy, table_to_csv_bytes, table_to_csv_text, write_binary_artifact};
    use crate::domain::{Cell, Column, ErrorKind, Table};
    use crate::modules::loader::load_table;
    use std::fs;
    use tempfile::TempDir;

    fn sample_table() -> Table {
        Table::new(vec![
            Column::new(
                "时间",
                vec![
                    Cell::text("2024-01-01 00:00:00"),
                    Cell::text("2024-01-01 00:00:01"),
                    Cell::Missing,
                ],
            ),
            Column::new(
                "电源1黑片温度",
                vec![Cell::Number(25.5), Cell::Missing, Cell::Number(-3.0)],
            ),
            Column::new(
                "备注",
                vec![Cell::text("a,b"), Cell::text("正常"), Cell::Missing],
            ),
        ])
        .expect("sample table should be rectangular")
    }

    #[test]
    fn csv_text_quotes_embedded_delimiters() {
        let text = table_to_csv_text(&sample_table()).expect("table should serialize");
        assert_eq!(
            text,
            "时间,电源1黑片温度,备注\n2024-01-01 00:00:00,25.5,\"a,b\"\n2024-01-01 00:00:01,,正常\n,-3,\n"
        );
    }

    #[test]
    fn serialized_table_reloads_identically() {
        let table = sample_table();
        let bytes = table_to_csv_bytes(&table).expect("table should serialize");
        let reloaded = load_table(&bytes).expect("serialized bytes should reload");
        assert_eq!(reloaded, table);
    }

    #[test]
    fn unmappable_characters_fail_with_encode_error() {
        let error = encode_legacy("温度 🌡").expect_err("emoji is not representable in GBK");
        assert_eq!(error.kind(), ErrorKind::Encode);
        assert!(error.message().contains('🌡'));
    }

    #[test]
    fn repeated_binary_writes_produce_identical_bytes() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("nested/artifact.csv");
        let input = [0_u8, 1_u8, 2_u8, 255_u8];

        write_binary_artifact(&path, &input).expect("first write should succeed");
        let first = fs::read(&path).expect("artifact should be readable");

        write_binary_artifact(&path, &input).expect("second write should succeed");
        let second = fs::read(&path).expect("artifact should be readable");

        assert_eq!(first, second);
        assert_eq!(second, input);
    }
}
