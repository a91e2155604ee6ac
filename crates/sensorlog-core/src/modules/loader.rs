use crate::domain::{Cell, SensorLogError, SensorLogResult, SourceFile, Table};
use encoding_rs::{Encoding, GBK};
use tracing::debug;

/// Encoding of every CSV the tool reads or writes. GB2312 exports decode
/// cleanly as GBK, which is a superset.
pub fn legacy_encoding() -> &'static Encoding {
    GBK
}

pub fn decode_legacy(bytes: &[u8]) -> SensorLogResult<String> {
    legacy_encoding()
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            SensorLogError::decode(
                "INPUT.DECODE",
                format!("input is not valid {} text", legacy_encoding().name()),
            )
        })
}

pub fn load_table(bytes: &[u8]) -> SensorLogResult<Table> {
    let text = decode_legacy(bytes)?;
    parse_csv_text(&text)
}

pub fn load_source(source: &SourceFile) -> SensorLogResult<Table> {
    let table = load_table(&source.bytes).map_err(|error| error.for_source(&source.filename))?;
    debug!(
        file = %source.filename,
        rows = table.row_count(),
        columns = table.column_count(),
        "loaded table"
    );
    Ok(table)
}

pub fn parse_csv_text(text: &str) -> SensorLogResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|source| {
            SensorLogError::parse("INPUT.CSV_HEADER", format!("failed to read header row: {}", source))
        })?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if headers.is_empty() || headers.iter().all(|header| header.trim().is_empty()) {
        return Err(SensorLogError::parse(
            "INPUT.CSV_HEADER",
            "input has no header row",
        ));
    }
    let headers = dedupe_headers(headers);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| {
            SensorLogError::parse("INPUT.CSV_RECORD", format!("malformed CSV record: {}", source))
        })?;
        if record.len() != headers.len() {
            let line = record.position().map_or(0, |position| position.line());
            return Err(SensorLogError::parse(
                "INPUT.CSV_ROW_WIDTH",
                format!(
                    "line {} has {} fields but the header declares {}",
                    line,
                    record.len(),
                    headers.len()
                ),
            ));
        }
        rows.push(record.iter().map(Cell::parse_field).collect::<Vec<_>>());
    }

    Table::from_rows(headers, rows)
}

/// Renames repeated header names to `name.1`, `name.2`, ... so every column
/// stays addressable by name.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(headers.len());
    for header in headers {
        let mut candidate = header.clone();
        let mut counter = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", header, counter);
            counter += 1;
        }
        seen.push(candidate);
    }
    seen
}
