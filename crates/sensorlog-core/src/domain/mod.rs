pub mod errors;

pub use errors::{ErrorCategory, ErrorKind, SensorLogError, SensorLogResult};

use chrono::NaiveDateTime;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Layout every valid timestamp is rewritten to during extraction.
pub const CANONICAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Field spellings the loader treats as a missing value.
pub const MISSING_TOKENS: [&str; 7] = ["NA", "N/A", "NaN", "nan", "null", "NULL", "-nan"];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Cell {
    pub fn parse_field(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || MISSING_TOKENS.contains(&trimmed) {
            return Self::Missing;
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Number(value),
            _ => Self::Text(raw.to_string()),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn to_field(&self) -> String {
        match self {
            Self::Missing => String::new(),
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value.clone(),
            Self::Timestamp(value) => value.format(CANONICAL_TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Total order used for sorting join keys: numbers, then timestamps, then
    /// text, with missing values last.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Missing, Self::Missing) => Ordering::Equal,
            (Self::Missing, _) => Ordering::Greater,
            (_, Self::Missing) => Ordering::Less,
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Timestamp(_) => 1,
            Self::Text(_) => 2,
            Self::Missing => 3,
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_field())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Largest numeric value in the column, ignoring missing and text cells.
    pub fn numeric_max(&self) -> Option<f64> {
        self.cells
            .iter()
            .filter_map(Cell::as_f64)
            .fold(None, |acc, value| match acc {
                Some(current) if current >= value => Some(current),
                _ => Some(value),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> SensorLogResult<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(ragged) = columns.iter().find(|column| column.len() != expected) {
                return Err(SensorLogError::schema_mismatch(
                    "INPUT.TABLE_SHAPE",
                    format!(
                        "column '{}' has {} rows but column '{}' has {}",
                        ragged.name,
                        ragged.len(),
                        first.name,
                        expected
                    ),
                ));
            }
        }
        Ok(Self { columns })
    }

    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> SensorLogResult<Self> {
        let mut columns = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect::<Vec<_>>();

        for (row_index, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(SensorLogError::parse(
                    "INPUT.TABLE_ROW_WIDTH",
                    format!(
                        "row {} has {} fields but the header declares {}",
                        row_index + 1,
                        row.len(),
                        columns.len()
                    ),
                ));
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.cells.push(cell);
            }
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn require_column(&self, name: &str, placeholder: &'static str) -> SensorLogResult<usize> {
        self.column_index(name).ok_or_else(|| {
            SensorLogError::unknown_column(
                placeholder,
                format!("column '{}' is not present in the table", name),
            )
        })
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.columns.get(column).and_then(|column| column.cells.get(row))
    }

    pub fn row(&self, row: usize) -> Vec<&Cell> {
        self.columns
            .iter()
            .filter_map(|column| column.cells.get(row))
            .collect()
    }

    pub fn column_mut(&mut self, index: usize) -> Option<&mut Column> {
        self.columns.get_mut(index)
    }

    /// Builds a table holding the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                Column::new(
                    column.name.clone(),
                    rows.iter().map(|&row| column.cells[row].clone()).collect(),
                )
            })
            .collect();
        Self { columns }
    }
}

/// An uploaded CSV buffer together with the name it was uploaded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupKey(pub char);

impl Display for GroupKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A table whose timestamp column has been promoted to the row index.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTable {
    index_name: String,
    index: Vec<Option<NaiveDateTime>>,
    data: Table,
}

impl ExtractedTable {
    pub fn new(
        index_name: impl Into<String>,
        index: Vec<Option<NaiveDateTime>>,
        data: Table,
    ) -> SensorLogResult<Self> {
        if !data.is_empty() && index.len() != data.row_count() {
            return Err(SensorLogError::internal(
                "SYS.EXTRACT_INDEX",
                format!(
                    "index has {} entries but the table has {} rows",
                    index.len(),
                    data.row_count()
                ),
            ));
        }
        Ok(Self {
            index_name: index_name.into(),
            index,
            data,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn index(&self) -> &[Option<NaiveDateTime>] {
        &self.index
    }

    pub fn data(&self) -> &Table {
        &self.data
    }

    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Restores the index as an ordinary leading column.
    pub fn to_table(&self) -> Table {
        let index_column = Column::new(
            self.index_name.clone(),
            self.index
                .iter()
                .map(|value| value.map_or(Cell::Missing, Cell::Timestamp))
                .collect(),
        );
        let columns = std::iter::once(index_column)
            .chain(self.data.columns().iter().cloned())
            .collect();
        Table { columns }
    }

    pub(crate) fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            index_name: self.index_name.clone(),
            index: rows.iter().map(|&row| self.index[row]).collect(),
            data: self.data.select_rows(rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, Column, Table};
    use crate::domain::ErrorKind;
    use std::cmp::Ordering;

    #[test]
    fn field_parsing_distinguishes_missing_numbers_and_text() {
        assert_eq!(Cell::parse_field(""), Cell::Missing);
        assert_eq!(Cell::parse_field("NaN"), Cell::Missing);
        assert_eq!(Cell::parse_field("12.5"), Cell::Number(12.5));
        assert_eq!(Cell::parse_field(" 3 "), Cell::Number(3.0));
        assert_eq!(
            Cell::parse_field("2024-01-01 00:00:00"),
            Cell::text("2024-01-01 00:00:00")
        );
        assert_eq!(Cell::parse_field("inf"), Cell::text("inf"));
    }

    #[test]
    fn numbers_render_without_trailing_zeros() {
        assert_eq!(Cell::Number(1.0).to_field(), "1");
        assert_eq!(Cell::Number(0.25).to_field(), "0.25");
        assert_eq!(Cell::Missing.to_field(), "");
    }

    #[test]
    fn missing_sorts_after_everything() {
        assert_eq!(Cell::Missing.sort_cmp(&Cell::Number(1.0)), Ordering::Greater);
        assert_eq!(Cell::text("a").sort_cmp(&Cell::text("b")), Ordering::Less);
        assert_eq!(Cell::Number(2.0).sort_cmp(&Cell::text("1")), Ordering::Less);
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let error = Table::new(vec![
            Column::new("a", vec![Cell::Number(1.0)]),
            Column::new("b", vec![]),
        ])
        .expect_err("ragged table should fail");
        assert_eq!(error.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn from_rows_rejects_short_rows() {
        let error = Table::from_rows(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![Cell::Number(1.0)]],
        )
        .expect_err("short row should fail");
        assert_eq!(error.kind(), ErrorKind::Parse);
    }

    #[test]
    fn numeric_max_ignores_missing_cells() {
        let column = Column::new(
            "x",
            vec![Cell::Missing, Cell::Number(3.0), Cell::Number(-1.0)],
        );
        assert_eq!(column.numeric_max(), Some(3.0));
        assert_eq!(Column::new("y", vec![Cell::Missing]).numeric_max(), None);
    }
}
