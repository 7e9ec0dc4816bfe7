use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use csv::{ReaderBuilder, Terminator, WriterBuilder};
use tracing::warn;

use crate::error::{IngestError, Result};

/// A CSV file read as text: one header row plus data rows of equal width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
    }
}

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn read_error(path: &Path, err: csv::Error) -> IngestError {
    let path = path.to_path_buf();
    if err.is_io_error() {
        IngestError::FileRead {
            path,
            source: err.into(),
        }
    } else {
        IngestError::CsvParse { path, source: err }
    }
}

/// Read a CSV file. The first non-blank row is the header; blank rows are
/// skipped and short rows are padded with empty cells. Cells past the header
/// width are dropped with a warning.
pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    let file = File::open(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => IngestError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);
    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| read_error(path, err))?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        match &headers {
            None => headers = Some(record.iter().map(normalize_header).collect()),
            Some(header_row) => {
                if record.len() > header_row.len() {
                    warn!(
                        path = %path.display(),
                        line = record.position().map_or(0, csv::Position::line),
                        cells = record.len(),
                        columns = header_row.len(),
                        "row is wider than the header; extra cells dropped"
                    );
                }
                let mut row = Vec::with_capacity(header_row.len());
                for idx in 0..header_row.len() {
                    row.push(record.get(idx).map(normalize_cell).unwrap_or_default());
                }
                rows.push(row);
            }
        }
    }
    let Some(headers) = headers else {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    };
    Ok(CsvTable { headers, rows })
}

/// Serialize a table back to CSV bytes.
pub fn csv_bytes(table: &CsvTable) -> std::result::Result<Vec<u8>, csv::Error> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_headers() {
        assert_eq!(normalize_header("\u{feff} visit_id "), "visit_id");
        assert_eq!(normalize_header("visit   cost"), "visit cost");
    }

    #[test]
    fn serializes_quoted_cells() {
        let table = CsvTable {
            headers: vec!["a".into(), "b".into()],
            rows: vec![vec!["x, y".into(), "".into()]],
        };
        let bytes = csv_bytes(&table).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "a,b\n\"x, y\",\n");
    }
}
