//! Delimited text input
//!
//! Files are decoded as UTF-8 (a leading BOM is dropped), falling back to
//! Windows-1251 for legacy Cyrillic exports. The delimiter is sniffed from the
//! first lines among comma, semicolon and tab.

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{CellValue, Dataset};

/// Delimiter candidates in preference order
const DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Number of leading lines inspected when sniffing the delimiter
const SNIFF_LINES: usize = 10;

/// Read a delimited text file into a dataset
pub fn read_csv(path: &Path) -> Result<Dataset> {
    let bytes = fs::read(path)?;
    let content = decode(&bytes);
    let dataset = read_csv_str(&content)?;

    info!(
        path = %path.display(),
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "Loaded CSV"
    );
    Ok(dataset)
}

/// Parse delimited text; the first record is the header
pub fn read_csv_str(content: &str) -> Result<Dataset> {
    let delimiter = sniff_delimiter(content);
    debug!(delimiter = %(delimiter as char).escape_default(), "Sniffed CSV delimiter");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers: Vec<Option<String>> = match records.next() {
        Some(header) => header?.iter().map(|h| Some(h.to_string())).collect(),
        None => return Ok(Dataset::default()),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        let row: Vec<CellValue> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(field.to_string())
                }
            })
            .collect();

        if !row.iter().all(CellValue::is_empty) {
            rows.push(row);
        }
    }

    Ok(Dataset::from_raw_headers(headers, rows))
}

/// Decode raw bytes as UTF-8, or Windows-1251 when they are not valid UTF-8
pub fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            warn!("Input is not valid UTF-8, decoding as Windows-1251");
            let (decoded, _, _) = encoding_rs::WINDOWS_1251.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Pick the delimiter that splits the first lines most consistently
fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best = DELIMITERS[0];
    let mut best_score = 0usize;

    for &delimiter in &DELIMITERS {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delimiter)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map_or(1, |r| r.len())
            })
            .collect();

        let Some(&first) = counts.first() else {
            continue;
        };
        if first <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&c| c == first).count();
        let score = consistent * first;
        if score > best_score {
            best_score = score;
            best = delimiter;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_semicolon_csv() {
        let ds = read_csv_str("Дата;Текст\n2024-01-05;Долго ждали, очень долго\n;\n").unwrap();
        assert_eq!(ds.columns(), &["Дата", "Текст"]);
        assert_eq!(ds.len(), 1);
        assert_eq!(
            ds.row(0).unwrap()[1],
            CellValue::from("Долго ждали, очень долго")
        );
    }

    #[test]
    fn test_comma_and_tab() {
        let ds = read_csv_str("a,b,c\n1,2,3\n").unwrap();
        assert_eq!(ds.columns().len(), 3);

        let ds = read_csv_str("a\tb\n1\t2\n").unwrap();
        assert_eq!(ds.columns(), &["a", "b"]);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let ds = read_csv_str("a,b,c\n1\n").unwrap();
        assert_eq!(ds.row(0).unwrap()[2], CellValue::Empty);
    }

    #[test]
    fn test_empty_input() {
        let ds = read_csv_str("").unwrap();
        assert!(ds.is_empty());
        assert!(ds.columns().is_empty());
    }

    #[test]
    fn test_bom_is_stripped() {
        let decoded = decode(b"\xEF\xBB\xBFtext\n");
        assert_eq!(decoded, "text\n");
    }

    #[test]
    fn test_windows_1251_fallback() {
        let (encoded, _, _) = encoding_rs::WINDOWS_1251.encode("Текст;Дата\nкасса;2024-01-01\n");
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&encoded).unwrap();

        let ds = read_csv(file.path()).unwrap();
        assert_eq!(ds.columns(), &["Текст", "Дата"]);
        assert_eq!(ds.row(0).unwrap()[0], CellValue::from("касса"));
    }
}
