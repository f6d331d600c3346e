// Core data structures: tabular dataset and category definitions

use chrono::NaiveDateTime;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

use crate::error::{Error, Result};

/// A single cell of the input table
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// True for empty cells and whitespace-only text
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering of the cell, `None` when the cell holds no value
    ///
    /// Numbers and booleans are rendered so that a text column with mixed
    /// content still participates in keyword matching.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Empty => None,
            Self::Text(s) if s.trim().is_empty() => None,
            Self::Text(s) => Some(Cow::Borrowed(s.as_str())),
            other => Some(Cow::Owned(other.to_string())),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// In-memory table: named columns and rows of cells
///
/// Every row has exactly one cell per column. Column names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Build a dataset, padding short rows with empty cells and dropping
    /// cells beyond the header width
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Build a dataset from raw header cells, de-duplicating the names
    pub fn from_raw_headers(headers: Vec<Option<String>>, rows: Vec<Vec<CellValue>>) -> Self {
        Self::new(unique_headers(headers), rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve a column name to its index
    ///
    /// Fails with [`Error::ColumnNotFound`] naming the missing column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::column_not_found(name, &self.columns))
    }

    /// Iterate over one column's cells in row order
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }
}

/// Make header names unique the way spreadsheet loaders usually do:
/// blanks become `Unnamed: <i>`, repeats get `.1`, `.2`, ... suffixes.
pub fn unique_headers(headers: Vec<Option<String>>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(headers.len());

    for (i, header) in headers.into_iter().enumerate() {
        let base = header
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| format!("Unnamed: {i}"));

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        seen.push(candidate);
    }

    seen
}

/// A named topical label with its keyword fragments
///
/// Categories are static configuration: built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Identifier used as key in reports (e.g. "admin")
    name: String,

    /// Human-readable label (e.g. "Регистратура / Администратор")
    label: String,

    /// Explicit worksheet name for exports
    sheet_name: Option<String>,

    /// Keyword fragments, lower-cased
    keywords: Vec<String>,
}

impl Category {
    /// Create a category; the name must not be blank and at least one
    /// non-blank keyword is required
    pub fn new<I, S>(name: impl Into<String>, label: impl Into<String>, keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidCategory("category name is blank".to_string()));
        }

        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(Error::InvalidCategory(format!(
                "category '{name}' has no keywords"
            )));
        }

        let label = label.into();
        let label = if label.trim().is_empty() {
            name.clone()
        } else {
            label
        };

        Ok(Self {
            name,
            label,
            sheet_name: None,
            keywords,
        })
    }

    /// Override the worksheet name used for exports
    #[must_use]
    pub fn with_sheet_name(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = Some(sheet_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Worksheet name for exports: the explicit one, else the label
    /// (the exporter sanitizes it for Excel)
    pub fn sheet_name(&self) -> &str {
        self.sheet_name.as_deref().unwrap_or(&self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_dataset_pads_rows() {
        let ds = Dataset::new(
            vec!["a".into(), "b".into()],
            vec![vec!["x".into()], vec!["1".into(), "2".into(), "3".into()]],
        );
        assert_eq!(ds.row(0).unwrap(), &[CellValue::from("x"), CellValue::Empty]);
        assert_eq!(ds.row(1).unwrap().len(), 2);
    }

    #[test]
    fn test_column_index_missing() {
        let ds = Dataset::new(vec!["Текст".into()], vec![]);
        assert_eq!(ds.column_index("Текст").unwrap(), 0);

        let err = ds.column_index("Дата").unwrap_err();
        match err {
            Error::ColumnNotFound { column, available } => {
                assert_eq!(column, "Дата");
                assert_eq!(available, vec!["Текст".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unique_headers() {
        let headers = unique_headers(vec![
            Some("Текст".into()),
            None,
            Some("Текст".into()),
            Some("  ".into()),
            Some("Текст".into()),
        ]);
        assert_eq!(
            headers,
            vec!["Текст", "Unnamed: 1", "Текст.1", "Unnamed: 3", "Текст.2"]
        );
    }

    #[test]
    fn test_cell_as_text() {
        assert_eq!(CellValue::Empty.as_text(), None);
        assert_eq!(CellValue::Text("   ".into()).as_text(), None);
        assert_eq!(CellValue::Float(42.0).as_text().as_deref(), Some("42"));
        assert_eq!(CellValue::Float(1.5).as_text().as_deref(), Some("1.5"));
        assert_eq!(CellValue::Bool(true).as_text().as_deref(), Some("TRUE"));

        let dt = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(
            CellValue::DateTime(dt).as_text().as_deref(),
            Some("2024-03-05 10:00:00")
        );
    }

    #[test]
    fn test_category_validation() {
        assert!(Category::new("admin", "Admin", Vec::<String>::new()).is_err());
        assert!(Category::new("admin", "Admin", ["  "]).is_err());
        assert!(Category::new(" ", "Admin", ["касса"]).is_err());

        let cat = Category::new("admin", "", ["  Касса "]).unwrap();
        assert_eq!(cat.keywords(), &["касса".to_string()]);
        assert_eq!(cat.label(), "admin");
        assert_eq!(cat.sheet_name(), "admin");
    }

    #[test]
    fn test_category_sheet_name_override() {
        let cat = Category::new("wait", "Ожидание / Очередь", ["очеред"])
            .unwrap()
            .with_sheet_name("Ожидание_Очередь");
        assert_eq!(cat.sheet_name(), "Ожидание_Очередь");
    }
}
