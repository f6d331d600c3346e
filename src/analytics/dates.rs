//! Date normalization and year-month bucketing
//!
//! Each record's raw date cell is parsed best-effort into a [`NormalizedDate`].
//! A value that cannot be parsed leaves that record's date absent and produces
//! a [`DateParseWarning`]; it never fails the batch.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{CellValue, Dataset};

/// Largest serial Excel accepts (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// 1899-12-30, day zero of the Excel 1900 date system, counted from 0001-01-01
const EXCEL_EPOCH_DAYS_FROM_CE: i64 = 693_594;

/// Years accepted from `%Y` layouts; chrono reads one to four digits there,
/// so a shorter year must fall through to the `%y` layouts
const FOUR_DIGIT_YEARS: std::ops::RangeInclusive<i32> = 1000..=9999;

/// Full date-time layouts tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d.%m.%y %H:%M:%S",
    "%d.%m.%y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%y %H:%M",
    "%d/%m/%y %H:%M",
];

/// Date-only layouts tried in order; slashed dates are month-first with a
/// day-first fallback
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d.%m.%y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m/%d/%y",
    "%d/%m/%y",
];

/// Year-month grouping key, displayed as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthBucket {
    year: i32,
    month: u32,
}

impl MonthBucket {
    /// Create a bucket; `month` must be 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Truncate a calendar date to its month
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthBucket {
    type Err = String;

    /// Accepts exactly `YYYY-MM`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let shape_ok = s.len() == 7
            && s.as_bytes()[4] == b'-'
            && s.bytes()
                .enumerate()
                .all(|(i, b)| i == 4 || b.is_ascii_digit());
        if !shape_ok {
            return Err(format!("Invalid month bucket: {s}"));
        }

        let year = s[..4]
            .parse::<i32>()
            .map_err(|_| format!("Invalid year in month bucket: {s}"))?;
        let month = s[5..]
            .parse::<u32>()
            .map_err(|_| format!("Invalid month in month bucket: {s}"))?;
        Self::new(year, month).ok_or_else(|| format!("Month out of range: {s}"))
    }
}

impl Serialize for MonthBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthBucket {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parsed date of one record; every field is absent when the raw value was
/// missing or unparsable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NormalizedDate {
    pub date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub bucket: Option<MonthBucket>,
}

impl NormalizedDate {
    /// The all-absent value
    pub const ABSENT: Self = Self {
        date: None,
        year: None,
        bucket: None,
    };

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            year: Some(date.year()),
            bucket: Some(MonthBucket::from_date(date)),
        }
    }

    pub fn is_absent(&self) -> bool {
        self.date.is_none()
    }
}

/// A date value that could not be parsed; the record keeps an absent date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateParseWarning {
    /// Zero-based source row
    pub row: usize,
    /// Raw value as text
    pub value: String,
}

impl fmt::Display for DateParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: unparsable date '{}'", self.row + 1, self.value)
    }
}

/// Normalized dates for a whole dataset, parallel to its rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedDates {
    column: Option<String>,
    dates: Vec<NormalizedDate>,
    warnings: Vec<DateParseWarning>,
}

impl NormalizedDates {
    /// Whether a date column was designated at all
    pub fn is_designated(&self) -> bool {
        self.column.is_some()
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    /// Date of one record; absent for out-of-range rows
    pub fn get(&self, row: usize) -> NormalizedDate {
        self.dates.get(row).copied().unwrap_or(NormalizedDate::ABSENT)
    }

    pub fn bucket(&self, row: usize) -> Option<MonthBucket> {
        self.get(row).bucket
    }

    pub fn iter(&self) -> impl Iterator<Item = &NormalizedDate> + '_ {
        self.dates.iter()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Records whose date is absent
    pub fn undated(&self) -> usize {
        self.dates.iter().filter(|d| d.is_absent()).count()
    }

    pub fn warnings(&self) -> &[DateParseWarning] {
        &self.warnings
    }
}

/// Parses a dataset's date column into [`NormalizedDates`]
pub struct DateNormalizer;

impl DateNormalizer {
    /// Normalize the designated date column
    ///
    /// With no column every record gets an absent date. A designated column
    /// that does not exist is a [`crate::error::Error::ColumnNotFound`].
    pub fn normalize(dataset: &Dataset, date_column: Option<&str>) -> Result<NormalizedDates> {
        let Some(column) = date_column else {
            debug!("No date column designated; all dates absent");
            return Ok(NormalizedDates {
                column: None,
                dates: vec![NormalizedDate::ABSENT; dataset.len()],
                warnings: Vec::new(),
            });
        };

        let index = dataset.column_index(column)?;
        let mut dates = Vec::with_capacity(dataset.len());
        let mut warnings = Vec::new();

        for (row, cell) in dataset.column_values(index).enumerate() {
            match parse_cell(cell) {
                Some(date) => dates.push(NormalizedDate::from_date(date)),
                None => {
                    if !cell.is_empty() {
                        let warning = DateParseWarning {
                            row,
                            value: cell.to_string(),
                        };
                        debug!(row = row, value = %warning.value, "Unparsable date");
                        warnings.push(warning);
                    }
                    dates.push(NormalizedDate::ABSENT);
                }
            }
        }

        if !warnings.is_empty() {
            warn!(
                column = %column,
                unparsed = warnings.len(),
                "Some date values could not be parsed and were left empty"
            );
        }

        Ok(NormalizedDates {
            column: Some(column.to_string()),
            dates,
            warnings,
        })
    }
}

/// Best-effort conversion of one cell to a calendar date
pub fn parse_cell(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Empty | CellValue::Bool(_) => None,
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Int(n) => excel_serial_to_datetime(*n as f64).map(|dt| dt.date()),
        CellValue::Float(n) => excel_serial_to_datetime(*n).map(|dt| dt.date()),
        CellValue::Text(s) => parse_date_str(s),
    }
}

/// Parse a textual date in any of the supported layouts
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(date) = DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.date_naive())
        .filter(has_four_digit_year)
    {
        return Some(date);
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| {
            NaiveDateTime::parse_from_str(s, format)
                .ok()
                .map(|dt| dt.date())
                .filter(has_four_digit_year)
        })
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|format| {
                NaiveDate::parse_from_str(s, format)
                    .ok()
                    .filter(has_four_digit_year)
            })
        })
        // Bare year-month, e.g. "2024-03"
        .or_else(|| {
            s.parse::<MonthBucket>()
                .ok()
                .and_then(|b| NaiveDate::from_ymd_opt(b.year, b.month, 1))
        })
}

fn has_four_digit_year(date: &NaiveDate) -> bool {
    FOUR_DIGIT_YEARS.contains(&date.year())
}

/// Excel 1900-system serial number to date-time
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let seconds = (serial.fract() * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::days(days) + Duration::seconds(seconds))
}

/// Date-time to Excel 1900-system serial number
pub fn datetime_to_excel_serial(dt: NaiveDateTime) -> f64 {
    let days = i64::from(dt.date().num_days_from_ce()) - EXCEL_EPOCH_DAYS_FROM_CE;
    let seconds = i64::from(dt.time().num_seconds_from_midnight());
    days as f64 + seconds as f64 / 86_400.0
}
