// Table domain model - rows and cells as delivered by the sheet service
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

static DATE_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Date\(\s*(-?\d+)\s*,\s*(\d+)\s*,\s*(\d+)(?:\s*,\s*(\d+)(?:\s*,\s*(\d+)(?:\s*,\s*(\d+))?)?)?\s*\)",
    )
    .expect("date literal pattern is valid")
});

/// A `Date(year, month0, day[, hour, minute, second])` literal as emitted by
/// the table-query endpoint. Months are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateLiteral {
    pub year: i32,
    pub month0: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub has_time: bool,
}

impl DateLiteral {
    /// Find the first date literal embedded anywhere in `text`.
    pub fn find(text: &str) -> Option<Self> {
        let caps = DATE_LITERAL.captures(text)?;
        let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

        let literal = Self {
            year: caps.get(1)?.as_str().parse().ok()?,
            month0: num(2).filter(|m| *m < 12)?,
            day: num(3)?,
            hour: num(4).unwrap_or(0),
            minute: num(5).unwrap_or(0),
            second: num(6).unwrap_or(0),
            has_time: caps.get(4).is_some(),
        };

        literal.to_datetime().map(|_| literal)
    }

    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month0.checked_add(1)?, self.day)?
            .and_hms_opt(self.hour, self.minute, self.second)
    }

    /// `DD/MM/YYYY`
    pub fn display_date(&self) -> String {
        format!("{:02}/{:02}/{:04}", self.day, self.month0.saturating_add(1), self.year)
    }

    /// `HH:MM`
    pub fn display_time(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(DateLiteral),
}

impl CellValue {
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Bool(b) => CellValue::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::Text(n.to_string())),
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// Like `from_json`, but recognises an embedded date literal in strings.
    pub fn from_table_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) if s.starts_with("Date(") => DateLiteral::find(s)
                .map(CellValue::Date)
                .unwrap_or_else(|| CellValue::Text(s.clone())),
            other => Self::from_json(other),
        }
    }

    /// The raw value as plain text; this is what gets written back to the sheet.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::Date(d) if d.has_time => {
                format!("{} {}", d.display_date(), d.display_time())
            }
            CellValue::Date(d) => d.display_date(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// How a table's column set is derived from heterogeneous rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnPolicy {
    /// Keys of the first row only; later rows render blanks for missing keys
    /// and extra keys are dropped.
    #[default]
    FirstRow,
    /// Ordered union of every row's keys, in first-seen order.
    Union,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<(String, CellValue)>,
    pub source_row_id: Option<u32>,
}

impl Row {
    pub fn new(cells: Vec<(String, CellValue)>) -> Self {
        Self {
            cells,
            source_row_id: None,
        }
    }

    pub fn with_source_row_id(mut self, id: Option<u32>) -> Self {
        self.source_row_id = id;
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Plain text of a cell, empty when the key is missing.
    pub fn text(&self, key: &str) -> String {
        self.get(key).map(CellValue::as_text).unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    /// The row's locator in the sheet. Falls back to `index + header_offset`
    /// when the service did not supply one; that estimate goes stale as soon
    /// as rows above it are inserted or deleted upstream.
    pub fn locator(&self, index: usize, header_offset: u32) -> u32 {
        self.source_row_id
            .unwrap_or(index as u32 + header_offset)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table deriving the column set from `rows` under `policy`.
    pub fn from_rows(rows: Vec<Row>, policy: ColumnPolicy) -> Self {
        let columns = match policy {
            ColumnPolicy::FirstRow => rows
                .first()
                .map(|r| r.keys().map(str::to_string).collect())
                .unwrap_or_default(),
            ColumnPolicy::Union => {
                let mut columns: Vec<String> = Vec::new();
                for key in rows.iter().flat_map(|r| r.keys()) {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.to_string());
                    }
                }
                columns
            }
        };

        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find a row by its locator, returning the row and its index.
    pub fn find_by_locator(&self, locator: u32, header_offset: u32) -> Option<(usize, &Row)> {
        self.rows
            .iter()
            .enumerate()
            .find(|(i, r)| r.locator(*i, header_offset) == locator)
    }
}
