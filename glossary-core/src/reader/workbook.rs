//! Worksheet data structures

use std::collections::HashMap;
use std::ops::RangeInclusive;

use super::WorksheetSource;

/// A single worksheet loaded into memory: cached cell values, hyperlinks and
/// data validation rules. Positions are 1-based `(row, col)`.
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    pub name: String,
    pub cells: HashMap<(u32, u32), CellValue>,
    pub hyperlinks: HashMap<(u32, u32), Hyperlink>,
    pub validations: Vec<DataValidation>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the cached value of a cell
    pub fn set_value(&mut self, row: u32, col: u32, value: CellValue) {
        self.cells.insert((row, col), value);
    }

    /// Attach a hyperlink to a cell, replacing any previous one
    pub fn set_hyperlink(&mut self, row: u32, col: u32, link: Hyperlink) {
        self.hyperlinks.insert((row, col), link);
    }

    pub fn push_validation(&mut self, validation: DataValidation) {
        self.validations.push(validation);
    }
}

impl WorksheetSource for Worksheet {
    fn cell_value(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    fn hyperlink(&self, row: u32, col: u32) -> Option<&Hyperlink> {
        self.hyperlinks.get(&(row, col))
    }

    fn data_validations(&self) -> &[DataValidation] {
        &self.validations
    }
}

/// Cached cell value types
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    /// Cached error result such as `#N/A`
    Error(String),
}

impl CellValue {
    /// Create a text cell
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Whether the value counts as present for title and tag checks.
    ///
    /// Empty cells, empty text, zero and `false` do not.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Empty => false,
            CellValue::Number(n) => *n != 0.0,
            CellValue::Text(s) | CellValue::Error(s) => !s.is_empty(),
            CellValue::Boolean(b) => *b,
        }
    }

    /// Get the string if this is a text cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as it is used for map keys
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) | CellValue::Error(s) => s.clone(),
            CellValue::Boolean(b) => b.to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    // Whole numbers are stored as floats in the sheet XML
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A hyperlink attached to a cell.
///
/// External links carry a `target` resolved from the sheet relationships.
/// Links to a place inside the workbook only carry a `location`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hyperlink {
    pub target: Option<String>,
    pub location: Option<String>,
}

impl Hyperlink {
    pub fn external(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            location: None,
        }
    }
}

/// Rectangular range of cells, 1-based and inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub min_row: u32,
    pub min_col: u32,
    pub max_row: u32,
    pub max_col: u32,
}

impl CellRange {
    pub fn new(min_row: u32, min_col: u32, max_row: u32, max_col: u32) -> Self {
        Self {
            min_row: min_row.min(max_row),
            min_col: min_col.min(max_col),
            max_row: min_row.max(max_row),
            max_col: min_col.max(max_col),
        }
    }

    pub fn single(row: u32, col: u32) -> Self {
        Self::new(row, col, row, col)
    }

    pub fn contains_col(&self, col: u32) -> bool {
        col >= self.min_col && col <= self.max_col
    }

    pub fn rows(&self) -> RangeInclusive<u32> {
        self.min_row..=self.max_row
    }

    /// Iterate every `(row, col)` in the range, row by row
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.rows()
            .flat_map(move |row| (self.min_col..=self.max_col).map(move |col| (row, col)))
    }
}

/// Data validation types as named in the sheet XML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationKind {
    #[default]
    None,
    List,
    Whole,
    Decimal,
    Date,
    Time,
    TextLength,
    Custom,
}

impl ValidationKind {
    pub fn from_xml(s: &str) -> Self {
        match s {
            "list" => ValidationKind::List,
            "whole" => ValidationKind::Whole,
            "decimal" => ValidationKind::Decimal,
            "date" => ValidationKind::Date,
            "time" => ValidationKind::Time,
            "textLength" => ValidationKind::TextLength,
            "custom" => ValidationKind::Custom,
            _ => ValidationKind::None,
        }
    }
}

/// A data validation rule and the cells it applies to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataValidation {
    pub kind: ValidationKind,
    /// First formula as written in the sheet, e.g. `"Yes,No"` (quotes included)
    pub formula1: Option<String>,
    /// Raw `sqref` attribute, kept for error messages
    pub sqref: String,
    pub ranges: Vec<CellRange>,
}

impl DataValidation {
    /// Build a list validation from an inline formula and its ranges
    pub fn list(formula1: impl Into<String>, sqref: impl Into<String>, ranges: Vec<CellRange>) -> Self {
        Self {
            kind: ValidationKind::List,
            formula1: Some(formula1.into()),
            sqref: sqref.into(),
            ranges,
        }
    }
}
