//! Worksheet access: the capability trait extraction runs against, and the
//! XLSX reader that provides it for real files.

use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use zip::ZipArchive;

pub mod parser_utils;
pub mod workbook;
pub mod xlsx_parser;

use self::xlsx_parser::XlsxReader;
use crate::error::ExtractError;
pub use workbook::{CellRange, CellValue, DataValidation, Hyperlink, ValidationKind, Worksheet};

/// What extraction needs from a worksheet. Rows and columns are 1-based.
pub trait WorksheetSource {
    /// Cached value of a cell, `None` when the cell holds nothing
    fn cell_value(&self, row: u32, col: u32) -> Option<&CellValue>;
    /// Hyperlink attached to a cell, if any
    fn hyperlink(&self, row: u32, col: u32) -> Option<&Hyperlink>;
    fn data_validations(&self) -> &[DataValidation];
}

/// Read one worksheet from an `.xlsx`/`.xlsm` file
pub fn read_worksheet<P: AsRef<Path>>(path: P, sheet_name: &str) -> Result<Worksheet> {
    let path_ref = path.as_ref();

    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open file: {}", path_ref.display()))?;

    let is_xlsx = path_ref
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("xlsx") || s.eq_ignore_ascii_case("xlsm"))
        .unwrap_or(false);
    if !is_xlsx {
        return Err(ExtractError::UnsupportedFormat {
            path: path_ref.display().to_string(),
        }
        .into());
    }

    let mut archive =
        ZipArchive::new(BufReader::new(file)).context("Failed to open zip archive")?;
    info!("Opened workbook {}", path_ref.display());

    let mut reader = XlsxReader::new(&mut archive)?;
    reader.read_worksheet(sheet_name)
}
