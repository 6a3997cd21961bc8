//! Configuration for a glossary extraction run

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ExtractError;

/// Where to read the glossary from and where to write the JSON outputs.
///
/// Rows and columns are 1-based, as shown in a spreadsheet application
/// (column A is 1). The row range is inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Path to the glossary workbook
    pub input: PathBuf,
    /// Worksheet holding the glossary table
    pub sheet: String,
    pub start_row: u32,
    pub end_row: u32,
    /// Column holding tag labels (the one carrying the dropdown validations)
    pub tag_column: u32,
    pub title_column: u32,
    pub link_column: u32,
    /// Output path for the tag label -> dropdown options mapping
    pub tag_dropdowns_output: PathBuf,
    /// Output path for the title -> resource entry mapping
    pub resources_output: PathBuf,
}

impl ExtractConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ExtractConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject row and column settings that cannot address a real cell
    pub fn validate(&self) -> Result<()> {
        if self.start_row == 0 {
            return Err(ExtractError::InvalidConfig("start_row must be at least 1".into()).into());
        }
        if self.start_row > self.end_row {
            return Err(ExtractError::InvalidConfig(format!(
                "start_row ({}) is after end_row ({})",
                self.start_row, self.end_row
            ))
            .into());
        }
        for (name, value) in [
            ("tag_column", self.tag_column),
            ("title_column", self.title_column),
            ("link_column", self.link_column),
        ] {
            if value == 0 {
                return Err(
                    ExtractError::InvalidConfig(format!("{} must be at least 1", name)).into(),
                );
            }
        }
        Ok(())
    }

    /// Check whether a row falls inside the configured scan range
    pub fn contains_row(&self, row: u32) -> bool {
        row >= self.start_row && row <= self.end_row
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("Resource Glossary.xlsx"),
            sheet: "Sheet1".to_string(),
            start_row: 3,
            end_row: 115,
            tag_column: 1,
            title_column: 2,
            link_column: 3,
            tag_dropdowns_output: PathBuf::from("tag_dropdowns.json"),
            resources_output: PathBuf::from("resource_dict.json"),
        }
    }
}
