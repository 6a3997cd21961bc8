//! glossary-core: export a resource glossary workbook to JSON
//!
//! Reads the glossary worksheet, collects the dropdown options offered for
//! each tag label, and maps every resource title to a direct download link
//! plus its tags.

pub mod config;
pub mod error;
pub mod extract;
pub mod link;
pub mod reader;
pub mod writer;

use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

pub use config::ExtractConfig;
pub use error::ExtractError;
pub use extract::{ResourceEntry, ResourceMap, TagDropdownMap};
pub use link::normalize;
pub use reader::{Worksheet, WorksheetSource};

/// Both maps produced from one worksheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub tag_dropdowns: TagDropdownMap,
    pub resources: ResourceMap,
}

/// What a completed run wrote, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub tag_dropdown_count: usize,
    pub tag_dropdowns_path: PathBuf,
    pub resource_count: usize,
    pub resources_path: PathBuf,
}

/// Main extraction interface
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    /// Create an extractor with the default glossary layout
    pub fn new() -> Self {
        Self::with_config(ExtractConfig::default())
    }

    pub fn with_config(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Build both maps from an already loaded worksheet.
    ///
    /// The configuration is validated here, so every entry point checks it once.
    pub fn extract<S: WorksheetSource + ?Sized>(&self, sheet: &S) -> Result<Extraction> {
        self.config.validate()?;
        let tag_dropdowns = extract::parse_tag_dropdowns(sheet, &self.config)?;
        let resources = extract::parse_resources(sheet, &self.config, &tag_dropdowns);
        Ok(Extraction {
            tag_dropdowns,
            resources,
        })
    }

    /// Open the configured workbook and build both maps from its sheet
    pub fn extract_file(&self) -> Result<Extraction> {
        let sheet = reader::read_worksheet(&self.config.input, &self.config.sheet)
            .with_context(|| format!("Failed to read {}", self.config.input.display()))?;
        self.extract(&sheet)
    }

    /// Extract, then write the tag dropdown file followed by the resource file
    pub fn run(&self) -> Result<RunSummary> {
        let extraction = self.extract_file()?;

        writer::save_json(&extraction.tag_dropdowns, &self.config.tag_dropdowns_output)?;
        info!(
            "Wrote {} tag dropdown entries to {}",
            extraction.tag_dropdowns.len(),
            self.config.tag_dropdowns_output.display()
        );
        writer::save_json(&extraction.resources, &self.config.resources_output)?;
        info!(
            "Wrote {} resources to {}",
            extraction.resources.len(),
            self.config.resources_output.display()
        );

        Ok(RunSummary {
            tag_dropdown_count: extraction.tag_dropdowns.len(),
            tag_dropdowns_path: self.config.tag_dropdowns_output.clone(),
            resource_count: extraction.resources.len(),
            resources_path: self.config.resources_output.clone(),
        })
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}
