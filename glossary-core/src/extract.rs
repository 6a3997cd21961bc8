//! Row scanning: tag dropdown options and resource entries

use anyhow::Result;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::ExtractConfig;
use crate::error::ExtractError;
use crate::link::{is_hosted_link, normalize};
use crate::reader::{DataValidation, ValidationKind, WorksheetSource};

/// Tag label -> allowed dropdown options, in first-seen order
pub type TagDropdownMap = IndexMap<String, Vec<String>>;

/// Resource title -> entry, in row order
pub type ResourceMap = IndexMap<String, ResourceEntry>;

/// A glossary resource as written to the resource JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// Direct export/download URL, `null` when the link could not be normalized
    pub link: Option<String>,
    pub tags: Vec<String>,
}

/// Split an inline list formula such as `"Yes,No"` into its options.
///
/// Surrounding quotes are stripped and the rest is split on commas as-is.
/// Quotes present on only one side make the formula malformed.
pub fn split_list_formula(validation: &DataValidation, formula: &str) -> Result<Vec<String>> {
    if formula.starts_with('"') != formula.ends_with('"') || formula == "\"" {
        return Err(ExtractError::MalformedFormula {
            sqref: validation.sqref.clone(),
            formula: formula.to_string(),
        }
        .into());
    }
    Ok(formula
        .trim_matches('"')
        .split(',')
        .map(str::to_string)
        .collect())
}

/// Collect the dropdown options offered for each tag label.
///
/// Only list validations whose ranges cover the tag column count, and only
/// rows inside the configured range. A later rule covering the same tag
/// label replaces the options recorded by an earlier one.
pub fn parse_tag_dropdowns<S: WorksheetSource + ?Sized>(
    sheet: &S,
    config: &ExtractConfig,
) -> Result<TagDropdownMap> {
    let mut tag_dropdowns = TagDropdownMap::new();

    for validation in sheet.data_validations() {
        if validation.kind != ValidationKind::List {
            debug!(
                "Skipping {:?} validation on {}",
                validation.kind, validation.sqref
            );
            continue;
        }
        let Some(formula) = validation.formula1.as_deref().filter(|f| !f.is_empty()) else {
            debug!("Skipping list validation without formula on {}", validation.sqref);
            continue;
        };
        let options = split_list_formula(validation, formula)?;

        for range in validation
            .ranges
            .iter()
            .filter(|range| range.contains_col(config.tag_column))
        {
            // Whole-column ranges span the sheet, so clamp to the scan window
            let first = range.min_row.max(config.start_row);
            let last = range.max_row.min(config.end_row);
            for row in first..=last {
                if let Some(tag_value) = sheet
                    .cell_value(row, config.tag_column)
                    .filter(|value| value.is_truthy())
                {
                    tag_dropdowns.insert(tag_value.display_text(), options.clone());
                }
            }
        }
    }

    Ok(tag_dropdowns)
}

/// The link for a cell: an explicit hyperlink wins over the literal value.
///
/// A hyperlink without an external target (a jump inside the workbook)
/// yields no link, as does a cell whose value is not text.
pub fn cell_link<S: WorksheetSource + ?Sized>(sheet: &S, row: u32, col: u32) -> Option<&str> {
    let link = match sheet.hyperlink(row, col) {
        Some(hyperlink) => hyperlink.target.as_deref(),
        None => sheet.cell_value(row, col).and_then(|value| value.as_text()),
    };
    link.filter(|l| !l.is_empty())
}

/// Build the resource map from the configured row range.
///
/// A row becomes an entry when it has a title and a hosted-service link.
/// Its tags are the dropdown options recorded for the row's tag label.
pub fn parse_resources<S: WorksheetSource + ?Sized>(
    sheet: &S,
    config: &ExtractConfig,
    tag_dropdowns: &TagDropdownMap,
) -> ResourceMap {
    let mut resources = ResourceMap::new();

    for row in config.start_row..=config.end_row {
        let Some(title) = sheet
            .cell_value(row, config.title_column)
            .filter(|value| value.is_truthy())
        else {
            continue;
        };
        let Some(link) = cell_link(sheet, row, config.link_column) else {
            debug!("Row {}: no link for '{}'", row, title.display_text());
            continue;
        };
        if !is_hosted_link(link) {
            debug!("Row {}: skipping non-hosted link {}", row, link);
            continue;
        }

        let tags = sheet
            .cell_value(row, config.tag_column)
            .filter(|value| value.is_truthy())
            .and_then(|tag| tag_dropdowns.get(&tag.display_text()))
            .cloned()
            .unwrap_or_default();

        let direct = normalize(link);
        if direct.is_none() {
            warn!("Row {}: could not normalize link {}", row, link);
        }

        resources.insert(
            title.display_text(),
            ResourceEntry {
                link: direct,
                tags,
            },
        );
    }

    resources
}
