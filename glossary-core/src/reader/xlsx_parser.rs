//! XML parsing for the parts of an XLSX package the glossary needs

use anyhow::{Context, Result};
use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::io::BufReader;
use zip::ZipArchive;

use super::parser_utils::{parse_cell_range, parse_cell_ref, parse_sqref, read_rich_text, read_text_node};
use super::workbook::{CellValue, DataValidation, Hyperlink, ValidationKind, Worksheet};
use crate::error::ExtractError;

/// Resolve sheet name to its XML path in the XLSX archive
pub fn get_xlsx_sheet_path(
    archive: &mut ZipArchive<impl std::io::Read + std::io::Seek>,
    sheet_name: &str,
) -> Result<String> {
    // 1. Get rId from xl/workbook.xml
    let mut rid = String::new();
    {
        let workbook_xml = archive
            .by_name("xl/workbook.xml")
            .context("Failed to find xl/workbook.xml")?;
        let mut reader = Reader::from_reader(BufReader::new(workbook_xml));
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) => {
                    if e.name().as_ref() == b"sheet" {
                        let mut name = String::new();
                        let mut r_id = String::new();
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"name" => name = attr.unescape_value()?.to_string(),
                                b"r:id" => r_id = attr.unescape_value()?.to_string(),
                                _ => {}
                            }
                        }
                        if name == sheet_name {
                            rid = r_id;
                            break;
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
    }

    if rid.is_empty() {
        return Err(ExtractError::SheetNotFound {
            sheet: sheet_name.to_string(),
        }
        .into());
    }

    // 2. Resolve rId in xl/_rels/workbook.xml.rels
    let rels = extract_relationships(archive, "xl/_rels/workbook.xml.rels")?;
    let target = rels.get(&rid).cloned().unwrap_or_default();

    if target.is_empty() {
        return Err(anyhow::anyhow!(
            "Relationship '{}' not found for sheet '{}'",
            rid,
            sheet_name
        ));
    }

    Ok(resolve_part_path(&target))
}

/// Turn a workbook relationship target into an archive path.
///
/// Targets are usually relative to `xl/` ("worksheets/sheet1.xml"), but some
/// writers emit absolute package paths ("/xl/worksheets/sheet1.xml").
fn resolve_part_path(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else if target.starts_with("xl/") {
        target.to_string()
    } else {
        format!("xl/{}", target)
    }
}

/// Path of the relationships part belonging to a sheet part
pub fn sheet_rels_path(sheet_path: &str) -> String {
    match sheet_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", sheet_path),
    }
}

/// Read a relationships part into an `Id -> Target` map.
///
/// A missing part yields an empty map.
pub fn extract_relationships(
    archive: &mut ZipArchive<impl std::io::Read + std::io::Seek>,
    rels_path: &str,
) -> Result<HashMap<String, String>> {
    let mut rels = HashMap::new();
    let rels_xml = match archive.by_name(rels_path) {
        Ok(file) => file,
        Err(_) => return Ok(rels),
    };

    let mut reader = Reader::from_reader(BufReader::new(rels_xml));
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"Relationship" => {
                let mut id = String::new();
                let mut target = String::new();
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = attr.unescape_value()?.to_string(),
                        b"Target" => target = attr.unescape_value()?.to_string(),
                        _ => {}
                    }
                }
                if !id.is_empty() {
                    rels.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

pub fn extract_shared_strings(
    archive: &mut ZipArchive<impl std::io::Read + std::io::Seek>,
) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    let ss_xml = match archive.by_name("xl/sharedStrings.xml") {
        Ok(file) => file,
        Err(_) => return Ok(strings),
    };

    // Whitespace inside <t> is significant, so no trimming here
    let mut reader = Reader::from_reader(BufReader::new(ss_xml));
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"si" => {
                strings.push(read_rich_text(&mut reader, b"si")?);
            }
            Event::Empty(e) if e.name().as_ref() == b"si" => strings.push(String::new()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Hyperlink element before its relationship id is resolved
struct RawHyperlink {
    cell_ref: String,
    r_id: Option<String>,
    location: Option<String>,
}

pub struct XlsxReader<'a, R: std::io::Read + std::io::Seek> {
    archive: &'a mut ZipArchive<R>,
    shared_strings: Vec<String>,
}

impl<'a, R: std::io::Read + std::io::Seek> XlsxReader<'a, R> {
    pub fn new(archive: &'a mut ZipArchive<R>) -> Result<Self> {
        let shared_strings =
            extract_shared_strings(archive).context("Failed to read xl/sharedStrings.xml")?;
        Ok(Self {
            archive,
            shared_strings,
        })
    }

    /// Load one worksheet by name: cached values, hyperlinks and validations
    pub fn read_worksheet(&mut self, sheet_name: &str) -> Result<Worksheet> {
        let path = get_xlsx_sheet_path(self.archive, sheet_name)?;
        debug!("Sheet '{}' resolved to {}", sheet_name, path);

        let mut sheet = Worksheet::new(sheet_name);
        let raw_links = self
            .parse_sheet_xml(&path, &mut sheet)
            .with_context(|| format!("Failed to parse {}", path))?;

        if !raw_links.is_empty() {
            let rels = extract_relationships(self.archive, &sheet_rels_path(&path))?;
            for link in raw_links {
                let hyperlink = Hyperlink {
                    target: link.r_id.as_ref().and_then(|id| rels.get(id)).cloned(),
                    location: link.location,
                };
                // A range ref applies the same link to every cell it covers
                if let Some(range) = parse_cell_range(&link.cell_ref) {
                    for (row, col) in range.cells() {
                        sheet.set_hyperlink(row, col, hyperlink.clone());
                    }
                }
            }
        }

        debug!(
            "Parsed sheet '{}': {} cells, {} hyperlinks, {} data validations",
            sheet.name,
            sheet.cells.len(),
            sheet.hyperlinks.len(),
            sheet.validations.len()
        );
        Ok(sheet)
    }

    fn parse_sheet_xml(&mut self, path: &str, sheet: &mut Worksheet) -> Result<Vec<RawHyperlink>> {
        let mut raw_links = Vec::new();

        let sheet_xml = self
            .archive
            .by_name(path)
            .with_context(|| format!("Failed to find {}", path))?;
        let mut reader = Reader::from_reader(BufReader::new(sheet_xml));

        let mut buf = Vec::new();
        let mut current_row = 0u32;
        let mut current_col = 0u32;

        loop {
            let event = reader.read_event_into(&mut buf)?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => match e.name().as_ref() {
                    b"row" => {
                        if let Some(r) = attr_value(e, b"r")? {
                            current_row = r.parse::<u32>()?;
                        } else {
                            current_row += 1;
                        }
                        current_col = 0;
                    }
                    b"c" => {
                        let (row, col) = match attr_value(e, b"r")?.as_deref().and_then(parse_cell_ref) {
                            Some(pos) => pos,
                            None => (current_row, current_col + 1),
                        };
                        current_col = col;

                        if let Event::Start(_) = event {
                            let t_attr = attr_value(e, b"t")?.unwrap_or_default();
                            let value =
                                parse_cell_contents(&mut reader, &t_attr, &self.shared_strings)?;
                            if !value.is_empty() {
                                sheet.set_value(row, col, value);
                            }
                        }
                    }
                    b"hyperlink" => {
                        let mut link = RawHyperlink {
                            cell_ref: String::new(),
                            r_id: None,
                            location: None,
                        };
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"ref" => link.cell_ref = attr.unescape_value()?.to_string(),
                                b"r:id" => link.r_id = Some(attr.unescape_value()?.to_string()),
                                b"location" => {
                                    link.location = Some(attr.unescape_value()?.to_string())
                                }
                                _ => {}
                            }
                        }
                        raw_links.push(link);
                    }
                    b"dataValidation" => {
                        let mut validation = DataValidation::default();
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"type" => {
                                    validation.kind =
                                        ValidationKind::from_xml(&attr.unescape_value()?)
                                }
                                b"sqref" => validation.sqref = attr.unescape_value()?.to_string(),
                                _ => {}
                            }
                        }
                        validation.ranges = parse_sqref(&validation.sqref);

                        if let Event::Start(_) = event {
                            validation.formula1 = read_validation_formula(&mut reader)?;
                        }
                        sheet.push_validation(validation);
                    }
                    _ => {}
                },
                Event::End(ref e) => {
                    if e.name().as_ref() == b"worksheet" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(raw_links)
    }
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.to_string()));
        }
    }
    Ok(None)
}

/// Read the children of a `<dataValidation>` element, returning `<formula1>`
fn read_validation_formula<R: std::io::BufRead>(reader: &mut Reader<R>) -> Result<Option<String>> {
    let mut formula1 = None;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"formula1" => formula1 = Some(read_text_node(reader)?),
                _ => {
                    read_text_node(reader)?;
                }
            },
            Event::End(e) if e.name().as_ref() == b"dataValidation" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(formula1)
}

/// Read the cached value of a `<c>` element. Formulas are not evaluated,
/// only their last cached result is kept.
fn parse_cell_contents<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    t_attr: &str,
    shared_strings: &[String],
) -> Result<CellValue> {
    let mut value = CellValue::Empty;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"v" => {
                    let v_text = read_text_node(reader)?;
                    value = match t_attr {
                        "s" => v_text
                            .trim()
                            .parse::<usize>()
                            .ok()
                            .and_then(|idx| shared_strings.get(idx))
                            .map(|s| CellValue::Text(s.clone()))
                            .unwrap_or_default(),
                        "b" => CellValue::Boolean(v_text.trim() == "1"),
                        "e" => CellValue::Error(v_text),
                        "str" | "d" => CellValue::Text(v_text),
                        _ => match v_text.trim().parse::<f64>() {
                            Ok(n) => CellValue::Number(n),
                            Err(_) if v_text.is_empty() => CellValue::Empty,
                            Err(_) => CellValue::Text(v_text),
                        },
                    };
                }
                b"is" => {
                    value = CellValue::Text(read_rich_text(reader, b"is")?);
                }
                // <f> and anything else: consume and ignore
                _ => {
                    read_text_node(reader)?;
                }
            },
            Event::End(e) if e.name().as_ref() == b"c" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(value)
}
