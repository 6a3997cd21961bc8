//! Common parsing utilities for sheet XML

use anyhow::Result;
use log::warn;
use quick_xml::Reader;
use quick_xml::events::Event;

use super::workbook::CellRange;

/// Last row of an XLSX worksheet
pub const MAX_ROW: u32 = 1_048_576;
/// Last column of an XLSX worksheet (XFD)
pub const MAX_COL: u32 = 16_384;

/// Parse a cell reference like "A1" or "$B$7" into 1-based (row, col)
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let mut col = 0u32;
    let mut row_str = String::new();

    for ch in cell_ref.chars() {
        if ch == '$' {
            continue;
        } else if ch.is_ascii_alphabetic() {
            if !row_str.is_empty() {
                return None;
            }
            col = col
                .checked_mul(26)?
                .checked_add(ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
        } else if ch.is_ascii_digit() {
            row_str.push(ch);
        } else {
            return None;
        }
    }

    if row_str.is_empty() || col == 0 {
        return None;
    }

    let row = row_str.parse::<u32>().ok()?;
    if row == 0 {
        return None;
    }

    Some((row, col))
}

/// Parse a range like "A1:B2" (or a single cell "A1") into a `CellRange`
pub fn parse_cell_range(range: &str) -> Option<CellRange> {
    match range.split_once(':') {
        Some((start, end)) => {
            let (start_row, start_col) = parse_cell_ref(start)?;
            let (end_row, end_col) = parse_cell_ref(end)?;
            Some(CellRange::new(start_row, start_col, end_row, end_col))
        }
        None => {
            let (row, col) = parse_cell_ref(range)?;
            Some(CellRange::single(row, col))
        }
    }
}

fn parse_column_letters(s: &str) -> Option<u32> {
    let letters = s.strip_prefix('$').unwrap_or(s);
    if letters.is_empty() || !letters.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return None;
    }
    letters.chars().try_fold(0u32, |col, ch| {
        col.checked_mul(26)?
            .checked_add(ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1)
    })
}

fn parse_row_number(s: &str) -> Option<u32> {
    let digits = s.strip_prefix('$').unwrap_or(s);
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|row| *row > 0)
}

/// Parse a whole-column ("A:C") or whole-row ("3:5") range
pub fn parse_line_range(range: &str) -> Option<CellRange> {
    let (start, end) = range.split_once(':')?;
    if let (Some(first), Some(last)) = (parse_column_letters(start), parse_column_letters(end)) {
        return Some(CellRange::new(1, first, MAX_ROW, last));
    }
    if let (Some(first), Some(last)) = (parse_row_number(start), parse_row_number(end)) {
        return Some(CellRange::new(first, 1, last, MAX_COL));
    }
    None
}

/// Parse a whitespace-separated `sqref` list such as "A3:A20 C5 E:E"
///
/// Whole-column and whole-row parts span the full sheet. Parts that are not
/// references at all are skipped with a warning.
pub fn parse_sqref(sqref: &str) -> Vec<CellRange> {
    sqref
        .split_whitespace()
        .filter_map(|part| {
            let range = parse_cell_range(part).or_else(|| parse_line_range(part));
            if range.is_none() {
                warn!("Ignoring unrecognized range '{}' in sqref '{}'", part, sqref);
            }
            range
        })
        .collect()
}

/// Read text content from an XML node
pub fn read_text_node<R: std::io::BufRead>(reader: &mut Reader<R>) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(e.unescape()?.as_ref()),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(e.as_ref())),
            Event::End(_) => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}

/// Read the `<t>` runs of a rich text container (`<si>` or `<is>`) up to its
/// closing tag. Phonetic runs (`<rPh>`) are skipped.
pub fn read_rich_text<R: std::io::BufRead>(reader: &mut Reader<R>, end: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut in_phonetic = false;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"rPh" => in_phonetic = true,
            Event::End(e) if e.name().as_ref() == b"rPh" => in_phonetic = false,
            Event::Start(e) if e.name().as_ref() == b"t" => {
                let run = read_text_node(reader)?;
                if !in_phonetic {
                    text.push_str(&run);
                }
            }
            Event::End(e) if e.name().as_ref() == end => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}
