//! Hosted document link normalization
//!
//! Turns share/edit links for hosted documents, spreadsheets, presentations
//! and drive files into direct export or download URLs.

use regex::Regex;
use std::sync::OnceLock;

/// Hosts whose links are considered glossary resources at all
const HOSTED_LINK_MARKERS: [&str; 3] = ["drive.google.com", "docs.google.com", "forms.gle"];

/// Check whether a link points at one of the hosted document services.
///
/// Links that fail this check never reach the resource map.
pub fn is_hosted_link(link: &str) -> bool {
    HOSTED_LINK_MARKERS
        .iter()
        .any(|marker| link.contains(marker))
}

fn id_patterns() -> &'static [Regex; 4] {
    static PATTERNS: OnceLock<[Regex; 4]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"document/d/([a-zA-Z0-9_-]+)",
            r"spreadsheets/d/([a-zA-Z0-9_-]+)",
            r"presentation/d/([a-zA-Z0-9_-]+)",
            r"file/d/([a-zA-Z0-9_-]+)",
        ]
        .map(|p| Regex::new(p).unwrap())
    })
}

fn docs_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"docs\.google\.com/(document|spreadsheets|presentation)/d/").unwrap()
    })
}

fn drive_file_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"drive\.google\.com/file/d/").unwrap())
}

/// Extract the file identifier from a document, spreadsheet, presentation
/// or drive file URL. Patterns are tried in that order.
pub fn extract_file_id(url: &str) -> Option<&str> {
    id_patterns()
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Check for a docs-host document, spreadsheet or presentation link
pub fn is_docs_link(url: &str) -> bool {
    docs_pattern().is_match(url)
}

/// Check for a drive-host file link
pub fn is_drive_file(url: &str) -> bool {
    drive_file_pattern().is_match(url)
}

/// Convert a hosted link into a direct export/download URL.
///
/// Docs-host links are dispatched on the keyword found anywhere in the URL,
/// not on the pattern that yielded the identifier. Returns `None` when no
/// identifier can be extracted, or when an identifier was found but the URL
/// belongs to neither the docs host nor the drive host.
pub fn normalize(url: &str) -> Option<String> {
    let file_id = extract_file_id(url)?;

    if is_docs_link(url) {
        if url.contains("document") {
            Some(format!(
                "https://docs.google.com/document/d/{}/export?format=pdf",
                file_id
            ))
        } else if url.contains("spreadsheets") {
            Some(format!(
                "https://docs.google.com/spreadsheets/d/{}/export?format=xlsx",
                file_id
            ))
        } else if url.contains("presentation") {
            Some(format!(
                "https://docs.google.com/presentation/d/{}/export/pdf",
                file_id
            ))
        } else {
            None
        }
    } else if is_drive_file(url) {
        Some(format!(
            "https://drive.google.com/uc?export=download&id={}",
            file_id
        ))
    } else {
        None
    }
}
