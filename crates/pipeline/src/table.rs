//! Table extraction and email-client compatibility checks.
//!
//! [`extract`] reduces an inlined document to its single top-level
//! `<table>` and normalizes images on the way out. [`validate`] inspects
//! the result and reports everything known to break in mail clients.
//! Validation is advisory: issues never fail an export.

use quick_xml::events::{BytesStart, Event};
use serde::Serialize;

use crate::html::{self, px_value, tag_name, Element, HtmlError};

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("Expected exactly one top-level table, found {found}")]
    TopLevelCount { found: usize },

    #[error(transparent)]
    Html(#[from] HtmlError),
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Give `<img>` an explicit `border="0"` and pixel `width`/`height`
/// attributes taken from its inline style where missing.
fn normalize_img(start: &BytesStart<'_>) -> BytesStart<'static> {
    let mut img = Element::from_start(start);
    img.set_attr("border", "0");

    let declarations = img.declarations();
    for dimension in ["width", "height"] {
        if img.has_attr(dimension) {
            continue;
        }
        let px = declarations
            .iter()
            .rev()
            .find(|d| d.property == dimension)
            .and_then(|d| px_value(&d.value));
        if let Some(px) = px {
            img.set_attr(dimension, px.to_string());
        }
    }
    img.to_start()
}

fn rewrite_start(start: BytesStart<'_>) -> BytesStart<'_> {
    if tag_name(&start) == "img" {
        normalize_img(&start)
    } else {
        start
    }
}

/// Return the markup of the one top-level `<table>` in `document`.
pub fn extract(document: &str) -> Result<String, TableError> {
    let mut reader = html::reader(document);
    let mut writer = html::writer(document.len());
    let mut depth = 0usize;
    let mut top_level = 0usize;

    loop {
        match reader.read_event().map_err(HtmlError::from)? {
            Event::Start(e) => {
                let is_table = tag_name(&e) == "table";
                if is_table && depth == 0 {
                    top_level += 1;
                }
                if is_table {
                    depth += 1;
                }
                if depth > 0 && top_level == 1 {
                    writer
                        .write_event(Event::Start(rewrite_start(e)))
                        .map_err(HtmlError::from)?;
                }
            }
            Event::Empty(e) => {
                let is_table = tag_name(&e) == "table";
                if is_table && depth == 0 {
                    top_level += 1;
                }
                if (depth > 0 || is_table) && top_level == 1 {
                    writer
                        .write_event(Event::Empty(rewrite_start(e)))
                        .map_err(HtmlError::from)?;
                }
            }
            Event::End(e) => {
                let closes_table = e.name().as_ref().eq_ignore_ascii_case(b"table");
                if depth > 0 && top_level == 1 {
                    writer.write_event(Event::End(e)).map_err(HtmlError::from)?;
                }
                if closes_table {
                    depth = depth.saturating_sub(1);
                }
            }
            Event::Eof => break,
            event => {
                if depth > 0 && top_level == 1 {
                    writer.write_event(event).map_err(HtmlError::from)?;
                }
            }
        }
    }

    if top_level != 1 {
        return Err(TableError::TopLevelCount { found: top_level });
    }
    Ok(html::finish(writer)?)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single compatibility problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompatibilityIssue {
    TopLevelTables(usize),
    StyleTag,
    LinkTag,
    RootMissingCellpadding,
    RootMissingCellspacing,
    ImageMissingBorder { src: String },
    ImageMissingDimensions { src: String },
    ClipPath { element: String },
    AbsolutePositioning { element: String },
    Unparseable(String),
}

impl std::fmt::Display for CompatibilityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TopLevelTables(n) => write!(f, "Expected exactly one top-level table, found {n}"),
            Self::StyleTag => write!(f, "Contains a <style> block; styles must be inline"),
            Self::LinkTag => write!(f, "Contains a <link> element; external stylesheets are stripped by mail clients"),
            Self::RootMissingCellpadding => write!(f, "Root table is missing cellpadding=\"0\""),
            Self::RootMissingCellspacing => write!(f, "Root table is missing cellspacing=\"0\""),
            Self::ImageMissingBorder { src } => write!(f, "Image {src} is missing border=\"0\""),
            Self::ImageMissingDimensions { src } => {
                write!(f, "Image {src} is missing explicit width/height")
            }
            Self::ClipPath { element } => {
                write!(f, "<{element}> uses clip-path, which mail clients ignore")
            }
            Self::AbsolutePositioning { element } => {
                write!(f, "<{element}> uses absolute positioning, which mail clients ignore")
            }
            Self::Unparseable(reason) => write!(f, "Markup could not be parsed: {reason}"),
        }
    }
}

/// Outcome of [`validate`]: `valid` is true iff `issues` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<String>,
}

impl ValidationReport {
    pub fn from_issues(issues: &[CompatibilityIssue]) -> Self {
        let mut messages: Vec<String> = Vec::with_capacity(issues.len());
        for issue in issues {
            let message = issue.to_string();
            if !messages.contains(&message) {
                messages.push(message);
            }
        }
        Self {
            valid: messages.is_empty(),
            issues: messages,
        }
    }
}

fn inspect_element(element: &Element, issues: &mut Vec<CompatibilityIssue>) {
    for declaration in element.declarations() {
        let property = declaration.property.as_str();
        if property == "clip-path" || property == "-webkit-clip-path" {
            issues.push(CompatibilityIssue::ClipPath {
                element: element.name.clone(),
            });
        }
        if property == "position" && declaration.value.trim().eq_ignore_ascii_case("absolute") {
            issues.push(CompatibilityIssue::AbsolutePositioning {
                element: element.name.clone(),
            });
        }
    }

    if element.name == "img" {
        let src = element.attr("src").unwrap_or("(no src)");
        let src = if src.starts_with("data:") { "(inline data)" } else { src };
        if element.attr("border") != Some("0") {
            issues.push(CompatibilityIssue::ImageMissingBorder { src: src.to_string() });
        }
        if !element.has_attr("width") && !element.has_attr("height") {
            issues.push(CompatibilityIssue::ImageMissingDimensions { src: src.to_string() });
        }
    }
}

/// Walk `table_html` and collect every compatibility issue, in document
/// order.
pub fn inspect(table_html: &str) -> Vec<CompatibilityIssue> {
    let mut reader = html::reader(table_html);
    let mut issues = Vec::new();
    let mut depth = 0usize;
    let mut top_level = 0usize;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                issues.push(CompatibilityIssue::Unparseable(err.to_string()));
                return issues;
            }
        };
        let (start, opens) = match event {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::End(e) => {
                if e.name().as_ref().eq_ignore_ascii_case(b"table") {
                    depth = depth.saturating_sub(1);
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        let element = Element::from_start(&start);
        match element.name.as_str() {
            "style" => issues.push(CompatibilityIssue::StyleTag),
            "link" => issues.push(CompatibilityIssue::LinkTag),
            "table" => {
                if depth == 0 {
                    top_level += 1;
                    if top_level == 1 {
                        if element.attr("cellpadding") != Some("0") {
                            issues.push(CompatibilityIssue::RootMissingCellpadding);
                        }
                        if element.attr("cellspacing") != Some("0") {
                            issues.push(CompatibilityIssue::RootMissingCellspacing);
                        }
                    }
                }
                if opens {
                    depth += 1;
                }
            }
            _ => {}
        }
        inspect_element(&element, &mut issues);
    }

    if top_level != 1 {
        issues.insert(0, CompatibilityIssue::TopLevelTables(top_level));
    }
    issues
}

pub fn validate(table_html: &str) -> ValidationReport {
    ValidationReport::from_issues(&inspect(table_html))
}
