//! Shared HTML plumbing for every markup pass.
//!
//! Layouts emit well-formed XHTML-style markup (quoted attributes, closed
//! or self-closed elements), so every downstream pass can walk it as a
//! quick-xml event stream and write it back out unchanged except for the
//! nodes it rewrites.

use std::io::Cursor;

use quick_xml::events::BytesStart;
use quick_xml::{Reader, Writer};

pub type HtmlWriter = Writer<Cursor<Vec<u8>>>;

/// Errors raised while walking or rewriting markup.
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("Markup parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Markup write error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Markup is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// HTML void elements; a `Start` event for one of these never gets an `End`.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Lenient reader: no text trimming, no end-name checks.
pub fn reader(html: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(html.as_bytes());
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);
    reader
}

pub fn writer(capacity: usize) -> HtmlWriter {
    Writer::new(Cursor::new(Vec::with_capacity(capacity)))
}

pub fn finish(writer: HtmlWriter) -> Result<String, HtmlError> {
    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

/// Lowercased local name of a start tag.
pub fn tag_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decode the handful of entities our markup can contain, plus numeric
/// references. Unknown entities are kept verbatim.
pub fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';').filter(|&i| i <= 10) else {
            out.push('&');
            rest = &tail[1..];
            continue;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ---------------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------------

/// A start tag with decoded attribute values, for passes that rewrite
/// attributes rather than forward them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    pub fn from_start(start: &BytesStart<'_>) -> Self {
        let attrs = start
            .html_attributes()
            .with_checks(false)
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
                let value = decode_entities(&String::from_utf8_lossy(&attr.value));
                (key, value)
            })
            .collect();
        Self {
            name: tag_name(start),
            attrs,
        }
    }

    /// Re-encode as a start tag; values are escaped exactly once here.
    pub fn to_start(&self) -> BytesStart<'static> {
        let mut start = BytesStart::new(self.name.clone());
        for (key, value) in &self.attrs {
            let escaped = escape_attr(value);
            start.push_attribute((key.as_bytes(), escaped.as_bytes()));
        }
        start
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attr(key).is_some()
    }

    /// Replace an existing attribute in place or append a new one.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(k, _)| k == key)?;
        Some(self.attrs.remove(idx).1)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    pub fn declarations(&self) -> Vec<Declaration> {
        self.attr("style").map(parse_declarations).unwrap_or_default()
    }

    /// Write `declarations` back to `style`, removing it when empty.
    pub fn set_declarations(&mut self, declarations: &[Declaration]) {
        if declarations.is_empty() {
            self.remove_attr("style");
        } else {
            self.set_attr("style", format_declarations(declarations));
        }
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// A single `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(property: &str, value: &str) -> Self {
        Self {
            property: property.to_ascii_lowercase(),
            value: value.to_string(),
            important: false,
        }
    }
}

/// Split `text` on `separator`, ignoring separators inside parentheses or
/// quotes (`url(a;b)`, `"x,y"`).
pub(crate) fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (idx, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth -= 1,
            (None, c) if c == separator && depth <= 0 => {
                parts.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Parse a declaration block (`a: b; c: d !important`).
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    split_top_level(block, ';')
        .into_iter()
        .filter_map(|chunk| {
            let (property, value) = chunk.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let mut value = value.trim();
            if property.is_empty() || value.is_empty() {
                return None;
            }
            let mut important = false;
            if let Some(bang) = value.rfind('!') {
                if value[bang + 1..].trim().eq_ignore_ascii_case("important") {
                    important = true;
                    value = value[..bang].trim_end();
                }
            }
            Some(Declaration {
                property,
                value: value.to_string(),
                important,
            })
        })
        .collect()
}

/// Serialize declarations for a `style` attribute. `!important` is dropped;
/// it has no meaning once a value is inline.
pub fn format_declarations(declarations: &[Declaration]) -> String {
    declarations
        .iter()
        .map(|d| format!("{}: {}", d.property, d.value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Integer pixel value from `Npx` or a bare number.
pub fn px_value(value: &str) -> Option<u32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    let parsed: f32 = number.parse().ok()?;
    (parsed.is_finite() && parsed >= 0.0).then(|| parsed.round() as u32)
}
