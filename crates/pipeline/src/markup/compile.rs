//! MJML to HTML compilation for the component subset the builder emits.
//!
//! Supported components: `mjml`, `mj-head` (`mj-title`, `mj-font`,
//! `mj-attributes` with per-tag defaults and `mj-all`, `mj-preview`),
//! `mj-body`, `mj-section`, `mj-column`, `mj-text`, `mj-image`,
//! `mj-social`/`mj-social-element`, `mj-divider`, `mj-spacer`,
//! `mj-button` and `mj-raw`. The body compiles to one root table; fonts
//! become `<link>` elements in the document head.

use std::collections::HashMap;

use quick_xml::events::Event;

use crate::html::{self, escape_attr, px_value, Element, HtmlError};

#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("MJML parse error: {0}")]
    Parse(#[from] HtmlError),

    #[error("MJML document has no <{0}> element")]
    Missing(&'static str),

    #[error("<{tag}> requires a `{attribute}` attribute")]
    MissingAttribute { tag: String, attribute: &'static str },

    #[error("Unsupported MJML element <{0}>")]
    Unsupported(String),
}

impl From<quick_xml::Error> for MarkupError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Parse(HtmlError::from(err))
    }
}

/// Components whose content is HTML passed through verbatim.
const ENDING_TAGS: &[&str] = &["mj-text", "mj-button", "mj-raw", "mj-title", "mj-preview", "mj-social-element"];

/// Body width used when `mj-body` does not set one.
const DEFAULT_BODY_WIDTH: u32 = 600;

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
    /// Raw inner markup of ending tags.
    content: String,
}

impl Node {
    fn from_element(element: Element) -> Self {
        Self {
            tag: element.name,
            attrs: element.attrs,
            ..Self::default()
        }
    }

    fn own_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn child(&self, tag: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.tag == tag)
    }
}

fn parse(mjml: &str) -> Result<Node, MarkupError> {
    let mut reader = html::reader(mjml);
    let mut stack = vec![Node::default()];

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let element = Element::from_start(&e);
                if ENDING_TAGS.contains(&element.name.as_str()) {
                    let content = reader.read_text(e.name())?.into_owned();
                    let mut node = Node::from_element(element);
                    node.content = content.trim().to_string();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                } else {
                    stack.push(Node::from_element(element));
                }
            }
            Event::Empty(e) => {
                let node = Node::from_element(Element::from_start(&e));
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    if let Some(node) = stack.pop() {
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(node);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    while stack.len() > 1 {
        if let Some(node) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
            }
        }
    }
    let root = stack.pop().unwrap_or_default();
    root.children
        .into_iter()
        .find(|n| n.tag == "mjml")
        .ok_or(MarkupError::Missing("mjml"))
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

fn builtin_default(tag: &str, name: &str) -> Option<&'static str> {
    let value = match (tag, name) {
        (_, "font-family") => "Ubuntu, Helvetica, Arial, sans-serif",
        ("mj-body", "width") => "600px",
        ("mj-section", "padding") => "20px 0",
        ("mj-section", "text-align") => "center",
        ("mj-column", "padding") => "0",
        ("mj-column", "vertical-align") => "top",
        ("mj-text", "font-size") => "13px",
        ("mj-text", "line-height") => "1",
        ("mj-text", "color") => "#000000",
        ("mj-text" | "mj-image" | "mj-social" | "mj-divider" | "mj-button", "padding") => "10px 25px",
        ("mj-text", "align") => "left",
        ("mj-image" | "mj-social" | "mj-button", "align") => "center",
        ("mj-image", "height") => "auto",
        ("mj-social", "icon-size") => "20px",
        ("mj-social", "mode") => "horizontal",
        ("mj-social", "inner-padding") => "4px",
        ("mj-divider", "border-width") => "4px",
        ("mj-divider", "border-style") => "solid",
        ("mj-divider", "border-color") => "#000000",
        ("mj-divider", "width") => "100%",
        ("mj-spacer", "height") => "20px",
        ("mj-button", "background-color") => "#414141",
        ("mj-button", "color") => "#ffffff",
        ("mj-button", "font-size") => "13px",
        ("mj-button", "inner-padding") => "10px 25px",
        ("mj-button", "border-radius") => "3px",
        _ => return None,
    };
    Some(value)
}

/// Attribute lookup order: the element itself, `mj-attributes` defaults
/// for its tag, `mj-all`, then the component default.
struct Defaults {
    by_tag: HashMap<String, Vec<(String, String)>>,
}

impl Defaults {
    fn from_head(head: Option<&Node>) -> Self {
        let mut by_tag: HashMap<String, Vec<(String, String)>> = HashMap::new();
        if let Some(attributes) = head.and_then(|h| h.child("mj-attributes")) {
            for node in &attributes.children {
                by_tag
                    .entry(node.tag.clone())
                    .or_default()
                    .extend(node.attrs.iter().cloned());
            }
        }
        Self { by_tag }
    }

    fn lookup<'a>(&'a self, tag: &str, name: &str) -> Option<&'a str> {
        let find = |key: &str| {
            self.by_tag
                .get(key)
                .and_then(|attrs| attrs.iter().rev().find(|(k, _)| k == name))
                .map(|(_, v)| v.as_str())
        };
        find(tag).or_else(|| find("mj-all"))
    }

    fn get<'a>(&'a self, node: &'a Node, name: &str) -> Option<&'a str> {
        node.own_attr(name)
            .or_else(|| self.lookup(&node.tag, name))
            .or_else(|| builtin_default(&node.tag, name))
    }

    fn get_or<'a>(&'a self, node: &'a Node, name: &str, fallback: &'a str) -> &'a str {
        self.get(node, name).unwrap_or(fallback)
    }
}

/// `(top, right, bottom, left)` from a CSS padding shorthand in pixels.
fn padding_sides(value: &str) -> (u32, u32, u32, u32) {
    let parts: Vec<u32> = value
        .split_whitespace()
        .map(|p| px_value(p).unwrap_or(0))
        .collect();
    match parts.as_slice() {
        [all] => (*all, *all, *all, *all),
        [v, h] => (*v, *h, *v, *h),
        [t, h, b] => (*t, *h, *b, *h),
        [t, r, b, l, ..] => (*t, *r, *b, *l),
        [] => (0, 0, 0, 0),
    }
}

fn horizontal_padding(value: &str) -> u32 {
    let (_, right, _, left) = padding_sides(value);
    right + left
}

fn push_decl(style: &mut Vec<String>, property: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        style.push(format!("{property}: {value}"));
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

struct Compiler {
    defaults: Defaults,
}

const TABLE_ATTRS: &str = "cellpadding=\"0\" cellspacing=\"0\" border=\"0\" role=\"presentation\"";

impl Compiler {
    fn section(&self, section: &Node, body_width: u32) -> Result<String, MarkupError> {
        let padding = self.defaults.get_or(section, "padding", "0");
        let inner_width = body_width.saturating_sub(horizontal_padding(padding));

        let columns: Vec<&Node> = section
            .children
            .iter()
            .filter(|c| c.tag == "mj-column")
            .collect();
        if let Some(other) = section.children.iter().find(|c| c.tag != "mj-column") {
            return Err(MarkupError::Unsupported(other.tag.clone()));
        }

        let widths = column_widths(&columns, inner_width, &self.defaults);
        let mut cells = String::new();
        for (column, width) in columns.iter().zip(widths) {
            cells.push_str(&self.column(column, width)?);
        }

        let mut style = vec![format!("padding: {padding}")];
        push_decl(&mut style, "background-color", self.defaults.get(section, "background-color"));
        push_decl(&mut style, "text-align", self.defaults.get(section, "text-align"));
        push_decl(&mut style, "border-radius", self.defaults.get(section, "border-radius"));

        Ok(format!(
            "<tr><td style=\"{}\"><table {TABLE_ATTRS} width=\"100%\" style=\"border-collapse: collapse\"><tr>{cells}</tr></table></td></tr>",
            escape_attr(&style.join("; "))
        ))
    }

    fn column(&self, column: &Node, width: u32) -> Result<String, MarkupError> {
        let padding = self.defaults.get_or(column, "padding", "0");
        let content_width = width.saturating_sub(horizontal_padding(padding));
        let valign = self.defaults.get_or(column, "vertical-align", "top");

        let mut rows = String::new();
        for child in &column.children {
            let child_padding = self.defaults.get_or(child, "padding", "0");
            let child_width = content_width.saturating_sub(horizontal_padding(child_padding));
            let align = self.defaults.get_or(child, "align", "left");
            let mut cell_style = vec![format!("padding: {child_padding}")];
            push_decl(&mut cell_style, "text-align", Some(align));
            push_decl(&mut cell_style, "background-color", self.defaults.get(child, "container-background-color"));
            rows.push_str(&format!(
                "<tr><td align=\"{}\" style=\"{}\">{}</td></tr>",
                escape_attr(align),
                escape_attr(&cell_style.join("; ")),
                self.component(child, child_width)?
            ));
        }

        let mut style = vec![format!("width: {width}px"), format!("vertical-align: {valign}")];
        push_decl(&mut style, "padding", Some(padding));
        push_decl(&mut style, "background-color", self.defaults.get(column, "background-color"));
        push_decl(&mut style, "border-left", self.defaults.get(column, "border-left"));
        push_decl(&mut style, "border-radius", self.defaults.get(column, "border-radius"));

        Ok(format!(
            "<td width=\"{width}\" valign=\"{}\" style=\"{}\"><table {TABLE_ATTRS} width=\"100%\" style=\"border-collapse: collapse\">{rows}</table></td>",
            escape_attr(valign),
            escape_attr(&style.join("; "))
        ))
    }

    fn component(&self, node: &Node, width: u32) -> Result<String, MarkupError> {
        match node.tag.as_str() {
            "mj-text" => Ok(self.text(node)),
            "mj-image" => self.image(node, width),
            "mj-social" => self.social(node),
            "mj-divider" => Ok(self.divider(node)),
            "mj-spacer" => {
                let height = self.defaults.get_or(node, "height", "20px");
                Ok(format!(
                    "<div style=\"height: {0}; line-height: {0}; font-size: 1px\"></div>",
                    escape_attr(height)
                ))
            }
            "mj-button" => Ok(self.button(node)),
            "mj-raw" => Ok(node.content.clone()),
            other => Err(MarkupError::Unsupported(other.to_string())),
        }
    }

    fn text(&self, node: &Node) -> String {
        let d = &self.defaults;
        let mut style = Vec::new();
        push_decl(&mut style, "font-family", d.get(node, "font-family"));
        push_decl(&mut style, "font-size", d.get(node, "font-size"));
        push_decl(&mut style, "font-weight", d.get(node, "font-weight"));
        push_decl(&mut style, "font-style", d.get(node, "font-style"));
        push_decl(&mut style, "line-height", d.get(node, "line-height"));
        push_decl(&mut style, "letter-spacing", d.get(node, "letter-spacing"));
        push_decl(&mut style, "text-transform", d.get(node, "text-transform"));
        push_decl(&mut style, "color", d.get(node, "color"));
        push_decl(&mut style, "text-align", d.get(node, "align"));
        format!(
            "<div style=\"{}\">{}</div>",
            escape_attr(&style.join("; ")),
            node.content
        )
    }

    fn image(&self, node: &Node, available: u32) -> Result<String, MarkupError> {
        let src = node.own_attr("src").ok_or_else(|| MarkupError::MissingAttribute {
            tag: node.tag.clone(),
            attribute: "src",
        })?;
        let width = self
            .defaults
            .get(node, "width")
            .and_then(px_value)
            .map_or(available, |w| w.min(available.max(1)));
        let height = self.defaults.get(node, "height").and_then(px_value);
        let alt = self.defaults.get_or(node, "alt", "");

        let mut style = vec![
            "display: block".to_string(),
            "outline: none".to_string(),
            "text-decoration: none".to_string(),
            format!("width: {width}px"),
        ];
        style.push(match height {
            Some(h) => format!("height: {h}px"),
            None => "height: auto".to_string(),
        });
        push_decl(&mut style, "border-radius", self.defaults.get(node, "border-radius"));

        let height_attr = height.map(|h| format!(" height=\"{h}\"")).unwrap_or_default();
        let img = format!(
            "<img src=\"{}\" alt=\"{}\" width=\"{width}\"{height_attr} border=\"0\" style=\"{}\" />",
            escape_attr(src),
            escape_attr(alt),
            escape_attr(&style.join("; "))
        );
        Ok(match node.own_attr("href") {
            Some(href) => format!(
                "<a href=\"{}\" target=\"_blank\">{img}</a>",
                escape_attr(href)
            ),
            None => img,
        })
    }

    fn social(&self, node: &Node) -> Result<String, MarkupError> {
        let icon = self
            .defaults
            .get(node, "icon-size")
            .and_then(px_value)
            .unwrap_or(20);
        let inner = self.defaults.get_or(node, "inner-padding", "4px");
        let vertical = self.defaults.get(node, "mode") == Some("vertical");
        let align = self.defaults.get_or(node, "align", "center");

        let mut cells = Vec::new();
        for element in &node.children {
            if element.tag != "mj-social-element" {
                return Err(MarkupError::Unsupported(element.tag.clone()));
            }
            let src = element.own_attr("src").ok_or_else(|| MarkupError::MissingAttribute {
                tag: element.tag.clone(),
                attribute: "src",
            })?;
            let alt = element
                .own_attr("alt")
                .or_else(|| element.own_attr("name"))
                .unwrap_or_default();
            let img = format!(
                "<img src=\"{}\" alt=\"{}\" width=\"{icon}\" height=\"{icon}\" border=\"0\" \
                 style=\"display: block; width: {icon}px; height: {icon}px\" />",
                escape_attr(src),
                escape_attr(alt)
            );
            let linked = match element.own_attr("href") {
                Some(href) => format!(
                    "<a href=\"{}\" target=\"_blank\">{img}</a>",
                    escape_attr(href)
                ),
                None => img,
            };
            cells.push(format!(
                "<td style=\"padding: {}\">{linked}</td>",
                escape_attr(inner)
            ));
        }

        let rows = if vertical {
            cells.iter().map(|c| format!("<tr>{c}</tr>")).collect::<String>()
        } else {
            format!("<tr>{}</tr>", cells.concat())
        };
        Ok(format!(
            "<table {TABLE_ATTRS} align=\"{}\" style=\"border-collapse: collapse\">{rows}</table>",
            escape_attr(align)
        ))
    }

    fn divider(&self, node: &Node) -> String {
        let d = &self.defaults;
        let border = format!(
            "{} {} {}",
            d.get_or(node, "border-width", "4px"),
            d.get_or(node, "border-style", "solid"),
            d.get_or(node, "border-color", "#000000")
        );
        format!(
            "<p style=\"{}\"></p>",
            escape_attr(&format!(
                "border-top: {border}; font-size: 1px; line-height: 1px; margin: 0 auto; width: {}",
                d.get_or(node, "width", "100%")
            ))
        )
    }

    fn button(&self, node: &Node) -> String {
        let d = &self.defaults;
        let mut style = vec!["display: inline-block".to_string(), "text-decoration: none".to_string()];
        push_decl(&mut style, "background-color", d.get(node, "background-color"));
        push_decl(&mut style, "color", d.get(node, "color"));
        push_decl(&mut style, "font-family", d.get(node, "font-family"));
        push_decl(&mut style, "font-size", d.get(node, "font-size"));
        push_decl(&mut style, "padding", d.get(node, "inner-padding"));
        push_decl(&mut style, "border-radius", d.get(node, "border-radius"));
        format!(
            "<a href=\"{}\" target=\"_blank\" style=\"{}\">{}</a>",
            escape_attr(node.own_attr("href").unwrap_or("#")),
            escape_attr(&style.join("; ")),
            node.content
        )
    }
}

/// Explicit `px`/`%` widths first; the rest share what is left equally.
fn column_widths(columns: &[&Node], inner_width: u32, defaults: &Defaults) -> Vec<u32> {
    let explicit: Vec<Option<u32>> = columns
        .iter()
        .map(|c| {
            let width = defaults.get(c, "width")?;
            match width.trim().strip_suffix('%') {
                Some(pct) => pct
                    .trim()
                    .parse::<f32>()
                    .ok()
                    .map(|p| (inner_width as f32 * p / 100.0).round() as u32),
                None => px_value(width),
            }
        })
        .collect();

    let fixed: u32 = explicit.iter().flatten().sum();
    let auto = explicit.iter().filter(|w| w.is_none()).count() as u32;
    let share = if auto == 0 {
        0
    } else {
        inner_width.saturating_sub(fixed) / auto
    };
    explicit.into_iter().map(|w| w.unwrap_or(share)).collect()
}

/// Compile an MJML document into a standalone HTML document.
pub fn compile_mjml(mjml: &str) -> Result<String, MarkupError> {
    let root = parse(mjml)?;
    let head = root.child("mj-head");
    let body = root.child("mj-body").ok_or(MarkupError::Missing("mj-body"))?;
    let compiler = Compiler {
        defaults: Defaults::from_head(head),
    };

    let body_width = compiler
        .defaults
        .get(body, "width")
        .and_then(px_value)
        .unwrap_or(DEFAULT_BODY_WIDTH);

    let mut sections = String::new();
    for section in &body.children {
        if section.tag != "mj-section" {
            return Err(MarkupError::Unsupported(section.tag.clone()));
        }
        sections.push_str(&compiler.section(section, body_width)?);
    }

    let mut head_markup = String::new();
    let title = head
        .and_then(|h| h.child("mj-title"))
        .map(|t| t.content.as_str())
        .unwrap_or_default();
    head_markup.push_str(&format!("<title>{title}</title>"));
    if let Some(head) = head {
        for node in &head.children {
            match node.tag.as_str() {
                "mj-font" => {
                    if let Some(href) = node.own_attr("href") {
                        head_markup.push_str(&format!(
                            "<link href=\"{}\" rel=\"stylesheet\" type=\"text/css\" />",
                            escape_attr(href)
                        ));
                    }
                }
                "mj-title" | "mj-attributes" | "mj-preview" => {}
                other => return Err(MarkupError::Unsupported(other.to_string())),
            }
        }
    }

    let mut table_style = vec![format!("width: {body_width}px"), "border-collapse: collapse".to_string()];
    push_decl(&mut table_style, "font-family", compiler.defaults.lookup("mj-all", "font-family"));
    push_decl(&mut table_style, "background-color", compiler.defaults.get(body, "background-color"));

    Ok(format!(
        "<!DOCTYPE html>\n<html xmlns=\"http://www.w3.org/1999/xhtml\"><head>\
         <meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\" />\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />{head_markup}</head>\
         <body style=\"margin: 0; padding: 0\">\n\
         <table {TABLE_ATTRS} width=\"{body_width}\" style=\"{}\">{sections}</table>\n</body></html>\n",
        escape_attr(&table_style.join("; "))
    ))
}
