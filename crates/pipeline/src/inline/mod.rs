//! CSS inlining.
//!
//! Collects every `<style>` block in the document, resolves the cascade
//! per element and writes the winning declarations into `style`
//! attributes. `<style>` and `<link>` elements are removed from the
//! output and `class` attributes are dropped once their rules are applied.
//!
//! Cascade order, lowest to highest: sheet rules by specificity then
//! source order, inline declarations, `!important` sheet rules,
//! `!important` inline declarations.

mod selector;
mod stylesheet;

use quick_xml::events::Event;

use crate::html::{self, is_void, tag_name, Declaration, Element, HtmlError};

pub use selector::{Selector, Specificity};
pub use stylesheet::{parse_stylesheet, Rule};

/// Inline all stylesheet rules of `document`.
pub fn inline_css(document: &str) -> Result<String, HtmlError> {
    let css = collect_styles(document)?;
    let rules = parse_stylesheet(&css);
    tracing::debug!(rules = rules.len(), "Inlining stylesheet");
    apply(document, &rules)
}

fn collect_styles(document: &str) -> Result<String, HtmlError> {
    let mut reader = html::reader(document);
    let mut css = String::new();
    let mut in_style = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if tag_name(&e) == "style" => in_style = true,
            Event::End(e) if e.name().as_ref().eq_ignore_ascii_case(b"style") => in_style = false,
            Event::Text(text) if in_style => {
                css.push_str(&String::from_utf8_lossy(&text));
                css.push('\n');
            }
            Event::CData(text) if in_style => {
                css.push_str(&String::from_utf8_lossy(&text));
                css.push('\n');
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(css)
}

fn apply(document: &str, rules: &[Rule]) -> Result<String, HtmlError> {
    let mut reader = html::reader(document);
    let mut writer = html::writer(document.len());
    let mut ancestors: Vec<Element> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let element = Element::from_start(&e);
                match element.name.clone().as_str() {
                    "style" => {
                        reader.read_to_end(e.name())?;
                    }
                    "link" => {}
                    name => {
                        let styled = styled(&element, &ancestors, rules);
                        writer.write_event(Event::Start(styled.to_start()))?;
                        if !is_void(name) {
                            ancestors.push(element);
                        }
                    }
                }
            }
            Event::Empty(e) => {
                let element = Element::from_start(&e);
                if matches!(element.name.as_str(), "style" | "link") {
                    continue;
                }
                let styled = styled(&element, &ancestors, rules);
                writer.write_event(Event::Empty(styled.to_start()))?;
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                if is_void(&name) {
                    continue;
                }
                if ancestors.last().is_some_and(|open| open.name == name) {
                    ancestors.pop();
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    html::finish(writer)
}

/// Position of a declaration in the cascade. Field order is sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CascadeKey {
    important: bool,
    inline: bool,
    specificity: Specificity,
    order: usize,
    index: usize,
}

/// Resolve the cascade for one element and return it with a merged
/// `style` and no `class`.
fn styled(element: &Element, ancestors: &[Element], rules: &[Rule]) -> Element {
    let inline = element.declarations();
    let mut matched: Vec<(CascadeKey, &Declaration)> = Vec::new();

    for rule in rules.iter().filter(|r| r.selector.matches(element, ancestors)) {
        for (index, declaration) in rule.declarations.iter().enumerate() {
            let key = CascadeKey {
                important: declaration.important,
                inline: false,
                specificity: rule.specificity,
                order: rule.order,
                index,
            };
            matched.push((key, declaration));
        }
    }
    for (index, declaration) in inline.iter().enumerate() {
        let key = CascadeKey {
            important: declaration.important,
            inline: true,
            specificity: Specificity::default(),
            order: 0,
            index,
        };
        matched.push((key, declaration));
    }
    matched.sort_by_key(|(key, _)| *key);

    let mut resolved: Vec<Declaration> = Vec::new();
    for (_, declaration) in matched {
        match resolved.iter_mut().find(|r| r.property == declaration.property) {
            Some(existing) => existing.value.clone_from(&declaration.value),
            None => resolved.push(Declaration {
                important: false,
                ..declaration.clone()
            }),
        }
    }

    let mut out = element.clone();
    out.remove_attr("class");
    out.set_declarations(&resolved);
    out
}
