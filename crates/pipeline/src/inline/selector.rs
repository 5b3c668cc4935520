//! The selector subset the inliner understands.
//!
//! Supported: type, universal, `#id`, `.class`, `[attr]`, `[attr=value]`,
//! compounds of those, and the descendant (` `) and child (`>`)
//! combinators. Anything else (pseudo-classes, sibling combinators) makes
//! [`Selector::parse`] return `None` and the rule is skipped.

use crate::html::Element;

/// `(ids, classes + attributes, types)`, compared lexicographically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity(pub u32, pub u32, pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

impl Compound {
    fn parse(text: &str) -> Option<Self> {
        let mut compound = Compound::default();
        let mut chars = text.char_indices().peekable();

        let ident_end = |from: usize| {
            text[from..]
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
                .map_or(text.len(), |i| from + i)
        };

        while let Some(&(idx, c)) = chars.peek() {
            let consumed_to = match c {
                '*' if idx == 0 => idx + 1,
                '#' | '.' => {
                    let end = ident_end(idx + 1);
                    if end == idx + 1 {
                        return None;
                    }
                    let ident = text[idx + 1..end].to_string();
                    if c == '#' {
                        compound.id = Some(ident);
                    } else {
                        compound.classes.push(ident);
                    }
                    end
                }
                '[' => {
                    let close = idx + text[idx..].find(']')?;
                    let inner = &text[idx + 1..close];
                    let attr = match inner.split_once('=') {
                        Some((name, value)) => AttrMatch {
                            name: name.trim().to_ascii_lowercase(),
                            value: Some(value.trim().trim_matches(['"', '\'']).to_string()),
                        },
                        None => AttrMatch {
                            name: inner.trim().to_ascii_lowercase(),
                            value: None,
                        },
                    };
                    if attr.name.is_empty() || attr.name.ends_with(['~', '|', '^', '$', '*']) {
                        return None;
                    }
                    compound.attrs.push(attr);
                    close + 1
                }
                c if idx == 0 && c.is_ascii_alphabetic() => {
                    let end = ident_end(idx);
                    compound.tag = Some(text[idx..end].to_ascii_lowercase());
                    end
                }
                _ => return None,
            };
            while chars.peek().is_some_and(|&(i, _)| i < consumed_to) {
                chars.next();
            }
        }
        Some(compound)
    }

    fn specificity(&self) -> Specificity {
        Specificity(
            u32::from(self.id.is_some()),
            (self.classes.len() + self.attrs.len()) as u32,
            u32::from(self.tag.is_some()),
        )
    }

    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if &element.name != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self
            .classes
            .iter()
            .all(|class| element.classes().any(|c| c == class))
        {
            return false;
        }
        self.attrs.iter().all(|attr| match (&attr.value, element.attr(&attr.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => expected == actual,
        })
    }
}

/// A parsed complex selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Compounds left to right; each carries the combinator linking it to
    /// the previous one (ignored for the first).
    parts: Vec<(Combinator, Compound)>,
}

impl Selector {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let mut parts = Vec::new();
        let mut pending = Combinator::Descendant;
        let mut current = String::new();
        let mut in_brackets = false;

        let mut flush = |current: &mut String, pending: &mut Combinator| -> Option<()> {
            if !current.is_empty() {
                parts.push((*pending, Compound::parse(current)?));
                current.clear();
                *pending = Combinator::Descendant;
            }
            Some(())
        };

        for c in text.chars() {
            match c {
                '[' => {
                    in_brackets = true;
                    current.push(c);
                }
                ']' => {
                    in_brackets = false;
                    current.push(c);
                }
                _ if in_brackets => current.push(c),
                c if c.is_whitespace() => flush(&mut current, &mut pending)?,
                '>' => {
                    flush(&mut current, &mut pending)?;
                    pending = Combinator::Child;
                }
                '+' | '~' | ':' | ',' => return None,
                _ => current.push(c),
            }
        }
        flush(&mut current, &mut pending)?;

        if parts.is_empty() {
            return None;
        }
        Some(Self { parts })
    }

    pub fn specificity(&self) -> Specificity {
        self.parts
            .iter()
            .map(|(_, compound)| compound.specificity())
            .fold(Specificity::default(), |acc, s| {
                Specificity(acc.0 + s.0, acc.1 + s.1, acc.2 + s.2)
            })
    }

    /// Match `element`, whose open ancestors are `ancestors` (outermost
    /// first).
    pub fn matches(&self, element: &Element, ancestors: &[Element]) -> bool {
        self.matches_at(self.parts.len() - 1, element, ancestors)
    }

    fn matches_at(&self, idx: usize, element: &Element, ancestors: &[Element]) -> bool {
        let (combinator, compound) = &self.parts[idx];
        if !compound.matches(element) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => match ancestors.split_last() {
                Some((parent, rest)) => self.matches_at(idx - 1, parent, rest),
                None => false,
            },
            Combinator::Descendant => {
                let mut rest = ancestors;
                while let Some((ancestor, above)) = rest.split_last() {
                    if self.matches_at(idx - 1, ancestor, above) {
                        return true;
                    }
                    rest = above;
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(name: &str, attrs: &[(&str, &str)]) -> Element {
        let mut element = Element::new(name);
        for (k, v) in attrs {
            element.set_attr(k, *v);
        }
        element
    }

    #[test]
    fn parses_compound_and_computes_specificity() {
        let selector = Selector::parse("table#root.sig-root[role=presentation]").unwrap();
        assert_eq!(selector.specificity(), Specificity(1, 2, 1));
    }

    #[test]
    fn pseudo_classes_and_siblings_are_unsupported() {
        assert!(Selector::parse("a:hover").is_none());
        assert!(Selector::parse("td + td").is_none());
        assert!(Selector::parse("").is_none());
    }

    #[test]
    fn descendant_matches_any_ancestor() {
        let selector = Selector::parse(".sig-root td").unwrap();
        let ancestors = vec![
            el("table", &[("class", "sig-root sig-sales")]),
            el("tr", &[]),
        ];
        assert!(selector.matches(&el("td", &[]), &ancestors));
        assert!(!selector.matches(&el("td", &[]), &ancestors[1..]));
    }

    #[test]
    fn child_requires_direct_parent() {
        let selector = Selector::parse("tr > td").unwrap();
        let tr = el("tr", &[]);
        let table = el("table", &[]);
        assert!(selector.matches(&el("td", &[]), &[table.clone(), tr]));
        assert!(!selector.matches(&el("td", &[]), &[table]));
    }

    #[test]
    fn attribute_selectors_compare_values() {
        let selector = Selector::parse("a[data-platform=\"linkedin\"]").unwrap();
        assert!(selector.matches(&el("a", &[("data-platform", "linkedin")]), &[]));
        assert!(!selector.matches(&el("a", &[("data-platform", "twitter")]), &[]));

        let presence = Selector::parse("[href]").unwrap();
        assert!(presence.matches(&el("a", &[("href", "x")]), &[]));
        assert!(!presence.matches(&el("a", &[]), &[]));
    }

    #[test]
    fn universal_selector_matches_everything_without_specificity() {
        let selector = Selector::parse("*").unwrap();
        assert_eq!(selector.specificity(), Specificity(0, 0, 0));
        assert!(selector.matches(&el("div", &[]), &[]));
    }
}
