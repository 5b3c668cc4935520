//! Stylesheet parsing: plain style rules only.
//!
//! At-rules (`@media`, `@keyframes`, `@import`, ...) are dropped whole;
//! selectors the inliner cannot match are skipped without failing the
//! rest of their rule list.

use super::selector::{Selector, Specificity};
use crate::html::{parse_declarations, split_top_level, Declaration};

/// One selector with its declarations. A selector list produces one rule
/// per selector, all sharing the same source `order`.
#[derive(Debug, Clone)]
pub struct Rule {
    pub selector: Selector,
    pub specificity: Specificity,
    pub declarations: Vec<Declaration>,
    pub order: usize,
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Byte offset just past the `}` matching the `{` at `open`.
fn block_end(css: &str, open: usize) -> usize {
    let mut depth = 0usize;
    for (idx, c) in css[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return open + idx + 1;
                }
            }
            _ => {}
        }
    }
    css.len()
}

pub fn parse_stylesheet(css: &str) -> Vec<Rule> {
    let css = strip_comments(css);
    let mut rules = Vec::new();
    let mut pos = 0;
    let mut order = 0;

    while pos < css.len() {
        let rest = &css[pos..];
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        pos += rest.len() - trimmed.len();

        let Some(brace) = css[pos..].find('{').map(|i| pos + i) else {
            break;
        };

        if trimmed.starts_with('@') {
            // Statement at-rules end at `;` before any block.
            if let Some(semi) = css[pos..brace].find(';') {
                pos += semi + 1;
                continue;
            }
            pos = block_end(&css, brace);
            continue;
        }

        let prelude = &css[pos..brace];
        let end = block_end(&css, brace);
        let body_end = end.saturating_sub(1).max(brace + 1);
        let declarations = parse_declarations(&css[brace + 1..body_end]);
        pos = end;

        if declarations.is_empty() {
            continue;
        }
        for text in split_top_level(prelude, ',') {
            match Selector::parse(text) {
                Some(selector) => rules.push(Rule {
                    specificity: selector.specificity(),
                    selector,
                    declarations: declarations.clone(),
                    order,
                }),
                None => tracing::trace!(selector = text.trim(), "Skipping unsupported selector"),
            }
        }
        order += 1;
    }

    rules
}
