//! MJML export path: build MJML per layout, then compile it to HTML.

mod builder;
mod compile;

pub use builder::build_mjml;
pub use compile::{compile_mjml, MarkupError};
