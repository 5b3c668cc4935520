//! The signature export pipeline.
//!
//! Turns a [`Signature`](sigcraft_core::signature::Signature) into
//! self-contained, email-client-safe HTML: layout generation, CSS
//! inlining, single-table extraction and validation, MJML compilation,
//! and frame baking for animated elements. [`export::Exporter`] is the
//! entry point.

pub mod assets;
pub mod bake;
pub mod error;
pub mod export;
pub mod html;
pub mod inline;
pub mod markup;
pub mod raster;
pub mod table;
pub mod templates;

pub use error::ExportError;
pub use export::{EmailClient, ExportConfig, ExportOutput, ExportStrategy, Exporter, InlineExport, MarkupExport};
