//! Domain model and pure logic for signature export.
//!
//! Everything in this crate is free of I/O: the signature record, image
//! reference resolution, and the animation easing curves used by the
//! frame renderer.

pub mod animation;
pub mod error;
pub mod images;
pub mod signature;
pub mod types;
