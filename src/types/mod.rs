//! Validated setting values.
//!
//! Newtype wrappers that enforce constraints on settings at
//! deserialization time, so the normalizer only ever merges valid values.

mod indent_size;
mod line_width;

pub use indent_size::{IndentSize, IndentSizeError, IndentToken};
pub use line_width::LineWidth;
