//! Small helpers shared across the crate.

pub mod html;

pub use html::escape_html;
