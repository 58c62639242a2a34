//! Bounded-memory accounting for decoded tile content.

mod content;

pub use content::{ContentCache, DEFAULT_CONTENT_BUDGET};
