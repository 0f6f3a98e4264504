//! usfm-ast - Document tree definitions
//!
//! This crate provides the types used to represent a parsed USFM document:
//! header entries, chapters keyed by chapter number, verses keyed by verse
//! number, and the inline content tree of each verse.

pub mod document;
pub mod node;

pub use document::{Chapter, Document, HeaderEntry, TextTag, VerseContent, FRONT_KEY};
pub use node::{Attribute, ContentNode, Marker, Milestone, NodeKind, Word};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
