//! usfm-core - Remove word alignment from USFM scripture text
//!
//! Core library for usfm-strip. Aligned USFM wraps every translated word in
//! `\w ...\w*` and groups words under `\zaln-s ... \zaln-e\*` milestones that
//! point at the source-language text. This crate parses such a document,
//! replaces the alignment markup with plain text (rebuilding the spaces
//! between words), and writes the document back out with its headers,
//! chapters, verses and all other markers intact.
//!
//! # Example
//!
//! ```
//! use usfm_core::remove_alignment_markup;
//!
//! let aligned = "\\id GEN\n\\c 1\n\\v 1 \\zaln-s |x-strong=\"b:H7225\"\\*\\w In|x-occurrence=\"1\"\\w*\n\\w the|x-occurrence=\"1\"\\w*\n\\w beginning|x-occurrence=\"1\"\\w*\\zaln-e\\*,";
//!
//! let plain = remove_alignment_markup(aligned)?;
//! assert_eq!(plain, "\\id GEN\n\n\\c 1\n\\v 1 In the beginning,");
//! # Ok::<(), usfm_core::UsfmError>(())
//! ```

pub mod assemble;
pub mod error;
pub mod flatten;
pub mod ordering;
pub mod parser;
pub mod writer;

use tracing::debug;

// Re-export main types and functions
pub use assemble::{render_chapter, render_document, render_verse, try_render_verse};
pub use error::{Result, UsfmError};
pub use flatten::{
    extract_milestone_text, flatten, flatten_verse, has_alignment_markup, strip_document, Spacing,
};
pub use ordering::{compare_keys, sorted_keys};
pub use parser::parse;
pub use writer::{to_usfm, to_usfm_with_config, UsfmWriter, WriterConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse a USFM document, remove its alignment markup and write it back.
///
/// # Errors
///
/// Returns [`UsfmError::Parse`] if the input is not well-formed; no partial
/// output is produced. A single verse that cannot be written back does not
/// fail the document, it renders as empty text.
pub fn remove_alignment_markup(text: &str) -> Result<String> {
    let doc = parse(text)?;
    let aligned = has_alignment_markup(&doc);
    let stripped = strip_document(doc);
    debug!(
        aligned,
        chapters = stripped.chapter_count(),
        verses = stripped.verse_count(),
        "removed alignment markup"
    );
    Ok(render_document(&stripped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }

    #[test]
    fn test_parse_error_aborts() {
        let result = remove_alignment_markup("\\id GEN\n\\c\n");
        assert!(matches!(result, Err(UsfmError::Parse { .. })));
    }
}
