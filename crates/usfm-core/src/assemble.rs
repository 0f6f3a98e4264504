//! Chapter and document reassembly
//!
//! Turns flattened chapters back into USFM text. Each verse body is produced
//! by the generic [`crate::writer`] on a one-verse document and then cut out
//! of the result after its `\v 1` marker; the chapter and document framing
//! (`\c`, `\v`, front matter, key order) is laid out here.

use tracing::warn;
use usfm_ast::{Chapter, ContentNode, Document, FRONT_KEY};

use crate::error::{Result, UsfmError};
use crate::ordering::sorted_keys;
use crate::writer::{header_line, UsfmWriter, WriterConfig};

const SYNTHETIC_VERSE_MARKER: &str = "\\v 1";

/// Write a verse body, failing if the writer output has no verse marker
pub fn try_render_verse(verse: &str, objects: &[ContentNode]) -> Result<String> {
    let mut doc = Document::new();
    doc.chapter_mut("1").insert("1", objects.to_vec());

    let usfm = UsfmWriter::with_config(WriterConfig {
        include_headers: false,
        ..Default::default()
    })
    .write(&doc);

    match usfm.split_once(SYNTHETIC_VERSE_MARKER) {
        Some((_, body)) => Ok(body.strip_prefix(' ').unwrap_or(body).to_string()),
        None => Err(UsfmError::Conversion {
            verse: verse.to_string(),
        }),
    }
}

/// Write a verse body; a verse that cannot be converted renders as empty
pub fn render_verse(verse: &str, objects: &[ContentNode]) -> String {
    try_render_verse(verse, objects).unwrap_or_else(|err| {
        warn!(verse, error = %err, "dropping verse content");
        String::new()
    })
}

/// Write a chapter body: front matter, then `\v <key> ...` in key order
pub fn render_chapter(chapter: &Chapter) -> String {
    let mut output = String::new();

    if let Some(front) = chapter.front() {
        output.push_str(&render_verse(FRONT_KEY, &front.objects));
    }

    for key in sorted_keys(chapter.verses.keys()) {
        if key == FRONT_KEY {
            continue;
        }
        if !output.is_empty() && !output.ends_with('\n') {
            output.push(' ');
        }
        output.push_str("\\v ");
        output.push_str(key);
        output.push(' ');
        output.push_str(&render_verse(key, &chapter.verses[key].objects));
    }

    output
}

/// Write the whole document: headers, front chapter, then `\c <key>` chapters
pub fn render_document(doc: &Document) -> String {
    let mut output: String = doc.headers.iter().map(header_line).collect();

    if let Some(front) = doc.chapters.get(FRONT_KEY) {
        output.push_str(&render_chapter(front));
    }

    for key in sorted_keys(doc.chapters.keys()) {
        if key == FRONT_KEY {
            continue;
        }
        output.push_str("\n\\c ");
        output.push_str(key);
        output.push('\n');
        output.push_str(&render_chapter(&doc.chapters[key]));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use usfm_ast::{HeaderEntry, Marker};

    #[test]
    fn test_render_verse_strips_synthetic_marker() {
        let body = render_verse("1", &[ContentNode::text("In the beginning")]);
        assert_eq!(body, "In the beginning");
    }

    #[test]
    fn test_render_verse_keeps_extra_leading_space() {
        let body = render_verse("1", &[ContentNode::text("  indented")]);
        assert_eq!(body, "  indented");
    }

    #[test]
    fn test_render_empty_verse() {
        assert_eq!(render_verse("7", &[]), "");
        assert!(try_render_verse("7", &[]).is_ok());
    }

    #[test]
    fn test_render_chapter_order() {
        let mut chapter = Chapter::new();
        for key in ["10", "2", "front", "3-4"] {
            chapter.insert(key, vec![ContentNode::text(format!("<{key}>"))]);
        }
        assert_eq!(
            render_chapter(&chapter),
            "<front> \\v 2 <2> \\v 3-4 <3-4> \\v 10 <10>"
        );
    }

    #[test]
    fn test_render_chapter_no_space_after_newline() {
        let mut chapter = Chapter::new();
        chapter.insert(
            FRONT_KEY,
            vec![ContentNode::Other(Marker::new("p").with_next_char("\n"))],
        );
        chapter.insert("1", vec![ContentNode::text("In")]);
        assert_eq!(render_chapter(&chapter), "\\p\n\\v 1 In");
    }

    #[test]
    fn test_render_document_layout() {
        let mut doc = Document::new();
        doc.push_header(HeaderEntry::marker("id", "GEN"));
        doc.push_header(HeaderEntry::marker("ts", "\\*"));
        doc.chapter_mut("2").insert("1", vec![ContentNode::text("two")]);
        doc.chapter_mut("1").insert("1", vec![ContentNode::text("one")]);
        doc.chapter_mut(FRONT_KEY)
            .insert(FRONT_KEY, vec![ContentNode::text("intro")]);

        assert_eq!(
            render_document(&doc),
            "\\id GEN\n\\ts\\*\nintro\n\\c 1\n\\v 1 one\n\\c 2\n\\v 1 two"
        );
    }
}
