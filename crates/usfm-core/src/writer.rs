//! USFM Writer
//!
//! This module converts a `usfm_ast::Document` back into USFM text. It is the
//! generic counterpart of [`crate::parser`]: every node shape the parser
//! produces, alignment markup included, is written back.
//!
//! # Example
//!
//! ```
//! use usfm_ast::{ContentNode, Document, HeaderEntry};
//! use usfm_core::to_usfm;
//!
//! let mut doc = Document::new();
//! doc.push_header(HeaderEntry::marker("id", "GEN"));
//! doc.chapter_mut("1").insert("1", vec![ContentNode::word("In")]);
//!
//! let usfm = to_usfm(&doc);
//! assert_eq!(usfm, "\\id GEN\n\\c 1\n\\v 1 \\w In\\w*");
//! ```

use usfm_ast::{Attribute, ContentNode, Document, HeaderEntry, Marker, FRONT_KEY};

use crate::ordering::sorted_keys;

/// Paragraph-level markers that start on their own line
const PARAGRAPH_TAGS: &[&str] = &[
    "p", "m", "po", "pr", "cls", "pmo", "pm", "pmc", "pmr", "pi", "mi", "nb", "pc", "ph", "b",
    "q", "qr", "qc", "qa", "qm", "qd", "lh", "li", "lf", "lim", "d", "s", "ms", "mr", "r", "sr",
    "sp", "cl", "cd", "mt", "mte", "rem", "tr",
];

fn is_paragraph_tag(tag: &str) -> bool {
    let base = tag.trim_end_matches(|c: char| c.is_ascii_digit());
    PARAGRAPH_TAGS.contains(&base)
}

/// USFM writer configuration
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Whether to write the header lines
    pub include_headers: bool,
    /// Whether paragraph markers are forced onto a new line
    pub forced_new_lines: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            include_headers: true,
            forced_new_lines: true,
        }
    }
}

/// USFM writer
pub struct UsfmWriter {
    config: WriterConfig,
    output: String,
    /// Set after a bare marker that would run into following text
    open_marker: bool,
}

impl UsfmWriter {
    /// Create a new writer with default configuration
    pub fn new() -> Self {
        Self::with_config(WriterConfig::default())
    }

    /// Create a writer with custom configuration
    pub fn with_config(config: WriterConfig) -> Self {
        Self {
            config,
            output: String::new(),
            open_marker: false,
        }
    }

    /// Write a document as USFM
    pub fn write(&mut self, doc: &Document) -> String {
        self.output.clear();
        self.open_marker = false;

        if self.config.include_headers {
            for header in &doc.headers {
                self.output.push_str(&header_line(header));
            }
        }

        if let Some(front) = doc.chapters.get(FRONT_KEY) {
            self.write_verses(front);
        }
        for key in sorted_keys(doc.chapters.keys()) {
            if key == FRONT_KEY {
                continue;
            }
            self.start_line();
            self.output.push_str("\\c ");
            self.output.push_str(key);
            self.output.push('\n');
            self.write_verses(&doc.chapters[key]);
        }

        std::mem::take(&mut self.output)
    }

    fn start_line(&mut self) {
        if !self.output.is_empty() && !self.output.ends_with('\n') {
            self.output.push('\n');
        }
        self.open_marker = false;
    }

    fn write_verses(&mut self, chapter: &usfm_ast::Chapter) {
        if let Some(front) = chapter.front() {
            self.write_nodes(&front.objects, true);
        }
        for key in sorted_keys(chapter.verses.keys()) {
            if key == FRONT_KEY {
                continue;
            }
            if !self.output.is_empty() && !self.output.ends_with(['\n', ' ']) {
                self.output.push(' ');
            }
            self.output.push_str("\\v ");
            self.output.push_str(key);
            self.output.push(' ');
            self.open_marker = false;
            self.write_nodes(&chapter.verses[key].objects, true);
        }
    }

    fn write_nodes(&mut self, nodes: &[ContentNode], at_verse_start: bool) {
        for (i, node) in nodes.iter().enumerate() {
            self.write_node(node, at_verse_start && i == 0);
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.open_marker && !text.is_empty() && !text.starts_with(char::is_whitespace) {
            self.output.push(' ');
        }
        self.output.push_str(text);
        self.open_marker = false;
    }

    fn push_marker(&mut self, marker: &str) {
        self.output.push('\\');
        self.output.push_str(marker);
        self.open_marker = false;
    }

    fn write_node(&mut self, node: &ContentNode, first_in_verse: bool) {
        match node {
            ContentNode::Text { text } => self.push_text(text),
            ContentNode::Word(word) => {
                self.push_marker(&word.tag);
                self.output.push(' ');
                self.output.push_str(&word.text);
                if !word.attributes.is_empty() {
                    self.output.push('|');
                    self.output.push_str(&attribute_list(&word.attributes));
                }
                self.push_marker(&format!("{}*", word.tag));
            }
            ContentNode::Milestone(milestone) => {
                self.push_marker(&format!("{}-s", milestone.tag));
                if !milestone.attributes.is_empty() {
                    self.output.push_str(" |");
                    self.output.push_str(&attribute_list(&milestone.attributes));
                }
                self.push_marker("*");
                self.write_nodes(&milestone.children, false);
                self.push_marker(&format!("{}-e", milestone.tag));
                self.push_marker("*");
            }
            ContentNode::Other(marker) => self.write_marker(marker, first_in_verse),
        }
    }

    fn write_marker(&mut self, marker: &Marker, first_in_verse: bool) {
        if self.config.forced_new_lines
            && is_paragraph_tag(&marker.tag)
            && !first_in_verse
            && !self.output.is_empty()
            && !self.output.ends_with('\n')
        {
            self.output.push('\n');
        }

        self.push_marker(&marker.tag);
        if !marker.attributes.is_empty() {
            self.output.push_str(" |");
            self.output.push_str(&attribute_list(&marker.attributes));
        }

        match (&marker.content, &marker.end_marker) {
            // Note: `\f + \ft ...\f*`
            (Some(content), Some(end)) => {
                self.output.push(' ');
                self.output.push_str(content);
                self.push_marker(end);
            }
            // Self-closing: `\ts\*`
            (None, Some(end)) if end == "*" && marker.children.is_empty() => {
                self.push_marker(end);
            }
            // Character span: `\add ...\add*`
            (None, Some(end)) => {
                self.output.push(' ');
                if let Some(text) = &marker.text {
                    self.output.push_str(text);
                }
                self.write_nodes(&marker.children, false);
                self.push_marker(end);
            }
            (content, None) => {
                let owned = content.as_deref().or(marker.text.as_deref());
                match (&marker.next_char, owned) {
                    (Some(next), Some(text)) => {
                        self.output.push_str(next);
                        self.output.push_str(text);
                    }
                    (None, Some(text)) => {
                        self.output.push(' ');
                        self.output.push_str(text);
                    }
                    (Some(next), None) => self.output.push_str(next),
                    (None, None) => self.open_marker = !marker.tag.ends_with('*'),
                }
                self.write_nodes(&marker.children, false);
            }
        }
    }
}

impl Default for UsfmWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Header line as written before the first chapter
///
/// A marker whose content is the literal `\*` is written without a space.
/// A marker without content is written as a bare `\tag` line instead of
/// being dropped, so chunk markers such as `\s5` survive a round trip.
pub fn header_line(header: &HeaderEntry) -> String {
    match header {
        HeaderEntry::Text { text, .. } => format!("{text}\n"),
        HeaderEntry::Marker { tag, content: None } => format!("\\{tag}\n"),
        HeaderEntry::Marker {
            tag,
            content: Some(content),
        } => {
            let separator = if content == "\\*" { "" } else { " " };
            format!("\\{tag}{separator}{content}\n")
        }
    }
}

fn attribute_list(attributes: &[Attribute]) -> String {
    attributes
        .iter()
        .map(|attr| format!("{}=\"{}\"", attr.key, attr.value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Write a document as USFM with the default configuration
pub fn to_usfm(doc: &Document) -> String {
    UsfmWriter::new().write(doc)
}

/// Write a document as USFM with a custom configuration
pub fn to_usfm_with_config(doc: &Document, config: WriterConfig) -> String {
    UsfmWriter::with_config(config).write(doc)
}
