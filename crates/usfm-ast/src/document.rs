//! Document root, chapters and verses
//!
//! A [`Document`] holds the header lines that precede the first chapter and a
//! map of chapters. Chapter and verse keys are kept as strings because they
//! are not always numbers: `"front"` holds content before the first numbered
//! chapter or verse, and verse keys may be ranges such as `"3-4"`.
//!
//! Map iteration order is *not* the canonical output order; writers sort the
//! keys themselves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::node::{ContentNode, NodeKind};

/// Key of the pseudo-chapter / pseudo-verse holding front matter
pub const FRONT_KEY: &str = "front";

/// A line in the document header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderEntry {
    /// A marker line such as `\id GEN` or `\toc1 Genesis`
    Marker {
        tag: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    /// A raw line without a marker
    Text {
        #[serde(rename = "type")]
        kind: TextTag,
        text: String,
    },
}

/// Serialized discriminator of [`HeaderEntry::Text`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTag {
    Text,
}

impl HeaderEntry {
    pub fn marker(tag: impl Into<String>, content: impl Into<String>) -> Self {
        HeaderEntry::Marker {
            tag: tag.into(),
            content: Some(content.into()),
        }
    }

    pub fn bare_marker(tag: impl Into<String>) -> Self {
        HeaderEntry::Marker {
            tag: tag.into(),
            content: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        HeaderEntry::Text {
            kind: TextTag::Text,
            text: text.into(),
        }
    }
}

/// The content of one verse, normalized to a sequence of nodes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VerseContent {
    #[serde(rename = "verseObjects")]
    pub objects: Vec<ContentNode>,
}

impl VerseContent {
    pub fn new(objects: Vec<ContentNode>) -> Self {
        Self { objects }
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl From<Vec<ContentNode>> for VerseContent {
    fn from(objects: Vec<ContentNode>) -> Self {
        Self { objects }
    }
}

impl From<ContentNode> for VerseContent {
    fn from(node: ContentNode) -> Self {
        Self {
            objects: vec![node],
        }
    }
}

/// A chapter: verse key -> verse content
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chapter {
    pub verses: BTreeMap<String, VerseContent>,
}

impl Chapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a verse
    pub fn insert(&mut self, key: impl Into<String>, content: impl Into<VerseContent>) {
        self.verses.insert(key.into(), content.into());
    }

    pub fn get(&self, key: &str) -> Option<&VerseContent> {
        self.verses.get(key)
    }

    /// Content before the first numbered verse
    pub fn front(&self) -> Option<&VerseContent> {
        self.verses.get(FRONT_KEY)
    }

    /// Number of verses, not counting the front pseudo-verse
    pub fn verse_count(&self) -> usize {
        self.verses.keys().filter(|key| *key != FRONT_KEY).count()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }
}

/// A complete USFM document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Document {
    pub headers: Vec<HeaderEntry>,
    pub chapters: BTreeMap<String, Chapter>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header entry
    pub fn push_header(&mut self, header: HeaderEntry) {
        self.headers.push(header);
    }

    /// Get or create a chapter
    pub fn chapter_mut(&mut self, key: impl Into<String>) -> &mut Chapter {
        self.chapters.entry(key.into()).or_default()
    }

    pub fn chapter(&self, key: &str) -> Option<&Chapter> {
        self.chapters.get(key)
    }

    /// Number of chapters, not counting the front pseudo-chapter
    pub fn chapter_count(&self) -> usize {
        self.chapters.keys().filter(|key| *key != FRONT_KEY).count()
    }

    /// Number of numbered verses across all chapters
    pub fn verse_count(&self) -> usize {
        self.chapters.values().map(Chapter::verse_count).sum()
    }

    /// Number of nodes of `kind` in every verse, front matter included
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.chapters
            .values()
            .flat_map(|chapter| chapter.verses.values())
            .flat_map(|verse| verse.objects.iter())
            .map(|node| node.count_kind(kind))
            .sum()
    }
}
