//! Inline content nodes of a verse
//!
//! A verse is an ordered sequence of [`ContentNode`]s. Alignment markup shows
//! up as [`ContentNode::Word`] (`\w ...\w*`) and [`ContentNode::Milestone`]
//! (`\zaln-s ...\* ... \zaln-e\*`); everything else is plain text or some
//! other marker that is carried through untouched.

use serde::{Deserialize, Serialize};

/// The four node shapes found in a verse tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Word,
    Milestone,
    Text,
    Other,
}

/// A `key="value"` attribute attached to a word or milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An aligned word: `\w text|x-occurrence="1"\w*`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// Marker name, `w` or `+w` when nested inside a character span
    pub tag: String,
    /// The word as it appears in the translation
    pub text: String,
    /// Alignment attributes (occurrence, lemma, strong, ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
}

impl Word {
    /// Create a plain `\w` word without attributes
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            tag: "w".to_string(),
            text: text.into(),
            attributes: Vec::new(),
        }
    }
}

/// An alignment milestone spanning its descendants: `\zaln-s |...\*`..`\zaln-e\*`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Marker name without the `-s`/`-e` suffix (e.g. `zaln`)
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    pub children: Vec<ContentNode>,
}

impl Milestone {
    pub fn new(tag: impl Into<String>, children: Vec<ContentNode>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children,
        }
    }
}

/// Any marker that is not alignment markup
///
/// Covers paragraph and poetry markers (`\p`, `\q1`), section headings
/// (`\s1 Title`), notes (`\f + \ft ...\f*`), character spans
/// (`\add ...\add*`) and standalone milestones (`\ts\*`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Marker {
    /// Marker name without the leading backslash
    pub tag: String,
    /// Literal text owned by the marker itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Raw content kept verbatim (note bodies, heading text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    /// Nested nodes of a character span
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ContentNode>,
    /// Closing marker without the backslash (`add*`, or `*` for `\ts\*`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_marker: Option<String>,
    /// Whitespace written right after the marker (`nextChar`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_char: Option<String>,
}

impl Marker {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set the whitespace that follows the marker
    pub fn with_next_char(mut self, next_char: impl Into<String>) -> Self {
        self.next_char = Some(next_char.into());
        self
    }

    /// Set the marker's own text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Turn the marker into a character span closed by `end_marker`
    pub fn with_children(mut self, children: Vec<ContentNode>, end_marker: impl Into<String>) -> Self {
        self.children = children;
        self.end_marker = Some(end_marker.into());
        self
    }
}

/// A node in a verse content tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentNode {
    Word(Word),
    Milestone(Milestone),
    Text { text: String },
    Other(Marker),
}

impl ContentNode {
    /// Shorthand for a plain text node
    pub fn text(text: impl Into<String>) -> Self {
        ContentNode::Text { text: text.into() }
    }

    /// Shorthand for an attribute-less `\w` word
    pub fn word(text: impl Into<String>) -> Self {
        ContentNode::Word(Word::new(text))
    }

    /// Shorthand for a `\zaln` milestone
    pub fn milestone(children: Vec<ContentNode>) -> Self {
        ContentNode::Milestone(Milestone::new("zaln", children))
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            ContentNode::Word(_) => NodeKind::Word,
            ContentNode::Milestone(_) => NodeKind::Milestone,
            ContentNode::Text { .. } => NodeKind::Text,
            ContentNode::Other(_) => NodeKind::Other,
        }
    }

    /// The node's own literal text, if any
    ///
    /// Milestones never have text of their own.
    pub fn literal_text(&self) -> Option<&str> {
        match self {
            ContentNode::Word(word) => Some(&word.text),
            ContentNode::Milestone(_) => None,
            ContentNode::Text { text } => Some(text),
            ContentNode::Other(marker) => marker.text.as_deref(),
        }
    }

    pub fn children(&self) -> &[ContentNode] {
        match self {
            ContentNode::Milestone(milestone) => &milestone.children,
            ContentNode::Other(marker) => &marker.children,
            ContentNode::Word(_) | ContentNode::Text { .. } => &[],
        }
    }

    /// Whether this node directly abuts the following sibling
    pub fn attaches_to_next(&self) -> bool {
        match self {
            ContentNode::Other(marker) => marker
                .next_char
                .as_deref()
                .is_some_and(|next| !next.is_empty()),
            _ => false,
        }
    }

    /// Number of nodes of `kind` in this subtree, the node itself included
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        let own = usize::from(self.kind() == kind);
        own + self
            .children()
            .iter()
            .map(|child| child.count_kind(kind))
            .sum::<usize>()
    }

    /// Whether this node or any descendant is alignment markup
    pub fn has_alignment(&self) -> bool {
        match self {
            ContentNode::Word(_) | ContentNode::Milestone(_) => true,
            ContentNode::Text { .. } => false,
            ContentNode::Other(marker) => marker.children.iter().any(ContentNode::has_alignment),
        }
    }
}
