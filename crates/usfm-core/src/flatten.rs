//! Alignment removal
//!
//! Rewrites a verse content tree so that every aligned word (`\w ...\w*`) and
//! every alignment milestone (`\zaln-s ... \zaln-e\*`) becomes a plain text
//! node. The spacing between words is not stored in aligned USFM, so it is
//! rebuilt while walking the tree: each step receives the [`Spacing`] to put
//! in front of the next word and hands back the spacing for its successor.
//!
//! Nodes are taken by value and rebuilt, so a flattened tree never shares
//! anything with the tree it came from.

use usfm_ast::{ContentNode, Document, VerseContent};

/// Punctuation that is always followed by a space before the next word
const SPACED_PUNCTUATION: [char; 4] = [',', '.', '?', ';'];

/// Spacing to put in front of the next word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spacing {
    /// The next word abuts whatever came before
    #[default]
    None,
    /// The next word is preceded by a single space
    Space,
}

impl Spacing {
    pub fn as_str(self) -> &'static str {
        match self {
            Spacing::None => "",
            Spacing::Space => " ",
        }
    }
}

fn ends_with_spaced_punctuation(text: &str) -> bool {
    text.ends_with(SPACED_PUNCTUATION)
}

/// Concatenate the words inside a milestone, space-joined
///
/// Nested milestones contribute their own words recursively. Any other child
/// with text is appended as-is; unless the text so far ends in `, . ? ;` the
/// next word then follows without a space.
pub fn extract_milestone_text(node: &ContentNode) -> String {
    let mut text = node.literal_text().unwrap_or_default().to_string();
    let mut spacing = Spacing::None;

    for child in node.children() {
        match child {
            ContentNode::Word(word) => {
                text.push_str(spacing.as_str());
                text.push_str(&word.text);
                spacing = Spacing::Space;
            }
            ContentNode::Milestone(_) => {
                text.push_str(spacing.as_str());
                text.push_str(&extract_milestone_text(child));
                spacing = Spacing::Space;
            }
            ContentNode::Text { .. } | ContentNode::Other(_) => {
                if let Some(child_text) = child.literal_text().filter(|t| !t.is_empty()) {
                    text.push_str(child_text);
                    if !ends_with_spaced_punctuation(&text) {
                        spacing = Spacing::None;
                    }
                }
            }
        }
    }
    text
}

/// Replace one node, given the spacing left by its preceding sibling
///
/// Words and milestones collapse to text nodes. Everything else keeps its
/// shape; only its descendants are flattened, with a spacing accumulator of
/// their own that starts empty.
pub fn flatten(node: ContentNode, incoming: Spacing) -> (ContentNode, Spacing) {
    match node {
        ContentNode::Word(word) => (
            ContentNode::text(format!("{}{}", incoming.as_str(), word.text)),
            Spacing::Space,
        ),
        ContentNode::Milestone(_) => (
            ContentNode::text(format!(
                "{}{}",
                incoming.as_str(),
                extract_milestone_text(&node)
            )),
            Spacing::Space,
        ),
        ContentNode::Text { .. } | ContentNode::Other(_) => {
            let outgoing = if node.attaches_to_next() {
                Spacing::None
            } else {
                match node.literal_text() {
                    Some(text) if !text.is_empty() && !ends_with_spaced_punctuation(text) => {
                        Spacing::None
                    }
                    _ => Spacing::Space,
                }
            };

            let node = match node {
                ContentNode::Other(mut marker) if !marker.children.is_empty() => {
                    marker.children = flatten_verse(std::mem::take(&mut marker.children));
                    ContentNode::Other(marker)
                }
                other => other,
            };
            (node, outgoing)
        }
    }
}

/// Flatten a verse's node sequence, threading spacing from node to node
pub fn flatten_verse(objects: Vec<ContentNode>) -> Vec<ContentNode> {
    let mut spacing = Spacing::None;
    let mut flattened = Vec::with_capacity(objects.len());
    for node in objects {
        let (node, next) = flatten(node, spacing);
        spacing = next;
        flattened.push(node);
    }
    flattened
}

/// Flatten every verse of every chapter, front matter included
pub fn strip_document(doc: Document) -> Document {
    let Document { headers, chapters } = doc;
    let chapters = chapters
        .into_iter()
        .map(|(key, mut chapter)| {
            chapter.verses = chapter
                .verses
                .into_iter()
                .map(|(verse, content)| (verse, VerseContent::new(flatten_verse(content.objects))))
                .collect();
            (key, chapter)
        })
        .collect();
    Document { headers, chapters }
}

/// Whether any verse still contains words or milestones
pub fn has_alignment_markup(doc: &Document) -> bool {
    doc.chapters.values().any(|chapter| {
        chapter
            .verses
            .values()
            .any(|verse| verse.objects.iter().any(ContentNode::has_alignment))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use usfm_ast::Marker;

    fn texts(nodes: &[ContentNode]) -> String {
        nodes
            .iter()
            .filter_map(ContentNode::literal_text)
            .collect::<Vec<_>>()
            .concat()
    }

    #[test]
    fn test_words_are_space_joined() {
        let verse = vec![
            ContentNode::word("In"),
            ContentNode::word("the"),
            ContentNode::word("beginning"),
        ];
        let flattened = flatten_verse(verse);
        assert_eq!(texts(&flattened), "In the beginning");
        assert!(flattened
            .iter()
            .all(|node| matches!(node, ContentNode::Text { .. })));
    }

    #[test]
    fn test_punctuation_followed_by_single_space() {
        let verse = vec![
            ContentNode::word("beginning"),
            ContentNode::text(","),
            ContentNode::word("God"),
        ];
        assert_eq!(texts(&flatten_verse(verse)), "beginning, God");
    }

    #[test]
    fn test_text_with_own_space_is_not_doubled() {
        let verse = vec![
            ContentNode::word("beginning"),
            ContentNode::text(", "),
            ContentNode::word("God"),
        ];
        assert_eq!(texts(&flatten_verse(verse)), "beginning, God");
    }

    #[test]
    fn test_attaches_to_next_suppresses_space() {
        let verse = vec![
            ContentNode::Other(Marker::new("q1").with_next_char(" ")),
            ContentNode::word("Blessed"),
        ];
        let flattened = flatten_verse(verse);
        assert_eq!(flattened[1], ContentNode::text("Blessed"));
    }

    #[test]
    fn test_bare_marker_leaves_space_for_next_word() {
        let (_, spacing) = flatten(ContentNode::Other(Marker::new("nb")), Spacing::None);
        assert_eq!(spacing, Spacing::Space);
    }

    #[test]
    fn test_marker_text_ending_in_punctuation_keeps_space() {
        let verse = vec![
            ContentNode::Other(Marker::new("wj").with_text("said.")),
            ContentNode::word("Then"),
        ];
        assert_eq!(flatten_verse(verse)[1], ContentNode::text(" Then"));

        let verse = vec![
            ContentNode::Other(Marker::new("wj").with_text("said")),
            ContentNode::word("Then"),
        ];
        assert_eq!(flatten_verse(verse)[1], ContentNode::text("Then"));
    }

    #[test]
    fn test_nested_milestones() {
        let inner =
            ContentNode::milestone(vec![ContentNode::word("the"), ContentNode::word("LORD")]);
        let outer = ContentNode::milestone(vec![ContentNode::milestone(vec![inner])]);
        assert_eq!(extract_milestone_text(&outer), "the LORD");

        let (node, spacing) = flatten(outer, Spacing::Space);
        assert_eq!(node, ContentNode::text(" the LORD"));
        assert_eq!(spacing, Spacing::Space);
    }

    #[test]
    fn test_milestone_with_glue_text() {
        let milestone = ContentNode::milestone(vec![
            ContentNode::word("God"),
            ContentNode::text("'s"),
            ContentNode::word("word"),
        ]);
        assert_eq!(extract_milestone_text(&milestone), "God'sword");

        let milestone = ContentNode::milestone(vec![
            ContentNode::word("said"),
            ContentNode::text(";"),
            ContentNode::word("then"),
        ]);
        assert_eq!(extract_milestone_text(&milestone), "said; then");
    }

    #[test]
    fn test_span_children_flattened_with_local_spacing() {
        let span = ContentNode::Other(Marker::new("add").with_children(
            vec![ContentNode::word("was"), ContentNode::word("good")],
            "add*",
        ));
        let (node, spacing) = flatten(span, Spacing::Space);
        let ContentNode::Other(marker) = node else {
            panic!("Expected the span to keep its shape");
        };
        assert_eq!(marker.tag, "add");
        assert_eq!(texts(&marker.children), "was good");
        assert_eq!(spacing, Spacing::Space);
    }

    #[test]
    fn test_has_alignment_markup() {
        let mut doc = Document::new();
        doc.chapter_mut("1").insert("1", vec![ContentNode::word("In")]);
        assert!(has_alignment_markup(&doc));
        assert!(!has_alignment_markup(&strip_document(doc)));
    }
}
