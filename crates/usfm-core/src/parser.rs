//! USFM Parser
//!
//! This module parses USFM text into a `usfm_ast::Document`.
//!
//! # Supported Syntax
//!
//! - Header markers before the first chapter: `\id GEN`, `\toc1 Genesis`, ...
//! - Chapters and verses: `\c 1`, `\v 1`, verse ranges `\v 3-4`
//! - Aligned words: `\w In|x-occurrence="1" x-occurrences="1"\w*`
//! - Alignment milestones: `\zaln-s |x-strong="H7225"\*` ... `\zaln-e\*`
//! - Notes kept verbatim: `\f + \ft ...\f*`, `\x ...\x*`
//! - Character spans: `\add ...\add*`, `\nd ...\nd*`
//! - Any other marker as a standalone node (`\p`, `\q1`, `\s1`, `\ts\*`)
//!
//! Content before the first `\v` of a chapter lands under the `"front"`
//! verse key; verses found before any `\c` land in the `"front"` chapter.
//!
//! # Example
//!
//! ```
//! use usfm_core::parser;
//!
//! let doc = parser::parse("\\id GEN\n\\c 1\n\\v 1 \\w In|x-occurrence=\"1\"\\w*")?;
//! assert_eq!(doc.chapter_count(), 1);
//! # Ok::<(), usfm_core::UsfmError>(())
//! ```

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};
use usfm_ast::{
    Attribute, Chapter, ContentNode, Document, HeaderEntry, Marker, Milestone, Word, FRONT_KEY,
};

use crate::error::{Result, UsfmError};
use crate::ordering::sorted_keys;

fn marker_re() -> &'static Regex {
    static MARKER_RE: OnceLock<Regex> = OnceLock::new();
    MARKER_RE.get_or_init(|| {
        Regex::new(r"\\(\+?[A-Za-z0-9][A-Za-z0-9_-]*)?(\*)?").expect("marker pattern is valid")
    })
}

fn attribute_re() -> &'static Regex {
    static ATTRIBUTE_RE: OnceLock<Regex> = OnceLock::new();
    ATTRIBUTE_RE.get_or_init(|| {
        Regex::new(r#"^\s*([A-Za-z0-9_:-]+)\s*=\s*"([^"]*)""#).expect("attribute pattern is valid")
    })
}

/// Markers whose body is kept as raw text up to their closing marker
const NOTE_TAGS: &[&str] = &["f", "fe", "x", "ef", "ex"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind<'a> {
    Text(&'a str),
    /// `\tag` or `\tag*`
    Marker { tag: &'a str, closing: bool },
    /// Bare `\*` ending a milestone or self-closing marker
    Close,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: TokenKind<'a>,
    start: usize,
    end: usize,
}

impl<'a> Token<'a> {
    fn text(text: &'a str, start: usize) -> Self {
        Self {
            kind: TokenKind::Text(text),
            start,
            end: start + text.len(),
        }
    }
}

/// Split the source into markers and the text runs between them
fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut text_start = 0;

    for caps in marker_re().captures_iter(source) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let kind = match (caps.get(1), caps.get(2).is_some()) {
            (Some(tag), closing) => TokenKind::Marker {
                tag: tag.as_str(),
                closing,
            },
            (None, true) => TokenKind::Close,
            // A lone backslash stays part of the surrounding text
            (None, false) => continue,
        };

        if whole.start() > text_start {
            tokens.push(Token::text(&source[text_start..whole.start()], text_start));
        }
        tokens.push(Token {
            kind,
            start: whole.start(),
            end: whole.end(),
        });
        text_start = whole.end();
    }

    if text_start < source.len() {
        tokens.push(Token::text(&source[text_start..], text_start));
    }
    tokens
}

fn line_at(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())].matches('\n').count() + 1
}

fn is_word_tag(tag: &str) -> bool {
    tag == "w" || tag == "+w"
}

fn is_milestone_tag(tag: &str) -> bool {
    tag.ends_with("-s") || tag.ends_with("-e")
}

/// Replace every whitespace run that contains a line break with one space
fn collapse_line_breaks(text: &str) -> String {
    if !text.contains('\n') {
        return text.to_string();
    }

    let mut collapsed = String::with_capacity(text.len());
    let mut run = String::new();
    for c in text.chars() {
        if c.is_whitespace() {
            run.push(c);
            continue;
        }
        push_run(&mut collapsed, &run);
        run.clear();
        collapsed.push(c);
    }
    push_run(&mut collapsed, &run);
    collapsed
}

fn push_run(out: &mut String, run: &str) {
    if run.contains('\n') {
        out.push(' ');
    } else {
        out.push_str(run);
    }
}

/// Parse an attribute list such as `x-occurrence="1" x-occurrences="2"`
///
/// A list without any `=` is a default attribute and is stored as `lemma`.
fn parse_attributes(raw: &str) -> std::result::Result<Vec<Attribute>, String> {
    let raw = raw.trim();
    let raw = raw.strip_prefix('|').unwrap_or(raw).trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if !raw.contains('=') {
        return Ok(vec![Attribute::new("lemma", raw)]);
    }

    let mut attributes = Vec::new();
    let mut rest = raw;
    while !rest.trim_start().is_empty() {
        let caps = attribute_re()
            .captures(rest)
            .ok_or_else(|| format!("malformed attribute list `{raw}`"))?;
        let (Some(whole), Some(key), Some(value)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            return Err(format!("malformed attribute list `{raw}`"));
        };
        attributes.push(Attribute::new(key.as_str(), value.as_str()));
        rest = &rest[whole.end()..];
    }
    Ok(attributes)
}

/// Where a nested `parse_nodes` call stops
#[derive(Debug, Clone, Copy)]
enum Until<'a> {
    End,
    Span { tag: &'a str, opened_at: usize },
    MilestoneEnd { tag: &'a str, opened_at: usize },
}

/// Which side of a milestone a crossing span marker moves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

/// Builds the content tree of a single verse
struct InlineParser<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    /// Spans and milestones currently being parsed, innermost last
    enclosing: Vec<Until<'a>>,
}

impl<'a> InlineParser<'a> {
    fn new(source: &'a str, tokens: Vec<Token<'a>>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            enclosing: Vec::new(),
        }
    }

    fn peek_kind(&self) -> Option<TokenKind<'a>> {
        self.tokens.get(self.pos).map(|token| token.kind)
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> UsfmError {
        UsfmError::parse(line_at(self.source, offset), message)
    }

    fn parse_nodes(&mut self, until: Until<'a>) -> Result<Vec<ContentNode>> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.get(self.pos).copied() {
            match token.kind {
                TokenKind::Text(text) => {
                    self.pos += 1;
                    if text.is_empty() {
                        continue;
                    }
                    if self.between_alignment(self.pos - 1) {
                        if text.trim().is_empty() {
                            continue;
                        }
                        nodes.push(ContentNode::text(collapse_line_breaks(text)));
                    } else {
                        nodes.push(ContentNode::text(text));
                    }
                }
                TokenKind::Close => {
                    self.pos += 1;
                    nodes.push(ContentNode::Other(Marker::new("*")));
                }
                TokenKind::Marker { tag, closing: true } => {
                    if matches!(until, Until::Span { tag: open, .. } if open == tag) {
                        return Ok(nodes);
                    }
                    self.pos += 1;
                    nodes.push(ContentNode::Other(Marker::new(format!("{tag}*"))));
                }
                TokenKind::Marker { tag, closing: false } => {
                    if let Some(base) = tag.strip_suffix("-e") {
                        if matches!(until, Until::MilestoneEnd { tag: open, .. } if open == base) {
                            return Ok(nodes);
                        }
                    }
                    self.pos += 1;
                    if let Some(base) = tag.strip_suffix("-s") {
                        nodes.extend(self.parse_milestone(token, tag, base)?);
                        continue;
                    }
                    let node = if is_word_tag(tag) {
                        self.parse_word(token, tag)?
                    } else if tag.ends_with("-e") {
                        self.parse_unmatched_milestone_end(token, tag)?
                    } else if NOTE_TAGS.contains(&tag) {
                        self.parse_note(token, tag)?
                    } else {
                        self.parse_marker(token, tag)?
                    };
                    nodes.push(node);
                }
            }
        }

        match until {
            Until::End => Ok(nodes),
            Until::Span { tag, opened_at } => {
                Err(self.error_at(opened_at, format!("unterminated \\{tag} span")))
            }
            Until::MilestoneEnd { tag, opened_at } => {
                Err(self.error_at(opened_at, format!("unterminated \\{tag}-s milestone")))
            }
        }
    }

    fn parse_nested(&mut self, until: Until<'a>) -> Result<Vec<ContentNode>> {
        self.enclosing.push(until);
        let nodes = self.parse_nodes(until);
        self.enclosing.pop();
        nodes
    }

    /// Whether the token closes a span or milestone opened further out
    fn closes_enclosing(&self, kind: TokenKind<'a>) -> bool {
        self.enclosing.iter().any(|until| match (until, kind) {
            (Until::Span { tag: open, .. }, TokenKind::Marker { tag, closing: true }) => {
                *open == tag
            }
            (Until::MilestoneEnd { tag: open, .. }, TokenKind::Marker { tag, closing: false }) => {
                tag.strip_suffix("-e") == Some(*open)
            }
            _ => false,
        })
    }

    /// Whitespace between two pieces of alignment markup carries no content
    fn between_alignment(&self, index: usize) -> bool {
        index > 0
            && self.ends_alignment(index - 1)
            && self.tokens.get(index + 1).is_some_and(|next| {
                matches!(next.kind, TokenKind::Marker { tag, closing: false }
                    if is_word_tag(tag) || is_milestone_tag(tag))
            })
    }

    fn ends_alignment(&self, index: usize) -> bool {
        match self.tokens[index].kind {
            TokenKind::Marker { tag, closing: true } => is_word_tag(tag),
            TokenKind::Close => {
                // Look back past the attribute run to the milestone marker
                let mut back = index;
                while back > 0 {
                    back -= 1;
                    match self.tokens[back].kind {
                        TokenKind::Text(_) => continue,
                        TokenKind::Marker { tag, closing: false } => return is_milestone_tag(tag),
                        _ => return false,
                    }
                }
                false
            }
            _ => false,
        }
    }

    /// `\w text|attributes\w*`
    fn parse_word(&mut self, open: Token<'a>, tag: &str) -> Result<ContentNode> {
        let body = match self.peek_kind() {
            Some(TokenKind::Text(text)) => {
                self.pos += 1;
                text
            }
            _ => "",
        };

        match self.peek_kind() {
            Some(TokenKind::Marker {
                tag: close,
                closing: true,
            }) if is_word_tag(close) => self.pos += 1,
            _ => return Err(self.error_at(open.start, format!("unterminated \\{tag} word"))),
        }

        let (text, attributes) = match body.split_once('|') {
            Some((text, raw)) => {
                let attributes =
                    parse_attributes(raw).map_err(|message| self.error_at(open.start, message))?;
                (text, attributes)
            }
            None => (body, Vec::new()),
        };

        Ok(ContentNode::Word(Word {
            tag: tag.to_string(),
            text: text.trim().to_string(),
            attributes,
        }))
    }

    /// Attributes and the closing `\*` following a milestone marker
    fn take_milestone_attributes(&mut self, open: Token<'a>) -> Result<Option<Vec<Attribute>>> {
        match (self.peek_kind(), self.tokens.get(self.pos + 1).map(|t| t.kind)) {
            (Some(TokenKind::Close), _) => {
                self.pos += 1;
                Ok(Some(Vec::new()))
            }
            (Some(TokenKind::Text(raw)), Some(TokenKind::Close)) => {
                let attributes =
                    parse_attributes(raw).map_err(|message| self.error_at(open.start, message))?;
                self.pos += 2;
                Ok(Some(attributes))
            }
            _ => Ok(None),
        }
    }

    fn has_milestone_end(&self, from: usize, base: &str) -> bool {
        let mut depth = 0usize;
        for token in self.tokens.iter().skip(from) {
            if let TokenKind::Marker { tag, closing: false } = token.kind {
                if tag.strip_suffix("-s") == Some(base) {
                    depth += 1;
                } else if tag.strip_suffix("-e") == Some(base) {
                    if depth == 0 {
                        return true;
                    }
                    depth -= 1;
                }
            }
        }
        false
    }

    /// `\zaln-s |attributes\*` ... `\zaln-e\*`
    ///
    /// Character span markers that cross the milestone boundary are moved
    /// out of it: an opening marker goes in front of the milestone and a
    /// closing marker right after it.
    fn parse_milestone(
        &mut self,
        open: Token<'a>,
        tag: &'a str,
        base: &'a str,
    ) -> Result<Vec<ContentNode>> {
        let Some(attributes) = self.take_milestone_attributes(open)? else {
            return Err(self.error_at(
                open.start,
                format!("milestone \\{tag} is missing its closing \\*"),
            ));
        };

        if !self.has_milestone_end(self.pos, base) {
            debug!(tag, "milestone start without matching end, keeping it standalone");
            return Ok(vec![ContentNode::Other(Marker {
                tag: tag.to_string(),
                attributes,
                end_marker: Some("*".to_string()),
                ..Default::default()
            })]);
        }

        let children = self.parse_nested(Until::MilestoneEnd {
            tag: base,
            opened_at: open.start,
        })?;

        // parse_nodes stopped on the matching end marker
        let end = self.tokens[self.pos];
        self.pos += 1;
        self.take_milestone_attributes(end)?;

        let mut before = Vec::new();
        let mut inside = Vec::new();
        let mut after = Vec::new();
        for child in children {
            match self.crossing_side(&child) {
                Some(Side::Before) => before.push(child),
                Some(Side::After) => after.push(child),
                None => inside.push(child),
            }
        }

        before.push(ContentNode::Milestone(Milestone {
            tag: base.to_string(),
            attributes,
            children: inside,
        }));
        before.extend(after);
        Ok(before)
    }

    /// Where a milestone child belongs if it is half of a crossing span
    ///
    /// Called once the milestone end has been consumed.
    fn crossing_side(&self, child: &ContentNode) -> Option<Side> {
        let ContentNode::Other(marker) = child else {
            return None;
        };
        if !marker.children.is_empty() || marker.end_marker.is_some() || marker.content.is_some() {
            return None;
        }
        match marker.tag.strip_suffix('*') {
            Some(open) if !open.is_empty() => Some(Side::After),
            Some(_) => None,
            None => self.find_span_close(&marker.tag).map(|_| Side::Before),
        }
    }

    fn parse_unmatched_milestone_end(&mut self, open: Token<'a>, tag: &'a str) -> Result<ContentNode> {
        match self.take_milestone_attributes(open)? {
            Some(attributes) => Ok(ContentNode::Other(Marker {
                tag: tag.to_string(),
                attributes,
                end_marker: Some("*".to_string()),
                ..Default::default()
            })),
            None => self.parse_marker(open, tag),
        }
    }

    /// `\f + \ft text\f*`, body kept verbatim
    fn parse_note(&mut self, open: Token<'a>, tag: &'a str) -> Result<ContentNode> {
        let close = self.tokens[self.pos..]
            .iter()
            .position(|token| token.kind == TokenKind::Marker { tag, closing: true })
            .map(|offset| self.pos + offset)
            .ok_or_else(|| self.error_at(open.start, format!("unterminated \\{tag} note")))?;

        let raw = &self.source[open.end..self.tokens[close].start];
        let raw = raw
            .chars()
            .next()
            .filter(|first| first.is_whitespace())
            .map_or(raw, |first| &raw[first.len_utf8()..]);
        self.pos = close + 1;

        Ok(ContentNode::Other(Marker {
            tag: tag.to_string(),
            content: Some(raw.to_string()),
            end_marker: Some(format!("{tag}*")),
            ..Default::default()
        }))
    }

    fn find_span_close(&self, tag: &str) -> Option<usize> {
        let mut depth = 0usize;
        for (offset, token) in self.tokens[self.pos..].iter().enumerate() {
            match token.kind {
                TokenKind::Marker { tag: t, closing: false } if t == tag => depth += 1,
                TokenKind::Marker { tag: t, closing: true } if t == tag => {
                    if depth == 0 {
                        return Some(self.pos + offset);
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
        None
    }

    /// Whether the span ending at `close` neither leaves a milestone it
    /// entered nor enters a milestone it does not leave
    fn span_is_well_nested(&self, close: usize) -> bool {
        let mut opened: Vec<&'a str> = Vec::new();
        for token in &self.tokens[self.pos..close] {
            let TokenKind::Marker { tag, closing } = token.kind else {
                continue;
            };
            let matched = if closing {
                opened.iter().rposition(|open| *open == tag)
            } else if let Some(base) = tag.strip_suffix("-e") {
                opened
                    .iter()
                    .rposition(|open| open.strip_suffix("-s") == Some(base))
            } else {
                opened.push(tag);
                continue;
            };
            match matched {
                Some(index) => {
                    opened.remove(index);
                }
                None if self.closes_enclosing(token.kind) => return false,
                None => {}
            }
        }

        !opened
            .iter()
            .filter_map(|open| open.strip_suffix("-s"))
            .any(|base| self.has_milestone_end(close + 1, base))
    }

    /// Character spans, self-closing markers and standalone markers
    fn parse_marker(&mut self, open: Token<'a>, tag: &'a str) -> Result<ContentNode> {
        if self.peek_kind() == Some(TokenKind::Close) {
            self.pos += 1;
            return Ok(ContentNode::Other(Marker {
                tag: tag.to_string(),
                end_marker: Some("*".to_string()),
                ..Default::default()
            }));
        }

        if let Some(close) = self.find_span_close(tag) {
            if self.span_is_well_nested(close) {
                self.consume_separator();
                let children = self.parse_nested(Until::Span {
                    tag,
                    opened_at: open.start,
                })?;
                self.pos += 1;
                return Ok(ContentNode::Other(
                    Marker::new(tag).with_children(children, format!("{tag}*")),
                ));
            }
            debug!(tag, "span overlaps a milestone, keeping its markers standalone");
        }

        let mut marker = Marker::new(tag);
        marker.next_char = self.consume_separator();
        Ok(ContentNode::Other(marker))
    }

    /// Take one whitespace character from the following text run
    fn consume_separator(&mut self) -> Option<String> {
        let token = self.tokens.get(self.pos).copied()?;
        let TokenKind::Text(text) = token.kind else {
            return None;
        };
        let first = text.chars().next().filter(|c| c.is_whitespace())?;
        let rest = &text[first.len_utf8()..];
        if rest.is_empty() {
            self.pos += 1;
        } else {
            self.tokens[self.pos] = Token::text(rest, token.start + first.len_utf8());
        }
        Some(first.to_string())
    }
}

/// Remove the whitespace that belongs to the next verse or chapter marker
///
/// Every verse loses its trailing spaces. The verse written last in its
/// chapter also loses any trailing line breaks, including the newline after
/// a final marker.
fn trim_verse_end(nodes: &mut Vec<ContentNode>, ends_chapter: bool) {
    loop {
        let remove = match nodes.last_mut() {
            Some(ContentNode::Text { text }) => {
                let len = if ends_chapter {
                    text.trim_end().len()
                } else {
                    text.trim_end_matches([' ', '\t']).len()
                };
                text.truncate(len);
                text.is_empty()
            }
            Some(ContentNode::Other(marker))
                if ends_chapter && marker.children.is_empty() && marker.end_marker.is_none() =>
            {
                marker.next_char = None;
                false
            }
            _ => false,
        };
        if !remove {
            break;
        }
        nodes.pop();
    }
}

/// Trim the verse that comes last in output order
///
/// Output order is key order, not source order, so this runs once the whole
/// chapter is known.
fn trim_chapter_end(chapter: &mut Chapter) {
    let last = sorted_keys(chapter.verses.keys())
        .into_iter()
        .rfind(|key| *key != FRONT_KEY)
        .or_else(|| chapter.verses.contains_key(FRONT_KEY).then_some(FRONT_KEY))
        .map(str::to_string);
    let Some(key) = last else {
        return;
    };
    let Some(verse) = chapter.verses.get_mut(&key) else {
        return;
    };

    trim_verse_end(&mut verse.objects, true);
    if key == FRONT_KEY && verse.is_empty() {
        chapter.verses.remove(FRONT_KEY);
    }
}

/// Document-level parser: headers, then chapters and verses
struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: tokenize(source),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn parse(mut self) -> Result<Document> {
        let mut doc = Document::new();
        self.parse_headers(&mut doc);

        let mut chapter = FRONT_KEY.to_string();
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Marker {
                    tag: "c",
                    closing: false,
                } => {
                    self.pos += 1;
                    let (number, rest) = self.take_number(token, "chapter")?;
                    chapter = number;
                    doc.chapter_mut(chapter.clone());
                    let body = self.take_body(rest);
                    self.insert_verse(&mut doc, &chapter, FRONT_KEY, body)?;
                }
                TokenKind::Marker {
                    tag: "v",
                    closing: false,
                } => {
                    self.pos += 1;
                    let (number, rest) = self.take_number(token, "verse")?;
                    let body = self.take_body(rest);
                    self.insert_verse(&mut doc, &chapter, &number, body)?;
                }
                _ => self.pos += 1,
            }
        }

        for chapter in doc.chapters.values_mut() {
            trim_chapter_end(chapter);
        }

        debug!(
            headers = doc.headers.len(),
            chapters = doc.chapter_count(),
            verses = doc.verse_count(),
            "parsed USFM document"
        );
        Ok(doc)
    }

    fn parse_headers(&mut self, doc: &mut Document) {
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Marker {
                    tag: "c" | "v",
                    closing: false,
                } => break,
                TokenKind::Text(text) => {
                    self.pos += 1;
                    let text = text.trim();
                    if !text.is_empty() {
                        doc.push_header(HeaderEntry::text(text));
                    }
                }
                TokenKind::Close => {
                    self.pos += 1;
                    doc.push_header(HeaderEntry::text("\\*"));
                }
                TokenKind::Marker { tag, closing } => {
                    self.pos += 1;
                    let tag = if closing {
                        format!("{tag}*")
                    } else {
                        tag.to_string()
                    };
                    let content = match self.peek().map(|t| t.kind) {
                        Some(TokenKind::Close) => {
                            self.pos += 1;
                            Some("\\*".to_string())
                        }
                        Some(TokenKind::Text(text)) => {
                            self.pos += 1;
                            Some(text.trim().to_string()).filter(|content| !content.is_empty())
                        }
                        _ => None,
                    };
                    doc.push_header(HeaderEntry::Marker { tag, content });
                }
            }
        }
    }

    /// Read the number after `\c` or `\v`
    ///
    /// Returns the number and whatever text follows it on the same run.
    fn take_number(&mut self, marker: Token<'a>, what: &str) -> Result<(String, Option<Token<'a>>)> {
        let missing =
            || UsfmError::parse(line_at(self.source, marker.start), format!("{what} marker without a number"));

        let Some(Token {
            kind: TokenKind::Text(text),
            end,
            ..
        }) = self.peek()
        else {
            return Err(missing());
        };
        let trimmed = text.trim_start();
        if trimmed.is_empty() {
            return Err(missing());
        }
        self.pos += 1;

        let number_end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let number = &trimmed[..number_end];
        let rest = &trimmed[number_end..];

        let rest = if what == "chapter" {
            match rest.find('\n') {
                Some(newline) if rest[..newline].trim().is_empty() => &rest[newline + 1..],
                None if rest.trim().is_empty() => "",
                _ => rest.trim_start_matches([' ', '\t']),
            }
        } else {
            rest.chars()
                .next()
                .filter(|c| c.is_whitespace())
                .map_or(rest, |separator| &rest[separator.len_utf8()..])
        };

        let remainder = (!rest.is_empty()).then(|| Token::text(rest, end - rest.len()));
        Ok((number.to_string(), remainder))
    }

    /// Collect tokens up to the next `\c` or `\v`
    fn take_body(&mut self, lead: Option<Token<'a>>) -> Vec<Token<'a>> {
        let mut body: Vec<Token<'a>> = lead.into_iter().collect();
        while let Some(token) = self.peek() {
            if matches!(
                token.kind,
                TokenKind::Marker {
                    tag: "c" | "v",
                    closing: false
                }
            ) {
                break;
            }
            body.push(token);
            self.pos += 1;
        }
        body
    }

    fn insert_verse(
        &self,
        doc: &mut Document,
        chapter: &str,
        verse: &str,
        body: Vec<Token<'a>>,
    ) -> Result<()> {
        let mut inline = InlineParser::new(self.source, body);
        let mut nodes = inline.parse_nodes(Until::End)?;
        trim_verse_end(&mut nodes, false);

        // An empty front section is just the gap after `\c`
        if verse == FRONT_KEY && nodes.is_empty() {
            return Ok(());
        }

        let chapter = doc.chapter_mut(chapter);
        if chapter.get(verse).is_some() {
            warn!(verse, "duplicate verse marker, keeping the last occurrence");
        }
        chapter.insert(verse, nodes);
        Ok(())
    }
}

/// Parse USFM text into a document tree.
///
/// # Errors
///
/// Returns [`UsfmError::Parse`] when a chapter or verse marker has no
/// number, a `\w` word or note is not closed, a milestone is not properly
/// nested, or an attribute list is malformed.
pub fn parse(text: &str) -> Result<Document> {
    let source = text.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    Parser::new(&source).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_markers_and_text() {
        let tokens = tokenize("\\w In|x\\w*\\zaln-e\\*");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Marker {
                    tag: "w",
                    closing: false
                },
                TokenKind::Text(" In|x"),
                TokenKind::Marker {
                    tag: "w",
                    closing: true
                },
                TokenKind::Marker {
                    tag: "zaln-e",
                    closing: false
                },
                TokenKind::Close,
            ]
        );
    }

    #[test]
    fn test_tokenize_lone_backslash_is_text() {
        let tokens = tokenize("a \\ b");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Text("a \\ b"));
    }

    #[test]
    fn test_collapse_line_breaks() {
        assert_eq!(collapse_line_breaks(",\n"), ", ");
        assert_eq!(collapse_line_breaks("; \n  "), "; ");
        assert_eq!(collapse_line_breaks("a  b"), "a  b");
    }

    #[test]
    fn test_parse_attributes_pairs() {
        let attrs = parse_attributes(r#"|x-occurrence="1" x-occurrences="2""#).unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[1], Attribute::new("x-occurrences", "2"));
    }

    #[test]
    fn test_parse_attributes_default_is_lemma() {
        let attrs = parse_attributes("grace").unwrap();
        assert_eq!(attrs, vec![Attribute::new("lemma", "grace")]);
    }

    #[test]
    fn test_parse_attributes_unterminated_quote() {
        assert!(parse_attributes(r#"x-occurrence="1"#).is_err());
    }

    #[test]
    fn test_trim_verse_end_before_next_verse_keeps_newline() {
        let mut nodes = vec![ContentNode::text("end.\n")];
        trim_verse_end(&mut nodes, false);
        assert_eq!(nodes, vec![ContentNode::text("end.\n")]);

        let mut nodes = vec![ContentNode::text("end.  ")];
        trim_verse_end(&mut nodes, false);
        assert_eq!(nodes, vec![ContentNode::text("end.")]);
    }

    #[test]
    fn test_trim_verse_end_at_chapter_end() {
        let mut nodes = vec![
            ContentNode::text("end."),
            ContentNode::Other(Marker::new("p").with_next_char("\n")),
            ContentNode::text("\n\n"),
        ];
        trim_verse_end(&mut nodes, true);
        assert_eq!(
            nodes,
            vec![ContentNode::text("end."), ContentNode::Other(Marker::new("p"))]
        );
    }

    #[test]
    fn test_trim_chapter_end_uses_key_order() {
        let mut chapter = Chapter::new();
        chapter.insert("10", vec![ContentNode::text("ten\n")]);
        chapter.insert("2", vec![ContentNode::text("two\n")]);
        trim_chapter_end(&mut chapter);

        assert_eq!(chapter.verses["2"].objects, vec![ContentNode::text("two\n")]);
        assert_eq!(chapter.verses["10"].objects, vec![ContentNode::text("ten")]);
    }

    #[test]
    fn test_trim_chapter_end_drops_blank_front() {
        let mut chapter = Chapter::new();
        chapter.insert(FRONT_KEY, vec![ContentNode::text("\n")]);
        trim_chapter_end(&mut chapter);
        assert!(chapter.verses.is_empty());
    }

    #[test]
    fn test_line_numbers_in_errors() {
        let err = parse("\\id GEN\n\\c 1\n\\v 1 \\w In").unwrap_err();
        assert_eq!(
            err,
            UsfmError::Parse {
                line: 3,
                message: "unterminated \\w word".to_string()
            }
        );
    }
}
