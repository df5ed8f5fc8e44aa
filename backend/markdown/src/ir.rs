//! Markdown Intermediate Representation
//!
//! Line-oriented parser for the small markdown subset models are asked to
//! answer in: `##`/`###` headings, `*`/`-` bullets, `1.` numbered items,
//! paragraphs, blank-line spacers and `**bold**` inline spans.

use serde::{Deserialize, Serialize};

/// Inline run of text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Span {
    Text(String),
    Bold(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    H2,
    H3,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Block {
    Heading { level: HeadingLevel, spans: Vec<Span> },
    /// One entry per consecutive bullet line.
    BulletList(Vec<Vec<Span>>),
    NumberedItem { number: u32, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    Spacer,
}

/// Parse text into block nodes.
///
/// Each call starts from a clean state; the only state carried between
/// lines is the bullet list being accumulated.
pub fn parse(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut list: Vec<Vec<Span>> = Vec::new();

    for raw in markdown.lines() {
        let line = raw.trim();

        if let Some(item) = bullet_body(line) {
            list.push(parse_inline(item));
            continue;
        }
        flush_list(&mut list, &mut blocks);

        if line.is_empty() {
            if !matches!(blocks.last(), None | Some(Block::Spacer)) {
                blocks.push(Block::Spacer);
            }
        } else if let Some((level, body)) = heading(line) {
            blocks.push(Block::Heading {
                level,
                spans: parse_inline(body),
            });
        } else if let Some((number, body)) = numbered(line) {
            blocks.push(Block::NumberedItem {
                number,
                spans: parse_inline(body),
            });
        } else {
            blocks.push(Block::Paragraph(parse_inline(line)));
        }
    }

    flush_list(&mut list, &mut blocks);
    if matches!(blocks.last(), Some(Block::Spacer)) {
        blocks.pop();
    }
    blocks
}

/// Split a line into text and `**bold**` spans.
///
/// An opening `**` with no closing partner stays literal.
pub fn parse_inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("**") else {
            break;
        };
        push_text(&mut spans, &rest[..open]);
        let inner = &after[..close];
        if !inner.is_empty() {
            spans.push(Span::Bold(inner.to_string()));
        }
        rest = &after[close + 2..];
    }

    push_text(&mut spans, rest);
    spans
}

fn push_text(spans: &mut Vec<Span>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Span::Text(prev)) = spans.last_mut() {
        prev.push_str(text);
    } else {
        spans.push(Span::Text(text.to_string()));
    }
}

fn flush_list(list: &mut Vec<Vec<Span>>, blocks: &mut Vec<Block>) {
    if !list.is_empty() {
        blocks.push(Block::BulletList(std::mem::take(list)));
    }
}

fn bullet_body(line: &str) -> Option<&str> {
    line.strip_prefix("* ")
        .or_else(|| line.strip_prefix("- "))
        .map(str::trim_start)
}

/// `#`/`##` map to H2, `###` to H3. Deeper headings are not part of the
/// subset and stay paragraphs.
fn heading(line: &str) -> Option<(HeadingLevel, &str)> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    let level = match hashes {
        1 | 2 => HeadingLevel::H2,
        3 => HeadingLevel::H3,
        _ => return None,
    };
    let body = line[hashes..].strip_prefix(' ')?.trim();
    Some((level, body))
}

fn numbered(line: &str) -> Option<(u32, &str)> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let body = line[digits..].strip_prefix(". ")?;
    let number = line[..digits].parse().ok()?;
    Some((number, body.trim_start()))
}
