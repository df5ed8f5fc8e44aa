//! Renderers for the Markdown IR
//!
//! Transforms block nodes into HTML (browser), plain text, and ANSI (terminal).

use crate::ir::{Block, HeadingLevel, Span};

const BOLD: &str = "\x1b[1m";
const UNDERLINE: &str = "\x1b[4m";
const RESET: &str = "\x1b[0m";

pub struct Renderer;

impl Renderer {
    /// Renders blocks to escaped HTML.
    pub fn to_html(blocks: &[Block]) -> String {
        let mut out = String::new();
        for block in blocks {
            match block {
                Block::Heading { level, spans } => {
                    let tag = match level {
                        HeadingLevel::H2 => "h2",
                        HeadingLevel::H3 => "h3",
                    };
                    out.push_str(&format!("<{tag}>{}</{tag}>", spans_html(spans)));
                }
                Block::BulletList(items) => {
                    out.push_str("<ul>");
                    for item in items {
                        out.push_str(&format!("<li>{}</li>", spans_html(item)));
                    }
                    out.push_str("</ul>");
                }
                Block::NumberedItem { number, spans } => {
                    out.push_str(&format!(
                        "<ol start=\"{number}\"><li>{}</li></ol>",
                        spans_html(spans)
                    ));
                }
                Block::Paragraph(spans) => {
                    out.push_str(&format!("<p>{}</p>", spans_html(spans)));
                }
                Block::Spacer => out.push_str("<br>"),
            }
            out.push('\n');
        }
        out
    }

    /// Renders blocks to plain text, dropping inline emphasis markers.
    pub fn to_plain_text(blocks: &[Block]) -> String {
        render_lines(blocks, spans_plain, |text| text)
    }

    /// Renders blocks with ANSI styling for terminals.
    pub fn to_ansi(blocks: &[Block]) -> String {
        render_lines(blocks, spans_ansi, |text| format!("{BOLD}{UNDERLINE}{text}{RESET}"))
    }
}

fn render_lines(
    blocks: &[Block],
    inline: impl Fn(&[Span]) -> String,
    heading: impl Fn(String) -> String,
) -> String {
    let mut lines: Vec<String> = Vec::new();
    for block in blocks {
        match block {
            Block::Heading { spans, .. } => lines.push(heading(inline(spans))),
            Block::BulletList(items) => {
                for item in items {
                    lines.push(format!("  • {}", inline(item)));
                }
            }
            Block::NumberedItem { number, spans } => {
                lines.push(format!("  {number}. {}", inline(spans)));
            }
            Block::Paragraph(spans) => lines.push(inline(spans)),
            Block::Spacer => lines.push(String::new()),
        }
    }
    lines.join("\n")
}

fn spans_html(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|s| match s {
            Span::Text(t) => escape_html(t),
            Span::Bold(t) => format!("<strong>{}</strong>", escape_html(t)),
        })
        .collect()
}

fn spans_plain(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|s| match s {
            Span::Text(t) | Span::Bold(t) => t.as_str(),
        })
        .collect()
}

fn spans_ansi(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|s| match s {
            Span::Text(t) => t.clone(),
            Span::Bold(t) => format!("{BOLD}{t}{RESET}"),
        })
        .collect()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
