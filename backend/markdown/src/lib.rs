//! Markdown-subset formatter and renderers
//!
//! Converts model responses into typed block nodes shared by the browser
//! UI (as JSON or HTML) and the terminal (as ANSI text).

pub mod ir;
pub mod renderer;

pub use ir::{Block, HeadingLevel, Span, parse, parse_inline};
pub use renderer::{Renderer, escape_html};
