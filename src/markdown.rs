//! Markdown → block stream adapter.
//!
//! Uses [pulldown-cmark](https://docs.rs/pulldown-cmark) with tables enabled
//! and flattens its event stream into [`Block`]s. Nesting inside lists and
//! block quotes is ignored: a paragraph inside a list item is still a
//! paragraph block. Link destinations are collected separately by [`links`]
//! because the rendered paragraph text no longer carries them.

use crate::block::{Block, BlockKind, TableShape};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;
use std::ops::Range;

/// A link destination found in a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkReference {
    pub target: String,
    pub line: usize,
}

/// Byte offset → 1-based line number.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&s| s <= offset)
    }
}

enum Capture {
    Heading { level: u8, text: String, start: usize },
    Paragraph { text: String, start: usize },
    Code { language: Option<String>, text: String, start: usize },
    Html { text: String, start: usize },
    Table { shape: TableShape, row: Vec<String>, in_head: bool, start: usize },
}

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH
}

/// Tokenize Markdown text into an ordered block stream.
pub fn tokenize(text: &str) -> Vec<Block> {
    let lines = LineIndex::new(text);
    let mut blocks = Vec::new();
    let mut capture: Option<Capture> = None;

    for (event, range) in Parser::new_ext(text, options()).into_offset_iter() {
        match event {
            Event::Start(tag) => start_tag(tag, range, text, &mut capture),
            Event::End(end) => {
                if let Some(block) = end_tag(end, &mut capture, &lines) {
                    blocks.push(block);
                }
            }
            Event::Text(t) | Event::Code(t) => push_text(&mut capture, &t),
            Event::SoftBreak | Event::HardBreak => push_text(&mut capture, "\n"),
            Event::Html(html) => match capture.as_mut() {
                Some(Capture::Html { text, .. }) => text.push_str(&html),
                _ => blocks.push(html_block(&html, lines.line_of(range.start))),
            },
            Event::InlineHtml(html) => push_text(&mut capture, &html),
            Event::Rule => blocks.push(Block::new(
                BlockKind::Other,
                "---",
                lines.line_of(range.start),
            )),
            _ => {}
        }
    }
    blocks
}

fn start_tag(tag: Tag<'_>, range: Range<usize>, source: &str, capture: &mut Option<Capture>) {
    match tag {
        Tag::Heading { level, .. } => {
            *capture = Some(Capture::Heading {
                level: level as u8,
                text: String::new(),
                start: range.start,
            });
        }
        Tag::Paragraph if capture.is_none() => {
            *capture = Some(Capture::Paragraph {
                text: String::new(),
                start: range.start,
            });
        }
        Tag::CodeBlock(kind) => {
            let language = match kind {
                CodeBlockKind::Fenced(info) => info
                    .split_whitespace()
                    .next()
                    .map(|s| s.to_string()),
                CodeBlockKind::Indented => None,
            };
            *capture = Some(Capture::Code {
                language,
                text: String::new(),
                start: range.start,
            });
        }
        Tag::HtmlBlock => {
            *capture = Some(Capture::Html {
                text: String::new(),
                start: range.start,
            });
        }
        Tag::Table(_) => {
            *capture = Some(Capture::Table {
                shape: TableShape::default(),
                row: Vec::new(),
                in_head: false,
                start: range.start,
            });
        }
        Tag::TableHead => {
            if let Some(Capture::Table { in_head, .. }) = capture.as_mut() {
                *in_head = true;
            }
        }
        Tag::TableCell => {
            if let Some(Capture::Table { row, .. }) = capture.as_mut() {
                let raw = source.get(range).unwrap_or_default();
                row.push(raw.trim().trim_matches('|').trim().to_string());
            }
        }
        _ => {}
    }
}

fn end_tag(end: TagEnd, capture: &mut Option<Capture>, lines: &LineIndex) -> Option<Block> {
    match (end, capture.take()) {
        (TagEnd::Heading(_), Some(Capture::Heading { level, text, start })) => Some(Block::new(
            BlockKind::Heading { level },
            text.trim(),
            lines.line_of(start),
        )),
        (TagEnd::Paragraph, Some(Capture::Paragraph { text, start })) => Some(Block::new(
            BlockKind::Paragraph,
            text.trim(),
            lines.line_of(start),
        )),
        (TagEnd::CodeBlock, Some(Capture::Code { language, text, start })) => {
            let mut block = Block::new(BlockKind::CodeBlock, text, lines.line_of(start));
            block.language = language;
            Some(block)
        }
        (TagEnd::HtmlBlock, Some(Capture::Html { text, start })) => {
            Some(html_block(&text, lines.line_of(start)))
        }
        (TagEnd::TableHead, Some(Capture::Table { mut shape, row, start, .. })) => {
            shape.headers = row;
            *capture = Some(Capture::Table {
                shape,
                row: Vec::new(),
                in_head: false,
                start,
            });
            None
        }
        (TagEnd::TableRow, Some(Capture::Table { mut shape, row, in_head, start })) => {
            if !in_head {
                shape.rows.push(row);
            }
            *capture = Some(Capture::Table {
                shape,
                row: Vec::new(),
                in_head,
                start,
            });
            None
        }
        (TagEnd::Table, Some(Capture::Table { shape, start, .. })) => {
            let content = shape.headers.join(" | ");
            Some(Block::new(BlockKind::Table(shape), content, lines.line_of(start)))
        }
        // Inner tags (emphasis, links, cells, list paragraphs) end while a
        // block is still being captured; put it back untouched.
        (_, other) => {
            *capture = other;
            None
        }
    }
}

fn push_text(capture: &mut Option<Capture>, fragment: &str) {
    match capture.as_mut() {
        Some(Capture::Heading { text, .. })
        | Some(Capture::Paragraph { text, .. })
        | Some(Capture::Code { text, .. })
        | Some(Capture::Html { text, .. }) => text.push_str(fragment),
        Some(Capture::Table { .. }) | None => {}
    }
}

fn html_block(html: &str, line: usize) -> Block {
    let kind = if html.trim_start().starts_with("<!--") {
        BlockKind::HtmlComment
    } else {
        BlockKind::Other
    };
    Block::new(kind, html.trim(), line)
}

/// Every inline link destination in the document, in source order.
pub fn links(text: &str) -> Vec<LinkReference> {
    let lines = LineIndex::new(text);
    Parser::new_ext(text, options())
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::Link { dest_url, .. }) => Some(LinkReference {
                target: dest_url.to_string(),
                line: lines.line_of(range.start),
            }),
            _ => None,
        })
        .collect()
}
