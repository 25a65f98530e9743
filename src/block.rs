//! The block stream: the unit of input every later stage consumes.
//!
//! A document arrives already tokenized into an ordered sequence of typed
//! blocks. This crate ships one producer ([`crate::markdown::tokenize`]), but
//! the scanner only depends on the shapes defined here, so any tokenizer that
//! can fill them in works.

use serde::Serialize;

/// What a block is, as decided by the tokenizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum BlockKind {
    /// `#` through `######`. The level is always in `1..=6`.
    Heading { level: u8 },
    Paragraph,
    CodeBlock,
    HtmlComment,
    Table(TableShape),
    Other,
}

/// Raw cell text of a Markdown table, header row separated from body rows.
///
/// Cells keep their Markdown syntax (emphasis, backticks, links); stripping
/// it is the table interpreter's job.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableShape {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableShape {
    /// Index of the first header matching one of `synonyms`, case-insensitively.
    ///
    /// Synonyms are tried in order, so earlier entries win when a table has
    /// several plausible columns (e.g. both "Name" and "Property Name").
    pub fn column_index(&self, synonyms: &[String]) -> Option<usize> {
        synonyms.iter().find_map(|syn| {
            self.headers
                .iter()
                .position(|h| strip_cell(h).eq_ignore_ascii_case(syn.trim()))
        })
    }
}

/// One tokenized unit of a Markdown document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub kind: BlockKind,
    /// Text content. For headings and paragraphs this is the rendered text,
    /// for code blocks the literal body, for HTML comments the raw comment.
    pub content: String,
    /// 1-based line the block starts on.
    pub line_start: usize,
    /// Fence info string of a code block (first word only), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Block {
    pub fn new(kind: BlockKind, content: impl Into<String>, line_start: usize) -> Self {
        Self {
            kind,
            content: content.into(),
            line_start,
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self.kind {
            BlockKind::Heading { level } => Some(level),
            _ => None,
        }
    }

    pub fn is_code_block(&self) -> bool {
        matches!(self.kind, BlockKind::CodeBlock)
    }

    /// True for code blocks fenced as `json` (any case).
    pub fn is_json_code(&self) -> bool {
        self.is_code_block()
            && self
                .language
                .as_deref()
                .is_some_and(|l| l.eq_ignore_ascii_case("json"))
    }
}

/// Strip Markdown decoration from a table cell.
///
/// Removes surrounding whitespace and pipes, emphasis markers (`*`, `_`),
/// inline-code backticks, and HTML line breaks. Link syntax is left alone
/// because type cells use it to point at the type's page.
pub fn strip_cell(cell: &str) -> String {
    let mut text = cell.trim().trim_matches('|').trim().to_string();
    for br in ["<br/>", "<br />", "<br>"] {
        text = text.replace(br, " ");
    }
    let text: String = text.chars().filter(|c| *c != '`').collect();
    let mut text = text.trim();
    loop {
        let stripped = text
            .strip_prefix("**")
            .and_then(|t| t.strip_suffix("**"))
            .or_else(|| text.strip_prefix("__").and_then(|t| t.strip_suffix("__")))
            .or_else(|| text.strip_prefix('*').and_then(|t| t.strip_suffix('*')))
            .or_else(|| text.strip_prefix('_').and_then(|t| t.strip_suffix('_')));
        match stripped {
            Some(inner) if !inner.is_empty() => text = inner.trim(),
            _ => break,
        }
    }
    text.to_string()
}
