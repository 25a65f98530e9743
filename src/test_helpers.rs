//! Shared test utilities for the apidocs-check test suite.
//!
//! Block builders stand in for the Markdown tokenizer so scanner and merger
//! tests can describe a page block by block:
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let blocks = vec![
//!     heading(1, "item resource type", 1),
//!     comment(r#"{"blockType":"resource","@odata.type":"foo.item"}"#, 3),
//!     code("json", r#"{"id": "x"}"#, 4),
//! ];
//! ```

use std::path::Path;

use crate::block::{Block, BlockKind, TableShape};
use crate::issues::{Issue, IssueCode};
use crate::resource::ResourceDefinition;

// =========================================================================
// Block builders
// =========================================================================

pub fn heading(level: u8, title: &str, line: usize) -> Block {
    Block::new(BlockKind::Heading { level }, title, line)
}

pub fn paragraph(text: &str, line: usize) -> Block {
    Block::new(BlockKind::Paragraph, text, line)
}

/// An HTML comment block wrapping `json`.
pub fn comment(json: &str, line: usize) -> Block {
    Block::new(BlockKind::HtmlComment, format!("<!-- {json} -->"), line)
}

pub fn code(language: &str, content: &str, line: usize) -> Block {
    Block::new(BlockKind::CodeBlock, content, line).with_language(language)
}

pub fn table(headers: &[&str], rows: &[&[&str]], line: usize) -> Block {
    let shape = TableShape {
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows: rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect(),
    };
    Block::new(BlockKind::Table(shape), "", line)
}

// =========================================================================
// Model builders
// =========================================================================

/// A property-less resource declared in `file`.
pub fn resource(name: &str, base_type: Option<&str>, file: &str) -> ResourceDefinition {
    ResourceDefinition {
        name: name.to_string(),
        title: None,
        description: None,
        parameters: Vec::new(),
        base_type: base_type.map(str::to_string),
        key_property: None,
        is_abstract: false,
        open_type: false,
        optional_properties: Vec::new(),
        navigation_properties: Vec::new(),
        truncated: false,
        source_file: file.to_string(),
        line: 1,
        resolved_base_type: None,
    }
}

// =========================================================================
// Disk and issue helpers
// =========================================================================

/// Write `content` to `relative` under `root`, creating parent directories.
pub fn write_page(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Number of issues carrying `code`.
pub fn issues_with_code<'a>(issues: impl IntoIterator<Item = &'a Issue>, code: IssueCode) -> usize {
    issues.into_iter().filter(|i| i.code == code).count()
}
