//! Block classification: turning one document's block stream into a model.
//!
//! The scanner walks the blocks of a single page in order and decides what
//! each one means. Most of the meaning comes from JSON annotations in HTML
//! comments placed directly above code blocks:
//!
//! ~~~text
//! # driveItem resource type            ← title for the blocks that follow
//!
//! Represents a file or folder.          ← description (first paragraph)
//!
//! ## Properties
//! | Property | Type   | Description |   ← table, classified by its heading
//! |----------|--------|-------------|
//! | id       | String | Identifier. |
//!
//! <!-- { "blockType": "resource", "@odata.type": "foo.driveItem" } -->
//! ```json                               ← annotated code block
//! { "id": "string" }
//! ```
//! ~~~
//!
//! ## Dispatch
//!
//! | `blockType`         | Effect                                              |
//! |---------------------|-----------------------------------------------------|
//! | `resource`          | new [`ResourceDefinition`] from the JSON payload    |
//! | `request`           | new [`MethodDefinition`], named `"<file> #<n>"` if unnamed |
//! | `response`          | attached to the named requests, or the latest one   |
//! | `example`/`samples` | recorded standalone                                 |
//! | `simulatedResponse` | attached to the latest request                      |
//! | `testParams`        | attached to the latest request                      |
//! | `ignored`           | nothing                                             |
//!
//! A JSON code block with no annotation, an annotation that is not valid
//! JSON, and an unknown `blockType` are errors scoped to that block; scanning
//! always continues.

use crate::annotation::{CodeBlockAnnotation, CodeBlockKind, PageAnnotation};
use crate::block::{Block, BlockKind};
use crate::config::SchemaConfig;
use crate::datatype::TypeResolver;
use crate::issues::{IssueCode, IssueLog};
use crate::markdown::LinkReference;
use crate::method::{MethodDefinition, RequestLine};
use crate::naming::bookmark_for_heading;
use crate::outline::HeaderOutline;
use crate::resource::{BlockContext, ResourceDefinition};
use crate::table::{EnumerationDefinition, TableDefinition, TableInterpreter, TableKind};
use std::collections::BTreeSet;

/// A code block recorded without pairing.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleDefinition {
    pub kind: CodeBlockKind,
    pub language: Option<String>,
    pub content: String,
    pub line: usize,
}

/// Position of a discovered element in its typed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoundElement {
    Resource(usize),
    Method(usize),
    Table(usize),
    Example(usize),
}

/// Everything discovered in one document.
#[derive(Debug, Clone, Default)]
pub struct DocFile {
    /// Path relative to the doc-set root, `/`-separated.
    pub path: String,
    /// Text of the first level-1 heading.
    pub title: Option<String>,
    pub page_annotation: Option<PageAnnotation>,
    /// Resolved after scanning by the merger.
    pub namespace: Option<String>,
    pub resources: Vec<ResourceDefinition>,
    pub requests: Vec<MethodDefinition>,
    pub examples: Vec<ExampleDefinition>,
    pub tables: Vec<TableDefinition>,
    /// Discovery order across the typed lists above.
    pub elements: Vec<FoundElement>,
    pub outline: HeaderOutline,
    pub bookmarks: BTreeSet<String>,
    pub links: Vec<LinkReference>,
}

impl DocFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Enumeration members declared by this page's tables.
    pub fn enums(&self) -> impl Iterator<Item = &EnumerationDefinition> {
        self.tables.iter().flat_map(|t| t.enumerations())
    }

    pub fn has_bookmark(&self, bookmark: &str) -> bool {
        self.bookmarks.contains(bookmark)
    }

    pub fn request(&self, identifier: &str) -> Option<&MethodDefinition> {
        self.requests.iter().find(|r| r.identifier == identifier)
    }
}

/// Mutable state carried across one document's block stream.
struct Scanner<'a> {
    config: &'a SchemaConfig,
    resolver: TypeResolver<'a>,
    tables: TableInterpreter<'a>,
    doc: DocFile,
    method_title: Option<String>,
    pending_description: Option<String>,
    awaiting_description: bool,
}

/// Classify every block of one document.
pub fn scan_document(
    path: &str,
    blocks: &[Block],
    config: &SchemaConfig,
    log: &mut IssueLog,
) -> DocFile {
    let mut scanner = Scanner {
        config,
        resolver: TypeResolver::new(config),
        tables: TableInterpreter::new(config),
        doc: DocFile::new(path),
        method_title: None,
        pending_description: None,
        awaiting_description: false,
    };

    for (index, block) in blocks.iter().enumerate() {
        let previous = index.checked_sub(1).and_then(|i| blocks.get(i));
        let next = blocks.get(index + 1);
        match &block.kind {
            BlockKind::Heading { level } => scanner.heading(*level, block),
            BlockKind::Paragraph => scanner.paragraph(block),
            BlockKind::HtmlComment => {
                if !next.is_some_and(Block::is_code_block) {
                    scanner.page_annotation(block, log);
                }
            }
            BlockKind::CodeBlock => match previous {
                Some(comment) if comment.kind == BlockKind::HtmlComment => {
                    scanner.annotated_code_block(comment, block, log)
                }
                _ if block.is_json_code() => log.error(
                    IssueCode::JsonWithoutMetadata,
                    format!("JSON code block on line {} has no metadata", block.line_start),
                ),
                _ => {}
            },
            BlockKind::Table(shape) => {
                let chain = scanner.doc.outline.open_titles();
                let table =
                    scanner
                        .tables
                        .classify_and_parse(shape, &chain, block.line_start, log);
                scanner.push_table(table);
            }
            BlockKind::Other => {}
        }
    }

    let mut doc = scanner.doc;
    if let Some(page) = doc.page_annotation.as_mut()
        && !page.has_title()
    {
        page.title = doc.title.clone();
    }
    tracing::debug!(
        path = %doc.path,
        resources = doc.resources.len(),
        requests = doc.requests.len(),
        tables = doc.tables.len(),
        "scanned document"
    );
    doc
}

impl Scanner<'_> {
    fn heading(&mut self, level: u8, block: &Block) {
        let title = block.content.trim();
        self.doc.outline.push(level, title, block.line_start);
        self.doc.bookmarks.insert(bookmark_for_heading(title));
        if level == 1 {
            if self.doc.title.is_none() {
                self.doc.title = Some(title.to_string());
            }
            self.method_title = Some(title.to_string());
            self.pending_description = None;
            self.awaiting_description = true;
        }
    }

    fn paragraph(&mut self, block: &Block) {
        let text = block.content.trim();
        if self.awaiting_description && !text.is_empty() && !self.config.is_boilerplate(text) {
            self.pending_description = Some(text.to_string());
            self.awaiting_description = false;
        }
    }

    fn page_annotation(&mut self, block: &Block, log: &mut IssueLog) {
        let Some(annotation) = PageAnnotation::parse(&block.content) else {
            return;
        };
        if self.doc.page_annotation.is_some() {
            log.warning(
                IssueCode::DuplicatePageAnnotation,
                format!(
                    "Ignoring second page annotation on line {}",
                    block.line_start
                ),
            );
        } else {
            self.doc.page_annotation = Some(annotation);
        }
    }

    fn context(&self, block: &Block) -> BlockContext {
        BlockContext {
            source_file: self.doc.path.clone(),
            line: block.line_start,
            title: self.method_title.clone(),
            description: self.pending_description.clone(),
        }
    }

    fn annotated_code_block(&mut self, comment: &Block, block: &Block, log: &mut IssueLog) {
        let annotation = match CodeBlockAnnotation::parse(&comment.content) {
            Ok(annotation) => annotation,
            Err(err) => {
                log.error(
                    IssueCode::MetadataParseError,
                    format!(
                        "Metadata on line {} is not valid JSON: {err}",
                        comment.line_start
                    ),
                );
                return;
            }
        };
        let kind = match annotation.kind() {
            Ok(kind) => kind,
            Err(err) => {
                log.error(
                    IssueCode::UnknownBlockType,
                    format!("Code block on line {}: {err}", block.line_start),
                );
                return;
            }
        };

        match kind {
            CodeBlockKind::Resource => self.resource(&annotation, block, log),
            CodeBlockKind::Request => self.request(&annotation, block, log),
            CodeBlockKind::Response => self.response(annotation, block, log),
            CodeBlockKind::Example | CodeBlockKind::Samples => {
                self.doc.examples.push(ExampleDefinition {
                    kind,
                    language: block.language.clone(),
                    content: block.content.clone(),
                    line: block.line_start,
                });
                self.doc
                    .elements
                    .push(FoundElement::Example(self.doc.examples.len() - 1));
            }
            CodeBlockKind::SimulatedResponse => match self.doc.requests.last_mut() {
                Some(request) => request.simulated_response = Some(block.content.clone()),
                None => log.error(
                    IssueCode::ResponseWithoutRequest,
                    format!(
                        "Simulated response on line {} has no preceding request",
                        block.line_start
                    ),
                ),
            },
            CodeBlockKind::TestParams => match self.doc.requests.last_mut() {
                Some(request) => request.test_params.push(block.content.clone()),
                None => log.error(
                    IssueCode::ResponseWithoutRequest,
                    format!(
                        "Test parameters on line {} have no preceding request",
                        block.line_start
                    ),
                ),
            },
            CodeBlockKind::Ignored => {}
        }
    }

    fn resource(&mut self, annotation: &CodeBlockAnnotation, block: &Block, log: &mut IssueLog) {
        let context = self.context(block);
        if let Some(resource) =
            ResourceDefinition::from_json(annotation, &block.content, &context, &self.resolver, log)
        {
            self.doc.resources.push(resource);
            self.doc
                .elements
                .push(FoundElement::Resource(self.doc.resources.len() - 1));
        }
    }

    fn request(&mut self, annotation: &CodeBlockAnnotation, block: &Block, log: &mut IssueLog) {
        let identifier = annotation
            .name
            .first()
            .cloned()
            .unwrap_or_else(|| format!("{} #{}", self.doc.path, self.doc.requests.len() + 1));
        if RequestLine::parse(&block.content).is_none() {
            log.error(
                IssueCode::RequestParseError,
                format!(
                    "Request '{identifier}' on line {} does not start with an HTTP request line",
                    block.line_start
                ),
            );
        }
        let context = self.context(block);
        let method = MethodDefinition::from_request(identifier, &block.content, annotation, &context);
        self.doc.requests.push(method);
        self.doc
            .elements
            .push(FoundElement::Method(self.doc.requests.len() - 1));
    }

    fn response(&mut self, annotation: CodeBlockAnnotation, block: &Block, log: &mut IssueLog) {
        let targets: Vec<usize> = if annotation.name.is_empty() {
            match self.doc.requests.len().checked_sub(1) {
                Some(last) => vec![last],
                None => {
                    log.error(
                        IssueCode::ResponseWithoutRequest,
                        format!(
                            "Response on line {} has no preceding request",
                            block.line_start
                        ),
                    );
                    return;
                }
            }
        } else {
            annotation
                .name
                .iter()
                .filter_map(|name| {
                    let found = self.doc.requests.iter().position(|r| &r.identifier == name);
                    if found.is_none() {
                        log.error(
                            IssueCode::RequestNotFound,
                            format!(
                                "Response on line {} refers to unknown request '{name}'",
                                block.line_start
                            ),
                        );
                    }
                    found
                })
                .collect()
        };

        for index in targets {
            let request = &mut self.doc.requests[index];
            if request.response.is_some() {
                log.error(
                    IssueCode::DuplicateResponse,
                    format!(
                        "Request '{}' already has a response; second one on line {}",
                        request.identifier, block.line_start
                    ),
                );
                continue;
            }
            request.response = Some(block.content.clone());
            request.response_annotation = Some(annotation.clone());
        }
    }

    fn push_table(&mut self, table: TableDefinition) {
        if table.kind == TableKind::Unknown {
            tracing::trace!(path = %self.doc.path, line = table.line, "unknown table");
        }
        self.doc.tables.push(table);
        self.doc
            .elements
            .push(FoundElement::Table(self.doc.tables.len() - 1));
    }
}
