//! # apidocs-check
//!
//! Semantic validation for REST API documentation written in Markdown.
//! Pages are ordinary Markdown; the machine-readable parts live in JSON
//! annotations inside HTML comments placed above code blocks, and in tables
//! whose headings say what they describe. The checker reads a whole
//! documentation set and reports where the prose, the tables, the JSON
//! examples and the links disagree.
//!
//! # Architecture: Document Pipeline, Then Set-Wide Passes
//!
//! ```text
//! per document (parallel)
//!   Markdown  →  blocks      →  DocFile          →  merged DocFile    →  outline issues
//!              (markdown)      (scanner)            (merge)              (outline)
//!
//! whole set (once)
//!   resources  →  base-first order + type references  (inheritance)
//!   links      →  bookmarks, destinations, orphans    (links)
//! ```
//!
//! Each document is independent until the set-wide passes, so documents are
//! checked in parallel with no shared mutable state. Everything a stage finds
//! is recorded in an [`issues::IssueLog`]; a documentation problem never
//! aborts the run. A run passes when no error was recorded.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`docset`] | Discovers pages, runs the per-document pipeline, then the set-wide passes |
//! | [`markdown`] | Markdown text → block stream and link list (pulldown-cmark) |
//! | [`block`] | The block stream's types: headings, paragraphs, code, comments, tables |
//! | [`scanner`] | Classifies one document's blocks into resources, methods, tables, examples |
//! | [`annotation`] | Code-block and page annotations, the closed set of block kinds |
//! | [`resource`] | Resource definitions inferred from annotated JSON examples |
//! | [`method`] | Request/response pairs, request lines, logical routes |
//! | [`table`] | Table classification and row parsing |
//! | [`datatype`] | Type names and literal values → parameter data types |
//! | [`parameter`] | Parameter definitions and their pure merge |
//! | [`merge`] | Folds tables into the resources and methods they describe |
//! | [`inheritance`] | Cross-document resource graph, base-type order, type references |
//! | [`outline`] | Found header trees, expected outlines, outline validation |
//! | [`links`] | Link, bookmark and orphan-page validation |
//! | [`issues`] | Issue records, codes, severities and scoped logs |
//! | [`config`] | `apidocs.toml` loading, merging over stock defaults, validation |
//! | [`naming`] | Bookmark slugs and type-name conventions |
//! | [`fuzzy`] | Edit distance and "did you mean" suggestions |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Findings Are Data, Not Errors
//!
//! `Result` is reserved for failures of the tool itself: an unreadable root,
//! a malformed `apidocs.toml`. A broken link or a missing header is a finding
//! about the documentation and goes into the issue log with a stable
//! [`issues::IssueCode`], so one bad page never hides the rest of the report.
//!
//! ## Explicit Configuration
//!
//! A [`config::SchemaConfig`] is loaded once per run and passed by reference
//! to every component that needs it. Nothing reads configuration from global
//! state, so tests can check the same page under different settings side by
//! side.
//!
//! ## Closed Block Kinds
//!
//! The `blockType` of an annotation is parsed into
//! [`annotation::CodeBlockKind`] up front. The scanner matches it
//! exhaustively; adding a kind is a compile error at every place that must
//! handle it.
//!
//! ## Pure Merges
//!
//! Merging a table row into a parameter returns the merged parameter and the
//! issues it raised instead of mutating through a shared error list, so merge
//! rules are testable in isolation.

pub mod annotation;
pub mod block;
pub mod config;
pub mod datatype;
pub mod docset;
pub mod fuzzy;
pub mod inheritance;
pub mod issues;
pub mod links;
pub mod markdown;
pub mod merge;
pub mod method;
pub mod naming;
pub mod outline;
pub mod output;
pub mod parameter;
pub mod resource;
pub mod scanner;
pub mod table;

#[cfg(test)]
pub(crate) mod test_helpers;
