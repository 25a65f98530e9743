//! Doc-set orchestration: discovery, the per-document pipeline, and the
//! set-wide passes that need every document at once.
//!
//! ```text
//! root/                        discover()   → sorted relative paths
//! ├── apidocs.toml             (loaded by the caller, see config)
//! ├── index.md                 per document, in parallel:
//! ├── resources/                 tokenize → scan → merge → outline
//! │   └── driveitem.md
//! └── api/                     then, once:
//!     └── driveitem-get.md       inheritance → type references → links → orphans
//! ```
//!
//! A document that cannot be read is an issue, not a failure: the rest of the
//! set is still checked. Only problems with the root itself (missing, not
//! walkable) or an unknown `--page` selection are returned as
//! [`DocSetError`].
//!
//! ## Targeted scans
//!
//! With [`CheckOptions::pages`] set, every document is still scanned so
//! resources, enumerations and bookmarks from the whole set are known, but
//! the report only carries issues for the selected pages and the orphan
//! report is skipped.

use crate::config::SchemaConfig;
use crate::inheritance::ResourceGraph;
use crate::issues::{Issue, IssueCode, IssueLog};
use crate::links::{LinkIndex, orphaned_pages, report_orphans, validate_links};
use crate::markdown;
use crate::merge::ElementMerger;
use crate::outline::{OutlineItem, validate_outline};
use crate::scanner::{DocFile, scan_document};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum DocSetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Documentation root not found: {0}")]
    RootNotFound(PathBuf),
    #[error("Page is not part of the documentation set: {0}")]
    PageNotFound(String),
}

/// What a run checks beyond the per-document scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    pub validate_links: bool,
    pub validate_outline: bool,
    /// Doc-set relative paths to report on. Empty means the whole set.
    pub pages: Vec<String>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            validate_links: false,
            validate_outline: true,
            pages: Vec::new(),
        }
    }
}

/// One scanned page and the issues found in it.
#[derive(Debug, Clone)]
pub struct ScannedDocument {
    pub doc: DocFile,
    pub log: IssueLog,
}

/// A fully checked documentation set.
#[derive(Debug)]
pub struct DocSet {
    root: PathBuf,
    documents: Vec<ScannedDocument>,
    resources: ResourceGraph,
    set_log: IssueLog,
    selected: Option<BTreeSet<String>>,
}

impl DocSet {
    /// Discover, scan and cross-check every page under `root`.
    pub fn check(
        root: &Path,
        config: &SchemaConfig,
        options: &CheckOptions,
    ) -> Result<DocSet, DocSetError> {
        let pages = discover(root)?;
        let selected = select_pages(&pages, &options.pages)?;

        let documents: Vec<ScannedDocument> = pages
            .par_iter()
            .map(|page| load_document(root, page, config, options))
            .collect();

        let mut set_log = IssueLog::new();
        if documents.is_empty() {
            set_log.error(
                IssueCode::EmptyDocSet,
                format!("No Markdown documents found under {}", root.display()),
            );
        }

        let resources = ResourceGraph::resolve(
            documents
                .iter()
                .flat_map(|d| d.doc.resources.iter().cloned())
                .collect(),
            &mut set_log,
        );
        let enum_identifiers: BTreeSet<String> = documents
            .iter()
            .flat_map(|d| d.doc.enums().map(|e| e.identifier()))
            .collect();
        resources.check_references(&enum_identifiers, &mut set_log);

        let mut set = DocSet {
            root: root.to_path_buf(),
            documents,
            resources,
            set_log,
            selected,
        };
        if options.validate_links {
            set.check_links(config);
        }

        tracing::info!(
            documents = set.documents.len(),
            resources = set.resources.resources().len(),
            errors = set.error_count(),
            "checked documentation set"
        );
        Ok(set)
    }

    fn check_links(&mut self, config: &SchemaConfig) {
        let index = LinkIndex::from_docs(&self.root, self.documents.iter().map(|d| &d.doc));
        let mut incoming: HashSet<String> = HashSet::new();
        for document in &mut self.documents {
            incoming.extend(validate_links(
                &document.doc,
                &index,
                &config.links,
                &mut document.log,
            ));
        }
        if self.selected.is_none() {
            let orphans = orphaned_pages(
                self.documents.iter().map(|d| d.doc.path.as_str()),
                &incoming,
                &config.links.toc_roots,
            );
            report_orphans(&orphans, &mut self.set_log);
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn documents(&self) -> &[ScannedDocument] {
        &self.documents
    }

    pub fn document(&self, path: &str) -> Option<&ScannedDocument> {
        self.documents.iter().find(|d| d.doc.path == path)
    }

    pub fn resources(&self) -> &ResourceGraph {
        &self.resources
    }

    fn is_reported(&self, page: &str) -> bool {
        self.selected.as_ref().is_none_or(|s| s.contains(page))
    }

    /// Set-wide issues that concern a reported page. Issues tied to no page
    /// at all are always reported.
    fn reported_set_issues(&self) -> impl Iterator<Item = &Issue> {
        self.set_log.issues().iter().filter(|issue| match &self.selected {
            Some(selected) if issue.source.is_some() || !issue.pages.is_empty() => {
                selected.iter().any(|page| issue.concerns(page))
            }
            _ => true,
        })
    }

    fn reported_issues(&self) -> impl Iterator<Item = &Issue> {
        self.documents
            .iter()
            .filter(|d| self.is_reported(&d.doc.path))
            .flat_map(|d| d.log.issues())
            .chain(self.reported_set_issues())
    }

    pub fn error_count(&self) -> usize {
        self.reported_issues().filter(|i| i.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.reported_issues().filter(|i| i.is_warning()).count()
    }

    /// A run passes when no error was recorded in the reported pages.
    pub fn passed(&self) -> bool {
        self.error_count() == 0
    }

    pub fn report(&self) -> DocSetReport {
        DocSetReport {
            root: self.root.clone(),
            documents: self
                .documents
                .iter()
                .filter(|d| self.is_reported(&d.doc.path))
                .map(|d| DocumentReport {
                    path: d.doc.path.clone(),
                    title: d.doc.title.clone(),
                    resources: d.doc.resources.len(),
                    methods: d.doc.requests.len(),
                    issues: d.log.issues().to_vec(),
                })
                .collect(),
            set_issues: self.reported_set_issues().cloned().collect(),
            resource_order: self
                .resources
                .sorted_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            passed: self.passed(),
        }
    }
}

/// Issues of one page, as reported.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub resources: usize,
    pub methods: usize,
    pub issues: Vec<Issue>,
}

/// Serializable outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct DocSetReport {
    pub root: PathBuf,
    pub documents: Vec<DocumentReport>,
    /// Issues from the inheritance, type-reference and orphan passes.
    pub set_issues: Vec<Issue>,
    /// Resource names, base types first.
    pub resource_order: Vec<String>,
    pub passed: bool,
}

impl DocSetReport {
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.documents
            .iter()
            .flat_map(|d| d.issues.iter())
            .chain(self.set_issues.iter())
    }

    pub fn error_count(&self) -> usize {
        self.issues().filter(|i| i.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues().filter(|i| i.is_warning()).count()
    }

    pub fn to_json(&self) -> Result<String, DocSetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Every `.md` file under `root`, as sorted `/`-separated relative paths.
/// Hidden files and directories are skipped.
pub fn discover(root: &Path) -> Result<Vec<String>, DocSetError> {
    if !root.is_dir() {
        return Err(DocSetError::RootNotFound(root.to_path_buf()));
    }
    let mut pages = Vec::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = entry?;
        let is_markdown = entry
            .path()
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("md"));
        if !entry.file_type().is_file() || !is_markdown {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            pages.push(parts.join("/"));
        }
    }
    pages.sort();
    Ok(pages)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn select_pages(
    pages: &[String],
    requested: &[String],
) -> Result<Option<BTreeSet<String>>, DocSetError> {
    if requested.is_empty() {
        return Ok(None);
    }
    let mut selected = BTreeSet::new();
    for page in requested {
        let normalized = normalize_page(page);
        if !pages.contains(&normalized) {
            return Err(DocSetError::PageNotFound(page.clone()));
        }
        selected.insert(normalized);
    }
    Ok(Some(selected))
}

fn normalize_page(page: &str) -> String {
    let page = page.replace('\\', "/");
    page.trim_start_matches("./").trim_start_matches('/').to_string()
}

fn load_document(
    root: &Path,
    page: &str,
    config: &SchemaConfig,
    options: &CheckOptions,
) -> ScannedDocument {
    match fs::read_to_string(root.join(page)) {
        Ok(text) => check_document(page, &text, config, options.validate_outline),
        Err(err) => {
            let mut log = IssueLog::new().scoped(page);
            log.error(
                IssueCode::DocumentReadError,
                format!("Could not read document: {err}"),
            );
            ScannedDocument {
                doc: DocFile::new(page),
                log,
            }
        }
    }
}

/// Run the per-document pipeline over the text of one page.
pub fn check_document(
    path: &str,
    text: &str,
    config: &SchemaConfig,
    validate_outlines: bool,
) -> ScannedDocument {
    let mut log = IssueLog::new().scoped(path);
    let blocks = markdown::tokenize(text);
    let mut doc = scan_document(path, &blocks, config, &mut log);
    doc.links = markdown::links(text);

    ElementMerger::new(config).merge(&mut doc, &mut log);

    if validate_outlines && let Some(template) = outline_template(&doc, config) {
        validate_outline(template, &doc.outline.to_tree(), &mut log);
    }
    ScannedDocument { doc, log }
}

/// Expected outline for the kind of page `doc` is.
fn outline_template<'c>(doc: &DocFile, config: &'c SchemaConfig) -> Option<&'c [OutlineItem]> {
    if !doc.requests.is_empty() {
        Some(&config.outlines.api)
    } else if !doc.resources.is_empty() {
        Some(&config.outlines.resource)
    } else {
        None
    }
}
