//! Link and bookmark validation across the doc set.
//!
//! Every link in a page is one of:
//!
//! - **external** (`https://…`, `mailto:…`): not checked, optionally warned
//! - **bookmark** (`#name`): must name a heading of the same page
//! - **relative** (`../b.md#sec`, `/api/b.md`): must exist on disk inside
//!   the doc-set root, and a bookmark must name a heading of the target page
//!
//! Misses come with a suggestion drawn from the closest bookmark or sibling
//! file name. The existence check is the only file-system access.
//!
//! Relative links also feed the incoming-link index used for the orphan
//! report.

use crate::config::LinksConfig;
use crate::fuzzy::best_match;
use crate::issues::{Issue, IssueCode, IssueLog, Severity};
use crate::scanner::DocFile;
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

/// Outcome of checking one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkValidationResult {
    Valid,
    ExternalSkipped,
    /// The page exists but the bookmark does not. The suggestion is a
    /// ready-to-use `#bookmark`.
    BookmarkMissing { suggestion: Option<String> },
    /// The target is not a scanned page, so its bookmarks are unknown.
    BookmarkSkipped,
    /// The suggestion is the link with its file name corrected.
    FileNotFound { suggestion: Option<String> },
    OutsideDocSet,
    InvalidFormat,
}

/// A checked link with the doc-set relative path it points at, when it
/// points at an existing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCheck {
    pub result: LinkValidationResult,
    pub destination: Option<String>,
}

impl LinkCheck {
    fn new(result: LinkValidationResult) -> Self {
        Self {
            result,
            destination: None,
        }
    }
}

/// Bookmarks of every scanned page, keyed by doc-set relative path.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    root: PathBuf,
    bookmarks: HashMap<String, BTreeSet<String>>,
}

impl LinkIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            bookmarks: HashMap::new(),
        }
    }

    pub fn add_page(&mut self, path: impl Into<String>, bookmarks: BTreeSet<String>) {
        self.bookmarks.insert(path.into(), bookmarks);
    }

    pub fn from_docs<'d>(root: impl Into<PathBuf>, docs: impl IntoIterator<Item = &'d DocFile>) -> Self {
        let mut index = LinkIndex::new(root);
        for doc in docs {
            index.add_page(doc.path.clone(), doc.bookmarks.clone());
        }
        index
    }

    /// Check `target`, linked from the page at `source` (doc-set relative).
    pub fn check_link(&self, source: &str, target: &str) -> LinkCheck {
        let target = target.trim();
        if target.is_empty() || target.contains(char::is_whitespace) {
            return LinkCheck::new(LinkValidationResult::InvalidFormat);
        }
        if is_external(target) {
            return LinkCheck::new(LinkValidationResult::ExternalSkipped);
        }
        if let Some(bookmark) = target.strip_prefix('#') {
            return LinkCheck::new(self.check_bookmark(source, bookmark));
        }

        let (path_part, bookmark) = match target.split_once('#') {
            Some((path, bookmark)) => (path, Some(bookmark)),
            None => (target, None),
        };
        let path_part = path_part.split('?').next().unwrap_or(path_part);
        let decoded = percent_decode(path_part);
        let path_part = &*decoded;

        let mut segments: Vec<&str> = if path_part.starts_with('/') {
            Vec::new()
        } else {
            let mut dir: Vec<&str> = source.split('/').collect();
            dir.pop();
            dir
        };
        for segment in path_part.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return LinkCheck::new(LinkValidationResult::OutsideDocSet);
                    }
                }
                other => segments.push(other),
            }
        }
        let destination = segments.join("/");
        let on_disk = self.root.join(&destination);

        if !on_disk.exists() {
            let suggestion = self.suggest_file(&segments).map(|name| {
                let replaced = match path_part.rsplit_once('/') {
                    Some((dir, _)) => format!("{dir}/{name}"),
                    None => name,
                };
                match bookmark {
                    Some(b) => format!("{replaced}#{b}"),
                    None => replaced,
                }
            });
            return LinkCheck::new(LinkValidationResult::FileNotFound { suggestion });
        }

        let result = match bookmark.filter(|b| !b.is_empty()) {
            None => LinkValidationResult::Valid,
            Some(_) if on_disk.is_dir() => LinkValidationResult::Valid,
            Some(bookmark) => match self.bookmarks.get(&destination) {
                None => LinkValidationResult::BookmarkSkipped,
                Some(known) => bookmark_result(known, bookmark),
            },
        };
        LinkCheck {
            result,
            destination: Some(destination),
        }
    }

    fn check_bookmark(&self, source: &str, bookmark: &str) -> LinkValidationResult {
        match self.bookmarks.get(source) {
            Some(known) => bookmark_result(known, bookmark),
            None => LinkValidationResult::BookmarkSkipped,
        }
    }

    /// Closest file name in the directory the link points into.
    fn suggest_file(&self, segments: &[&str]) -> Option<String> {
        let (name, dir) = segments.split_last()?;
        let entries = fs::read_dir(self.root.join(dir.join("/"))).ok()?;
        let names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        best_match(name, names.iter().map(String::as_str)).map(str::to_string)
    }
}

fn bookmark_result(known: &BTreeSet<String>, bookmark: &str) -> LinkValidationResult {
    if known.contains(bookmark) {
        LinkValidationResult::Valid
    } else {
        LinkValidationResult::BookmarkMissing {
            suggestion: best_match(bookmark, known.iter().map(String::as_str))
                .map(|b| format!("#{b}")),
        }
    }
}

/// `drive%20item.md` → `drive item.md`. Malformed escapes and sequences
/// that don't decode to UTF-8 leave the text unchanged.
fn percent_decode(text: &str) -> Cow<'_, str> {
    if !text.contains('%') {
        return Cow::Borrowed(text);
    }
    let bytes = text.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = text.get(i + 1..i + 3)
            && hex.bytes().all(|b| b.is_ascii_hexdigit())
            && let Ok(byte) = u8::from_str_radix(hex, 16)
        {
            decoded.push(byte);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    match String::from_utf8(decoded) {
        Ok(decoded) => Cow::Owned(decoded),
        Err(_) => Cow::Borrowed(text),
    }
}

/// `scheme:` prefixes (`http:`, `mailto:`) mark links this tool does not follow.
fn is_external(target: &str) -> bool {
    match target.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

/// Check every link of `doc` and return the pages it links to (excluding
/// itself).
pub fn validate_links(
    doc: &DocFile,
    index: &LinkIndex,
    config: &LinksConfig,
    log: &mut IssueLog,
) -> BTreeSet<String> {
    let mut destinations = BTreeSet::new();
    for link in &doc.links {
        let check = index.check_link(&doc.path, &link.target);
        let at = format!("Link '{}' on line {}", link.target, link.line);
        match check.result {
            LinkValidationResult::Valid => {}
            LinkValidationResult::ExternalSkipped => {
                if config.warn_on_external {
                    log.warning(
                        IssueCode::LinkExternalSkipped,
                        format!("{at} is external and was not checked"),
                    );
                }
            }
            LinkValidationResult::BookmarkMissing { suggestion } => log.error(
                IssueCode::LinkBookmarkMissing,
                format!("{at}: bookmark not found.{}", did_you_mean(suggestion)),
            ),
            LinkValidationResult::BookmarkSkipped => log.record(Issue {
                severity: Severity::Message,
                ..Issue::warning(
                    IssueCode::LinkBookmarkSkipped,
                    format!("{at}: target is not a scanned page; bookmark not checked"),
                )
            }),
            LinkValidationResult::FileNotFound { suggestion } => log.error(
                IssueCode::LinkDestinationNotFound,
                format!("{at}: destination not found.{}", did_you_mean(suggestion)),
            ),
            LinkValidationResult::OutsideDocSet => log.error(
                IssueCode::LinkOutsideDocSet,
                format!("{at} points outside the documentation set"),
            ),
            LinkValidationResult::InvalidFormat => log.error(
                IssueCode::LinkFormatInvalid,
                format!("{at} is not a valid link target"),
            ),
        }
        if let Some(destination) = check.destination
            && destination != doc.path
        {
            destinations.insert(destination);
        }
    }
    destinations
}

fn did_you_mean(suggestion: Option<String>) -> String {
    suggestion
        .map(|s| format!(" Did you mean '{s}'?"))
        .unwrap_or_default()
}

/// Pages nothing links to, excluding table-of-contents roots.
pub fn orphaned_pages<'p>(
    pages: impl IntoIterator<Item = &'p str>,
    incoming: &HashSet<String>,
    toc_roots: &[String],
) -> Vec<&'p str> {
    pages
        .into_iter()
        .filter(|page| !incoming.contains(*page) && !toc_roots.iter().any(|r| r == page))
        .collect()
}

/// Record one orphan warning per page.
pub fn report_orphans(orphans: &[&str], log: &mut IssueLog) {
    for page in orphans {
        log.record(
            Issue::warning(IssueCode::OrphanedPage, "No page in the doc set links here")
                .with_source(*page),
        );
    }
}
