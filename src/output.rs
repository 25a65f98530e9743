//! CLI output formatting for check results.
//!
//! # Page-First Display
//!
//! Issues are grouped under the page they were found in. Each page leads
//! with its positional index and title, with the file path as context; the
//! issues follow indented, one per line, with the page prefix dropped from
//! their source since the header already names it.
//!
//! ```text
//! Documents
//! 001 Get item (api/item-get.md)
//!     error[link-bookmark-missing] Link '../b.md#sec1' on line 12: bookmark not found. Did you mean '#sec2'?
//!     warning[additional-property-detected] GET /items/{id}: Property 'etag' is not in the example
//! 002 item resource type (resources/item.md)
//!     note[info] Resource example is truncated
//!
//! Documentation set
//!     error[circular-base-type] Circular base type dependency: foo.a -> foo.b -> foo.a
//!     warning[orphaned-page] lonely.md: No page in the doc set links here
//!
//! Resources (base types first)
//!     foo.entity
//!     foo.item
//!
//! Checked 2 documents: 2 errors, 2 warnings. FAILED
//! ```
//!
//! Pages without visible issues are listed only in verbose mode, as are
//! notes (informational issues).
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::docset::{DocSetReport, DocumentReport};
use crate::issues::{Issue, Severity};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Header line of a page: index, title when known, path.
///
/// ```text
/// 001 Get item (api/item-get.md)
/// 002 api/untitled.md
/// ```
fn document_header(index: usize, document: &DocumentReport) -> String {
    match document.title.as_deref() {
        Some(title) if !title.is_empty() => {
            format!("{} {} ({})", format_index(index), title, document.path)
        }
        _ => format!("{} {}", format_index(index), document.path),
    }
}

/// One issue line, with `page` dropped from the front of its source.
///
/// ```text
/// error[request-not-found] GET item: No request named 'get-b'
/// warning[unused-table] Table 'Response headers' is not used
/// ```
pub fn format_issue(issue: &Issue, page: Option<&str>) -> String {
    let label = match issue.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Message => "note",
    };
    let source = issue.source.as_deref().and_then(|source| match page {
        Some(page) if source == page => None,
        Some(page) => Some(
            source
                .strip_prefix(page)
                .and_then(|rest| rest.strip_prefix(" > "))
                .unwrap_or(source),
        ),
        None => Some(source),
    });
    match source {
        Some(source) => format!("{label}[{}] {source}: {}", issue.code, issue.message),
        None => format!("{label}[{}] {}", issue.code, issue.message),
    }
}

fn is_visible(issue: &Issue, verbose: bool) -> bool {
    verbose || issue.severity != Severity::Message
}

// ============================================================================
// Check report
// ============================================================================

/// Format a whole check report.
pub fn format_check_output(report: &DocSetReport, verbose: bool) -> Vec<String> {
    let mut lines = Vec::new();

    let mut document_lines = Vec::new();
    for (i, document) in report.documents.iter().enumerate() {
        let visible: Vec<&Issue> = document
            .issues
            .iter()
            .filter(|issue| is_visible(issue, verbose))
            .collect();
        if visible.is_empty() && !verbose {
            continue;
        }
        document_lines.push(document_header(i + 1, document));
        if verbose {
            document_lines.push(format!(
                "{}{}, {}",
                indent(1),
                plural(document.resources, "resource"),
                plural(document.methods, "method")
            ));
        }
        for issue in visible {
            document_lines.push(format!(
                "{}{}",
                indent(1),
                format_issue(issue, Some(document.path.as_str()))
            ));
        }
    }
    if !document_lines.is_empty() {
        lines.push("Documents".to_string());
        lines.extend(document_lines);
    }

    let set_issues: Vec<&Issue> = report
        .set_issues
        .iter()
        .filter(|issue| is_visible(issue, verbose))
        .collect();
    if !set_issues.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Documentation set".to_string());
        for issue in set_issues {
            lines.push(format!("{}{}", indent(1), format_issue(issue, None)));
        }
    }

    if verbose && !report.resource_order.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Resources (base types first)".to_string());
        for name in &report.resource_order {
            lines.push(format!("{}{}", indent(1), name));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format_summary(report));
    lines
}

/// Closing line of a report.
///
/// ```text
/// Checked 12 documents: 0 errors, 3 warnings. Passed
/// ```
pub fn format_summary(report: &DocSetReport) -> String {
    format!(
        "Checked {}: {}, {}. {}",
        plural(report.documents.len(), "document"),
        plural(report.error_count(), "error"),
        plural(report.warning_count(), "warning"),
        if report.passed { "Passed" } else { "FAILED" }
    )
}

/// Print a check report to stdout.
pub fn print_check_output(report: &DocSetReport, verbose: bool) {
    for line in format_check_output(report, verbose) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::IssueCode;
    use std::path::PathBuf;

    fn document(path: &str, title: Option<&str>, issues: Vec<Issue>) -> DocumentReport {
        DocumentReport {
            path: path.to_string(),
            title: title.map(str::to_string),
            resources: 0,
            methods: 1,
            issues,
        }
    }

    fn report(documents: Vec<DocumentReport>, set_issues: Vec<Issue>) -> DocSetReport {
        let passed = !documents
            .iter()
            .flat_map(|d| d.issues.iter())
            .chain(set_issues.iter())
            .any(Issue::is_error);
        DocSetReport {
            root: PathBuf::from("docs"),
            documents,
            set_issues,
            resource_order: vec!["foo.entity".to_string(), "foo.item".to_string()],
            passed,
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn plural_counts() {
        assert_eq!(plural(1, "error"), "1 error");
        assert_eq!(plural(0, "error"), "0 errors");
    }

    #[test]
    fn document_header_prefers_title() {
        let titled = document("api/get.md", Some("Get item"), vec![]);
        assert_eq!(document_header(1, &titled), "001 Get item (api/get.md)");
        let untitled = document("api/x.md", None, vec![]);
        assert_eq!(document_header(2, &untitled), "002 api/x.md");
    }

    // =========================================================================
    // Issue lines
    // =========================================================================

    #[test]
    fn issue_drops_page_prefix() {
        let issue = Issue::warning(IssueCode::UnusedTable, "Table 'X' is not used")
            .with_source("api/get.md > GET item");
        assert_eq!(
            format_issue(&issue, Some("api/get.md")),
            "warning[unused-table] GET item: Table 'X' is not used"
        );
    }

    #[test]
    fn issue_on_the_page_itself_has_no_source() {
        let issue = Issue::error(IssueCode::RequiredHeaderMissing, "Missing 'Response'")
            .with_source("api/get.md");
        assert_eq!(
            format_issue(&issue, Some("api/get.md")),
            "error[required-header-missing] Missing 'Response'"
        );
    }

    #[test]
    fn set_issue_keeps_its_source() {
        let issue = Issue::warning(IssueCode::OrphanedPage, "No page in the doc set links here")
            .with_source("lonely.md");
        assert_eq!(
            format_issue(&issue, None),
            "warning[orphaned-page] lonely.md: No page in the doc set links here"
        );
    }

    #[test]
    fn notes_are_labelled() {
        assert_eq!(format_issue(&Issue::message("hello"), None), "note[info] hello");
    }

    // =========================================================================
    // Full report
    // =========================================================================

    #[test]
    fn clean_report_is_just_the_summary() {
        let report = report(vec![document("a.md", Some("A"), vec![])], vec![]);
        assert_eq!(
            format_check_output(&report, false),
            vec!["Checked 1 document: 0 errors, 0 warnings. Passed"]
        );
    }

    #[test]
    fn report_groups_issues_by_page() {
        let report = report(
            vec![
                document("a.md", Some("A"), vec![]),
                document(
                    "b.md",
                    Some("B"),
                    vec![
                        Issue::error(IssueCode::LinkDestinationNotFound, "Link 'x.md' on line 3: destination not found.")
                            .with_source("b.md"),
                        Issue::message("only in verbose").with_source("b.md"),
                    ],
                ),
            ],
            vec![Issue::error(IssueCode::CircularBaseType, "Circular base type dependency: a -> a")],
        );
        let lines = format_check_output(&report, false);
        assert_eq!(
            lines,
            vec![
                "Documents",
                "002 B (b.md)",
                "    error[link-destination-not-found] Link 'x.md' on line 3: destination not found.",
                "",
                "Documentation set",
                "    error[circular-base-type] Circular base type dependency: a -> a",
                "",
                "Checked 2 documents: 2 errors, 0 warnings. FAILED",
            ]
        );
    }

    #[test]
    fn verbose_lists_every_page_and_resource_order() {
        let report = report(
            vec![document("a.md", Some("A"), vec![Issue::message("note").with_source("a.md")])],
            vec![],
        );
        let lines = format_check_output(&report, true);
        assert_eq!(
            lines,
            vec![
                "Documents",
                "001 A (a.md)",
                "    0 resources, 1 method",
                "    note[info] note",
                "",
                "Resources (base types first)",
                "    foo.entity",
                "    foo.item",
                "",
                "Checked 1 document: 0 errors, 0 warnings. Passed",
            ]
        );
    }
}
