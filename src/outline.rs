//! Document outlines: the header tree a page actually has, the header tree a
//! page type is expected to have, and the comparison between the two.
//!
//! ## Found outlines
//!
//! While scanning, headings are pushed into a [`HeaderOutline`], an arena of
//! nodes linked by index. A heading becomes a child of the most recent
//! heading with a strictly lower level; a level-1 heading always starts a new
//! root. [`HeaderOutline::to_tree`] turns the arena into owned
//! [`DocumentHeader`] trees for validation.
//!
//! ## Expected outlines
//!
//! Templates are lists of [`OutlineItem`]s loaded from configuration: plain
//! [`ExpectedHeader`]s, or condition groups. An `and` group stands for all of
//! its members in order; an `or` group for the first alternative that is
//! present in the page. Groups are expanded on the fly into a local work
//! queue, so the template itself is never modified and validating the same
//! page twice yields the same issues.
//!
//! ## Matching
//!
//! At each level the expected and found lists are walked with two cursors:
//!
//! | Situation | Result |
//! |-----------|--------|
//! | exact title + level | consume both, recurse into children |
//! | same title, other case | consume both, `header-wrong-case` error |
//! | edit distance below [`MISSPELLING_THRESHOLD`] | consume both, `misspelled-header` error |
//! | expected header absent from the rest of the page | `required-header-missing` error if required, else skip it |
//! | found header matches another expected header | `header-in-wrong-position` warning, skip the found header |
//! | anything else | `extra-header-found` warning, skip the found header |
//!
//! An `allow_multiple` header keeps consuming consecutive matching headers.

use crate::fuzzy::edit_distance;
use crate::issues::{IssueCode, IssueLog};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Titles closer than this (case-insensitive edit distance) count as
/// misspellings of each other.
pub const MISSPELLING_THRESHOLD: usize = 3;

// ============================================================================
// Found outline
// ============================================================================

/// A heading of a scanned document together with its sub-headings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentHeader {
    pub level: u8,
    pub title: String,
    pub line: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentHeader>,
}

impl DocumentHeader {
    pub fn new(level: u8, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            line: 0,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<DocumentHeader>) -> Self {
        self.children = children;
        self
    }
}

/// Arena node of a [`HeaderOutline`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderNode {
    pub level: u8,
    pub title: String,
    pub line: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// Header hierarchy of one document, built incrementally while scanning.
#[derive(Debug, Clone, Default)]
pub struct HeaderOutline {
    nodes: Vec<HeaderNode>,
    roots: Vec<usize>,
    /// Open headings from the outermost root to the most recent heading.
    stack: Vec<usize>,
}

impl HeaderOutline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a heading and return its node index.
    pub fn push(&mut self, level: u8, title: impl Into<String>, line: usize) -> usize {
        if level <= 1 {
            self.stack.clear();
        }
        while let Some(&top) = self.stack.last() {
            if self.nodes[top].level >= level {
                self.stack.pop();
            } else {
                break;
            }
        }

        let index = self.nodes.len();
        let parent = self.stack.last().copied();
        self.nodes.push(HeaderNode {
            level,
            title: title.into(),
            line,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p].children.push(index),
            None => self.roots.push(index),
        }
        self.stack.push(index);
        index
    }

    pub fn nodes(&self) -> &[HeaderNode] {
        &self.nodes
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Titles of the open headings, nearest first.
    pub fn open_titles(&self) -> Vec<&str> {
        self.stack
            .iter()
            .rev()
            .map(|&i| self.nodes[i].title.as_str())
            .collect()
    }

    /// Titles from `index` up to its root, nearest first.
    pub fn ancestry(&self, index: usize) -> Vec<&str> {
        let mut titles = Vec::new();
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            titles.push(self.nodes[i].title.as_str());
            cursor = self.nodes[i].parent;
        }
        titles
    }

    /// Owned header trees, one per root.
    pub fn to_tree(&self) -> Vec<DocumentHeader> {
        self.roots.iter().map(|&r| self.subtree(r)).collect()
    }

    fn subtree(&self, index: usize) -> DocumentHeader {
        let node = &self.nodes[index];
        DocumentHeader {
            level: node.level,
            title: node.title.clone(),
            line: node.line,
            children: node.children.iter().map(|&c| self.subtree(c)).collect(),
        }
    }
}

// ============================================================================
// Expected outline
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    And,
    Or,
}

/// One entry of an expected-outline template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutlineItem {
    Condition {
        condition: Condition,
        arguments: Vec<OutlineItem>,
    },
    Header(ExpectedHeader),
}

/// A header a page is expected to contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedHeader {
    pub level: u8,
    /// Title to match. `*` matches any run of characters.
    pub title: String,
    #[serde(default)]
    pub required: bool,
    /// One expected slot may consume several consecutive matching headers.
    #[serde(default)]
    pub allow_multiple: bool,
    #[serde(default)]
    pub children: Vec<OutlineItem>,
}

impl ExpectedHeader {
    pub fn new(level: u8, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            required: false,
            allow_multiple: false,
            children: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.allow_multiple = true;
        self
    }

    pub fn with_children(mut self, children: Vec<OutlineItem>) -> Self {
        self.children = children;
        self
    }
}

impl From<ExpectedHeader> for OutlineItem {
    fn from(header: ExpectedHeader) -> Self {
        OutlineItem::Header(header)
    }
}

// ============================================================================
// Validation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TitleMatch {
    Exact,
    WrongCase,
    Misspelled,
}

/// Compare a page's header tree against an expected outline, recording every
/// difference in `log`.
pub fn validate_outline(expected: &[OutlineItem], found: &[DocumentHeader], log: &mut IssueLog) {
    validate_level(expected, found, log);
}

fn validate_level(expected: &[OutlineItem], found: &[DocumentHeader], log: &mut IssueLog) {
    let all_expected = flatten(expected);
    let mut queue: VecDeque<&OutlineItem> = expected.iter().collect();
    let mut cursor = 0;

    while let Some(item) = queue.pop_front() {
        let header = match item {
            OutlineItem::Condition {
                condition: Condition::And,
                arguments,
            } => {
                for argument in arguments.iter().rev() {
                    queue.push_front(argument);
                }
                continue;
            }
            OutlineItem::Condition {
                condition: Condition::Or,
                arguments,
            } => {
                if let Some(chosen) = choose_alternative(arguments, &found[cursor..]) {
                    queue.push_front(chosen);
                }
                continue;
            }
            OutlineItem::Header(header) => header,
        };

        let mut consumed = false;
        while let Some(candidate) = found.get(cursor) {
            if let Some(matched) = compare(header, candidate) {
                report_match(matched, header, candidate, log);
                if !header.children.is_empty() {
                    validate_level(&header.children, &candidate.children, log);
                }
                cursor += 1;
                consumed = true;
                if header.allow_multiple {
                    continue;
                }
                break;
            }
            if consumed {
                break;
            }
            if !appears_in(header, &found[cursor..]) {
                break;
            }
            report_out_of_place(candidate, header, &all_expected, log);
            cursor += 1;
        }

        if !consumed && header.required {
            log.error(
                IssueCode::RequiredHeaderMissing,
                format!(
                    "Missing required header '{}' (level {})",
                    header.title, header.level
                ),
            );
        }
    }

    for extra in &found[cursor..] {
        report_extra(extra, log);
    }
}

fn report_match(
    matched: TitleMatch,
    expected: &ExpectedHeader,
    found: &DocumentHeader,
    log: &mut IssueLog,
) {
    match matched {
        TitleMatch::Exact => {}
        TitleMatch::WrongCase => log.error(
            IssueCode::HeaderWrongCase,
            format!(
                "Header '{}' (line {}) has the wrong case; expected '{}'",
                found.title, found.line, expected.title
            ),
        ),
        TitleMatch::Misspelled => log.error(
            IssueCode::MisspelledHeader,
            format!(
                "Header '{}' (line {}) may be misspelled; expected '{}'",
                found.title, found.line, expected.title
            ),
        ),
    }
}

/// `found` does not match `current` but `current` shows up later: decide
/// whether `found` belongs somewhere else in the template or nowhere.
fn report_out_of_place(
    found: &DocumentHeader,
    current: &ExpectedHeader,
    all_expected: &[&ExpectedHeader],
    log: &mut IssueLog,
) {
    let best = all_expected
        .iter()
        .filter(|e| !std::ptr::eq(**e, current))
        .filter_map(|e| compare(e, found))
        .min();
    match best {
        Some(TitleMatch::Exact | TitleMatch::WrongCase) => log.warning(
            IssueCode::HeaderInWrongPosition,
            format!(
                "Header '{}' (line {}) was found in the wrong position; expected '{}' here",
                found.title, found.line, current.title
            ),
        ),
        Some(TitleMatch::Misspelled) => log.warning(
            IssueCode::MisspelledHeaderInWrongPosition,
            format!(
                "Header '{}' (line {}) may be misspelled and is in the wrong position",
                found.title, found.line
            ),
        ),
        None => report_extra(found, log),
    }
}

fn report_extra(found: &DocumentHeader, log: &mut IssueLog) {
    log.warning(
        IssueCode::ExtraHeaderFound,
        format!("Extra header found: '{}' (line {})", found.title, found.line),
    );
}

fn compare(expected: &ExpectedHeader, found: &DocumentHeader) -> Option<TitleMatch> {
    if expected.level != found.level {
        return None;
    }
    if wildcard_match(&expected.title, &found.title, false) {
        return Some(TitleMatch::Exact);
    }
    if wildcard_match(&expected.title, &found.title, true) {
        return Some(TitleMatch::WrongCase);
    }
    if !expected.title.contains('*')
        && edit_distance(&expected.title.to_lowercase(), &found.title.to_lowercase())
            < MISSPELLING_THRESHOLD
    {
        return Some(TitleMatch::Misspelled);
    }
    None
}

fn appears_in(expected: &ExpectedHeader, found: &[DocumentHeader]) -> bool {
    found.iter().any(|f| compare(expected, f).is_some())
}

/// The alternative whose leading header best matches the remaining headers
/// (exact beats wrong case beats misspelled, ties go to the earlier
/// alternative), falling back to the first alternative so a missing group is
/// reported.
fn choose_alternative<'a>(
    alternatives: &'a [OutlineItem],
    remaining: &[DocumentHeader],
) -> Option<&'a OutlineItem> {
    alternatives
        .iter()
        .filter_map(|alt| {
            leading_headers(alt)
                .into_iter()
                .flat_map(|h| remaining.iter().filter_map(move |f| compare(h, f)))
                .min()
                .map(|strength| (strength, alt))
        })
        .min_by_key(|(strength, _)| *strength)
        .map(|(_, alt)| alt)
        .or_else(|| alternatives.first())
}

/// Headers that can open an item: the header itself, the first member of an
/// `and` group, or the opener of any `or` alternative.
fn leading_headers(item: &OutlineItem) -> Vec<&ExpectedHeader> {
    match item {
        OutlineItem::Header(h) => vec![h],
        OutlineItem::Condition {
            condition: Condition::And,
            arguments,
        } => arguments.first().map(leading_headers).unwrap_or_default(),
        OutlineItem::Condition {
            condition: Condition::Or,
            arguments,
        } => arguments.iter().flat_map(leading_headers).collect(),
    }
}

/// Every header of one level, with condition groups dissolved.
fn flatten(items: &[OutlineItem]) -> Vec<&ExpectedHeader> {
    let mut out = Vec::new();
    for item in items {
        match item {
            OutlineItem::Header(h) => out.push(h),
            OutlineItem::Condition { arguments, .. } => out.extend(flatten(arguments)),
        }
    }
    out
}

/// Glob-style title comparison where `*` matches any run of characters.
fn wildcard_match(pattern: &str, text: &str, ignore_case: bool) -> bool {
    let (pattern, text) = if ignore_case {
        (pattern.to_lowercase(), text.to_lowercase())
    } else {
        (pattern.to_string(), text.to_string())
    };
    if !pattern.contains('*') {
        return pattern == text;
    }

    // At least two parts, since the pattern contains a `*`.
    let parts: Vec<&str> = pattern.split('*').collect();
    let (first, last) = (parts[0], parts[parts.len() - 1]);
    let Some(mut remaining) = text.strip_prefix(first) else {
        return false;
    };
    for part in &parts[1..parts.len() - 1] {
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }
    remaining.len() >= last.len() && remaining.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(level: u8, title: &str) -> DocumentHeader {
        DocumentHeader::new(level, title)
    }

    fn req(level: u8, title: &str) -> OutlineItem {
        ExpectedHeader::new(level, title).required().into()
    }

    fn opt(level: u8, title: &str) -> OutlineItem {
        ExpectedHeader::new(level, title).into()
    }

    fn codes(log: &IssueLog) -> Vec<IssueCode> {
        log.issues().iter().map(|i| i.code).collect()
    }

    fn run(expected: &[OutlineItem], found: &[DocumentHeader]) -> IssueLog {
        let mut log = IssueLog::new();
        validate_outline(expected, found, &mut log);
        log
    }

    // =========================================================================
    // Arena
    // =========================================================================

    #[test]
    fn outline_nests_by_level() {
        let mut outline = HeaderOutline::new();
        outline.push(1, "Title", 1);
        outline.push(2, "Properties", 3);
        outline.push(3, "Details", 5);
        outline.push(2, "Methods", 7);
        outline.push(1, "Second", 9);

        let tree = outline.to_tree();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].children[0].title, "Details");
        assert_eq!(tree[0].children[1].title, "Methods");
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn outline_skipped_levels_attach_to_nearest_lower() {
        let mut outline = HeaderOutline::new();
        outline.push(1, "Title", 1);
        outline.push(3, "Deep", 2);
        outline.push(2, "Shallow", 3);
        let tree = outline.to_tree();
        let titles: Vec<&str> = tree[0].children.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Deep", "Shallow"]);
    }

    #[test]
    fn outline_headings_before_level_one_are_roots() {
        let mut outline = HeaderOutline::new();
        outline.push(2, "Preface", 1);
        outline.push(1, "Title", 2);
        assert_eq!(outline.roots().len(), 2);
    }

    #[test]
    fn open_titles_are_nearest_first() {
        let mut outline = HeaderOutline::new();
        outline.push(1, "Title", 1);
        let props = outline.push(2, "Properties", 2);
        assert_eq!(outline.open_titles(), vec!["Properties", "Title"]);
        assert_eq!(outline.ancestry(props), vec!["Properties", "Title"]);
    }

    // =========================================================================
    // Matching
    // =========================================================================

    #[test]
    fn exact_outline_has_no_issues() {
        let expected = [req(2, "Properties"), req(2, "JSON representation")];
        let found = [h(2, "Properties"), h(2, "JSON representation")];
        assert!(run(&expected, &found).is_empty());
    }

    #[test]
    fn wrong_case_is_error() {
        let log = run(&[req(2, "JSON representation")], &[h(2, "JSON Representation")]);
        assert_eq!(codes(&log), vec![IssueCode::HeaderWrongCase]);
    }

    #[test]
    fn misspelling_is_error() {
        let log = run(&[req(2, "Properties")], &[h(2, "Propertes")]);
        assert_eq!(codes(&log), vec![IssueCode::MisspelledHeader]);
    }

    #[test]
    fn missing_required_header() {
        let log = run(&[req(2, "Properties"), req(2, "Methods")], &[h(2, "Properties")]);
        assert_eq!(codes(&log), vec![IssueCode::RequiredHeaderMissing]);
        assert!(log.issues()[0].message.contains("Methods"));
    }

    #[test]
    fn missing_optional_header_is_silent() {
        let log = run(&[opt(2, "Methods"), req(2, "Properties")], &[h(2, "Properties")]);
        assert!(log.is_empty());
    }

    #[test]
    fn extra_header_is_warning() {
        let log = run(&[req(2, "Properties")], &[h(2, "Properties"), h(2, "Remarks")]);
        assert_eq!(codes(&log), vec![IssueCode::ExtraHeaderFound]);
    }

    #[test]
    fn extra_header_in_the_middle() {
        let log = run(
            &[req(2, "Properties"), req(2, "Methods")],
            &[h(2, "Properties"), h(2, "Remarks"), h(2, "Methods")],
        );
        assert_eq!(codes(&log), vec![IssueCode::ExtraHeaderFound]);
    }

    #[test]
    fn header_in_wrong_position() {
        let log = run(
            &[req(2, "Properties"), req(2, "Methods")],
            &[h(2, "Methods"), h(2, "Properties")],
        );
        assert_eq!(
            codes(&log),
            vec![IssueCode::HeaderInWrongPosition, IssueCode::RequiredHeaderMissing]
        );
    }

    #[test]
    fn misspelled_in_wrong_position() {
        let log = run(
            &[req(2, "Properties"), opt(2, "Methods")],
            &[h(2, "Methds"), h(2, "Properties")],
        );
        assert_eq!(codes(&log), vec![IssueCode::MisspelledHeaderInWrongPosition]);
    }

    #[test]
    fn level_mismatch_is_not_a_match() {
        let log = run(&[req(2, "Properties")], &[h(3, "Properties")]);
        assert_eq!(
            codes(&log),
            vec![IssueCode::RequiredHeaderMissing, IssueCode::ExtraHeaderFound]
        );
    }

    #[test]
    fn wildcard_titles_match() {
        let expected = [req(1, "* resource type")];
        assert!(run(&expected, &[h(1, "driveItem resource type")]).is_empty());
        assert!(wildcard_match("*", "anything", false));
        assert!(wildcard_match("a*c*e", "abcde", false));
        assert!(!wildcard_match("a*c", "ab", false));
        assert!(!wildcard_match("ab*ab", "ab", false));
    }

    #[test]
    fn children_are_validated_recursively() {
        let expected = [ExpectedHeader::new(1, "*")
            .required()
            .with_children(vec![req(2, "Properties")])
            .into()];
        let found = [h(1, "Item").with_children(vec![h(2, "Remarks")])];
        let log = run(&expected, &found);
        assert_eq!(
            codes(&log),
            vec![IssueCode::RequiredHeaderMissing, IssueCode::ExtraHeaderFound]
        );
    }

    #[test]
    fn allow_multiple_consumes_a_run() {
        let expected = [
            ExpectedHeader::new(2, "Example").required().multiple().into(),
            req(2, "See also"),
        ];
        let found = [h(2, "Example"), h(2, "Example"), h(2, "Example"), h(2, "See also")];
        assert!(run(&expected, &found).is_empty());
    }

    #[test]
    fn single_slot_does_not_consume_repeats() {
        let expected = [req(2, "Example")];
        let found = [h(2, "Example"), h(2, "Example")];
        assert_eq!(codes(&run(&expected, &found)), vec![IssueCode::ExtraHeaderFound]);
    }

    // =========================================================================
    // Conditions
    // =========================================================================

    #[test]
    fn and_group_splices_members() {
        let expected = [OutlineItem::Condition {
            condition: Condition::And,
            arguments: vec![req(2, "Request"), req(2, "Response")],
        }];
        assert!(run(&expected, &[h(2, "Request"), h(2, "Response")]).is_empty());
        let log = run(&expected, &[h(2, "Request")]);
        assert_eq!(codes(&log), vec![IssueCode::RequiredHeaderMissing]);
    }

    #[test]
    fn or_group_picks_present_alternative() {
        let expected = [OutlineItem::Condition {
            condition: Condition::Or,
            arguments: vec![req(2, "Examples"), req(2, "Example")],
        }];
        assert!(run(&expected, &[h(2, "Example")]).is_empty());
        assert!(run(&expected, &[h(2, "Examples")]).is_empty());
    }

    #[test]
    fn or_group_reports_first_alternative_when_none_present() {
        let expected = [OutlineItem::Condition {
            condition: Condition::Or,
            arguments: vec![req(2, "Examples"), req(2, "Samples")],
        }];
        let log = run(&expected, &[]);
        assert_eq!(codes(&log), vec![IssueCode::RequiredHeaderMissing]);
        assert!(log.issues()[0].message.contains("'Examples'"));
    }

    #[test]
    fn or_group_with_and_alternative() {
        let expected = [OutlineItem::Condition {
            condition: Condition::Or,
            arguments: vec![
                OutlineItem::Condition {
                    condition: Condition::And,
                    arguments: vec![req(2, "Request"), req(2, "Response")],
                },
                req(2, "Example"),
            ],
        }];
        assert!(run(&expected, &[h(2, "Request"), h(2, "Response")]).is_empty());
        assert!(run(&expected, &[h(2, "Example")]).is_empty());
    }

    #[test]
    fn conditional_headers_count_for_wrong_position() {
        let expected = [
            req(2, "Properties"),
            OutlineItem::Condition {
                condition: Condition::Or,
                arguments: vec![opt(2, "Examples"), opt(2, "Example")],
            },
        ];
        let log = run(&expected, &[h(2, "Example"), h(2, "Properties")]);
        assert_eq!(codes(&log), vec![IssueCode::HeaderInWrongPosition]);
    }

    #[test]
    fn validation_is_idempotent() {
        let expected = [
            req(2, "Properties"),
            OutlineItem::Condition {
                condition: Condition::Or,
                arguments: vec![req(2, "Examples"), req(2, "Example")],
            },
        ];
        let found = [h(2, "Exmple"), h(2, "properties"), h(2, "Extra")];
        let first = run(&expected, &found);
        let second = run(&expected, &found);
        assert_eq!(first.issues(), second.issues());
        assert!(!first.is_empty());
    }
}
