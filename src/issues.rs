//! Validation issue recording.
//!
//! Every stage reports what it finds into an [`IssueLog`] instead of
//! returning `Err`: a malformed block or a missing header is a finding about
//! the documentation, not a failure of the tool. A run passes when no
//! [`Severity::Error`] was recorded anywhere; warnings and messages never
//! fail a run.
//!
//! Logs can be scoped to a context (usually a file name or a resource name)
//! with [`IssueLog::scoped`]; the scoped log's issues carry that context and
//! are folded back into the parent with [`IssueLog::absorb`].

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Message,
}

/// Stable identifiers for every kind of finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCode {
    // Structural parse errors
    MetadataParseError,
    UnknownBlockType,
    MissingResourceName,
    JsonWithoutMetadata,
    ResourceJsonInvalid,
    ResponseWithoutRequest,
    RequestNotFound,
    DuplicateResponse,
    RequestParseError,
    DuplicatePageAnnotation,
    TableParseError,
    UnrecognizedTable,
    // Types and merging
    TypeParseFallback,
    TypeSpecificityDowngrade,
    ParameterTypeMismatch,
    AdditionalPropertyDetected,
    PropertyMissingFromTable,
    MultipleResourcesInDocument,
    AmbiguousTableMapping,
    UnusedTable,
    NamespaceMismatch,
    PossibleUndeclaredEnum,
    MissingEnumDeclaration,
    // Inheritance
    ResourceNameCaseMismatch,
    BaseTypeConflict,
    CircularBaseType,
    UnresolvedTypeReference,
    // Outline
    RequiredHeaderMissing,
    HeaderWrongCase,
    MisspelledHeader,
    HeaderInWrongPosition,
    MisspelledHeaderInWrongPosition,
    ExtraHeaderFound,
    // Links
    LinkExternalSkipped,
    LinkBookmarkMissing,
    LinkBookmarkSkipped,
    LinkDestinationNotFound,
    LinkOutsideDocSet,
    LinkFormatInvalid,
    OrphanedPage,
    // Document set
    EmptyDocSet,
    DocumentReadError,
    Info,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::MetadataParseError => "metadata-parse-error",
            IssueCode::UnknownBlockType => "unknown-block-type",
            IssueCode::MissingResourceName => "missing-resource-name",
            IssueCode::JsonWithoutMetadata => "json-without-metadata",
            IssueCode::ResourceJsonInvalid => "resource-json-invalid",
            IssueCode::ResponseWithoutRequest => "response-without-request",
            IssueCode::RequestNotFound => "request-not-found",
            IssueCode::DuplicateResponse => "duplicate-response",
            IssueCode::RequestParseError => "request-parse-error",
            IssueCode::DuplicatePageAnnotation => "duplicate-page-annotation",
            IssueCode::TableParseError => "table-parse-error",
            IssueCode::UnrecognizedTable => "unrecognized-table",
            IssueCode::TypeParseFallback => "type-parse-fallback",
            IssueCode::TypeSpecificityDowngrade => "type-specificity-downgrade",
            IssueCode::ParameterTypeMismatch => "parameter-type-mismatch",
            IssueCode::AdditionalPropertyDetected => "additional-property-detected",
            IssueCode::PropertyMissingFromTable => "property-missing-from-table",
            IssueCode::MultipleResourcesInDocument => "multiple-resources-in-document",
            IssueCode::AmbiguousTableMapping => "ambiguous-table-mapping",
            IssueCode::UnusedTable => "unused-table",
            IssueCode::NamespaceMismatch => "namespace-mismatch",
            IssueCode::PossibleUndeclaredEnum => "possible-undeclared-enum",
            IssueCode::MissingEnumDeclaration => "missing-enum-declaration",
            IssueCode::ResourceNameCaseMismatch => "resource-name-case-mismatch",
            IssueCode::BaseTypeConflict => "base-type-conflict",
            IssueCode::CircularBaseType => "circular-base-type",
            IssueCode::UnresolvedTypeReference => "unresolved-type-reference",
            IssueCode::RequiredHeaderMissing => "required-header-missing",
            IssueCode::HeaderWrongCase => "header-wrong-case",
            IssueCode::MisspelledHeader => "misspelled-header",
            IssueCode::HeaderInWrongPosition => "header-in-wrong-position",
            IssueCode::MisspelledHeaderInWrongPosition => "misspelled-header-in-wrong-position",
            IssueCode::ExtraHeaderFound => "extra-header-found",
            IssueCode::LinkExternalSkipped => "link-external-skipped",
            IssueCode::LinkBookmarkMissing => "link-bookmark-missing",
            IssueCode::LinkBookmarkSkipped => "link-bookmark-skipped",
            IssueCode::LinkDestinationNotFound => "link-destination-not-found",
            IssueCode::LinkOutsideDocSet => "link-outside-doc-set",
            IssueCode::LinkFormatInvalid => "link-format-invalid",
            IssueCode::OrphanedPage => "orphaned-page",
            IssueCode::EmptyDocSet => "empty-doc-set",
            IssueCode::DocumentReadError => "document-read-error",
            IssueCode::Info => "info",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub code: IssueCode,
    /// Where the issue was found (file, resource, method), outermost first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub message: String,
    /// Further pages the issue concerns, for findings that span pages.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<String>,
}

impl Issue {
    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            source: None,
            message: message.into(),
            pages: Vec::new(),
        }
    }

    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            source: None,
            message: message.into(),
            pages: Vec::new(),
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Message,
            code: IssueCode::Info,
            source: None,
            message: text.into(),
            pages: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_pages<I, S>(mut self, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pages = pages.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the issue was found on `page` or names it among its pages.
    pub fn concerns(&self, page: &str) -> bool {
        let on_page = self
            .source
            .as_deref()
            .is_some_and(|s| s == page || s.starts_with(&format!("{page} > ")));
        on_page || self.pages.iter().any(|p| p == page)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Message => "note",
        };
        match &self.source {
            Some(source) => write!(f, "{label}[{}] {source}: {}", self.code, self.message),
            None => write!(f, "{label}[{}] {}", self.code, self.message),
        }
    }
}

/// Ordered collection of issues with an optional context name.
#[derive(Debug, Clone, Default)]
pub struct IssueLog {
    context: Option<String>,
    issues: Vec<Issue>,
}

impl IssueLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh log whose issues are attributed to `context`, nested under
    /// this log's own context if it has one.
    pub fn scoped(&self, context: impl AsRef<str>) -> IssueLog {
        let context = match &self.context {
            Some(parent) => format!("{parent} > {}", context.as_ref()),
            None => context.as_ref().to_string(),
        };
        IssueLog {
            context: Some(context),
            issues: Vec::new(),
        }
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn error(&mut self, code: IssueCode, message: impl Into<String>) {
        self.record(Issue::error(code, message));
    }

    pub fn warning(&mut self, code: IssueCode, message: impl Into<String>) {
        self.record(Issue::warning(code, message));
    }

    pub fn message(&mut self, text: impl Into<String>) {
        self.record(Issue::message(text));
    }

    /// Record an issue, attributing it to this log's context when the issue
    /// has no source of its own.
    pub fn record(&mut self, mut issue: Issue) {
        if issue.source.is_none() {
            issue.source = self.context.clone();
        }
        tracing::debug!(
            code = %issue.code,
            source = issue.source.as_deref().unwrap_or(""),
            "{}",
            issue.message
        );
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.record(issue);
        }
    }

    /// Fold a scoped child log back into this one, keeping its attribution.
    pub fn absorb(&mut self, child: IssueLog) {
        self.issues.extend(child.issues);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_warning())
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(Issue::is_error)
    }

    pub fn has_code(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }
}
