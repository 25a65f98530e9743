//! Methods: documented request/response pairs.

use crate::annotation::CodeBlockAnnotation;
use crate::parameter::ParameterDefinition;
use crate::resource::BlockContext;
use crate::table::ErrorDefinition;
use regex::Regex;
use std::sync::LazyLock;

static REQUEST_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)\s+(\S+)(?:\s+(HTTP/\d(?:\.\d)?))?\s*$").expect("valid request line")
});
static FUNCTION_ARGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]+\)").expect("valid argument pattern"));

/// Verb and target of an HTTP request's first line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub http_version: Option<String>,
}

impl RequestLine {
    /// Parse the first non-empty line of `request`.
    pub fn parse(request: &str) -> Option<Self> {
        let first = request.lines().map(str::trim).find(|l| !l.is_empty())?;
        let captures = REQUEST_LINE.captures(first)?;
        Some(RequestLine {
            method: captures[1].to_uppercase(),
            target: captures[2].to_string(),
            http_version: captures.get(3).map(|m| m.as_str().to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDefinition {
    pub identifier: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub request: String,
    pub response: Option<String>,
    pub response_annotation: Option<CodeBlockAnnotation>,
    pub simulated_response: Option<String>,
    pub test_params: Vec<String>,
    pub scopes: Vec<String>,
    pub api_versions: Vec<String>,
    pub tags: Vec<String>,
    pub expect_error: bool,
    pub errors: Vec<ErrorDefinition>,
    /// Path, query and header parameters.
    pub parameters: Vec<ParameterDefinition>,
    pub request_body_parameters: Vec<ParameterDefinition>,
    pub source_file: String,
    pub line: usize,
}

impl MethodDefinition {
    pub fn from_request(
        identifier: impl Into<String>,
        request: &str,
        annotation: &CodeBlockAnnotation,
        context: &BlockContext,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            title: context.title.clone(),
            description: context.description.clone(),
            request: request.to_string(),
            response: None,
            response_annotation: None,
            simulated_response: None,
            test_params: Vec::new(),
            scopes: annotation.scopes.clone(),
            api_versions: annotation.api_versions.clone(),
            tags: annotation.tags.clone(),
            expect_error: annotation.expect_error,
            errors: Vec::new(),
            parameters: Vec::new(),
            request_body_parameters: Vec::new(),
            source_file: context.source_file.clone(),
            line: context.line,
        }
    }

    pub fn request_line(&self) -> Option<RequestLine> {
        RequestLine::parse(&self.request)
    }

    /// Route of the request with every variable part replaced by `{var}`.
    /// Two methods sharing a route describe the same operation.
    pub fn logical_route(&self) -> Option<String> {
        self.request_line().map(|line| logical_route(&line.target))
    }
}

/// Normalize a request target to a logical route.
///
/// Drops scheme, host, query and fragment. `{placeholders}`, quoted or
/// numeric key segments, GUIDs and function arguments become `{var}`.
/// Literal segments are lowercased.
pub fn logical_route(target: &str) -> String {
    let path = match target.find("://") {
        Some(scheme_end) => {
            let after_scheme = &target[scheme_end + 3..];
            after_scheme.find('/').map_or("/", |slash| &after_scheme[slash..])
        }
        None => target,
    };
    let path = path.split(['?', '#']).next().unwrap_or("");

    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(normalize_segment)
        .collect();
    format!("/{}", segments.join("/"))
}

fn normalize_segment(segment: &str) -> String {
    let is_variable = (segment.starts_with('{') && segment.ends_with('}'))
        || (segment.starts_with('\'') && segment.ends_with('\''))
        || segment.starts_with(|c: char| c.is_ascii_digit())
        || uuid::Uuid::parse_str(segment).is_ok();
    if is_variable {
        return "{var}".to_string();
    }
    FUNCTION_ARGS
        .replace_all(&segment.to_lowercase(), "({var})")
        .into_owned()
}
