//! JSON annotations carried in HTML comments.
//!
//! Two kinds exist. A comment directly before a code block describes that
//! block (`{"blockType": "resource", "@odata.type": "foo.item"}`). A free
//! standing comment whose `type` is `#page.annotation` describes the page.

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

pub const PAGE_ANNOTATION_TYPE: &str = "#page.annotation";

/// What an annotated code block contains. Every dispatch site matches this
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeBlockKind {
    Resource,
    Request,
    Response,
    Example,
    Samples,
    SimulatedResponse,
    TestParams,
    Ignored,
}

impl CodeBlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeBlockKind::Resource => "resource",
            CodeBlockKind::Request => "request",
            CodeBlockKind::Response => "response",
            CodeBlockKind::Example => "example",
            CodeBlockKind::Samples => "samples",
            CodeBlockKind::SimulatedResponse => "simulatedResponse",
            CodeBlockKind::TestParams => "testParams",
            CodeBlockKind::Ignored => "ignored",
        }
    }
}

impl fmt::Display for CodeBlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBlockKind(pub String);

impl fmt::Display for UnknownBlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown blockType '{}'", self.0)
    }
}

impl std::error::Error for UnknownBlockKind {}

impl FromStr for CodeBlockKind {
    type Err = UnknownBlockKind;

    /// Case-insensitive; `-` and `_` separators are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "resource" => Ok(CodeBlockKind::Resource),
            "request" => Ok(CodeBlockKind::Request),
            "response" => Ok(CodeBlockKind::Response),
            "example" => Ok(CodeBlockKind::Example),
            "samples" | "sample" => Ok(CodeBlockKind::Samples),
            "simulatedresponse" => Ok(CodeBlockKind::SimulatedResponse),
            "testparams" => Ok(CodeBlockKind::TestParams),
            "ignored" | "ignore" => Ok(CodeBlockKind::Ignored),
            _ => Err(UnknownBlockKind(s.to_string())),
        }
    }
}

/// Metadata for the code block that follows the comment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodeBlockAnnotation {
    pub block_type: Option<String>,
    #[serde(rename = "@odata.type", alias = "resourceType")]
    pub resource_type: Option<String>,
    /// Request names declared by a request block or referenced by a response.
    #[serde(alias = "methodName", deserialize_with = "one_or_many")]
    pub name: Vec<String>,
    pub optional_properties: Vec<String>,
    pub navigation_properties: Vec<String>,
    pub key_property: Option<String>,
    pub base_type: Option<String>,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    pub open_type: bool,
    pub is_collection: bool,
    pub truncated: bool,
    pub expect_error: bool,
    #[serde(deserialize_with = "word_list")]
    pub scopes: Vec<String>,
    #[serde(deserialize_with = "word_list")]
    pub api_versions: Vec<String>,
    #[serde(deserialize_with = "word_list")]
    pub tags: Vec<String>,
}

impl CodeBlockAnnotation {
    /// Parse the JSON inside an HTML comment.
    pub fn parse(comment: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(strip_comment(comment))
    }

    /// The declared block kind. A missing `blockType` is reported as an
    /// empty unknown kind.
    pub fn kind(&self) -> Result<CodeBlockKind, UnknownBlockKind> {
        self.block_type.as_deref().unwrap_or("").parse()
    }
}

/// Page-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageAnnotation {
    #[serde(rename = "type")]
    pub annotation_type: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "word_list")]
    pub keywords: Vec<String>,
    pub section: Option<String>,
    pub toc_path: Option<String>,
    pub namespace: Option<String>,
}

impl PageAnnotation {
    /// Parse a comment as a page annotation. Comments that are not JSON or
    /// carry a different `type` are not page annotations.
    pub fn parse(comment: &str) -> Option<Self> {
        let annotation: PageAnnotation = serde_json::from_str(strip_comment(comment)).ok()?;
        annotation
            .annotation_type
            .eq_ignore_ascii_case(PAGE_ANNOTATION_TYPE)
            .then_some(annotation)
    }

    pub fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

/// The text between `<!--` and `-->`, trimmed.
pub fn strip_comment(comment: &str) -> &str {
    let trimmed = comment.trim();
    let trimmed = trimmed.strip_prefix("<!--").unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("-->").unwrap_or(trimmed);
    trimmed.trim()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) if s.trim().is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s.trim().to_string()],
        Some(OneOrMany::Many(list)) => list,
    })
}

/// A list, or a single string of whitespace/comma separated words.
fn word_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect(),
        Some(OneOrMany::Many(list)) => list,
    })
}
