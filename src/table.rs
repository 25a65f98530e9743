//! Table interpretation.
//!
//! A Markdown table means whatever the heading above it says it means:
//! "Path parameters", "Properties", "Error codes". Classification tries the
//! configured heading rules against the nearest heading first and falls back
//! to the table's column headers. Each row then becomes a typed record using
//! the configured column synonyms.
//!
//! Tables that cannot be classified are kept as [`TableKind::Unknown`] so the
//! merger can still report them as unused.

use crate::block::{TableShape, strip_cell};
use crate::config::{ColumnSynonyms, SchemaConfig};
use crate::datatype::{ParameterDataType, TypeResolver};
use crate::issues::{Issue, IssueCode, IssueLog};
use crate::parameter::{ParameterDefinition, ParameterLocation};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableKind {
    Unknown,
    ErrorCodes,
    PathParameters,
    QueryParameters,
    Headers,
    ResponseHeaders,
    RequestBody,
    Properties,
    NavigationProperties,
    AuthScopes,
    EnumValues,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Unknown => "unknown",
            TableKind::ErrorCodes => "error-codes",
            TableKind::PathParameters => "path-parameters",
            TableKind::QueryParameters => "query-parameters",
            TableKind::Headers => "headers",
            TableKind::ResponseHeaders => "response-headers",
            TableKind::RequestBody => "request-body",
            TableKind::Properties => "properties",
            TableKind::NavigationProperties => "navigation-properties",
            TableKind::AuthScopes => "auth-scopes",
            TableKind::EnumValues => "enum-values",
        }
    }

    /// Where the parameters of a parameter-shaped table live.
    pub fn parameter_location(&self) -> Option<ParameterLocation> {
        match self {
            TableKind::PathParameters => Some(ParameterLocation::Path),
            TableKind::QueryParameters => Some(ParameterLocation::QueryString),
            TableKind::Headers | TableKind::ResponseHeaders => Some(ParameterLocation::Header),
            TableKind::RequestBody | TableKind::Properties | TableKind::NavigationProperties => {
                Some(ParameterLocation::JsonObject)
            }
            TableKind::Unknown
            | TableKind::ErrorCodes
            | TableKind::AuthScopes
            | TableKind::EnumValues => None,
        }
    }

    /// Tables describing the properties of a resource.
    pub fn describes_properties(&self) -> bool {
        matches!(self, TableKind::Properties | TableKind::NavigationProperties)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDefinition {
    pub code: String,
    pub http_status: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthScopeDefinition {
    pub scope: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub required: Option<bool>,
}

/// One member of an enumeration type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationDefinition {
    /// Filled in once the page's namespace is known.
    pub namespace: Option<String>,
    pub type_name: String,
    pub member_name: String,
    pub description: Option<String>,
}

impl EnumerationDefinition {
    /// `namespace.typeName`, or the bare type name without a namespace.
    pub fn identifier(&self) -> String {
        match &self.namespace {
            Some(ns) if !self.type_name.contains('.') => format!("{ns}.{}", self.type_name),
            _ => self.type_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableRows {
    Parameters(Vec<ParameterDefinition>),
    Errors(Vec<ErrorDefinition>),
    AuthScopes(Vec<AuthScopeDefinition>),
    Enumerations(Vec<EnumerationDefinition>),
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub kind: TableKind,
    /// Title of the heading the table was classified under, if any.
    pub title: Option<String>,
    pub rows: TableRows,
    pub line: usize,
    /// Identifiers of the resources and methods this table was merged into.
    pub used_by: Vec<String>,
}

impl TableDefinition {
    pub fn parameters(&self) -> &[ParameterDefinition] {
        match &self.rows {
            TableRows::Parameters(params) => params,
            _ => &[],
        }
    }

    pub fn errors(&self) -> &[ErrorDefinition] {
        match &self.rows {
            TableRows::Errors(errors) => errors,
            _ => &[],
        }
    }

    pub fn enumerations(&self) -> &[EnumerationDefinition] {
        match &self.rows {
            TableRows::Enumerations(members) => members,
            _ => &[],
        }
    }

    pub fn mark_used_by(&mut self, identifier: impl Into<String>) {
        let identifier = identifier.into();
        if !self.used_by.contains(&identifier) {
            self.used_by.push(identifier);
        }
    }

    pub fn is_used(&self) -> bool {
        !self.used_by.is_empty()
    }
}

/// Classifies tables and converts their rows.
pub struct TableInterpreter<'a> {
    config: &'a SchemaConfig,
    resolver: TypeResolver<'a>,
}

impl<'a> TableInterpreter<'a> {
    pub fn new(config: &'a SchemaConfig) -> Self {
        Self {
            config,
            resolver: TypeResolver::new(config),
        }
    }

    fn columns(&self) -> &ColumnSynonyms {
        &self.config.tables.columns
    }

    /// Decide a table's kind from the nearest heading, then from its shape.
    pub fn classify(&self, shape: &TableShape, header_chain: &[&str]) -> TableKind {
        if let Some(nearest) = header_chain.first() {
            let title = nearest.to_lowercase();
            let rule = self
                .config
                .tables
                .headers
                .iter()
                .find(|rule| rule.matches(&title));
            if let Some(rule) = rule {
                return rule.kind;
            }
        }
        self.classify_by_shape(shape)
    }

    fn classify_by_shape(&self, shape: &TableShape) -> TableKind {
        let columns = self.columns();
        let has = |synonyms: &[String]| shape.column_index(synonyms).is_some();

        if has(&columns.error_code) && (has(&columns.http_status) || has(&columns.description)) {
            TableKind::ErrorCodes
        } else if has(&columns.scope) {
            TableKind::AuthScopes
        } else if has(&columns.member) {
            TableKind::EnumValues
        } else if has(&columns.header) {
            TableKind::Headers
        } else if has(&columns.name) && has(&columns.data_type) {
            TableKind::Properties
        } else {
            TableKind::Unknown
        }
    }

    /// Classify `shape` and convert its rows.
    ///
    /// `header_chain` lists the titles of the open headings, nearest first.
    /// Parse problems are recorded in `log`; a table is always returned.
    pub fn classify_and_parse(
        &self,
        shape: &TableShape,
        header_chain: &[&str],
        line: usize,
        log: &mut IssueLog,
    ) -> TableDefinition {
        let kind = self.classify(shape, header_chain);
        let title = header_chain.first().map(|t| t.to_string());
        let rows = match kind {
            TableKind::Unknown => {
                log.record(Issue {
                    code: IssueCode::UnrecognizedTable,
                    ..Issue::message(format!(
                        "Table on line {line} with columns [{}] was not recognized",
                        shape.headers.join(", ")
                    ))
                });
                TableRows::Unknown
            }
            TableKind::ErrorCodes => self.parse_errors(shape, line, log),
            TableKind::AuthScopes => self.parse_auth_scopes(shape, line, log),
            TableKind::EnumValues => self.parse_enumerations(shape, header_chain, line, log),
            TableKind::PathParameters
            | TableKind::QueryParameters
            | TableKind::Headers
            | TableKind::ResponseHeaders
            | TableKind::RequestBody
            | TableKind::Properties
            | TableKind::NavigationProperties => self.parse_parameters(shape, kind, line, log),
        };
        TableDefinition {
            kind,
            title,
            rows,
            line,
            used_by: Vec::new(),
        }
    }

    fn parse_parameters(
        &self,
        shape: &TableShape,
        kind: TableKind,
        line: usize,
        log: &mut IssueLog,
    ) -> TableRows {
        let columns = self.columns();
        let name_column = if matches!(kind, TableKind::Headers | TableKind::ResponseHeaders) {
            shape
                .column_index(&columns.header)
                .or_else(|| shape.column_index(&columns.name))
        } else {
            shape.column_index(&columns.name)
        };
        let Some(name_column) = name_column else {
            log.error(
                IssueCode::TableParseError,
                format!("{kind} table on line {line} has no name column"),
            );
            return TableRows::Unknown;
        };
        let type_column = shape.column_index(&columns.data_type);
        let description_column = shape.column_index(&columns.description);
        let required_column = shape.column_index(&columns.required);
        let location = kind
            .parameter_location()
            .unwrap_or(ParameterLocation::JsonObject);

        let mut params = Vec::new();
        for row in &shape.rows {
            let name = strip_cell(cell(row, Some(name_column)));
            if name.is_empty() {
                continue;
            }
            let type_text = cell(row, type_column);
            let data_type = if strip_cell(type_text).is_empty() {
                ParameterDataType::STRING
            } else {
                self.resolver.parse_type(type_text, false, None, log)
            };
            let description = non_empty(strip_cell(cell(row, description_column)));
            let required = required_column
                .and_then(|c| parse_flag(&strip_cell(cell(row, Some(c)))))
                .or_else(|| description.as_deref().and_then(required_from_description));

            let mut param = ParameterDefinition::new(name, data_type, location);
            param.description = description;
            param.required = required;
            param.optional = required.map(|r| !r);
            param.original_value = non_empty(type_text.trim().to_string());
            param.is_navigatable = kind == TableKind::NavigationProperties;
            params.push(param);
        }
        TableRows::Parameters(params)
    }

    fn parse_errors(&self, shape: &TableShape, line: usize, log: &mut IssueLog) -> TableRows {
        let columns = self.columns();
        let Some(code_column) = shape.column_index(&columns.error_code) else {
            log.error(
                IssueCode::TableParseError,
                format!("Error table on line {line} has no error code column"),
            );
            return TableRows::Unknown;
        };
        let status_column = shape.column_index(&columns.http_status);
        let description_column = shape.column_index(&columns.description);
        let errors = shape
            .rows
            .iter()
            .filter_map(|row| {
                let code = strip_cell(cell(row, Some(code_column)));
                (!code.is_empty()).then(|| ErrorDefinition {
                    code,
                    http_status: non_empty(strip_cell(cell(row, status_column))),
                    description: non_empty(strip_cell(cell(row, description_column))),
                })
            })
            .collect();
        TableRows::Errors(errors)
    }

    fn parse_auth_scopes(&self, shape: &TableShape, line: usize, log: &mut IssueLog) -> TableRows {
        let columns = self.columns();
        let Some(scope_column) = shape
            .column_index(&columns.scope)
            .or_else(|| shape.column_index(&columns.name))
        else {
            log.error(
                IssueCode::TableParseError,
                format!("Permissions table on line {line} has no scope column"),
            );
            return TableRows::Unknown;
        };
        let title_column = shape.column_index(&columns.scope_title);
        let description_column = shape.column_index(&columns.description);
        let required_column = shape.column_index(&columns.required);
        let scopes = shape
            .rows
            .iter()
            .filter_map(|row| {
                let scope = strip_cell(cell(row, Some(scope_column)));
                if scope.is_empty() {
                    return None;
                }
                let description = non_empty(strip_cell(cell(row, description_column)));
                let required = required_column
                    .and_then(|c| parse_flag(&strip_cell(cell(row, Some(c)))))
                    .or_else(|| description.as_deref().and_then(required_from_description));
                Some(AuthScopeDefinition {
                    scope,
                    title: non_empty(strip_cell(cell(row, title_column))),
                    description,
                    required,
                })
            })
            .collect();
        TableRows::AuthScopes(scopes)
    }

    fn parse_enumerations(
        &self,
        shape: &TableShape,
        header_chain: &[&str],
        line: usize,
        log: &mut IssueLog,
    ) -> TableRows {
        let columns = self.columns();
        let Some(member_column) = shape
            .column_index(&columns.member)
            .or_else(|| shape.column_index(&columns.value))
            .or_else(|| shape.column_index(&columns.name))
        else {
            log.error(
                IssueCode::TableParseError,
                format!("Enumeration table on line {line} has no member column"),
            );
            return TableRows::Unknown;
        };
        let Some(type_name) = header_chain.first().map(|t| enum_type_name(t)) else {
            log.error(
                IssueCode::TableParseError,
                format!("Enumeration table on line {line} has no heading naming its type"),
            );
            return TableRows::Unknown;
        };
        let description_column = shape.column_index(&columns.description);
        let members = shape
            .rows
            .iter()
            .filter_map(|row| {
                let member_name = strip_cell(cell(row, Some(member_column)));
                (!member_name.is_empty()).then(|| EnumerationDefinition {
                    namespace: None,
                    type_name: type_name.clone(),
                    member_name,
                    description: non_empty(strip_cell(cell(row, description_column))),
                })
            })
            .collect();
        TableRows::Enumerations(members)
    }
}

fn cell(row: &[String], column: Option<usize>) -> &str {
    column
        .and_then(|c| row.get(c))
        .map(String::as_str)
        .unwrap_or("")
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.to_lowercase().as_str() {
        "yes" | "true" | "required" | "y" => Some(true),
        "no" | "false" | "optional" | "n" => Some(false),
        _ => None,
    }
}

/// Descriptions conventionally start with "Required." or "Optional.".
fn required_from_description(description: &str) -> Option<bool> {
    let lower = description.trim_start().to_lowercase();
    if lower.starts_with("required.") || lower.starts_with("required ") || lower == "required" {
        Some(true)
    } else if lower.starts_with("optional") {
        Some(false)
    } else {
        None
    }
}

/// `colorName values`, `colorName enum values` → `colorName`.
fn enum_type_name(heading: &str) -> String {
    let mut name = strip_cell(heading).trim().to_string();
    while let Some(suffix) = [" values", " enum", " enumeration"]
        .iter()
        .find(|suffix| name.to_ascii_lowercase().ends_with(*suffix))
    {
        name.truncate(name.len() - suffix.len());
        name = name.trim_end().to_string();
    }
    name
}
