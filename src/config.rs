//! Schema configuration module.
//!
//! Handles loading, validating, and merging `apidocs.toml`. The file is
//! optional: stock defaults cover the common REST documentation layout and a
//! doc set only needs to override what differs.
//!
//! ## Config File Location
//!
//! Place `apidocs.toml` at the root of the documentation set:
//!
//! ```text
//! docs/
//! ├── apidocs.toml             # Schema config (overrides stock defaults)
//! ├── index.md
//! ├── resources/
//! │   └── driveitem.md
//! └── api/
//!     └── driveitem-get.md
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! default_namespace = "microsoft.graph"   # Qualifies bare type names
//! type_name_exclusions = ["ETag"]        # Names never lower-camel-cased
//! description_boilerplate_prefixes = ["Namespace:"]
//!
//! [tables]
//! headers = [{ match = "Path parameters", kind = "path-parameters" }]
//!
//! [tables.columns]
//! name = ["Property", "Name"]
//!
//! [[outlines.resource]]
//! level = 1
//! title = "* resource type"
//! required = true
//!
//! [links]
//! warn_on_external = false
//! toc_roots = ["index.md"]
//!
//! [processing]
//! max_processes = 4
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Tables merge key-by-key; arrays (synonym lists,
//! header rules, outline templates) replace the stock value entirely.
//!
//! Unknown keys are rejected to catch typos early.

use crate::outline::{Condition, ExpectedHeader, OutlineItem};
use crate::table::TableKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up at the doc-set root.
pub const CONFIG_FILE_NAME: &str = "apidocs.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Schema configuration for a documentation set.
///
/// Constructed once per run and passed by reference to every component that
/// needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    /// Namespace used for bare type names and pages that neither declare nor
    /// imply one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_namespace: Option<String>,
    /// Type names that keep their capitalization when normalized.
    pub type_name_exclusions: Vec<String>,
    /// Paragraph prefixes that never become a page or method description.
    pub description_boilerplate_prefixes: Vec<String>,
    /// Table classification rules and column synonyms.
    pub tables: TablesConfig,
    /// Expected header outlines per page type.
    pub outlines: OutlinesConfig,
    /// Link validation settings.
    pub links: LinksConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            default_namespace: None,
            type_name_exclusions: Vec::new(),
            description_boilerplate_prefixes: strings(&["Namespace:", "[!INCLUDE"]),
            tables: TablesConfig::default(),
            outlines: OutlinesConfig::default(),
            links: LinksConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SchemaConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ns) = &self.default_namespace
            && (ns.is_empty() || ns.starts_with('.') || ns.ends_with('.'))
        {
            return Err(ConfigError::Validation(format!(
                "default_namespace '{ns}' is not a dotted identifier"
            )));
        }
        if self.tables.columns.name.is_empty() {
            return Err(ConfigError::Validation(
                "tables.columns.name must not be empty".into(),
            ));
        }
        if let Some(rule) = self.tables.headers.iter().find(|r| r.pattern.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "tables.headers rule for '{}' has an empty match",
                rule.kind
            )));
        }
        for (page_type, items) in [
            ("resource", &self.outlines.resource),
            ("api", &self.outlines.api),
        ] {
            validate_outline(page_type, items)?;
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Whether a paragraph is page boilerplate rather than a description.
    pub fn is_boilerplate(&self, paragraph: &str) -> bool {
        let text = paragraph.trim_start();
        self.description_boilerplate_prefixes
            .iter()
            .any(|p| text.starts_with(p.as_str()))
    }
}

fn validate_outline(page_type: &str, items: &[OutlineItem]) -> Result<(), ConfigError> {
    for item in items {
        match item {
            OutlineItem::Condition { arguments, .. } => {
                if arguments.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "outlines.{page_type}: condition group has no arguments"
                    )));
                }
                validate_outline(page_type, arguments)?;
            }
            OutlineItem::Header(header) => {
                if !(1..=6).contains(&header.level) {
                    return Err(ConfigError::Validation(format!(
                        "outlines.{page_type}: header '{}' has level {} (must be 1-6)",
                        header.title, header.level
                    )));
                }
                validate_outline(page_type, &header.children)?;
            }
        }
    }
    Ok(())
}

/// Table classification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TablesConfig {
    /// Header-title rules, checked in order against the nearest heading.
    pub headers: Vec<HeaderRule>,
    /// Column-name synonyms per logical field.
    pub columns: ColumnSynonyms,
}

impl Default for TablesConfig {
    fn default() -> Self {
        let rule = |pattern: &str, kind| HeaderRule {
            pattern: pattern.to_string(),
            kind,
            exact: false,
        };
        Self {
            headers: vec![
                rule("Path parameters", TableKind::PathParameters),
                rule("Query parameters", TableKind::QueryParameters),
                rule("Request headers", TableKind::Headers),
                rule("Response headers", TableKind::ResponseHeaders),
                rule("Request body", TableKind::RequestBody),
                rule("Relationships", TableKind::NavigationProperties),
                rule("Properties", TableKind::Properties),
                rule("Error", TableKind::ErrorCodes),
                rule("Permissions", TableKind::AuthScopes),
                rule("Enum values", TableKind::EnumValues),
                HeaderRule {
                    pattern: "Values".to_string(),
                    kind: TableKind::EnumValues,
                    exact: true,
                },
            ],
            columns: ColumnSynonyms::default(),
        }
    }
}

/// Maps a substring of a heading title to a table kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderRule {
    /// Case-insensitive substring of the heading title.
    #[serde(rename = "match")]
    pub pattern: String,
    pub kind: TableKind,
    /// Match the whole heading instead of a substring.
    #[serde(default)]
    pub exact: bool,
}

impl HeaderRule {
    /// Whether the rule applies to a lower-cased heading title.
    pub fn matches(&self, title: &str) -> bool {
        let pattern = self.pattern.trim().to_lowercase();
        if self.exact {
            title.trim() == pattern
        } else {
            title.contains(&pattern)
        }
    }
}

/// Column header synonyms, tried in order, per logical table field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnSynonyms {
    pub name: Vec<String>,
    #[serde(rename = "type")]
    pub data_type: Vec<String>,
    pub description: Vec<String>,
    pub required: Vec<String>,
    pub error_code: Vec<String>,
    pub http_status: Vec<String>,
    pub scope: Vec<String>,
    pub scope_title: Vec<String>,
    pub member: Vec<String>,
    pub value: Vec<String>,
    pub header: Vec<String>,
}

impl Default for ColumnSynonyms {
    fn default() -> Self {
        Self {
            name: strings(&["Parameter Name", "Property Name", "Name", "Parameter", "Property"]),
            data_type: strings(&["Type", "Data Type"]),
            description: strings(&["Description", "Notes"]),
            required: strings(&["Required"]),
            error_code: strings(&["Error Code", "Code", "Error"]),
            http_status: strings(&["HTTP Status", "HTTP Status Code", "Status Code"]),
            scope: strings(&["Scope", "Scope Name", "Permission"]),
            scope_title: strings(&["Title", "Display Name"]),
            member: strings(&["Member", "Enum Value"]),
            value: strings(&["Value"]),
            header: strings(&["Header", "Header Name"]),
        }
    }
}

/// Expected header outlines per page type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutlinesConfig {
    /// Outline for pages documenting a resource type.
    pub resource: Vec<OutlineItem>,
    /// Outline for pages documenting API methods.
    pub api: Vec<OutlineItem>,
}

impl Default for OutlinesConfig {
    fn default() -> Self {
        Self {
            resource: vec![header(
                1,
                "* resource type",
                true,
                vec![
                    header(2, "Methods", false, vec![]),
                    header(2, "Properties", true, vec![]),
                    header(2, "Relationships", false, vec![]),
                    header(2, "JSON representation", true, vec![]),
                ],
            )],
            api: vec![header(
                1,
                "*",
                true,
                vec![
                    header(2, "Permissions", false, vec![]),
                    header(2, "HTTP request", true, vec![]),
                    header(2, "Optional query parameters", false, vec![]),
                    header(2, "Request headers", true, vec![]),
                    header(2, "Request body", true, vec![]),
                    header(2, "Response", true, vec![]),
                    OutlineItem::Condition {
                        condition: Condition::Or,
                        arguments: vec![
                            example_section("Examples"),
                            example_section("Example"),
                        ],
                    },
                ],
            )],
        }
    }
}

fn header(level: u8, title: &str, required: bool, children: Vec<OutlineItem>) -> OutlineItem {
    OutlineItem::Header(ExpectedHeader {
        level,
        title: title.to_string(),
        required,
        allow_multiple: false,
        children,
    })
}

fn example_section(title: &str) -> OutlineItem {
    header(
        2,
        title,
        true,
        vec![
            header(3, "Request", true, vec![]),
            header(3, "Response", true, vec![]),
        ],
    )
}

/// Link validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinksConfig {
    /// Record a warning for every external link that was not validated.
    pub warn_on_external: bool,
    /// Pages that are entry points and never reported as orphaned.
    pub toc_roots: Vec<String>,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            warn_on_external: false,
            toc_roots: strings(&["index.md", "README.md"]),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel document workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SchemaConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SchemaConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SchemaConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `apidocs.toml` in the given doc-set root.
pub fn load_config(root: &Path) -> Result<SchemaConfig, ConfigError> {
    load_config_file(&root.join(CONFIG_FILE_NAME))
}

/// Load config from an explicit file path, falling back to stock defaults
/// when the file does not exist.
pub fn load_config_file(path: &Path) -> Result<SchemaConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `apidocs.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# apidocs-check configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Tables merge key-by-key with the defaults; arrays replace the default
# array entirely. Unknown keys will cause an error.

# Namespace that qualifies bare type names ("driveItem" -> "ns.driveItem")
# and is used for pages that neither declare nor imply a namespace.
# default_namespace = "microsoft.graph"

# Type names that keep their capitalization when normalized.
type_name_exclusions = []

# Paragraphs starting with these prefixes are never used as a description.
description_boilerplate_prefixes = ["Namespace:", "[!INCLUDE"]

# ---------------------------------------------------------------------------
# Tables
# ---------------------------------------------------------------------------
[tables]
# The nearest heading above a table is matched (case-insensitive substring,
# or the whole heading with exact = true) against these rules in order. The
# first match decides the table kind.
# Kinds: error-codes, path-parameters, query-parameters, headers,
# response-headers, request-body, properties, navigation-properties,
# auth-scopes, enum-values.
headers = [
    { match = "Path parameters", kind = "path-parameters" },
    { match = "Query parameters", kind = "query-parameters" },
    { match = "Request headers", kind = "headers" },
    { match = "Response headers", kind = "response-headers" },
    { match = "Request body", kind = "request-body" },
    { match = "Relationships", kind = "navigation-properties" },
    { match = "Properties", kind = "properties" },
    { match = "Error", kind = "error-codes" },
    { match = "Permissions", kind = "auth-scopes" },
    { match = "Enum values", kind = "enum-values" },
    { match = "Values", kind = "enum-values", exact = true },
]

# Column header synonyms per logical field, tried in order.
[tables.columns]
name = ["Parameter Name", "Property Name", "Name", "Parameter", "Property"]
type = ["Type", "Data Type"]
description = ["Description", "Notes"]
required = ["Required"]
error_code = ["Error Code", "Code", "Error"]
http_status = ["HTTP Status", "HTTP Status Code", "Status Code"]
scope = ["Scope", "Scope Name", "Permission"]
scope_title = ["Title", "Display Name"]
member = ["Member", "Enum Value"]
value = ["Value"]
header = ["Header", "Header Name"]

# ---------------------------------------------------------------------------
# Outlines
# ---------------------------------------------------------------------------
# Expected heading structure per page type. Titles may use "*" wildcards.
# Entries are either headers (level, title, required, allow_multiple,
# children) or condition groups (condition = "and" | "or", arguments).

[[outlines.resource]]
level = 1
title = "* resource type"
required = true
allow_multiple = false

[[outlines.resource.children]]
level = 2
title = "Methods"
required = false
allow_multiple = false
children = []

[[outlines.resource.children]]
level = 2
title = "Properties"
required = true
allow_multiple = false
children = []

[[outlines.resource.children]]
level = 2
title = "Relationships"
required = false
allow_multiple = false
children = []

[[outlines.resource.children]]
level = 2
title = "JSON representation"
required = true
allow_multiple = false
children = []

[[outlines.api]]
level = 1
title = "*"
required = true
allow_multiple = false

[[outlines.api.children]]
level = 2
title = "Permissions"
required = false
allow_multiple = false
children = []

[[outlines.api.children]]
level = 2
title = "HTTP request"
required = true
allow_multiple = false
children = []

[[outlines.api.children]]
level = 2
title = "Optional query parameters"
required = false
allow_multiple = false
children = []

[[outlines.api.children]]
level = 2
title = "Request headers"
required = true
allow_multiple = false
children = []

[[outlines.api.children]]
level = 2
title = "Request body"
required = true
allow_multiple = false
children = []

[[outlines.api.children]]
level = 2
title = "Response"
required = true
allow_multiple = false
children = []

[[outlines.api.children]]
condition = "or"

[[outlines.api.children.arguments]]
level = 2
title = "Examples"
required = true
allow_multiple = false
children = [
    { level = 3, title = "Request", required = true, allow_multiple = false, children = [] },
    { level = 3, title = "Response", required = true, allow_multiple = false, children = [] },
]

[[outlines.api.children.arguments]]
level = 2
title = "Example"
required = true
allow_multiple = false
children = [
    { level = 3, title = "Request", required = true, allow_multiple = false, children = [] },
    { level = 3, title = "Response", required = true, allow_multiple = false, children = [] },
]

# ---------------------------------------------------------------------------
# Links
# ---------------------------------------------------------------------------
[links]
# Warn about every external (http/https) link, which is never validated.
warn_on_external = false

# Entry pages that are never reported as orphaned.
toc_roots = ["index.md", "README.md"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of parallel document workers. Omit for auto (= CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_no_namespace() {
        let config = SchemaConfig::default();
        assert!(config.default_namespace.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn stock_config_toml_matches_defaults() {
        let parsed: SchemaConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(parsed, SchemaConfig::default());
    }

    #[test]
    fn parse_partial_config() {
        let overlay: toml::Value = toml::from_str(
            r#"
default_namespace = "microsoft.graph"

[links]
warn_on_external = true
"#,
        )
        .unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        assert_eq!(config.default_namespace.as_deref(), Some("microsoft.graph"));
        assert!(config.links.warn_on_external);
        // Untouched keys keep their defaults
        assert_eq!(config.links.toc_roots, vec!["index.md", "README.md"]);
        assert_eq!(config.tables, TablesConfig::default());
    }

    #[test]
    fn overlay_arrays_replace_defaults() {
        let overlay: toml::Value = toml::from_str(
            r#"
[tables.columns]
name = ["Field"]
"#,
        )
        .unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        assert_eq!(config.tables.columns.name, vec!["Field"]);
        assert_eq!(config.tables.columns.data_type, vec!["Type", "Data Type"]);
    }

    #[test]
    fn outline_conditions_parse() {
        let overlay: toml::Value = toml::from_str(
            r#"
[[outlines.resource]]
condition = "and"
arguments = [
    { level = 1, title = "Overview", required = true },
    { level = 1, title = "Details" },
]
"#,
        )
        .unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        let OutlineItem::Condition { condition, arguments } = &config.outlines.resource[0] else {
            panic!("expected a condition group");
        };
        assert_eq!(*condition, Condition::And);
        assert_eq!(arguments.len(), 2);
        let OutlineItem::Header(details) = &arguments[1] else {
            panic!("expected a header");
        };
        assert!(!details.required);
        assert!(!details.allow_multiple);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, SchemaConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "type_name_exclusions = [\"ETag\"]\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.type_name_exclusions, vec!["ETag"]);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "this is not toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let overlay: toml::Value = toml::from_str("unknown_option = 1\n").unwrap();
        assert!(resolve_config(Some(overlay)).is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let overlay: toml::Value = toml::from_str("[links]\nfollow_redirects = true\n").unwrap();
        assert!(resolve_config(Some(overlay)).is_err());
    }

    #[test]
    fn validate_rejects_bad_namespace() {
        let config = SchemaConfig {
            default_namespace: Some("foo.".into()),
            ..SchemaConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_bad_outline_level() {
        let mut config = SchemaConfig::default();
        config.outlines.resource = vec![header(7, "Too deep", true, vec![])];
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_zero_processes() {
        let config = SchemaConfig {
            processing: ProcessingConfig {
                max_processes: Some(0),
            },
            ..SchemaConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn boilerplate_prefixes_detected() {
        let config = SchemaConfig::default();
        assert!(config.is_boilerplate("Namespace: microsoft.graph"));
        assert!(config.is_boilerplate("  [!INCLUDE [beta](../includes/beta.md)]"));
        assert!(!config.is_boilerplate("Represents a file."));
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn merge_toml_preserves_base_keys() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }
}
