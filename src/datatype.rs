//! Parameter data types and the resolver that reads them from free text.
//!
//! Documentation describes types in prose: `Collection(microsoft.graph.driveItem)`,
//! `String collection`, `[identitySet](identityset.md)`, `Edm.Int32`,
//! `colorName enum`. [`TypeResolver::parse_type`] turns such a description
//! into a [`ParameterDataType`]. The same literal detection also re-infers
//! types from example values (`"2015-01-01T00:00:00Z"` is a
//! `DateTimeOffset`, not just a string).
//!
//! Types form a loose specificity order used when an inferred type and a
//! documented type disagree: see [`ParameterDataType::is_less_specific_than`].

use crate::block::strip_cell;
use crate::config::SchemaConfig;
use crate::issues::{IssueCode, IssueLog};
use crate::naming::{lower_camel, qualify};
use crate::parameter::ParameterDefinition;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?$")
        .expect("valid date-time pattern")
});
static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date pattern"));
static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{2}:\d{2}(:\d{2}(\.\d+)?)?$").expect("valid time pattern")
});
static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?P(\d+Y)?(\d+M)?(\d+W)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$")
        .expect("valid duration pattern")
});

/// Primitive types understood without further context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimpleDataType {
    String,
    Boolean,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Single,
    Byte,
    Guid,
    Date,
    TimeOfDay,
    Duration,
    DateTimeOffset,
    Stream,
    Binary,
    Json,
}

impl SimpleDataType {
    /// Look up a type name from the fixed vocabulary. Case-insensitive; an
    /// `Edm.` prefix is ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        let lower = lower.strip_prefix("edm.").unwrap_or(&lower);
        let simple = match lower {
            "string" => SimpleDataType::String,
            "boolean" | "bool" => SimpleDataType::Boolean,
            "int16" | "short" => SimpleDataType::Int16,
            "int32" | "int" | "integer" => SimpleDataType::Int32,
            "int64" | "long" => SimpleDataType::Int64,
            "float" => SimpleDataType::Float,
            "double" | "number" | "decimal" => SimpleDataType::Double,
            "single" => SimpleDataType::Single,
            "byte" | "sbyte" => SimpleDataType::Byte,
            "guid" | "uuid" => SimpleDataType::Guid,
            "date" => SimpleDataType::Date,
            "timeofday" | "time" => SimpleDataType::TimeOfDay,
            "duration" | "timespan" => SimpleDataType::Duration,
            "datetimeoffset" | "datetime" => SimpleDataType::DateTimeOffset,
            "stream" => SimpleDataType::Stream,
            "binary" => SimpleDataType::Binary,
            "json" => SimpleDataType::Json,
            _ => return None,
        };
        Some(simple)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SimpleDataType::String => "String",
            SimpleDataType::Boolean => "Boolean",
            SimpleDataType::Int16 => "Int16",
            SimpleDataType::Int32 => "Int32",
            SimpleDataType::Int64 => "Int64",
            SimpleDataType::Float => "Float",
            SimpleDataType::Double => "Double",
            SimpleDataType::Single => "Single",
            SimpleDataType::Byte => "Byte",
            SimpleDataType::Guid => "Guid",
            SimpleDataType::Date => "Date",
            SimpleDataType::TimeOfDay => "TimeOfDay",
            SimpleDataType::Duration => "Duration",
            SimpleDataType::DateTimeOffset => "DateTimeOffset",
            SimpleDataType::Stream => "Stream",
            SimpleDataType::Binary => "Binary",
            SimpleDataType::Json => "Json",
        }
    }
}

/// The type of a parameter or property.
///
/// A `Collection` never directly wraps another `Collection`: nesting is
/// counted in `dimensions`. Build collections with
/// [`ParameterDataType::collection_of`] to keep that invariant.
#[derive(Debug, Clone)]
pub enum ParameterDataType {
    Simple(SimpleDataType),
    Collection {
        inner: Box<ParameterDataType>,
        dimensions: u32,
    },
    Object {
        custom_type_name: Option<String>,
        is_enum: bool,
        custom_members: Option<Vec<ParameterDefinition>>,
    },
}

impl PartialEq for ParameterDataType {
    /// Structural equality that ignores inline object members.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Simple(a), Self::Simple(b)) => a == b,
            (
                Self::Collection {
                    inner: a,
                    dimensions: da,
                },
                Self::Collection {
                    inner: b,
                    dimensions: db,
                },
            ) => da == db && a == b,
            (
                Self::Object {
                    custom_type_name: a,
                    is_enum: ea,
                    ..
                },
                Self::Object {
                    custom_type_name: b,
                    is_enum: eb,
                    ..
                },
            ) => a == b && ea == eb,
            _ => false,
        }
    }
}

impl ParameterDataType {
    pub const STRING: ParameterDataType = ParameterDataType::Simple(SimpleDataType::String);

    /// An object type with no known name.
    pub fn untyped_object() -> Self {
        ParameterDataType::Object {
            custom_type_name: None,
            is_enum: false,
            custom_members: None,
        }
    }

    pub fn custom(name: impl Into<String>) -> Self {
        ParameterDataType::Object {
            custom_type_name: Some(name.into()),
            is_enum: false,
            custom_members: None,
        }
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        ParameterDataType::Object {
            custom_type_name: Some(name.into()),
            is_enum: true,
            custom_members: None,
        }
    }

    /// Wrap `inner` in one more collection dimension.
    pub fn collection_of(inner: ParameterDataType) -> Self {
        match inner {
            ParameterDataType::Collection { inner, dimensions } => ParameterDataType::Collection {
                inner,
                dimensions: dimensions + 1,
            },
            other => ParameterDataType::Collection {
                inner: Box::new(other),
                dimensions: 1,
            },
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, ParameterDataType::Collection { .. })
    }

    pub fn is_string(&self) -> bool {
        matches!(self, ParameterDataType::Simple(SimpleDataType::String))
    }

    /// The element type of a collection, or the type itself.
    pub fn element_type(&self) -> &ParameterDataType {
        match self {
            ParameterDataType::Collection { inner, .. } => inner,
            other => other,
        }
    }

    /// Named custom type referenced by this type, looking through collections.
    pub fn custom_type_name(&self) -> Option<&str> {
        match self.element_type() {
            ParameterDataType::Object {
                custom_type_name, ..
            } => custom_type_name.as_deref(),
            _ => None,
        }
    }

    /// Whether `other` carries strictly more information than `self`, so a
    /// merge may replace `self` with `other` without losing anything.
    ///
    /// - an untyped object is less specific than any other type
    /// - `String` is less specific than GUID, date/time, duration, binary and enum types
    /// - `Int64` is less specific than narrower integers, `Boolean` and floating point types
    /// - `Double` is less specific than `Float` and `Single`
    /// - collections compare their element types when dimensions agree
    pub fn is_less_specific_than(&self, other: &ParameterDataType) -> bool {
        use SimpleDataType as S;
        match (self, other) {
            (
                ParameterDataType::Object {
                    custom_type_name: None,
                    is_enum: false,
                    ..
                },
                o,
            ) => *o != ParameterDataType::untyped_object(),
            (ParameterDataType::Simple(S::String), ParameterDataType::Simple(o)) => matches!(
                o,
                S::Guid | S::DateTimeOffset | S::Duration | S::Date | S::TimeOfDay | S::Binary
            ),
            (ParameterDataType::Simple(S::String), ParameterDataType::Object { is_enum, .. }) => {
                *is_enum
            }
            (ParameterDataType::Simple(S::Int64), ParameterDataType::Simple(o)) => matches!(
                o,
                S::Int32 | S::Int16 | S::Byte | S::Boolean | S::Double | S::Float | S::Single
            ),
            (ParameterDataType::Simple(S::Double), ParameterDataType::Simple(o)) => {
                matches!(o, S::Float | S::Single)
            }
            (
                ParameterDataType::Collection {
                    inner: a,
                    dimensions: da,
                },
                ParameterDataType::Collection {
                    inner: b,
                    dimensions: db,
                },
            ) => da == db && a.is_less_specific_than(b),
            _ => false,
        }
    }
}

impl fmt::Display for ParameterDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterDataType::Simple(simple) => f.write_str(simple.as_str()),
            ParameterDataType::Collection { inner, dimensions } => {
                for _ in 0..*dimensions {
                    f.write_str("Collection(")?;
                }
                write!(f, "{inner}")?;
                for _ in 0..*dimensions {
                    f.write_str(")")?;
                }
                Ok(())
            }
            ParameterDataType::Object {
                custom_type_name: Some(name),
                is_enum: true,
                ..
            } => write!(f, "{name} enum"),
            ParameterDataType::Object {
                custom_type_name: Some(name),
                ..
            } => f.write_str(name),
            ParameterDataType::Object { .. } => f.write_str("Object"),
        }
    }
}

/// Recognize a literal value (rather than a type name) by its shape.
pub fn detect_literal(text: &str) -> Option<SimpleDataType> {
    let text = text.trim();
    if DATE_TIME.is_match(text) {
        Some(SimpleDataType::DateTimeOffset)
    } else if DATE.is_match(text) {
        Some(SimpleDataType::Date)
    } else if TIME_OF_DAY.is_match(text) {
        Some(SimpleDataType::TimeOfDay)
    } else if DURATION.is_match(text) && text.chars().any(|c| c.is_ascii_digit()) {
        Some(SimpleDataType::Duration)
    } else if uuid::Uuid::parse_str(text).is_ok() {
        Some(SimpleDataType::Guid)
    } else {
        None
    }
}

/// Reads type descriptions using the schema configuration's namespace
/// defaults and capitalization exclusions.
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    config: &'a SchemaConfig,
}

impl<'a> TypeResolver<'a> {
    pub fn new(config: &'a SchemaConfig) -> Self {
        Self { config }
    }

    /// Parse a type description.
    ///
    /// `is_collection` wraps the result in a collection unless the text
    /// already described one. When nothing matches, `default` is returned if
    /// given; otherwise a `type-parse-fallback` warning is recorded and the
    /// raw text becomes an object type name.
    pub fn parse_type(
        &self,
        text: &str,
        is_collection: bool,
        default: Option<ParameterDataType>,
        log: &mut IssueLog,
    ) -> ParameterDataType {
        let parsed = self.parse_description(text, default, log);
        if is_collection && !parsed.is_collection() {
            ParameterDataType::collection_of(parsed)
        } else {
            parsed
        }
    }

    fn parse_description(
        &self,
        text: &str,
        default: Option<ParameterDataType>,
        log: &mut IssueLog,
    ) -> ParameterDataType {
        let cleaned = strip_cell(text);

        if let Some(inner) = strip_collection(&cleaned) {
            let inner_default = default.as_ref().map(|d| d.element_type().clone());
            let element = self.parse_description(inner, inner_default, log);
            return ParameterDataType::collection_of(element);
        }

        let name = strip_link(&cleaned);
        if let Some(parsed) = self.parse_name(name) {
            return parsed;
        }

        match default {
            Some(default) => default,
            None => {
                log.warning(
                    IssueCode::TypeParseFallback,
                    format!("Unable to parse type '{}'; treating it as an object type", text.trim()),
                );
                ParameterDataType::custom(text.trim())
            }
        }
    }

    fn parse_name(&self, name: &str) -> Option<ParameterDataType> {
        if name.is_empty() {
            return None;
        }
        // `<name> enum` always names an enumeration, even when the name
        // itself looks like a simple type.
        let (name, is_enum) = match strip_suffix_ignore_case(name, " enum") {
            Some(base) => (base.trim(), true),
            None => (name, false),
        };

        if !is_enum {
            if let Some(simple) = SimpleDataType::from_name(name) {
                return Some(ParameterDataType::Simple(simple));
            }
            if let Some(simple) = detect_literal(name) {
                return Some(ParameterDataType::Simple(simple));
            }

            let lower = name.to_lowercase();
            if lower.starts_with("base64") {
                return Some(ParameterDataType::Simple(SimpleDataType::Binary));
            }
            if lower.contains("etag") || lower.contains("string") {
                return Some(ParameterDataType::STRING);
            }
            if lower.contains("timestamp") {
                return Some(ParameterDataType::Simple(SimpleDataType::DateTimeOffset));
            }
        }

        if name.is_empty() || name.contains(char::is_whitespace) || name.contains('/') {
            return None;
        }

        let normalized = self.normalize_type_name(name);
        Some(ParameterDataType::Object {
            custom_type_name: Some(normalized),
            is_enum,
            custom_members: None,
        })
    }

    /// Lower-camel-case the type segment (unless excluded) and qualify bare
    /// names with the default namespace.
    pub fn normalize_type_name(&self, name: &str) -> String {
        let name = name.trim_start_matches('#');
        let (namespace, type_name) = match name.rsplit_once('.') {
            Some((ns, t)) => (Some(ns), t),
            None => (None, name),
        };
        let type_name = if self
            .config
            .type_name_exclusions
            .iter()
            .any(|e| e == type_name)
        {
            type_name.to_string()
        } else {
            lower_camel(type_name)
        };
        match namespace {
            Some(ns) => format!("{ns}.{type_name}"),
            None => qualify(&type_name, self.config.default_namespace.as_deref()),
        }
    }

    /// Infer the type of an example string value.
    pub fn infer_string_value(&self, value: &str) -> ParameterDataType {
        match detect_literal(value) {
            Some(simple) => ParameterDataType::Simple(simple),
            None => ParameterDataType::STRING,
        }
    }
}

/// Peel one collection wrapper: `Collection(x)`, `Collection of x`,
/// `x collection`, `x[]`.
fn strip_collection(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("collection(") && trimmed.ends_with(')') {
        return Some(trimmed["collection(".len()..trimmed.len() - 1].trim());
    }
    if lower.starts_with("collection of ") {
        return Some(trimmed["collection of ".len()..].trim());
    }
    if let Some(inner) = strip_suffix_ignore_case(trimmed, " collection") {
        return Some(inner.trim());
    }
    trimmed.strip_suffix("[]").map(str::trim)
}

/// `[name](target)` → `name`; anything else is returned unchanged.
fn strip_link(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix('[')
        && let Some(close) = rest.find(']')
    {
        let after = &rest[close + 1..];
        if after.is_empty() || after.starts_with('(') || after.starts_with('[') {
            return rest[..close].trim();
        }
    }
    trimmed
}

fn strip_suffix_ignore_case<'t>(text: &'t str, suffix: &str) -> Option<&'t str> {
    let split = text.len().checked_sub(suffix.len())?;
    if !text.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = text.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ParameterDataType {
        let config = SchemaConfig::default();
        let mut log = IssueLog::new();
        TypeResolver::new(&config).parse_type(text, false, None, &mut log)
    }

    fn parse_with_namespace(text: &str, ns: &str) -> ParameterDataType {
        let config = SchemaConfig {
            default_namespace: Some(ns.to_string()),
            ..SchemaConfig::default()
        };
        let mut log = IssueLog::new();
        TypeResolver::new(&config).parse_type(text, false, None, &mut log)
    }

    // =========================================================================
    // Simple vocabulary
    // =========================================================================

    #[test]
    fn simple_types_are_case_insensitive() {
        assert_eq!(parse("string"), ParameterDataType::STRING);
        assert_eq!(parse("Int32"), ParameterDataType::Simple(SimpleDataType::Int32));
        assert_eq!(parse("BOOLEAN"), ParameterDataType::Simple(SimpleDataType::Boolean));
    }

    #[test]
    fn edm_prefix_is_stripped() {
        assert_eq!(
            parse("Edm.DateTimeOffset"),
            ParameterDataType::Simple(SimpleDataType::DateTimeOffset)
        );
        assert_eq!(parse("edm.Guid"), ParameterDataType::Simple(SimpleDataType::Guid));
    }

    #[test]
    fn emphasis_and_backticks_are_ignored() {
        assert_eq!(parse("**Int64**"), ParameterDataType::Simple(SimpleDataType::Int64));
        assert_eq!(parse("`Boolean`"), ParameterDataType::Simple(SimpleDataType::Boolean));
    }

    // =========================================================================
    // Collections
    // =========================================================================

    #[test]
    fn collection_of_custom_type() {
        let parsed = parse("Collection(foo.bar)");
        assert!(parsed.is_collection());
        assert_eq!(parsed.custom_type_name(), Some("foo.bar"));
        let ParameterDataType::Collection { dimensions, .. } = parsed else {
            unreachable!();
        };
        assert_eq!(dimensions, 1);
    }

    #[test]
    fn nested_collections_flatten_into_dimensions() {
        let parsed = parse("Collection(Collection(string))");
        let ParameterDataType::Collection { inner, dimensions } = &parsed else {
            panic!("expected collection, got {parsed:?}");
        };
        assert_eq!(*dimensions, 2);
        assert_eq!(**inner, ParameterDataType::STRING);
        assert_eq!(parsed.to_string(), "Collection(Collection(String))");
    }

    #[test]
    fn collection_phrasings() {
        let expected = ParameterDataType::collection_of(ParameterDataType::STRING);
        assert_eq!(parse("String collection"), expected);
        assert_eq!(parse("Collection of String"), expected);
        assert_eq!(parse("String[]"), expected);
    }

    #[test]
    fn collection_hint_wraps_once() {
        let config = SchemaConfig::default();
        let resolver = TypeResolver::new(&config);
        let mut log = IssueLog::new();
        let hinted = resolver.parse_type("string", true, None, &mut log);
        assert_eq!(hinted, ParameterDataType::collection_of(ParameterDataType::STRING));
        let already = resolver.parse_type("Collection(string)", true, None, &mut log);
        assert_eq!(already, hinted);
    }

    // =========================================================================
    // Custom types
    // =========================================================================

    #[test]
    fn link_syntax_is_stripped() {
        let parsed = parse("[identitySet](identityset.md)");
        assert_eq!(parsed.custom_type_name(), Some("identitySet"));
        let collection = parse("[driveItem](driveitem.md) collection");
        assert_eq!(collection.custom_type_name(), Some("driveItem"));
        assert!(collection.is_collection());
    }

    #[test]
    fn custom_names_are_lower_camel_cased() {
        assert_eq!(parse("DriveItem").custom_type_name(), Some("driveItem"));
        assert_eq!(parse("foo.DriveItem").custom_type_name(), Some("foo.driveItem"));
    }

    #[test]
    fn exclusions_keep_capitalization() {
        let config = SchemaConfig {
            type_name_exclusions: vec!["IPRange".into()],
            ..SchemaConfig::default()
        };
        let mut log = IssueLog::new();
        let parsed = TypeResolver::new(&config).parse_type("IPRange", false, None, &mut log);
        assert_eq!(parsed.custom_type_name(), Some("IPRange"));
    }

    #[test]
    fn bare_names_get_default_namespace() {
        let parsed = parse_with_namespace("driveItem", "microsoft.graph");
        assert_eq!(parsed.custom_type_name(), Some("microsoft.graph.driveItem"));
        let qualified = parse_with_namespace("other.driveItem", "microsoft.graph");
        assert_eq!(qualified.custom_type_name(), Some("other.driveItem"));
    }

    #[test]
    fn enum_suffix_sets_flag() {
        let parsed = parse_with_namespace("colorName enum", "foo");
        assert_eq!(parsed, ParameterDataType::enumeration("foo.colorName"));
    }

    #[test]
    fn enum_suffix_wins_over_string_heuristic() {
        let parsed = parse_with_namespace("stringFormat enum", "foo");
        assert_eq!(parsed, ParameterDataType::enumeration("foo.stringFormat"));
        let parsed = parse_with_namespace("String enum", "foo");
        assert_eq!(parsed.custom_type_name(), Some("foo.string"));
        assert_eq!(parse("stringFormat"), ParameterDataType::STRING);
    }

    // =========================================================================
    // Heuristics and fallbacks
    // =========================================================================

    #[test]
    fn literal_values_are_detected() {
        assert_eq!(
            parse("2015-01-01T10:00:00Z"),
            ParameterDataType::Simple(SimpleDataType::DateTimeOffset)
        );
        assert_eq!(parse("2015-01-01"), ParameterDataType::Simple(SimpleDataType::Date));
        assert_eq!(
            parse("936da01f-9abd-4d9d-80c7-02af85c822a8"),
            ParameterDataType::Simple(SimpleDataType::Guid)
        );
        assert_eq!(detect_literal("PT1H30M"), Some(SimpleDataType::Duration));
        assert_eq!(detect_literal("P"), None);
    }

    #[test]
    fn substring_heuristics() {
        assert_eq!(parse("base64Binary"), ParameterDataType::Simple(SimpleDataType::Binary));
        assert_eq!(parse("ETag value"), ParameterDataType::STRING);
        assert_eq!(parse("String (identifier)"), ParameterDataType::STRING);
        assert_eq!(
            parse("Unix timestamp"),
            ParameterDataType::Simple(SimpleDataType::DateTimeOffset)
        );
    }

    #[test]
    fn unparseable_text_falls_back_with_warning() {
        let config = SchemaConfig::default();
        let mut log = IssueLog::new();
        let parsed =
            TypeResolver::new(&config).parse_type("see the notes below", false, None, &mut log);
        assert_eq!(parsed.custom_type_name(), Some("see the notes below"));
        assert!(log.has_code(IssueCode::TypeParseFallback));
    }

    #[test]
    fn unparseable_text_uses_default_silently() {
        let config = SchemaConfig::default();
        let mut log = IssueLog::new();
        let parsed = TypeResolver::new(&config).parse_type(
            "see the notes below",
            false,
            Some(ParameterDataType::STRING),
            &mut log,
        );
        assert_eq!(parsed, ParameterDataType::STRING);
        assert!(log.is_empty());
    }

    #[test]
    fn example_values_infer_strings_by_default() {
        let config = SchemaConfig::default();
        let resolver = TypeResolver::new(&config);
        assert_eq!(resolver.infer_string_value("hello"), ParameterDataType::STRING);
        assert_eq!(
            resolver.infer_string_value("2020-02-02T02:02:02.5+01:00"),
            ParameterDataType::Simple(SimpleDataType::DateTimeOffset)
        );
    }

    // =========================================================================
    // Specificity
    // =========================================================================

    #[test]
    fn string_is_less_specific_than_typed_strings() {
        let string = ParameterDataType::STRING;
        for other in [SimpleDataType::Guid, SimpleDataType::DateTimeOffset, SimpleDataType::Duration] {
            assert!(string.is_less_specific_than(&ParameterDataType::Simple(other)));
            assert!(!ParameterDataType::Simple(other).is_less_specific_than(&string));
        }
        assert!(string.is_less_specific_than(&ParameterDataType::enumeration("foo.color")));
    }

    #[test]
    fn integer_and_float_ordering() {
        let int64 = ParameterDataType::Simple(SimpleDataType::Int64);
        let double = ParameterDataType::Simple(SimpleDataType::Double);
        assert!(int64.is_less_specific_than(&ParameterDataType::Simple(SimpleDataType::Int32)));
        assert!(int64.is_less_specific_than(&ParameterDataType::Simple(SimpleDataType::Boolean)));
        assert!(double.is_less_specific_than(&ParameterDataType::Simple(SimpleDataType::Float)));
        assert!(!double.is_less_specific_than(&int64));
    }

    #[test]
    fn untyped_object_is_least_specific() {
        let untyped = ParameterDataType::untyped_object();
        assert!(untyped.is_less_specific_than(&ParameterDataType::custom("foo.bar")));
        assert!(untyped.is_less_specific_than(&ParameterDataType::STRING));
        assert!(!untyped.is_less_specific_than(&ParameterDataType::untyped_object()));
    }

    #[test]
    fn collections_compare_elements() {
        let strings = ParameterDataType::collection_of(ParameterDataType::STRING);
        let guids =
            ParameterDataType::collection_of(ParameterDataType::Simple(SimpleDataType::Guid));
        assert!(strings.is_less_specific_than(&guids));
        let nested = ParameterDataType::collection_of(guids.clone());
        assert!(!strings.is_less_specific_than(&nested));
    }

    #[test]
    fn equality_ignores_inline_members() {
        let with_members = ParameterDataType::Object {
            custom_type_name: Some("foo.bar".into()),
            is_enum: false,
            custom_members: Some(vec![]),
        };
        assert_eq!(with_members, ParameterDataType::custom("foo.bar"));
        assert_ne!(with_members, ParameterDataType::enumeration("foo.bar"));
    }
}
