//! Resource definitions read from annotated JSON examples.

use crate::annotation::CodeBlockAnnotation;
use crate::datatype::{ParameterDataType, SimpleDataType, TypeResolver};
use crate::issues::{IssueCode, IssueLog};
use crate::naming::split_namespace;
use crate::parameter::{ParameterDefinition, ParameterLocation};
use serde_json::{Map, Value};

/// Where a code block sits, for attributing definitions built from it.
#[derive(Debug, Clone, Default)]
pub struct BlockContext {
    pub source_file: String,
    pub line: usize,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDefinition {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub parameters: Vec<ParameterDefinition>,
    pub base_type: Option<String>,
    pub key_property: Option<String>,
    pub is_abstract: bool,
    pub open_type: bool,
    pub optional_properties: Vec<String>,
    pub navigation_properties: Vec<String>,
    /// The example was marked as truncated, so missing properties are expected.
    pub truncated: bool,
    pub source_file: String,
    pub line: usize,
    /// Index of the base type's first definition in the set-wide resource
    /// list. Written once by the inheritance pass.
    pub resolved_base_type: Option<usize>,
}

impl ResourceDefinition {
    /// Build a resource from its annotation and JSON payload.
    ///
    /// Returns `None` (with an error recorded) when the annotation names no
    /// resource type or the payload is not valid JSON.
    pub fn from_json(
        annotation: &CodeBlockAnnotation,
        json: &str,
        context: &BlockContext,
        resolver: &TypeResolver<'_>,
        log: &mut IssueLog,
    ) -> Option<Self> {
        let name = annotation
            .resource_type
            .as_deref()
            .map(|n| n.trim().trim_start_matches('#'))
            .unwrap_or("");
        if name.is_empty() {
            log.error(
                IssueCode::MissingResourceName,
                format!(
                    "Resource on line {} has no @odata.type in its metadata",
                    context.line
                ),
            );
            return None;
        }

        let parameters = match serde_json::from_str::<Value>(json) {
            Ok(value) => {
                let object = match &value {
                    Value::Array(items) if annotation.is_collection => {
                        items.first().and_then(Value::as_object)
                    }
                    other => other.as_object(),
                };
                match object {
                    Some(object) => {
                        infer_properties(object, &annotation.navigation_properties, resolver)
                    }
                    None => {
                        log.error(
                            IssueCode::ResourceJsonInvalid,
                            format!("Resource {name} on line {} is not a JSON object", context.line),
                        );
                        return None;
                    }
                }
            }
            Err(err) if annotation.truncated => {
                log.message(format!(
                    "Skipping property inference for truncated resource {name}: {err}"
                ));
                Vec::new()
            }
            Err(err) => {
                log.error(
                    IssueCode::ResourceJsonInvalid,
                    format!("Resource {name} on line {} has invalid JSON: {err}", context.line),
                );
                return None;
            }
        };

        Some(ResourceDefinition {
            name: name.to_string(),
            title: context.title.clone(),
            description: context.description.clone(),
            parameters,
            base_type: annotation
                .base_type
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(|b| b.trim_start_matches('#').to_string()),
            key_property: annotation.key_property.clone(),
            is_abstract: annotation.is_abstract,
            open_type: annotation.open_type,
            optional_properties: annotation.optional_properties.clone(),
            navigation_properties: annotation.navigation_properties.clone(),
            truncated: annotation.truncated,
            source_file: context.source_file.clone(),
            line: context.line,
            resolved_base_type: None,
        })
    }

    /// Dotted prefix of the resource name.
    pub fn namespace(&self) -> Option<&str> {
        split_namespace(&self.name).0
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn is_optional_property(&self, name: &str) -> bool {
        self.optional_properties.iter().any(|p| p == name)
    }

    pub fn is_navigation_property(&self, name: &str) -> bool {
        self.navigation_properties.iter().any(|p| p == name)
    }
}

/// Infer one parameter per key of a JSON object. `@odata.*` annotations are
/// not properties.
pub fn infer_properties(
    object: &Map<String, Value>,
    navigation_properties: &[String],
    resolver: &TypeResolver<'_>,
) -> Vec<ParameterDefinition> {
    object
        .iter()
        .filter(|(key, _)| !key.starts_with('@') && !key.contains("@odata."))
        .map(|(key, value)| {
            let mut param = ParameterDefinition::new(
                key.clone(),
                infer_type(value, resolver),
                ParameterLocation::JsonObject,
            );
            param.original_value = match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            };
            param.is_navigatable = navigation_properties.iter().any(|n| n == key);
            param
        })
        .collect()
}

fn infer_type(value: &Value, resolver: &TypeResolver<'_>) -> ParameterDataType {
    match value {
        Value::String(s) => resolver.infer_string_value(s),
        Value::Number(n) if n.is_i64() || n.is_u64() => {
            ParameterDataType::Simple(SimpleDataType::Int64)
        }
        Value::Number(_) => ParameterDataType::Simple(SimpleDataType::Double),
        Value::Bool(_) => ParameterDataType::Simple(SimpleDataType::Boolean),
        Value::Array(items) => {
            let element = items
                .first()
                .map(|first| infer_type(first, resolver))
                .unwrap_or_else(ParameterDataType::untyped_object);
            ParameterDataType::collection_of(element)
        }
        Value::Object(map) => match map.get("@odata.type").and_then(Value::as_str) {
            Some(odata_type) => {
                ParameterDataType::custom(resolver.normalize_type_name(odata_type))
            }
            None => ParameterDataType::Object {
                custom_type_name: None,
                is_enum: false,
                custom_members: Some(infer_properties(map, &[], resolver)),
            },
        },
        Value::Null => ParameterDataType::untyped_object(),
    }
}
