//! Parameters and properties, and how two descriptions of one are reconciled.
//!
//! The same property is usually described twice: once implicitly by a JSON
//! example (name and an inferred type) and once by a table row (name, a
//! declared type, a description). [`ParameterDefinition::merge`] combines
//! them without mutating either side and returns the findings alongside the
//! result.

use crate::datatype::ParameterDataType;
use crate::issues::{Issue, IssueCode};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterLocation {
    Path,
    QueryString,
    Header,
    JsonObject,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDefinition {
    /// Dedup key within any one parameter list.
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub data_type: ParameterDataType,
    pub location: ParameterLocation,
    /// `None` means the documentation never said.
    pub required: Option<bool>,
    pub optional: Option<bool>,
    /// Text the type was inferred from, before parsing.
    pub original_value: Option<String>,
    pub is_navigatable: bool,
}

impl ParameterDefinition {
    pub fn new(
        name: impl Into<String>,
        data_type: ParameterDataType,
        location: ParameterLocation,
    ) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            data_type,
            location,
            required: None,
            optional: None,
            original_value: None,
            is_navigatable: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Fill what `self` lacks from `other`, reconciling types.
    ///
    /// Fields already set on `self` win. For the type, the more specific of
    /// the two wins; when `other` would replace a more specific type the
    /// original is kept and a `type-specificity-downgrade` warning is
    /// returned, and unrelated types take `other` with a
    /// `parameter-type-mismatch` warning.
    pub fn merge(&self, other: &ParameterDefinition) -> (ParameterDefinition, Vec<Issue>) {
        let mut issues = Vec::new();
        let data_type = if self.data_type == other.data_type
            || other.data_type == ParameterDataType::untyped_object()
        {
            self.data_type.clone()
        } else if self.data_type.is_less_specific_than(&other.data_type) {
            other.data_type.clone()
        } else if other.data_type.is_less_specific_than(&self.data_type) {
            issues.push(Issue::warning(
                IssueCode::TypeSpecificityDowngrade,
                format!(
                    "Property '{}' is documented as {} but the example shows the more specific {}",
                    self.name, other.data_type, self.data_type
                ),
            ));
            self.data_type.clone()
        } else {
            issues.push(Issue::warning(
                IssueCode::ParameterTypeMismatch,
                format!(
                    "Property '{}' is documented as {} but the example shows {}",
                    self.name, other.data_type, self.data_type
                ),
            ));
            other.data_type.clone()
        };

        let merged = ParameterDefinition {
            name: self.name.clone(),
            title: self.title.clone().or_else(|| other.title.clone()),
            description: self
                .description
                .clone()
                .or_else(|| other.description.clone()),
            data_type,
            location: self.location,
            required: self.required.or(other.required),
            optional: self.optional.or(other.optional),
            original_value: self
                .original_value
                .clone()
                .or_else(|| other.original_value.clone()),
            is_navigatable: self.is_navigatable || other.is_navigatable,
        };
        (merged, issues)
    }
}

/// Merge `incoming` into `existing` by name: matches are merged, new names
/// are appended in order.
pub fn merge_parameter_lists(
    existing: &[ParameterDefinition],
    incoming: &[ParameterDefinition],
) -> (Vec<ParameterDefinition>, Vec<Issue>) {
    let mut merged = existing.to_vec();
    let mut issues = Vec::new();
    for param in incoming {
        match merged.iter().position(|p| p.name == param.name) {
            Some(index) => {
                let (combined, found) = merged[index].merge(param);
                merged[index] = combined;
                issues.extend(found);
            }
            None => merged.push(param.clone()),
        }
    }
    (merged, issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::SimpleDataType;

    fn property(name: &str, data_type: ParameterDataType) -> ParameterDefinition {
        ParameterDefinition::new(name, data_type, ParameterLocation::JsonObject)
    }

    #[test]
    fn merge_fills_missing_fields() {
        let example = property("id", ParameterDataType::STRING);
        let row = property("id", ParameterDataType::STRING)
            .with_description("The identifier.")
            .with_required(true);

        let (merged, issues) = example.merge(&row);
        assert!(issues.is_empty());
        assert_eq!(merged.description.as_deref(), Some("The identifier."));
        assert_eq!(merged.required, Some(true));
    }

    #[test]
    fn merge_keeps_existing_fields() {
        let example = property("id", ParameterDataType::STRING).with_description("mine");
        let row = property("id", ParameterDataType::STRING).with_description("theirs");
        let (merged, _) = example.merge(&row);
        assert_eq!(merged.description.as_deref(), Some("mine"));
    }

    #[test]
    fn more_specific_table_type_wins_silently() {
        let example = property("when", ParameterDataType::STRING);
        let row = property("when", ParameterDataType::Simple(SimpleDataType::DateTimeOffset));
        let (merged, issues) = example.merge(&row);
        assert!(issues.is_empty());
        assert_eq!(merged.data_type, row.data_type);
    }

    #[test]
    fn less_specific_table_type_is_a_downgrade() {
        let example = property("id", ParameterDataType::Simple(SimpleDataType::Guid));
        let row = property("id", ParameterDataType::STRING);
        let (merged, issues) = example.merge(&row);
        assert_eq!(merged.data_type, ParameterDataType::Simple(SimpleDataType::Guid));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::TypeSpecificityDowngrade);
    }

    #[test]
    fn unrelated_types_take_the_table_type_with_warning() {
        let example = property("size", ParameterDataType::STRING);
        let row = property("size", ParameterDataType::Simple(SimpleDataType::Int32));
        let (merged, issues) = example.merge(&row);
        assert_eq!(merged.data_type, row.data_type);
        assert_eq!(issues[0].code, IssueCode::ParameterTypeMismatch);
    }

    #[test]
    fn list_merge_dedups_by_name() {
        let existing = vec![property("a", ParameterDataType::STRING)];
        let incoming = vec![
            property("a", ParameterDataType::STRING).with_required(false),
            property("b", ParameterDataType::STRING),
        ];
        let (merged, issues) = merge_parameter_lists(&existing, &incoming);
        assert!(issues.is_empty());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].required, Some(false));
        assert_eq!(merged[1].name, "b");
    }
}
