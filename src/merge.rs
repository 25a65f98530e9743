//! Post-scan merging within one document.
//!
//! After a page is scanned its tables are still loose. The merger decides
//! which resource or method each table describes and folds the rows in:
//!
//! 1. **Namespace**: the page annotation's namespace, else the dotted prefix
//!    of the first resource name, else the configured default. An annotation
//!    that disagrees with the first resource is an error.
//! 2. **Resource tables**: property tables merge into the page's resource,
//!    but only when the page declares exactly one.
//! 3. **Method tables**: error, header, path, query and request-body tables
//!    attach to the page's methods when the mapping is unambiguous.
//! 4. **Enumerations**: string properties whose descriptions mention several
//!    known enum members, and `"a|b|c"` example values no enum table covers,
//!    are flagged.
//! 5. **Unused tables**: whatever was not merged anywhere is reported.

use crate::config::SchemaConfig;
use crate::issues::{Issue, IssueCode, IssueLog, Severity};
use crate::method::MethodDefinition;
use crate::parameter::{ParameterDefinition, merge_parameter_lists};
use crate::resource::ResourceDefinition;
use crate::scanner::DocFile;
use crate::table::{TableDefinition, TableKind, TableRows};
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub struct ElementMerger<'a> {
    config: &'a SchemaConfig,
}

impl<'a> ElementMerger<'a> {
    pub fn new(config: &'a SchemaConfig) -> Self {
        Self { config }
    }

    /// Run every merge step over `doc`.
    pub fn merge(&self, doc: &mut DocFile, log: &mut IssueLog) {
        self.resolve_namespace(doc, log);
        merge_resource_tables(doc, log);
        merge_method_tables(doc, log);
        check_enumerations(doc, log);
        report_unused_tables(doc, log);
    }

    fn resolve_namespace(&self, doc: &mut DocFile, log: &mut IssueLog) {
        let inferred = doc
            .resources
            .first()
            .and_then(ResourceDefinition::namespace)
            .map(str::to_string);
        let explicit = doc
            .page_annotation
            .as_ref()
            .and_then(|page| page.namespace.clone())
            .filter(|ns| !ns.trim().is_empty());

        if let (Some(explicit), Some(inferred)) = (&explicit, &inferred)
            && explicit != inferred
        {
            log.error(
                IssueCode::NamespaceMismatch,
                format!(
                    "Page declares namespace '{explicit}' but resource '{}' is in '{inferred}'",
                    doc.resources[0].name
                ),
            );
        }

        doc.namespace = explicit
            .or(inferred)
            .or_else(|| self.config.default_namespace.clone());

        if let Some(namespace) = &doc.namespace {
            for table in &mut doc.tables {
                if let TableRows::Enumerations(members) = &mut table.rows {
                    for member in members.iter_mut().filter(|m| m.namespace.is_none()) {
                        member.namespace = Some(namespace.clone());
                    }
                }
            }
        }
    }
}

fn merge_resource_tables(doc: &mut DocFile, log: &mut IssueLog) {
    let property_tables: Vec<usize> = doc
        .tables
        .iter()
        .enumerate()
        .filter(|(_, t)| t.kind.describes_properties())
        .map(|(i, _)| i)
        .collect();
    if property_tables.is_empty() {
        return;
    }
    match doc.resources.len() {
        0 => return,
        1 => {}
        count => {
            log.warning(
                IssueCode::MultipleResourcesInDocument,
                format!("{count} resources on one page; property tables were not merged"),
            );
            return;
        }
    }

    let resource = &mut doc.resources[0];
    let mut scoped = log.scoped(&resource.name);
    let mut documented = HashSet::new();
    for &index in &property_tables {
        let table = &mut doc.tables[index];
        for row in table.parameters() {
            documented.insert(row.name.clone());
            merge_property(resource, row, &mut scoped);
        }
        table.mark_used_by(resource.name.clone());
    }

    if !resource.truncated {
        for param in &resource.parameters {
            if !documented.contains(&param.name) {
                scoped.warning(
                    IssueCode::PropertyMissingFromTable,
                    format!(
                        "Property '{}' appears in the example but in no property table",
                        param.name
                    ),
                );
            }
        }
    }
    log.absorb(scoped);
}

/// Fold one table row into a resource's property list.
fn merge_property(resource: &mut ResourceDefinition, row: &ParameterDefinition, log: &mut IssueLog) {
    if let Some(index) = resource.parameters.iter().position(|p| p.name == row.name) {
        let (merged, issues) = resource.parameters[index].merge(row);
        resource.parameters[index] = merged;
        log.extend(issues);
        return;
    }

    let silently_accepted = resource.open_type && resource.is_optional_property(&row.name);
    if !silently_accepted {
        let message = format!(
            "Property '{}' is documented but missing from the example",
            row.name
        );
        if row.is_navigatable || resource.is_navigation_property(&row.name) {
            log.record(Issue {
                severity: Severity::Message,
                ..Issue::warning(IssueCode::AdditionalPropertyDetected, message)
            });
        } else {
            log.warning(IssueCode::AdditionalPropertyDetected, message);
        }
    }
    resource.parameters.push(row.clone());
}

fn is_method_table(kind: TableKind) -> bool {
    matches!(
        kind,
        TableKind::ErrorCodes
            | TableKind::PathParameters
            | TableKind::QueryParameters
            | TableKind::Headers
            | TableKind::RequestBody
    )
}

fn merge_method_tables(doc: &mut DocFile, log: &mut IssueLog) {
    let method_tables: Vec<usize> = doc
        .tables
        .iter()
        .enumerate()
        .filter(|(_, t)| is_method_table(t.kind))
        .map(|(i, _)| i)
        .collect();
    if method_tables.is_empty() || doc.requests.is_empty() {
        return;
    }

    if doc.requests.len() > 1 {
        let routes: Vec<Option<String>> =
            doc.requests.iter().map(MethodDefinition::logical_route).collect();
        let same_route = routes[0].is_some() && routes.iter().all(|r| *r == routes[0]);
        let mut kinds = HashSet::new();
        let repeated_kind = method_tables
            .iter()
            .any(|&i| !kinds.insert(doc.tables[i].kind));
        if !same_route && repeated_kind {
            let methods: Vec<&str> = doc.requests.iter().map(|r| r.identifier.as_str()).collect();
            let tables: Vec<String> = method_tables
                .iter()
                .map(|&i| {
                    let table = &doc.tables[i];
                    format!("{} (line {})", table.kind, table.line)
                })
                .collect();
            log.warning(
                IssueCode::AmbiguousTableMapping,
                format!(
                    "Unable to map tables to methods. Methods: [{}]. Tables: [{}]",
                    methods.join(", "),
                    tables.join(", ")
                ),
            );
            return;
        }
    }

    for &index in &method_tables {
        let table = &mut doc.tables[index];
        for method in &mut doc.requests {
            let mut scoped = log.scoped(&method.identifier);
            apply_table(method, table, &mut scoped);
            log.absorb(scoped);
        }
    }
}

fn apply_table(method: &mut MethodDefinition, table: &mut TableDefinition, log: &mut IssueLog) {
    match table.kind {
        TableKind::ErrorCodes => method.errors.extend(table.errors().iter().cloned()),
        TableKind::PathParameters | TableKind::QueryParameters | TableKind::Headers => {
            let (merged, issues) = merge_parameter_lists(&method.parameters, table.parameters());
            method.parameters = merged;
            log.extend(issues);
        }
        TableKind::RequestBody => {
            let (merged, issues) =
                merge_parameter_lists(&method.request_body_parameters, table.parameters());
            method.request_body_parameters = merged;
            log.extend(issues);
        }
        TableKind::Unknown
        | TableKind::ResponseHeaders
        | TableKind::Properties
        | TableKind::NavigationProperties
        | TableKind::AuthScopes
        | TableKind::EnumValues => return,
    }
    table.mark_used_by(method.identifier.clone());
}

fn check_enumerations(doc: &DocFile, log: &mut IssueLog) {
    let members: BTreeSet<String> = doc.enums().map(|m| m.member_name.to_lowercase()).collect();

    let string_params = doc
        .resources
        .iter()
        .flat_map(|r| r.parameters.iter())
        .chain(doc.requests.iter().flat_map(|m| {
            m.parameters.iter().chain(m.request_body_parameters.iter())
        }))
        .filter(|p| p.data_type.is_string());

    if members.len() > 1 {
        for param in string_params {
            let Some(description) = &param.description else {
                continue;
            };
            let words: BTreeSet<String> = description
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .map(str::to_lowercase)
                .collect();
            let shared = words.intersection(&members).count();
            if words.len() > 1 && shared > 1 {
                log.warning(
                    IssueCode::PossibleUndeclaredEnum,
                    format!(
                        "Property '{}' is a string but its description lists {shared} enum members",
                        param.name
                    ),
                );
            }
        }
    }

    for resource in &doc.resources {
        for param in &resource.parameters {
            let Some(value) = param.original_value.as_deref() else {
                continue;
            };
            let candidates: BTreeSet<&str> = value
                .split('|')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect();
            if candidates.len() < 2 {
                continue;
            }
            if !enum_covers(doc, &candidates) {
                log.warning(
                    IssueCode::MissingEnumDeclaration,
                    format!(
                        "Property '{}' of {} shows values '{value}' but no enumeration declares them",
                        param.name, resource.name
                    ),
                );
            }
        }
    }
}

/// Whether one declared enumeration type has every candidate as a member.
fn enum_covers(doc: &DocFile, candidates: &BTreeSet<&str>) -> bool {
    let mut by_type: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
    for member in doc.enums() {
        by_type
            .entry(member.identifier())
            .or_default()
            .insert(member.member_name.as_str());
    }
    by_type
        .values()
        .any(|declared| candidates.iter().all(|c| declared.contains(c)))
}

fn report_unused_tables(doc: &DocFile, log: &mut IssueLog) {
    for table in &doc.tables {
        let reportable = !matches!(
            table.kind,
            TableKind::AuthScopes | TableKind::EnumValues | TableKind::ResponseHeaders
        );
        if reportable && !table.is_used() {
            let heading = table.title.as_deref().unwrap_or("(no heading)");
            log.warning(
                IssueCode::UnusedTable,
                format!(
                    "{} table under '{heading}' on line {} was not merged into any resource or method",
                    table.kind, table.line
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan_document;
    use crate::test_helpers::*;

    fn merged(blocks: &[crate::block::Block]) -> (DocFile, IssueLog) {
        merged_with(blocks, &SchemaConfig::default())
    }

    fn merged_with(blocks: &[crate::block::Block], config: &SchemaConfig) -> (DocFile, IssueLog) {
        let mut log = IssueLog::new();
        let mut doc = scan_document("item.md", blocks, config, &mut log);
        ElementMerger::new(config).merge(&mut doc, &mut log);
        (doc, log)
    }

    fn resource_page(annotation: &str, json: &str, rows: &[&[&str]]) -> Vec<crate::block::Block> {
        vec![
            heading(1, "item resource type", 1),
            heading(2, "Properties", 3),
            table(&["Property", "Type", "Description"], rows, 5),
            heading(2, "JSON representation", 10),
            comment(annotation, 12),
            code("json", json, 13),
        ]
    }

    // =========================================================================
    // Namespace
    // =========================================================================

    #[test]
    fn namespace_inferred_from_first_resource() {
        let blocks = resource_page(
            r#"{"blockType":"resource","@odata.type":"foo.item"}"#,
            r#"{"id":"x"}"#,
            &[&["id", "String", "Id."]],
        );
        let (doc, _) = merged(&blocks);
        assert_eq!(doc.namespace.as_deref(), Some("foo"));
    }

    #[test]
    fn conflicting_page_namespace_is_an_error() {
        let mut blocks = resource_page(
            r#"{"blockType":"resource","@odata.type":"foo.item"}"#,
            r#"{"id":"x"}"#,
            &[&["id", "String", "Id."]],
        );
        blocks.insert(0, comment(r##"{"type":"#page.annotation","namespace":"bar"}"##, 0));
        let (doc, log) = merged(&blocks);
        assert!(log.has_code(IssueCode::NamespaceMismatch));
        assert_eq!(doc.namespace.as_deref(), Some("bar"));
    }

    #[test]
    fn default_namespace_is_last_resort() {
        let config = SchemaConfig {
            default_namespace: Some("microsoft.graph".into()),
            ..SchemaConfig::default()
        };
        let (doc, _) = merged_with(&[heading(1, "Overview", 1)], &config);
        assert_eq!(doc.namespace.as_deref(), Some("microsoft.graph"));
    }

    // =========================================================================
    // Resource tables
    // =========================================================================

    #[test]
    fn table_rows_merge_into_resource() {
        let blocks = resource_page(
            r#"{"blockType":"resource","@odata.type":"foo.item"}"#,
            r#"{"id":"x","created":"2015-01-01T00:00:00Z"}"#,
            &[
                &["id", "String", "The identifier."],
                &["created", "DateTimeOffset", "When."],
            ],
        );
        let (doc, log) = merged(&blocks);
        assert!(log.is_empty(), "{:?}", log.issues());
        let resource = &doc.resources[0];
        assert_eq!(
            resource.parameter("id").unwrap().description.as_deref(),
            Some("The identifier.")
        );
        assert_eq!(doc.tables[0].used_by, vec!["foo.item"]);
    }

    #[test]
    fn additional_property_on_closed_type_warns() {
        let blocks = resource_page(
            r#"{"blockType":"resource","@odata.type":"foo.item","optionalProperties":["extra"]}"#,
            r#"{"id":"x"}"#,
            &[&["id", "String", "Id."], &["extra", "String", "Extra."]],
        );
        let (doc, log) = merged(&blocks);
        assert!(log.has_code(IssueCode::AdditionalPropertyDetected));
        assert!(doc.resources[0].parameter("extra").is_some());
    }

    #[test]
    fn optional_property_on_open_type_is_silent() {
        let blocks = resource_page(
            r#"{"blockType":"resource","@odata.type":"foo.item","openType":true,"optionalProperties":["extra"]}"#,
            r#"{"id":"x"}"#,
            &[&["id", "String", "Id."], &["extra", "String", "Extra."]],
        );
        let (doc, log) = merged(&blocks);
        assert!(log.is_empty(), "{:?}", log.issues());
        assert!(doc.resources[0].parameter("extra").is_some());
    }

    #[test]
    fn navigation_additions_are_messages() {
        let blocks = vec![
            heading(1, "item resource type", 1),
            heading(2, "Relationships", 3),
            table(&["Name", "Type"], &[&["owner", "user"]], 5),
            comment(r#"{"blockType":"resource","@odata.type":"foo.item"}"#, 8),
            code("json", "{}", 9),
        ];
        let (_, log) = merged(&blocks);
        let addition = log
            .issues()
            .iter()
            .find(|i| i.code == IssueCode::AdditionalPropertyDetected)
            .unwrap();
        assert_eq!(addition.severity, Severity::Message);
    }

    #[test]
    fn undocumented_example_property_warns() {
        let blocks = resource_page(
            r#"{"blockType":"resource","@odata.type":"foo.item"}"#,
            r#"{"id":"x","secret":"y"}"#,
            &[&["id", "String", "Id."]],
        );
        let (_, log) = merged(&blocks);
        assert!(log.has_code(IssueCode::PropertyMissingFromTable));
        assert!(log.issues().iter().any(|i| i.message.contains("'secret'")));
    }

    #[test]
    fn type_downgrade_is_reported() {
        let blocks = resource_page(
            r#"{"blockType":"resource","@odata.type":"foo.item"}"#,
            r#"{"when":"2015-01-01T00:00:00Z"}"#,
            &[&["when", "String", "When."]],
        );
        let (_, log) = merged(&blocks);
        assert!(log.has_code(IssueCode::TypeSpecificityDowngrade));
        assert_eq!(
            log.issues()[0].source.as_deref(),
            Some("foo.item"),
            "merge issues are attributed to the resource"
        );
    }

    #[test]
    fn multiple_resources_skip_merge() {
        let mut blocks = resource_page(
            r#"{"blockType":"resource","@odata.type":"foo.item"}"#,
            r#"{"id":"x"}"#,
            &[&["id", "String", "Id."]],
        );
        blocks.push(comment(r#"{"blockType":"resource","@odata.type":"foo.other"}"#, 20));
        blocks.push(code("json", "{}", 21));
        let (doc, log) = merged(&blocks);
        assert!(log.has_code(IssueCode::MultipleResourcesInDocument));
        assert!(log.has_code(IssueCode::UnusedTable));
        assert!(doc.resources[0].parameter("id").unwrap().description.is_none());
    }

    // =========================================================================
    // Method tables
    // =========================================================================

    fn method_page(requests: &[&str], tables: &[(&str, &[&str], &[&[&str]])]) -> Vec<crate::block::Block> {
        let mut blocks = vec![heading(1, "Operation", 1)];
        let mut line = 2;
        for (title, headers, rows) in tables {
            blocks.push(heading(2, title, line));
            blocks.push(table(headers, rows, line + 1));
            line += 10;
        }
        for request in requests {
            blocks.push(comment(r#"{"blockType":"request"}"#, line));
            blocks.push(code("http", request, line + 1));
            line += 5;
        }
        blocks
    }

    #[test]
    fn single_method_takes_all_tables() {
        let blocks = method_page(
            &["GET /items/{id}"],
            &[
                ("Path parameters", &["Name", "Type"], &[&["id", "String"]]),
                ("Optional query parameters", &["Name", "Type"], &[&["$top", "Int32"]]),
                ("Error codes", &["Error Code", "HTTP Status"], &[&["notFound", "404"]]),
            ],
        );
        let (doc, log) = merged(&blocks);
        assert!(log.is_empty(), "{:?}", log.issues());
        let method = &doc.requests[0];
        assert_eq!(method.parameters.len(), 2);
        assert_eq!(method.errors[0].code, "notFound");
        assert!(doc.tables.iter().all(TableDefinition::is_used));
    }

    #[test]
    fn request_body_tables_merge_by_name() {
        let blocks = method_page(
            &["POST /items"],
            &[
                ("Request body", &["Property", "Type"], &[&["name", "String"]]),
                ("Request body (continued)", &["Property", "Type"], &[&["name", "String"], &["size", "Int64"]]),
            ],
        );
        let (doc, _) = merged(&blocks);
        let names: Vec<_> = doc.requests[0]
            .request_body_parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["name", "size"]);
    }

    #[test]
    fn same_route_methods_share_tables() {
        let blocks = method_page(
            &["GET /items/{id}", "GET /items/42"],
            &[
                ("Path parameters", &["Name", "Type"], &[&["id", "String"]]),
                ("Path parameters", &["Name", "Type"], &[&["id", "String"]]),
            ],
        );
        let (doc, log) = merged(&blocks);
        assert!(!log.has_code(IssueCode::AmbiguousTableMapping));
        assert!(doc.requests.iter().all(|m| m.parameters.len() == 1));
    }

    #[test]
    fn ambiguous_mapping_is_reported_not_guessed() {
        let blocks = method_page(
            &["GET /items/{id}", "GET /users/{id}"],
            &[
                ("Path parameters", &["Name", "Type"], &[&["id", "String"]]),
                ("Path parameters", &["Name", "Type"], &[&["id", "String"]]),
            ],
        );
        let (doc, log) = merged(&blocks);
        let warnings: Vec<_> = log
            .issues()
            .iter()
            .filter(|i| i.code == IssueCode::AmbiguousTableMapping)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("item.md #1"));
        assert!(doc.requests.iter().all(|m| m.parameters.is_empty()));
    }

    #[test]
    fn distinct_table_kinds_apply_to_every_method() {
        let blocks = method_page(
            &["GET /items/{id}", "GET /users/{id}"],
            &[("Path parameters", &["Name", "Type"], &[&["id", "String"]])],
        );
        let (doc, log) = merged(&blocks);
        assert!(log.is_empty());
        assert!(doc.requests.iter().all(|m| m.parameters.len() == 1));
        assert_eq!(doc.tables[0].used_by.len(), 2);
    }

    // =========================================================================
    // Enumerations
    // =========================================================================

    #[test]
    fn description_listing_members_suggests_enum() {
        let blocks = vec![
            heading(1, "item resource type", 1),
            heading(2, "Properties", 2),
            table(
                &["Property", "Type", "Description"],
                &[&["color", "String", "One of red, green or blue."]],
                3,
            ),
            heading(2, "colorName values", 6),
            table(&["Member"], &[&["red"], &["green"], &["blue"]], 7),
            comment(r#"{"blockType":"resource","@odata.type":"foo.item"}"#, 12),
            code("json", r#"{"color":"red"}"#, 13),
        ];
        let (_, log) = merged(&blocks);
        assert!(log.has_code(IssueCode::PossibleUndeclaredEnum));
        assert!(!log.has_code(IssueCode::UnusedTable));
    }

    #[test]
    fn pipe_values_need_an_enum_table() {
        let blocks = resource_page(
            r#"{"blockType":"resource","@odata.type":"foo.item"}"#,
            r#"{"color":"red | green"}"#,
            &[&["color", "colorName", "Color."]],
        );
        let (_, log) = merged(&blocks);
        assert!(log.has_code(IssueCode::MissingEnumDeclaration));

        let mut covered = blocks.clone();
        covered.push(heading(2, "colorName values", 30));
        covered.push(table(&["Member"], &[&["red"], &["green"]], 31));
        let (_, log) = merged(&covered);
        assert!(!log.has_code(IssueCode::MissingEnumDeclaration));
    }
}
