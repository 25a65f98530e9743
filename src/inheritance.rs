//! Cross-document resource inheritance.
//!
//! The same resource may be documented on several pages. Resources are grouped
//! by name, their base-type declarations reconciled, and the groups sorted so
//! every base type comes before the resources deriving from it. Base types
//! are resolved by index into the graph's resource list.
//!
//! A declared base type missing on some duplicates is copied from the one
//! that has it; two different non-empty declarations are an error.

use crate::issues::{Issue, IssueCode, IssueLog};
use crate::naming::split_namespace;
use crate::resource::ResourceDefinition;
use std::collections::{BTreeSet, HashMap};

/// Type name every error response resolves to without being documented.
pub const BUILTIN_ERROR_TYPE: &str = "odata.error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// All resources of a doc set, grouped by name and sorted base-first.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    resources: Vec<ResourceDefinition>,
    /// Names in first-seen order.
    names: Vec<String>,
    by_name: HashMap<String, Vec<usize>>,
    /// Base type each definition declared itself, before duplicates were
    /// reconciled.
    declared_base: Vec<Option<String>>,
    order: Vec<usize>,
}

impl ResourceGraph {
    /// Group, reconcile and sort `resources`.
    pub fn resolve(resources: Vec<ResourceDefinition>, log: &mut IssueLog) -> Self {
        let declared_base = resources.iter().map(|r| r.base_type.clone()).collect();
        let mut graph = ResourceGraph {
            resources,
            declared_base,
            ..ResourceGraph::default()
        };
        for (index, resource) in graph.resources.iter().enumerate() {
            let group = graph.by_name.entry(resource.name.clone()).or_default();
            if group.is_empty() {
                graph.names.push(resource.name.clone());
            }
            group.push(index);
        }

        graph.report_case_mismatches(log);
        graph.reconcile_base_types(log);
        graph.sort(log);
        graph.link_base_types();
        graph
    }

    fn report_case_mismatches(&self, log: &mut IssueLog) {
        let mut seen: HashMap<String, &str> = HashMap::new();
        for name in &self.names {
            match seen.get(&name.to_lowercase()) {
                Some(other) => log.record(
                    Issue::warning(
                        IssueCode::ResourceNameCaseMismatch,
                        format!("Resource '{name}' differs only in case from '{other}'"),
                    )
                    .with_pages(self.pages_of([name.as_str(), *other])),
                ),
                None => {
                    seen.insert(name.to_lowercase(), name);
                }
            }
        }
    }

    /// Pages defining any of `names`, sorted and deduplicated.
    fn pages_of<'n>(&self, names: impl IntoIterator<Item = &'n str>) -> Vec<String> {
        let pages: BTreeSet<&str> = names
            .into_iter()
            .filter_map(|name| self.by_name.get(name))
            .flatten()
            .map(|&i| self.resources[i].source_file.as_str())
            .collect();
        pages.into_iter().map(str::to_string).collect()
    }

    fn reconcile_base_types(&mut self, log: &mut IssueLog) {
        for name in &self.names {
            let group = &self.by_name[name];
            let declared: BTreeSet<&str> = group
                .iter()
                .filter_map(|&i| self.resources[i].base_type.as_deref())
                .collect();
            match declared.len() {
                0 => {}
                1 => {
                    let base = declared.iter().next().map(|b| b.to_string());
                    for &i in group {
                        self.resources[i].base_type = base.clone();
                    }
                }
                _ => {
                    let files: Vec<String> = group
                        .iter()
                        .map(|&i| {
                            let r = &self.resources[i];
                            format!(
                                "{} ({})",
                                r.source_file,
                                r.base_type.as_deref().unwrap_or("none")
                            )
                        })
                        .collect();
                    log.record(
                        Issue::error(
                            IssueCode::BaseTypeConflict,
                            format!(
                                "Resource '{name}' declares conflicting base types: {}",
                                files.join(", ")
                            ),
                        )
                        .with_pages(self.pages_of([name.as_str()])),
                    );
                }
            }
        }
    }

    fn sort(&mut self, log: &mut IssueLog) {
        let mut marks: HashMap<String, Mark> = HashMap::new();
        let mut chain = Vec::new();
        let names = self.names.clone();
        for name in &names {
            self.visit(name, &mut marks, &mut chain, log);
        }
    }

    fn visit(
        &mut self,
        name: &str,
        marks: &mut HashMap<String, Mark>,
        chain: &mut Vec<String>,
        log: &mut IssueLog,
    ) {
        match marks.get(name) {
            Some(Mark::Done) => return,
            Some(Mark::InProgress) => {
                let start = chain.iter().position(|n| n == name).unwrap_or(0);
                let mut cycle: Vec<&str> = chain[start..].iter().map(String::as_str).collect();
                cycle.push(name);
                log.record(
                    Issue::error(
                        IssueCode::CircularBaseType,
                        format!("Circular base type dependency: {}", cycle.join(" -> ")),
                    )
                    .with_pages(self.pages_of(cycle.iter().copied())),
                );
                return;
            }
            None => {}
        }
        let Some(group) = self.by_name.get(name).cloned() else {
            return;
        };

        marks.insert(name.to_string(), Mark::InProgress);
        chain.push(name.to_string());
        let bases: BTreeSet<String> = group
            .iter()
            .filter_map(|&i| self.resources[i].base_type.clone())
            .collect();
        for base in &bases {
            tracing::trace!(resource = name, base = %base, "visiting base type");
            if self.by_name.contains_key(base) {
                self.visit(base, marks, chain, log);
            }
        }
        chain.pop();
        self.order.extend(group);
        marks.insert(name.to_string(), Mark::Done);
    }

    fn link_base_types(&mut self) {
        for index in 0..self.resources.len() {
            let resolved = self.resources[index]
                .base_type
                .as_deref()
                .and_then(|base| self.by_name.get(base))
                .and_then(|group| group.first().copied());
            self.resources[index].resolved_base_type = resolved;
        }
    }

    pub fn resources(&self) -> &[ResourceDefinition] {
        &self.resources
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Every definition, base types first.
    pub fn sorted(&self) -> impl Iterator<Item = &ResourceDefinition> {
        self.order.iter().map(|&i| &self.resources[i])
    }

    /// Distinct resource names, base types first.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for resource in self.sorted() {
            if names.last() != Some(&resource.name.as_str()) {
                names.push(&resource.name);
            }
        }
        names
    }

    pub fn definitions<'g>(&'g self, name: &str) -> impl Iterator<Item = &'g ResourceDefinition> {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(|&i| &self.resources[i])
    }

    /// The resolved base definition of `resource`.
    pub fn base_of(&self, resource: &ResourceDefinition) -> Option<&ResourceDefinition> {
        resource
            .resolved_base_type
            .and_then(|i| self.resources.get(i))
    }

    /// Check that declared base types and the custom types of every property
    /// name a known resource, enumeration or the built-in error type.
    ///
    /// Unqualified references are qualified with the referring resource's
    /// namespace first.
    pub fn check_references(&self, enum_identifiers: &BTreeSet<String>, log: &mut IssueLog) {
        let mut known: BTreeSet<&str> = self.names.iter().map(String::as_str).collect();
        known.extend(enum_identifiers.iter().map(String::as_str));
        known.insert(BUILTIN_ERROR_TYPE);

        let mut reported = BTreeSet::new();
        for (index, resource) in self.resources.iter().enumerate() {
            let namespace = resource.namespace();
            let references = self.declared_base[index]
                .iter()
                .map(|b| ("base type", b.as_str()))
                .chain(resource.parameters.iter().filter_map(|p| {
                    p.data_type
                        .custom_type_name()
                        .map(|t| ("property type", t))
                }));
            for (role, reference) in references {
                let qualified = match (split_namespace(reference).0, namespace) {
                    (None, Some(ns)) => format!("{ns}.{reference}"),
                    _ => reference.to_string(),
                };
                if known.contains(qualified.as_str()) || known.contains(reference) {
                    continue;
                }
                if !reported.insert((resource.name.clone(), qualified.clone())) {
                    continue;
                }
                let suggestion = suggest(&qualified, &known)
                    .map(|s| format!(" Did you mean '{s}'?"))
                    .unwrap_or_default();
                log.record(
                    Issue::error(
                        IssueCode::UnresolvedTypeReference,
                        format!(
                            "Resource '{}' references unknown {role} '{qualified}'.{suggestion}",
                            resource.name
                        ),
                    )
                    .with_source(&resource.source_file),
                );
            }
        }
    }
}

/// First known name containing, or contained in, `reference`.
fn suggest<'k>(reference: &str, known: &BTreeSet<&'k str>) -> Option<&'k str> {
    let lookup = reference.to_lowercase();
    known.iter().copied().find(|name| {
        let name = name.to_lowercase();
        name.contains(&lookup) || lookup.contains(&name)
    })
}
