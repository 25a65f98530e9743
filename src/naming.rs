//! Centralized naming conventions shared by every stage.
//!
//! Two conventions live here so the scanner, the link validator, and the type
//! resolver agree on them:
//!
//! ## Bookmarks
//!
//! Every heading produces a bookmark that links can target with `#name`:
//! - `## Properties` → `properties`
//! - `### Get item (beta)` → `get-item-beta`
//! - `## JSON representation` → `json-representation`
//! - `## created_date_time property` → `created_date_time-property`
//!
//! ## Type names
//!
//! Documented type names are lower-camel-cased on their first letter
//! (`DriveItem` → `driveItem`) and qualified with a namespace when they have
//! none (`driveItem` → `microsoft.graph.driveItem`).

/// Convert heading text to its bookmark slug.
///
/// Lowercases, turns runs of whitespace into a single `-`, keeps
/// alphanumerics, `-` and `_`, and drops all other punctuation.
pub fn bookmark_for_heading(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.trim().chars() {
        if c.is_whitespace() {
            pending_dash = !slug.is_empty();
        } else if c.is_alphanumeric() || c == '-' || c == '_' {
            if pending_dash {
                slug.push('-');
                pending_dash = false;
            }
            slug.extend(c.to_lowercase());
        }
    }
    slug
}

/// Lowercase the first character, leaving the rest untouched.
pub fn lower_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split a dotted type identifier into `(namespace, type_name)`.
///
/// - `"foo.bar.item"` → `(Some("foo.bar"), "item")`
/// - `"item"` → `(None, "item")`
pub fn split_namespace(identifier: &str) -> (Option<&str>, &str) {
    match identifier.rsplit_once('.') {
        Some((ns, name)) if !ns.is_empty() => (Some(ns), name),
        _ => (None, identifier),
    }
}

/// Qualify `name` with `namespace` unless it already contains a dot.
pub fn qualify(name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) if !name.contains('.') && !ns.is_empty() => format!("{ns}.{name}"),
        _ => name.to_string(),
    }
}
