//! Payload introspection: which modules does a document talk about?
//!
//! These scans run before any schema exists to validate the payload, so they
//! are deliberately heuristic: namespace attributes and key/value qualifier
//! patterns, not semantic checks. Under-reporting an identifier only delays
//! loading until a later query; over-reporting is harmless because unknown
//! identifiers never pass the capability lookup.

use crate::error::{Error, Result};
use crate::pathutil;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// Collect the namespace URI of every element in the document.
///
/// Elements without a namespace contribute nothing. The result is a set;
/// no visit-order guarantee carries into it.
pub fn xml_namespaces(doc: &roxmltree::Document) -> BTreeSet<String> {
    debug!("extracting module namespaces from XML payload");
    doc.descendants()
        .filter(|node| node.is_element())
        .filter_map(|node| node.tag_name().namespace())
        .map(str::to_string)
        .collect()
}

/// Parse `payload` as XML and collect element namespaces.
pub fn xml_namespaces_from_str(payload: &str) -> Result<BTreeSet<String>> {
    let doc = roxmltree::Document::parse(payload)?;
    Ok(xml_namespaces(&doc))
}

/// Collect every module name referenced anywhere in a JSON value.
///
/// Object keys containing the qualifier delimiter contribute the prefix
/// before its first occurrence. Scalar member values are additionally
/// scanned for embedded qualified identifiers (a value may itself be a
/// segmented list such as `"mod-b:value mod-c:other"`).
pub fn json_module_names(value: &Value) -> BTreeSet<String> {
    debug!("extracting module names from JSON payload");
    let mut names = BTreeSet::new();
    collect_module_names(value, &mut names);
    names
}

/// Parse `payload` as JSON and collect referenced module names.
pub fn json_module_names_from_str(payload: &str) -> Result<BTreeSet<String>> {
    let value: Value = serde_json::from_str(payload)?;
    Ok(json_module_names(&value))
}

fn collect_module_names(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_module_names(item, names);
            }
        }
        Value::Object(members) => {
            for (key, member) in members {
                if let (Some(prefix), _) = pathutil::split_qualifier(key) {
                    names.insert(prefix.to_string());
                }
                match scalar_text(member) {
                    Some(text) => names.extend(pathutil::module_prefixes(&text)),
                    None => collect_module_names(member, names),
                }
            }
        }
        _ => {}
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(_) | Value::Bool(_) | Value::Null => Some(value.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// The module name of the document's top-level member key.
///
/// The key's prefix before the first qualifier delimiter is the module name;
/// an unqualified key is taken as the module name whole. Documents without a
/// top-level member are rejected.
pub fn top_level_module_name(value: &Value) -> Result<String> {
    debug!("extracting top level module name from JSON payload");
    let members = value
        .as_object()
        .ok_or_else(|| Error::invalid_argument("payload has no top-level object"))?;
    let key = members
        .keys()
        .next()
        .ok_or_else(|| Error::invalid_argument("payload has no top-level members"))?;
    match pathutil::split_qualifier(key) {
        (Some(prefix), _) => Ok(prefix.to_string()),
        (None, _) => Ok(key.clone()),
    }
}

/// Parse `payload` as JSON and extract the top-level module name.
pub fn top_level_module_name_from_str(payload: &str) -> Result<String> {
    let value: Value = serde_json::from_str(payload)?;
    top_level_module_name(&value)
}
