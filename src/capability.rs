//! Capability lookup tables mapping payload identifiers to modules.
//!
//! A capability names the module (and optionally the revision) to load when a
//! given identifier shows up in a payload or a path. Two tables exist per
//! tree: one keyed by module name (JSON payloads, path prefixes) and one
//! keyed by namespace URI (XML payloads). Both are supplied at tree
//! construction and never mutated afterwards.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
/// Which module (and revision) an identifier resolves to.
pub struct Capability {
    pub module: String,
    #[serde(default)]
    pub revision: Option<String>,
}

impl Capability {
    pub fn new(module: impl Into<String>) -> Self {
        Capability {
            module: module.into(),
            revision: None,
        }
    }

    pub fn with_revision(module: impl Into<String>, revision: impl Into<String>) -> Self {
        Capability {
            module: module.into(),
            revision: Some(revision.into()),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
/// Read-only identifier → capability mapping.
///
/// Keys are unique by map construction; a deterministic `BTreeMap` keeps
/// resolver output stable regardless of insertion order.
pub struct CapabilityTable {
    entries: BTreeMap<String, Capability>,
}

impl CapabilityTable {
    /// Register one identifier before the table is handed to a tree.
    pub fn register(&mut self, identifier: impl Into<String>, capability: Capability) {
        self.entries.insert(identifier.into(), capability);
    }

    pub fn get(&self, identifier: &str) -> Option<&Capability> {
        self.entries.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates identifiers in stable order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Capability)> for CapabilityTable {
    fn from_iter<I: IntoIterator<Item = (String, Capability)>>(iter: I) -> Self {
        CapabilityTable {
            entries: iter.into_iter().collect(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
/// The lookup pair injected into a tree at construction.
pub struct CapabilityLookups {
    #[serde(default)]
    pub by_name: CapabilityTable,
    #[serde(default)]
    pub by_namespace: CapabilityTable,
}

impl CapabilityLookups {
    /// Load and validate a lookup document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|err| Error::invalid_argument(format!("reading {}: {err}", path.display())))?;
        let lookups: CapabilityLookups = serde_json::from_str(&data)?;
        lookups.validate()?;
        Ok(lookups)
    }

    /// Reject documents that would make resolution ambiguous or silently
    /// dead: empty identifiers and capabilities without a module name.
    pub fn validate(&self) -> Result<()> {
        validate_table("by_name", &self.by_name)?;
        validate_table("by_namespace", &self.by_namespace)?;
        Ok(())
    }
}

fn validate_table(label: &str, table: &CapabilityTable) -> Result<()> {
    for (identifier, capability) in &table.entries {
        if identifier.trim().is_empty() {
            return Err(Error::invalid_argument(format!(
                "{label} contains an empty identifier"
            )));
        }
        if capability.module.trim().is_empty() {
            return Err(Error::invalid_argument(format!(
                "{label} entry '{identifier}' names no module"
            )));
        }
        if let Some(revision) = &capability.revision {
            if revision.trim().is_empty() {
                return Err(Error::invalid_argument(format!(
                    "{label} entry '{identifier}' has an empty revision"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_round_trips_from_json() {
        let doc = r#"{
            "by_name": {"mod-a": {"module": "mod-a"}},
            "by_namespace": {"urn:a": {"module": "mod-a", "revision": "2024-01-15"}}
        }"#;
        let lookups: CapabilityLookups = serde_json::from_str(doc).unwrap();
        lookups.validate().unwrap();
        assert_eq!(lookups.by_name.get("mod-a").unwrap().module, "mod-a");
        let cap = lookups.by_namespace.get("urn:a").unwrap();
        assert_eq!(cap.revision.as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn validation_rejects_empty_module() {
        let mut lookups = CapabilityLookups::default();
        lookups.by_name.register("mod-a", Capability::new(""));
        assert!(matches!(
            lookups.validate(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn missing_identifier_resolves_to_none() {
        let lookups = CapabilityLookups::default();
        assert!(lookups.by_name.get("absent").is_none());
    }
}
