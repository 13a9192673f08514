//! Module definitions, the compiler seam, and on-demand resolution.
//!
//! A `ModuleDef` is the deserializable form of one schema module: its
//! declaration trees in declaration order plus the augments it wants to graft
//! into other modules' trees. `ModuleSource` is the seam to whatever compiles
//! or serves these documents; `ModuleRepository` is the in-memory
//! implementation used by tests and by deployments that pre-register their
//! module set.

use crate::capability::CapabilityTable;
use crate::context::{Context, ModuleId};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Clone, Debug, Default, Deserialize)]
/// One schema module as served by a module source.
pub struct ModuleDef {
    pub name: String,
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub declarations: Vec<DeclDef>,
    #[serde(default)]
    pub augments: Vec<AugmentDef>,
}

#[derive(Clone, Debug, Default, Deserialize)]
/// One declaration in a module's tree.
///
/// `keyword` is the statement kind (`container`, `list`, `leaf`, `rpc`,
/// `uses`, ...). `keys` is only meaningful for list-like declarations and
/// keeps its declared order.
pub struct DeclDef {
    pub keyword: String,
    pub name: String,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub children: Vec<DeclDef>,
}

#[derive(Clone, Debug, Default, Deserialize)]
/// A subtree this module grafts into another tree position.
///
/// `target` is an absolute path (`/mod:container/inner`) resolved against
/// whatever modules are loaded; resolution may be deferred until the target's
/// module arrives.
pub struct AugmentDef {
    pub target: String,
    #[serde(default)]
    pub children: Vec<DeclDef>,
}

/// Seam to the external schema compiler.
///
/// Implementations return the compiled-document form of the requested module
/// or fail with [`Error::UnknownModule`]. `revision` of `None` means "the
/// source's preferred revision".
pub trait ModuleSource {
    fn compile_module(&self, name: &str, revision: Option<&str>) -> Result<ModuleDef>;
}

#[derive(Debug, Default)]
/// In-memory module source over pre-registered definitions.
///
/// Multiple revisions of one module may be registered; an exact revision
/// request must match, and a revisionless request gets the most recently
/// registered definition.
pub struct ModuleRepository {
    modules: BTreeMap<String, Vec<ModuleDef>>,
}

impl ModuleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition for later compilation requests.
    pub fn register(&mut self, def: ModuleDef) {
        self.modules.entry(def.name.clone()).or_default().push(def);
    }

    /// Read a definition from a JSON document and register it.
    pub fn register_from_path(&mut self, path: &Path) -> Result<()> {
        self.register(load_module_from_path(path)?);
        Ok(())
    }
}

impl ModuleSource for ModuleRepository {
    fn compile_module(&self, name: &str, revision: Option<&str>) -> Result<ModuleDef> {
        let unknown = || Error::UnknownModule {
            name: name.to_string(),
            revision: revision.map(str::to_string),
        };
        let revisions = self.modules.get(name).ok_or_else(unknown)?;
        let def = match revision {
            Some(wanted) => revisions
                .iter()
                .find(|def| def.revision.as_deref() == Some(wanted)),
            None => revisions.last(),
        };
        def.cloned().ok_or_else(unknown)
    }
}

/// Parse one module definition from a JSON document on disk.
pub fn load_module_from_path(path: &Path) -> Result<ModuleDef> {
    let data = fs::read_to_string(path)
        .map_err(|err| Error::invalid_argument(format!("reading {}: {err}", path.display())))?;
    let def: ModuleDef = serde_json::from_str(&data)?;
    if def.name.trim().is_empty() {
        return Err(Error::invalid_argument(format!(
            "module document {} names no module",
            path.display()
        )));
    }
    Ok(def)
}

/// Load the modules a set of identifiers implies, returning only new ones.
///
/// Identifiers missing from `table` are expected noise in free-form payloads
/// and contribute nothing. Identifiers whose module is already loaded are
/// skipped, which is what makes every `populate_*` caller idempotent. The
/// result preserves the table's deterministic identifier order.
pub fn resolve_new_modules(
    ctx: &mut Context,
    source: &dyn ModuleSource,
    identifiers: &BTreeSet<String>,
    table: &CapabilityTable,
) -> Result<Vec<ModuleId>> {
    let mut newly_loaded = Vec::new();
    for identifier in identifiers {
        let Some(capability) = table.get(identifier) else {
            debug!(%identifier, "identifier not in capability lookup, skipping");
            continue;
        };
        if ctx.is_loaded(&capability.module) {
            continue;
        }
        let def = source.compile_module(&capability.module, capability.revision.as_deref())?;
        debug!(module = %def.name, "compiled module for identifier '{identifier}'");
        newly_loaded.push(ctx.load(def)?);
    }
    Ok(newly_loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, revision: Option<&str>) -> ModuleDef {
        ModuleDef {
            name: name.to_string(),
            revision: revision.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn revisionless_request_prefers_latest_registration() {
        let mut repo = ModuleRepository::new();
        repo.register(def("mod-a", Some("2023-06-01")));
        repo.register(def("mod-a", Some("2024-01-15")));
        let compiled = repo.compile_module("mod-a", None).unwrap();
        assert_eq!(compiled.revision.as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn exact_revision_must_match() {
        let mut repo = ModuleRepository::new();
        repo.register(def("mod-a", Some("2023-06-01")));
        assert!(repo.compile_module("mod-a", Some("2023-06-01")).is_ok());
        assert!(matches!(
            repo.compile_module("mod-a", Some("1999-01-01")),
            Err(Error::UnknownModule { .. })
        ));
    }

    #[test]
    fn unregistered_module_is_unknown() {
        let repo = ModuleRepository::new();
        assert!(matches!(
            repo.compile_module("absent", None),
            Err(Error::UnknownModule { .. })
        ));
    }
}
