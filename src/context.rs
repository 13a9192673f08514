//! Compiled-module store: the schema-engine side of the tree.
//!
//! All compiled declarations live in one arena addressed by stable
//! [`NodeId`]s; parent and child links are indices, never pointers, so the
//! wrapper tree can reference engine nodes without ownership cycles. Loading
//! is monotonic: a module, once loaded, stays for the life of the context,
//! and loading it again is a no-op.
//!
//! Grouping references (`uses`) are compiled like any other declaration but
//! are transparent to path lookup: their children are addressable as if they
//! sat directly under the reference's parent.

use crate::error::{Error, Result};
use crate::module::ModuleDef;
use crate::pathutil;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Statement keyword of a grouping reference, the one transparent node kind.
pub const GROUPING_REF_KEYWORD: &str = "uses";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
/// Stable identifier of one compiled declaration.
pub struct NodeId(usize);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
/// Identifier of one loaded module.
pub struct ModuleId(usize);

#[derive(Clone, Debug, Default, Eq, PartialEq)]
/// Keyword/argument pair of one declaration.
pub struct Statement {
    pub keyword: String,
    pub argument: String,
}

#[derive(Debug)]
struct Decl {
    stmt: Statement,
    module: ModuleId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    keys: Vec<String>,
}

#[derive(Debug)]
struct Augment {
    target_path: String,
    children: Vec<NodeId>,
    placed: bool,
}

#[derive(Debug)]
struct CompiledModule {
    name: String,
    revision: Option<String>,
    namespace: Option<String>,
    top: Vec<NodeId>,
    augments: Vec<Augment>,
}

#[derive(Clone, Debug)]
/// An augment that just found its target: which module declared it, where it
/// landed, and the subtree roots that were attached.
pub struct PlacedAugment {
    pub module: ModuleId,
    pub target: NodeId,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Default)]
/// Process-scoped store of every module compiled for one tree instance.
pub struct Context {
    decls: Vec<Decl>,
    modules: Vec<CompiledModule>,
    by_name: BTreeMap<String, ModuleId>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn module_id(&self, name: &str) -> Option<ModuleId> {
        self.by_name.get(name).copied()
    }

    /// Iterates loaded modules in load order.
    pub fn modules(&self) -> impl Iterator<Item = ModuleId> {
        (0..self.modules.len()).map(ModuleId)
    }

    pub fn module_name(&self, id: ModuleId) -> &str {
        &self.modules[id.0].name
    }

    pub fn module_revision(&self, id: ModuleId) -> Option<&str> {
        self.modules[id.0].revision.as_deref()
    }

    pub fn module_namespace(&self, id: ModuleId) -> Option<&str> {
        self.modules[id.0].namespace.as_deref()
    }

    /// Top-level declarations of a module, in declaration order.
    pub fn top_level_nodes(&self, id: ModuleId) -> &[NodeId] {
        &self.modules[id.0].top
    }

    pub fn statement(&self, id: NodeId) -> &Statement {
        &self.decls[id.0].stmt
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.decls[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.decls[id.0].children
    }

    pub fn keys(&self, id: NodeId) -> &[String] {
        &self.decls[id.0].keys
    }

    pub fn node_module(&self, id: NodeId) -> ModuleId {
        self.decls[id.0].module
    }

    /// Total number of compiled declarations. Stable across repeated loads
    /// of the same modules.
    pub fn node_count(&self) -> usize {
        self.decls.len()
    }

    /// Compile one module definition into the arena.
    ///
    /// Loading an already-loaded module name returns the existing id without
    /// touching the arena. Augments are staged unplaced; call
    /// [`Context::resolve_augments`] after a batch of loads to attach them.
    pub fn load(&mut self, def: ModuleDef) -> Result<ModuleId> {
        if def.name.trim().is_empty() {
            return Err(Error::invalid_argument("module definition names no module"));
        }
        if let Some(&existing) = self.by_name.get(&def.name) {
            debug!(module = %def.name, "module already loaded");
            return Ok(existing);
        }

        let id = ModuleId(self.modules.len());
        let mut top = Vec::with_capacity(def.declarations.len());
        for decl in &def.declarations {
            top.push(self.insert_decl(decl, id, None)?);
        }
        let mut augments = Vec::with_capacity(def.augments.len());
        for aug in &def.augments {
            let mut children = Vec::with_capacity(aug.children.len());
            for child in &aug.children {
                children.push(self.insert_decl(child, id, None)?);
            }
            augments.push(Augment {
                target_path: aug.target.clone(),
                children,
                placed: false,
            });
        }

        debug!(module = %def.name, tops = top.len(), augments = augments.len(), "loaded module");
        self.by_name.insert(def.name.clone(), id);
        self.modules.push(CompiledModule {
            name: def.name,
            revision: def.revision,
            namespace: def.namespace,
            top,
            augments,
        });
        Ok(id)
    }

    fn insert_decl(
        &mut self,
        def: &crate::module::DeclDef,
        module: ModuleId,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        if def.keyword.trim().is_empty() || def.name.trim().is_empty() {
            return Err(Error::invalid_argument(
                "declaration is missing a keyword or a name",
            ));
        }
        let id = NodeId(self.decls.len());
        self.decls.push(Decl {
            stmt: Statement {
                keyword: def.keyword.clone(),
                argument: def.name.clone(),
            },
            module,
            parent,
            children: Vec::new(),
            keys: def.keys.clone(),
        });
        let mut children = Vec::with_capacity(def.children.len());
        for child in &def.children {
            children.push(self.insert_decl(child, module, Some(id))?);
        }
        self.decls[id.0].children = children;
        Ok(id)
    }

    /// Attach every augment whose target is now resolvable.
    ///
    /// Runs to a fixpoint so augments targeting positions created by other
    /// augments in the same batch still land. Returns exactly the augments
    /// placed by this call; augments whose target module is still missing
    /// stay pending and are retried on the next call.
    pub fn resolve_augments(&mut self) -> Vec<PlacedAugment> {
        let mut placed_now = Vec::new();
        loop {
            let mut progressed = false;
            for m in 0..self.modules.len() {
                for a in 0..self.modules[m].augments.len() {
                    if self.modules[m].augments[a].placed {
                        continue;
                    }
                    let target_path = self.modules[m].augments[a].target_path.clone();
                    let Some(target) = self.lookup_node(&target_path) else {
                        continue;
                    };
                    let children = self.modules[m].augments[a].children.clone();
                    for &child in &children {
                        self.decls[child.0].parent = Some(target);
                    }
                    self.decls[target.0].children.extend(children.iter().copied());
                    self.modules[m].augments[a].placed = true;
                    debug!(
                        module = %self.modules[m].name,
                        %target_path,
                        "placed augment"
                    );
                    placed_now.push(PlacedAugment {
                        module: ModuleId(m),
                        target,
                        children,
                    });
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
        for module in &self.modules {
            for augment in &module.augments {
                if !augment.placed {
                    warn!(
                        module = %module.name,
                        target_path = %augment.target_path,
                        "augment target not loaded yet, leaving pending"
                    );
                }
            }
        }
        placed_now
    }

    /// Number of augments still waiting for their target module.
    pub fn pending_augments(&self) -> usize {
        self.modules
            .iter()
            .flat_map(|m| &m.augments)
            .filter(|a| !a.placed)
            .count()
    }

    /// Resolve a slash-separated path to a declaration.
    ///
    /// Segments may carry a module qualifier (`mod:name`); a qualifier must
    /// match the owning module's name. Unqualified top-level segments are
    /// searched across all loaded modules in load order. Grouping references
    /// are descended through transparently.
    pub fn lookup_node(&self, path: &str) -> Option<NodeId> {
        let segs = pathutil::segments(path);
        if segs.is_empty() {
            return None;
        }
        let mut current: Option<NodeId> = None;
        for seg in segs {
            let (qualifier, name) = pathutil::split_qualifier(seg);
            let found = match current {
                None => self.find_top(qualifier, name),
                Some(node) => self.search(&self.decls[node.index()].children, qualifier, name),
            }?;
            current = Some(found);
        }
        current
    }

    fn find_top(&self, qualifier: Option<&str>, name: &str) -> Option<NodeId> {
        for module in &self.modules {
            if let Some(found) = self.search(&module.top, qualifier, name) {
                return Some(found);
            }
        }
        None
    }

    fn search(&self, ids: &[NodeId], qualifier: Option<&str>, name: &str) -> Option<NodeId> {
        for &id in ids {
            let decl = &self.decls[id.0];
            if decl.stmt.keyword == GROUPING_REF_KEYWORD {
                if let Some(found) = self.search(&decl.children, qualifier, name) {
                    return Some(found);
                }
                continue;
            }
            if decl.stmt.argument != name {
                continue;
            }
            if let Some(q) = qualifier {
                if self.modules[decl.module.0].name != q {
                    continue;
                }
            }
            return Some(id);
        }
        None
    }
}

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{AugmentDef, DeclDef};

    fn container(name: &str, children: Vec<DeclDef>) -> DeclDef {
        DeclDef {
            keyword: "container".to_string(),
            name: name.to_string(),
            children,
            ..Default::default()
        }
    }

    fn leaf(name: &str) -> DeclDef {
        DeclDef {
            keyword: "leaf".to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn module_a() -> ModuleDef {
        ModuleDef {
            name: "mod-a".to_string(),
            namespace: Some("urn:a".to_string()),
            declarations: vec![container("top", vec![leaf("inner")])],
            ..Default::default()
        }
    }

    #[test]
    fn load_is_idempotent() {
        let mut ctx = Context::new();
        let first = ctx.load(module_a()).unwrap();
        let count = ctx.node_count();
        let second = ctx.load(module_a()).unwrap();
        assert_eq!(first, second);
        assert_eq!(ctx.node_count(), count);
    }

    #[test]
    fn lookup_accepts_qualified_and_plain_segments() {
        let mut ctx = Context::new();
        ctx.load(module_a()).unwrap();
        let plain = ctx.lookup_node("/top/inner").unwrap();
        let qualified = ctx.lookup_node("/mod-a:top/inner").unwrap();
        assert_eq!(plain, qualified);
        assert!(ctx.lookup_node("/mod-b:top/inner").is_none());
        assert!(ctx.lookup_node("/top/absent").is_none());
    }

    #[test]
    fn grouping_reference_is_transparent_to_lookup() {
        let mut ctx = Context::new();
        ctx.load(ModuleDef {
            name: "mod-g".to_string(),
            declarations: vec![container(
                "outer",
                vec![DeclDef {
                    keyword: GROUPING_REF_KEYWORD.to_string(),
                    name: "shared".to_string(),
                    children: vec![leaf("hidden")],
                    ..Default::default()
                }],
            )],
            ..Default::default()
        })
        .unwrap();
        let found = ctx.lookup_node("/outer/hidden").unwrap();
        assert_eq!(ctx.statement(found).argument, "hidden");
        // The reference itself sits between target and root in parent links.
        let parent = ctx.parent(found).unwrap();
        assert_eq!(ctx.statement(parent).keyword, GROUPING_REF_KEYWORD);
    }

    #[test]
    fn augment_waits_for_target_module() {
        let mut ctx = Context::new();
        ctx.load(ModuleDef {
            name: "mod-b".to_string(),
            augments: vec![AugmentDef {
                target: "/mod-a:top".to_string(),
                children: vec![leaf("extra")],
            }],
            ..Default::default()
        })
        .unwrap();
        assert!(ctx.resolve_augments().is_empty());
        assert_eq!(ctx.pending_augments(), 1);

        ctx.load(module_a()).unwrap();
        let placed = ctx.resolve_augments();
        assert_eq!(placed.len(), 1);
        assert_eq!(ctx.pending_augments(), 0);
        let extra = ctx.lookup_node("/top/mod-b:extra").unwrap();
        assert_eq!(ctx.statement(ctx.parent(extra).unwrap()).argument, "top");
    }
}
