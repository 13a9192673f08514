//! The root of the addressable schema tree.
//!
//! `RootSchemaNode` owns the compiled-module context, the two capability
//! lookups, the wrapper arena, and every data-tree root created against it.
//! Modules arrive lazily: queries and payloads name modules, the resolver
//! loads the missing ones, and the tree grafts their declarations (and any
//! augments that became placeable) before the original request is answered.

use crate::capability::CapabilityLookups;
use crate::context::{Context, GROUPING_REF_KEYWORD, ModuleId, NodeId, PlacedAugment};
use crate::data::{DataTreeId, RootDataNode};
use crate::error::{Error, Result};
use crate::module::{ModuleSource, resolve_new_modules};
use crate::payload;
use crate::pathutil;
use crate::rpc::Rpc;
use crate::tree::node::{SchemaNodeData, SchemaNodeId, SchemaNodeRef};
use crate::EncodingFormat;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, warn};

/// Statement keyword of an invocable operation node.
pub const RPC_KEYWORD: &str = "rpc";
const RPC_INPUT_KEYWORD: &str = "input";

/// Dynamically populated schema tree with path-based lookup.
///
/// Not designed for concurrent use: every populating operation takes `&mut
/// self`, and callers sharing one tree across threads must serialize access
/// themselves. Data roots created from the tree are independent of each
/// other once created.
pub struct RootSchemaNode {
    ctx: Context,
    source: Rc<dyn ModuleSource>,
    lookups: CapabilityLookups,
    nodes: Vec<SchemaNodeData>,
    top: Vec<SchemaNodeId>,
    by_engine: BTreeMap<NodeId, SchemaNodeId>,
    data_roots: Vec<RootDataNode>,
}

impl RootSchemaNode {
    /// Build a tree over `ctx`, immediately wrapping whatever modules the
    /// context already holds. Everything else loads lazily through the
    /// capability lookups, which stay fixed for the tree's lifetime.
    pub fn new(ctx: Context, source: Rc<dyn ModuleSource>, lookups: CapabilityLookups) -> Self {
        let mut root = RootSchemaNode {
            ctx,
            source,
            lookups,
            nodes: Vec::new(),
            top: Vec::new(),
            by_engine: BTreeMap::new(),
            data_roots: Vec::new(),
        };
        let preloaded: Vec<ModuleId> = root.ctx.modules().collect();
        root.populate_new_schemas(&preloaded);
        root
    }

    /// The root's own path.
    pub fn path(&self) -> &'static str {
        "/"
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Top-level children in module load order, declaration order within a
    /// module.
    pub fn children(&self) -> Vec<SchemaNodeRef<'_>> {
        self.top
            .iter()
            .map(|&id| SchemaNodeRef::new(self, id))
            .collect()
    }

    pub fn node(&self, id: SchemaNodeId) -> Option<SchemaNodeRef<'_>> {
        self.nodes.get(id.0).map(|_| SchemaNodeRef::new(self, id))
    }

    /// Number of wrapper nodes currently in the tree. Stable across repeated
    /// population of the same modules.
    pub fn schema_node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Find the schema node a module-relative path addresses.
    ///
    /// Empty and absolute paths are rejected before anything loads. The path
    /// then drives lazy population, and the engine lookup of `"/" + path`
    /// maps back through the side table. A syntactically fine path that
    /// addresses nothing yields an empty result, not an error.
    pub fn find(&mut self, path: &str) -> Result<Vec<SchemaNodeRef<'_>>> {
        let found = self.find_ids(path)?;
        let root: &Self = self;
        Ok(found
            .into_iter()
            .map(|id| SchemaNodeRef::new(root, id))
            .collect())
    }

    fn find_ids(&mut self, path: &str) -> Result<Vec<SchemaNodeId>> {
        if path.is_empty() {
            return Err(Error::invalid_argument("path is empty"));
        }
        if path.starts_with('/') {
            return Err(Error::invalid_argument("path must be a relative path"));
        }

        self.populate_from_path(path)?;

        let full_path = format!("/{path}");
        let mut found = Vec::new();
        if let Some(engine) = self.ctx.lookup_node(&full_path) {
            if let Some(&wrapper) = self.by_engine.get(&engine) {
                found.push(wrapper);
            }
        }
        Ok(found)
    }

    /// Load whatever modules the path's qualifier prefixes imply.
    pub fn populate_from_path(&mut self, path: &str) -> Result<()> {
        let identifiers = pathutil::module_prefixes(path);
        if identifiers.is_empty() {
            return Ok(());
        }
        let source = Rc::clone(&self.source);
        let new_modules = resolve_new_modules(
            &mut self.ctx,
            source.as_ref(),
            &identifiers,
            &self.lookups.by_name,
        )?;
        self.populate_new_schemas(&new_modules);
        Ok(())
    }

    /// Load whatever modules a payload references.
    ///
    /// XML payloads resolve element namespaces through the namespace lookup.
    /// JSON payloads resolve the top-level module name and every nested
    /// qualified name as one identifier set through the name lookup, so
    /// modules referenced only by nested values (augmenters, imports) are
    /// grafted along with the top-level module.
    pub fn populate_from_payload(&mut self, payload: &str, format: EncodingFormat) -> Result<()> {
        let source = Rc::clone(&self.source);
        let new_modules = match format {
            EncodingFormat::Xml => {
                let namespaces = payload::xml_namespaces_from_str(payload)?;
                resolve_new_modules(
                    &mut self.ctx,
                    source.as_ref(),
                    &namespaces,
                    &self.lookups.by_namespace,
                )?
            }
            EncodingFormat::Json => {
                let value: serde_json::Value = serde_json::from_str(payload)?;
                let mut identifiers = payload::json_module_names(&value);
                identifiers.insert(payload::top_level_module_name(&value)?);
                resolve_new_modules(
                    &mut self.ctx,
                    source.as_ref(),
                    &identifiers,
                    &self.lookups.by_name,
                )?
            }
        };
        self.populate_new_schemas(&new_modules);
        Ok(())
    }

    /// Create a data node at `path` under a brand-new data-tree root.
    ///
    /// Every call creates an independent root; nothing is merged across
    /// calls. Keep building one coherent instance through
    /// [`RootSchemaNode::extend_datanode`] with the returned id.
    pub fn create_datanode(&mut self, path: &str, value: &str) -> Result<DataTreeId> {
        self.populate_from_path(path)?;
        let mut data_root = RootDataNode::new();
        data_root.create(&self.schema_view(), path, value)?;
        self.data_roots.push(data_root);
        Ok(DataTreeId(self.data_roots.len() - 1))
    }

    /// Add another node to a previously created data-tree root.
    pub fn extend_datanode(&mut self, tree: DataTreeId, path: &str, value: &str) -> Result<()> {
        self.populate_from_path(path)?;
        let Self {
            ctx,
            nodes,
            top,
            data_roots,
            ..
        } = self;
        let view = SchemaView {
            ctx: &*ctx,
            nodes: nodes.as_slice(),
            top: top.as_slice(),
        };
        let data_root = data_roots
            .get_mut(tree.0)
            .ok_or_else(|| Error::invalid_argument("unknown data tree"))?;
        data_root.create(&view, path, value)
    }

    pub fn data_root(&self, tree: DataTreeId) -> Option<&RootDataNode> {
        self.data_roots.get(tree.0)
    }

    pub fn data_root_count(&self) -> usize {
        self.data_roots.len()
    }

    /// Bind an rpc invocation to the node `path` addresses.
    ///
    /// The path must resolve, and to a node whose statement keyword is
    /// `rpc`; anything else is the caller's mistake. A side-table mismatch
    /// while materializing the handle means the tree broke an invariant and
    /// surfaces as illegal-state.
    pub fn create_rpc(&mut self, path: &str) -> Result<Rpc> {
        let found = self.find_ids(path)?;
        if found.is_empty() {
            return Err(Error::invalid_argument(format!("path is invalid: {path}")));
        }

        let rpc_id = found
            .iter()
            .copied()
            .find(|&id| self.statement_of(id).keyword == RPC_KEYWORD)
            .ok_or_else(|| {
                Error::invalid_argument(format!("path does not refer to an rpc node: {path}"))
            })?;

        let engine = self.nodes[rpc_id.0].engine;
        if self.by_engine.get(&engine) != Some(&rpc_id) {
            return Err(Error::illegal_state(
                "rpc schema node is not backed by its own engine declaration",
            ));
        }

        let input = self.nodes[rpc_id.0]
            .children
            .iter()
            .copied()
            .find(|&child| self.statement_of(child).keyword == RPC_INPUT_KEYWORD);
        Ok(Rpc::new(
            rpc_id,
            self.ctx.statement(engine).clone(),
            input,
            Rc::clone(&self.source),
        ))
    }

    /// Wrap freshly loaded modules and graft every augment that became
    /// placeable, in that order, so targets always precede their augments
    /// within one call.
    fn populate_new_schemas(&mut self, new_modules: &[ModuleId]) {
        for &module in new_modules {
            self.populate_module(module);
        }
        let placed = self.ctx.resolve_augments();
        for augment in placed {
            self.graft_augment(&augment);
        }
    }

    /// Append one wrapper per top-level declaration of `module`, in
    /// declaration order, wrapping present children recursively.
    fn populate_module(&mut self, module: ModuleId) {
        debug!(module = %self.ctx.module_name(module), "populating module schema");
        let tops = self.ctx.top_level_nodes(module).to_vec();
        for engine in tops {
            self.wrap_subtree(engine, None);
        }
    }

    /// Wrap `engine` and its current children under `parent`.
    ///
    /// Grouping references are spliced out: their children attach to the
    /// reference's parent. The side table makes re-wrapping a no-op, which
    /// keeps every populate operation idempotent.
    fn wrap_subtree(&mut self, engine: NodeId, parent: Option<SchemaNodeId>) {
        if self.ctx.statement(engine).keyword == GROUPING_REF_KEYWORD {
            for child in self.ctx.children(engine).to_vec() {
                self.wrap_subtree(child, parent);
            }
            return;
        }
        if self.by_engine.contains_key(&engine) {
            return;
        }

        let id = SchemaNodeId(self.nodes.len());
        self.nodes.push(SchemaNodeData {
            engine,
            parent,
            children: Vec::new(),
        });
        self.by_engine.insert(engine, id);
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.top.push(id),
        }
        for child in self.ctx.children(engine).to_vec() {
            self.wrap_subtree(child, Some(id));
        }
    }

    /// Graft one placed augment into the wrapper tree.
    ///
    /// The ancestor chain is collected by walking engine parent links from
    /// the target upward, skipping grouping references (they hold no tree
    /// position). The chain is then consumed from the root end, descending
    /// the wrapper tree by declaration argument; the augment subtree is
    /// wrapped under the node reached.
    fn graft_augment(&mut self, augment: &PlacedAugment) {
        let mut chain = Vec::new();
        let mut cursor = Some(augment.target);
        while let Some(node) = cursor {
            if self.ctx.statement(node).keyword != GROUPING_REF_KEYWORD {
                chain.push(node);
            }
            cursor = self.ctx.parent(node);
        }

        let mut current: Option<SchemaNodeId> = None;
        while let Some(ancestor) = chain.pop() {
            let wanted = self.ctx.statement(ancestor).argument.as_str();
            let children = match current {
                None => &self.top,
                Some(id) => &self.nodes[id.0].children,
            };
            let next = children
                .iter()
                .copied()
                .find(|&child| self.statement_of(child).argument == wanted);
            match next {
                Some(child) => current = Some(child),
                None => {
                    // Unreachable while resolve_augments only reports placed
                    // targets, but a missing step must not corrupt the tree.
                    warn!(
                        module = %self.ctx.module_name(augment.module),
                        ancestor = wanted,
                        "augment ancestor not present in tree, skipping graft"
                    );
                    return;
                }
            }
        }

        let Some(anchor) = current else {
            return;
        };
        debug!(
            module = %self.ctx.module_name(augment.module),
            anchor = %self.statement_of(anchor).argument,
            "grafting augmented schema nodes"
        );
        for &child in &augment.children {
            self.wrap_subtree(child, Some(anchor));
        }
    }

    fn statement_of(&self, id: SchemaNodeId) -> &crate::context::Statement {
        self.ctx.statement(self.nodes[id.0].engine)
    }

    pub(crate) fn node_data(&self, id: SchemaNodeId) -> &SchemaNodeData {
        &self.nodes[id.0]
    }

    fn schema_view(&self) -> SchemaView<'_> {
        SchemaView {
            ctx: &self.ctx,
            nodes: &self.nodes,
            top: &self.top,
        }
    }
}

impl std::fmt::Debug for RootSchemaNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootSchemaNode")
            .field("schema_nodes", &self.nodes.len())
            .field("top_level", &self.top.len())
            .field("data_roots", &self.data_roots.len())
            .finish()
    }
}

/// Read-only slice of the schema tree handed to data-node construction.
pub struct SchemaView<'a> {
    ctx: &'a Context,
    nodes: &'a [SchemaNodeData],
    top: &'a [SchemaNodeId],
}

impl SchemaView<'_> {
    /// Find the child of `parent` (or a top-level node when `None`) whose
    /// declaration argument is `name`. A qualifier, when present, must match
    /// the owning module's name.
    pub(crate) fn child_named(
        &self,
        parent: Option<SchemaNodeId>,
        qualifier: Option<&str>,
        name: &str,
    ) -> Option<SchemaNodeId> {
        let candidates = match parent {
            None => self.top,
            Some(id) => self.nodes[id.0].children.as_slice(),
        };
        candidates.iter().copied().find(|&id| {
            let engine = self.nodes[id.0].engine;
            if self.ctx.statement(engine).argument != name {
                return false;
            }
            match qualifier {
                Some(q) => self.ctx.module_name(self.ctx.node_module(engine)) == q,
                None => true,
            }
        })
    }

    pub(crate) fn argument(&self, id: SchemaNodeId) -> &str {
        &self.ctx.statement(self.nodes[id.0].engine).argument
    }
}
