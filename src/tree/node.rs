//! Wrapper-node storage and the borrowed handle over it.
//!
//! Wrapper nodes live in an arena owned by the root; parent and child links
//! are arena indices. Each wrapper references exactly one engine declaration,
//! and the root's side table maps engine ids back to wrappers, so neither
//! tree holds pointers into the other.

use crate::context::{NodeId, Statement};
use crate::tree::root::RootSchemaNode;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
/// Stable identifier of one wrapper node within its tree.
pub struct SchemaNodeId(pub(crate) usize);

#[derive(Debug)]
pub(crate) struct SchemaNodeData {
    pub(crate) engine: NodeId,
    pub(crate) parent: Option<SchemaNodeId>,
    pub(crate) children: Vec<SchemaNodeId>,
}

#[derive(Clone, Copy)]
/// Borrowed handle to one schema node.
///
/// Reads go through the owning root, so a handle is only as long-lived as
/// the borrow that produced it; re-fetch by id after mutating the tree.
pub struct SchemaNodeRef<'a> {
    root: &'a RootSchemaNode,
    id: SchemaNodeId,
}

impl<'a> SchemaNodeRef<'a> {
    pub(crate) fn new(root: &'a RootSchemaNode, id: SchemaNodeId) -> Self {
        SchemaNodeRef { root, id }
    }

    pub fn id(&self) -> SchemaNodeId {
        self.id
    }

    /// Keyword/argument of the wrapped declaration.
    pub fn statement(&self) -> &'a Statement {
        self.root.context().statement(self.data().engine)
    }

    /// Key statements of a list-like node, in declared order; empty for
    /// everything else.
    pub fn keys(&self) -> Vec<Statement> {
        self.root
            .context()
            .keys(self.data().engine)
            .iter()
            .map(|name| Statement {
                keyword: "leaf".to_string(),
                argument: name.clone(),
            })
            .collect()
    }

    /// Name of the module that declared this node.
    pub fn module_name(&self) -> &'a str {
        let ctx = self.root.context();
        ctx.module_name(ctx.node_module(self.data().engine))
    }

    pub fn parent(&self) -> Option<SchemaNodeRef<'a>> {
        self.data()
            .parent
            .map(|parent| SchemaNodeRef::new(self.root, parent))
    }

    /// Children in declaration order (augmented children follow the
    /// declared ones, in graft order).
    pub fn children(&self) -> Vec<SchemaNodeRef<'a>> {
        self.data()
            .children
            .iter()
            .map(|&child| SchemaNodeRef::new(self.root, child))
            .collect()
    }

    /// Slash-joined declaration arguments from the root down to this node.
    ///
    /// The root is `/`; every other node concatenates its ancestors' plain
    /// arguments, without module qualifiers.
    pub fn path(&self) -> String {
        let mut arguments = Vec::new();
        let mut cursor = Some(self.id);
        while let Some(id) = cursor {
            let data = self.root.node_data(id);
            arguments.push(self.root.context().statement(data.engine).argument.as_str());
            cursor = data.parent;
        }
        arguments.reverse();
        let mut path = String::new();
        for argument in arguments {
            path.push('/');
            path.push_str(argument);
        }
        path
    }

    fn data(&self) -> &'a SchemaNodeData {
        self.root.node_data(self.id)
    }
}

impl std::fmt::Debug for SchemaNodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaNodeRef")
            .field("id", &self.id)
            .field("statement", self.statement())
            .finish()
    }
}
