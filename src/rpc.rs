//! Invocation handles for rpc-kind schema nodes.

use crate::context::Statement;
use crate::module::ModuleSource;
use crate::tree::SchemaNodeId;
use std::rc::Rc;

/// One invocation bound to an rpc schema node.
///
/// The handle owns no tree structure; it carries the bound node's id and
/// statement plus the module source the invocation machinery resolves
/// against. Handles stay valid for the life of the tree that produced them
/// because schema nodes are never removed.
pub struct Rpc {
    schema: SchemaNodeId,
    statement: Statement,
    input: Option<SchemaNodeId>,
    source: Rc<dyn ModuleSource>,
}

impl Rpc {
    pub(crate) fn new(
        schema: SchemaNodeId,
        statement: Statement,
        input: Option<SchemaNodeId>,
        source: Rc<dyn ModuleSource>,
    ) -> Self {
        Rpc {
            schema,
            statement,
            input,
            source,
        }
    }

    /// The rpc's declared name.
    pub fn name(&self) -> &str {
        &self.statement.argument
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Id of the bound schema node; resolve it through the owning tree.
    pub fn schema_id(&self) -> SchemaNodeId {
        self.schema
    }

    /// Id of the rpc's `input` child, when the rpc declares one.
    pub fn input_id(&self) -> Option<SchemaNodeId> {
        self.input
    }

    pub fn source(&self) -> &Rc<dyn ModuleSource> {
        &self.source
    }
}

impl std::fmt::Debug for Rpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rpc")
            .field("schema", &self.schema)
            .field("statement", &self.statement)
            .finish()
    }
}
