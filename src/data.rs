//! Data-node trees: runtime instances bound to schema nodes.
//!
//! A data tree is rooted independently of the schema tree that validates it;
//! many data nodes may instantiate the same schema node (list entries), but
//! every data node binds to exactly one. Construction is the only machinery
//! here; validation and serialization belong to the surrounding system.

use crate::error::{Error, Result};
use crate::pathutil;
use crate::tree::root::SchemaView;
use crate::tree::SchemaNodeId;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
/// Identifier of one data-tree root within its owning schema tree.
pub struct DataTreeId(pub(crate) usize);

#[derive(Debug, Default)]
/// One independently rooted data tree.
pub struct RootDataNode {
    children: Vec<DataNode>,
}

#[derive(Debug)]
/// One data instance, bound to the schema node it conforms to.
pub struct DataNode {
    schema: SchemaNodeId,
    argument: String,
    value: String,
    children: Vec<DataNode>,
}

impl RootDataNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn children(&self) -> &[DataNode] {
        &self.children
    }

    /// Create (or descend into) one data node per path segment and set
    /// `value` on the final node.
    ///
    /// Segments resolve against the wrapper tree; a segment that addresses
    /// no schema node rejects the whole call without touching the tree
    /// beyond the nodes already created for earlier segments.
    pub(crate) fn create(
        &mut self,
        schema: &SchemaView<'_>,
        path: &str,
        value: &str,
    ) -> Result<()> {
        let segs = pathutil::segments(path);
        if segs.is_empty() {
            return Err(Error::invalid_argument("data path is empty"));
        }
        create_at(&mut self.children, schema, None, &segs, value)
    }

    /// Find the data node at `path`, reusing the same segment syntax as
    /// creation.
    pub fn get(&self, path: &str) -> Option<&DataNode> {
        let segs = pathutil::segments(path);
        let mut nodes = &self.children;
        let mut found: Option<&DataNode> = None;
        for seg in segs {
            let (_, name) = pathutil::split_qualifier(seg);
            let node = nodes.iter().find(|node| node.argument == name)?;
            nodes = &node.children;
            found = Some(node);
        }
        found
    }
}

fn create_at(
    nodes: &mut Vec<DataNode>,
    schema: &SchemaView<'_>,
    parent: Option<SchemaNodeId>,
    segs: &[&str],
    value: &str,
) -> Result<()> {
    let Some((seg, rest)) = segs.split_first() else {
        return Ok(());
    };
    let (qualifier, name) = pathutil::split_qualifier(seg);
    let bound = schema.child_named(parent, qualifier, name).ok_or_else(|| {
        Error::invalid_argument(format!("path segment '{seg}' addresses no schema node"))
    })?;

    let index = match nodes.iter().position(|node| node.schema == bound) {
        Some(existing) => existing,
        None => {
            nodes.push(DataNode {
                schema: bound,
                argument: schema.argument(bound).to_string(),
                value: String::new(),
                children: Vec::new(),
            });
            nodes.len() - 1
        }
    };

    if rest.is_empty() {
        nodes[index].value = value.to_string();
        Ok(())
    } else {
        create_at(&mut nodes[index].children, schema, Some(bound), rest, value)
    }
}

impl DataNode {
    /// The schema node this instance conforms to.
    pub fn schema(&self) -> SchemaNodeId {
        self.schema
    }

    pub fn argument(&self) -> &str {
        &self.argument
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn children(&self) -> &[DataNode] {
        &self.children
    }
}
