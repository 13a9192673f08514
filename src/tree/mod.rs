//! The addressable schema tree: root, wrapper nodes, population, lookup.
//!
//! The tree wraps compiled declarations from the context into an owned
//! wrapper arena so callers get stable handles with computed paths, while
//! the engine side keeps the raw declaration structure. `RootSchemaNode` is
//! the single entry point; everything it hands out borrows from it.

pub mod node;
pub mod root;

pub use node::{SchemaNodeId, SchemaNodeRef};
pub use root::{RPC_KEYWORD, RootSchemaNode, SchemaView};
