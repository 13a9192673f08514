//! Lazily assembled schema trees for model-driven configuration.
//!
//! The crate takes a universe of declared schema modules (named, optionally
//! revisioned, reachable through capability lookup tables) and loads only
//! the ones a request actually references: payload introspection finds the
//! identifiers, the resolver compiles the missing modules, the tree grafts
//! their declarations and cross-module augments into place, and the caller's
//! original query (find a node, create a data node, bind an rpc) is answered
//! against the now-complete tree. Schema compilation sits behind the
//! [`module::ModuleSource`] seam; XML and JSON parsing are delegated to
//! `roxmltree` and `serde_json`.

pub mod capability;
pub mod context;
pub mod data;
pub mod error;
pub mod module;
pub mod payload;
pub mod pathutil;
pub mod rpc;
pub mod tree;

pub use capability::{Capability, CapabilityLookups, CapabilityTable};
pub use context::{Context, ModuleId, NodeId, Statement};
pub use data::{DataNode, DataTreeId, RootDataNode};
pub use error::{Error, Result};
pub use module::{
    AugmentDef, DeclDef, ModuleDef, ModuleRepository, ModuleSource, load_module_from_path,
    resolve_new_modules,
};
pub use rpc::Rpc;
pub use tree::{RPC_KEYWORD, RootSchemaNode, SchemaNodeId, SchemaNodeRef};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
/// Wire encoding of an inbound payload.
pub enum EncodingFormat {
    Xml,
    Json,
}
