//! The node protocol, graph definition, and validator (§4.A, §4.D).
//!
//! A [`Graph`] is a validated, immutable view over a declared set of node
//! types sharing one `State`/`Deps`/`RunEnd` triple. Build one with
//! [`GraphBuilder`]; validation runs once, eagerly, inside
//! [`GraphBuilder::build`].

mod builder;
mod node;
mod registry;

pub use builder::{Graph, GraphBuilder, GraphSetupError};
pub use node::{BaseNode, DeclaredReturn, End, GraphRunContext, NodeStep, node_to_json, simple_type_name};
pub use registry::{NodeMeta, NodeRegistry};
