//! The compile-time-built map from `node_id` to the means of decoding a
//! concrete node type, backing both validation and JSON decoding.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::node::{BaseNode, DeclaredReturn};

/// Metadata the registry keeps for one registered node type.
pub struct NodeMeta<S, D, R> {
    /// The full (non-simplified) type name, used in diagnostics.
    pub type_name: &'static str,
    /// What this node type may hand control to, per §4.A/§4.D.
    pub declared_returns: Vec<DeclaredReturn>,
    decode: Box<dyn Fn(Value) -> serde_json::Result<Box<dyn BaseNode<S, D, R>>> + Send + Sync>,
}

/// Maps a graph's declared node set by `node_id`, built once by
/// [`crate::graph::GraphBuilder::build`].
pub struct NodeRegistry<S, D, R> {
    entries: HashMap<String, NodeMeta<S, D, R>>,
}

impl<S, D, R> Default for NodeRegistry<S, D, R> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<S, D, R> NodeRegistry<S, D, R>
where
    S: Send + 'static,
    D: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node type, returning the entry that previously held the
    /// same `node_id`, if any (the caller uses this to detect collisions).
    pub fn register<N>(&mut self) -> Option<&'static str>
    where
        N: BaseNode<S, D, R> + DeserializeOwned,
    {
        let node_id = N::node_id().to_string();
        let meta = NodeMeta {
            type_name: std::any::type_name::<N>(),
            declared_returns: N::declared_returns(),
            decode: Box::new(|value| serde_json::from_value::<N>(value).map(|n| Box::new(n) as Box<dyn BaseNode<S, D, R>>)),
        };
        let previous = self.entries.insert(node_id, meta);
        previous.map(|p| p.type_name)
    }

    /// Whether a node type with this ID is registered.
    pub fn contains(&self, node_id: &str) -> bool {
        self.entries.contains_key(node_id)
    }

    /// All registered node IDs.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// The declared returns of a registered node type, if present.
    pub fn declared_returns(&self, node_id: &str) -> Option<&[DeclaredReturn]> {
        self.entries.get(node_id).map(|m| m.declared_returns.as_slice())
    }

    /// The full type name of a registered node type, if present.
    pub fn type_name(&self, node_id: &str) -> Option<&'static str> {
        self.entries.get(node_id).map(|m| m.type_name)
    }

    /// Decodes a node payload for a given `node_id`, dispatching to the
    /// registered type's own `Deserialize` implementation.
    pub fn decode(&self, node_id: &str, value: Value) -> Option<serde_json::Result<Box<dyn BaseNode<S, D, R>>>> {
        self.entries.get(node_id).map(|meta| (meta.decode)(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{GraphRunContext, NodeStep};
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Marker;

    #[async_trait]
    impl BaseNode<(), (), ()> for Marker {
        fn id(&self) -> String {
            Self::node_id().to_string()
        }

        async fn run(&mut self, _ctx: &mut GraphRunContext<'_, (), ()>) -> anyhow::Result<NodeStep<(), (), ()>> {
            unreachable!()
        }

        fn clone_node(&self) -> Box<dyn BaseNode<(), (), ()>> {
            Box::new(self.clone())
        }

        fn to_json(&self) -> Value {
            crate::graph::node::node_to_json(self, &self.id())
        }
    }

    #[test]
    fn registers_under_simple_type_name() {
        let mut registry: NodeRegistry<(), (), ()> = NodeRegistry::new();
        assert!(registry.register::<Marker>().is_none());
        assert!(registry.contains("Marker"));
    }

    #[test]
    fn re_registering_reports_the_prior_type() {
        let mut registry: NodeRegistry<(), (), ()> = NodeRegistry::new();
        registry.register::<Marker>();
        let prior = registry.register::<Marker>();
        assert!(prior.is_some());
    }
}
