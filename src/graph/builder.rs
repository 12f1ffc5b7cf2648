//! Graph construction and the eager validator.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use thiserror::Error;

use super::node::{BaseNode, DeclaredReturn};
use super::registry::NodeRegistry;

/// Errors raised synchronously while constructing a [`Graph`]. These are
/// programmer errors: missing node references or duplicate node IDs abort
/// the process path that built the graph rather than being retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphSetupError {
    /// Two registered node types answered the same value to `node_id()`.
    #[error("Node ID `{node_id}` is not unique — found on {type_a}, {type_b}")]
    DuplicateNodeId {
        /// The colliding node ID.
        node_id: String,
        /// The first type found holding this ID.
        type_a: String,
        /// The second type found holding this ID.
        type_b: String,
    },

    /// One or more node types are referenced by a declared return but were
    /// never registered. The message is pre-formatted per §4.D, one line
    /// per missing node, sorted for determinism.
    #[error("{0}")]
    MissingNodes(String),
}

/// A validated, ready-to-run graph over node types sharing the `S`/`D`/`R`
/// triple. Construct via [`GraphBuilder`].
pub struct Graph<S, D, R> {
    name: String,
    registry: NodeRegistry<S, D, R>,
}

impl<S, D, R> Graph<S, D, R>
where
    S: Send + 'static,
    D: Send + Sync + 'static,
    R: Send + 'static,
{
    /// The graph's human name, as given to [`GraphBuilder::new`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The graph's node registry, used by the run engine and by
    /// full-history persistence to decode JSON.
    pub fn registry(&self) -> &NodeRegistry<S, D, R> {
        &self.registry
    }
}

/// Builds a [`Graph`], registering node types and validating the declared
/// set once, eagerly, on [`GraphBuilder::build`].
pub struct GraphBuilder<S, D, R> {
    name: String,
    registry: NodeRegistry<S, D, R>,
    errors: Vec<GraphSetupError>,
}

impl<S, D, R> GraphBuilder<S, D, R>
where
    S: Send + 'static,
    D: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Starts building a graph with the given human name. The source this
    /// crate was adapted from binds a graph's name lazily from the
    /// caller's variable name at the first `run`/`next` call; Rust cannot
    /// reflect caller locals, so the name is required up front instead.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: NodeRegistry::new(),
            errors: Vec::new(),
        }
    }

    /// Registers a node type. Collisions on `node_id()` are recorded and
    /// surfaced as a [`GraphSetupError::DuplicateNodeId`] from `build`,
    /// citing both offending type names.
    pub fn register_node<N>(mut self) -> Self
    where
        N: BaseNode<S, D, R> + DeserializeOwned,
    {
        let node_id = N::node_id().to_string();
        let new_type = std::any::type_name::<N>().to_string();
        if let Some(prior_type) = self.registry.register::<N>() {
            self.errors.push(GraphSetupError::DuplicateNodeId {
                node_id,
                type_a: prior_type.to_string(),
                type_b: new_type,
            });
        }
        self
    }

    /// Validates the declared node set and produces a [`Graph`].
    ///
    /// Validation enforces, in order: node-ID uniqueness (collected during
    /// registration above), then closure — every node type referenced by
    /// some node's [`BaseNode::declared_returns`] must either be
    /// registered or be [`super::node::DeclaredReturn::End`].
    pub fn build(self) -> Result<Graph<S, D, R>, GraphSetupError> {
        if let Some(first) = self.errors.into_iter().next() {
            return Err(first);
        }

        let node_ids: Vec<String> = self.registry.node_ids().map(|s| s.to_string()).collect();
        let mut missing: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for node_id in &node_ids {
            let Some(returns) = self.registry.declared_returns(node_id) else {
                continue;
            };
            for declared in returns {
                if let DeclaredReturn::Node(referenced) = declared {
                    if !self.registry.contains(referenced) {
                        missing.entry((*referenced).to_string()).or_default().push(node_id.clone());
                    }
                }
            }
        }

        if !missing.is_empty() {
            return Err(GraphSetupError::MissingNodes(format_missing_report(&missing)));
        }

        Ok(Graph {
            name: self.name,
            registry: self.registry,
        })
    }
}

fn format_missing_report(missing: &BTreeMap<String, Vec<String>>) -> String {
    missing
        .iter()
        .map(|(missing_id, referrers)| format_single_missing(missing_id, referrers))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_single_missing(missing_id: &str, referrers: &[String]) -> String {
    let backticked: Vec<String> = referrers.iter().map(|r| format!("`{r}`")).collect();
    format!("`{missing_id}` is referenced by {} but not included in the graph.", oxford_join(&backticked))
}

fn oxford_join(items: &[String]) -> String {
    match items.len() {
        0 => String::new(),
        1 => items[0].clone(),
        2 => format!("{} and {}", items[0], items[1]),
        _ => {
            let (last, rest) = items.split_last().expect("checked non-empty above");
            format!("{}, and {}", rest.join(", "), last)
        }
    }
}
