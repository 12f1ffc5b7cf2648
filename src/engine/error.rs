//! Runtime errors raised while driving a run (§4.E, §7).

use thiserror::Error;

/// Errors raised while executing a run. [`crate::graph::NodeStep`] is a
/// closed two-variant enum, so "invalid node return type" has no
/// constructor in this rendering. "Node not in the declared set" is very
/// much reachable, though: any `impl BaseNode<S, D, R>` can be boxed and
/// handed back from `run` as a `NodeStep::Next` whether or not its type
/// was ever passed to `register_node`, so the run loop checks the
/// returned node's ID against the graph's registry on every step (§4.E).
#[derive(Error, Debug)]
pub enum GraphRuntimeError {
    /// `node.run()` returned an error. The recording region has already
    /// attached timing and marked the snapshot `error` before this
    /// propagates; no end snapshot is recorded for this run.
    #[error("node `{node_id}` failed: {source}")]
    Node {
        /// The `id()` of the node whose `run` failed.
        node_id: String,
        /// The underlying error, opaque to this crate (§4.G).
        #[source]
        source: anyhow::Error,
    },

    /// A node's `run` handed control to a node type that was never
    /// registered with the graph. The snapshot for the node that returned
    /// it has already been marked `success`; no snapshot is recorded for
    /// the unregistered node itself.
    #[error("Node `{repr}` is not in the graph.")]
    NotInGraph {
        /// The rejected node's `id()`, rendered the way the original
        /// source renders an unrecognized node in this message.
        repr: String,
    },
}
