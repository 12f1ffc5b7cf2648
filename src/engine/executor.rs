//! The run loop: drives a graph from a starting node to termination,
//! bracketing every step with a snapshot and a recording region (§4.E).

use tracing::{debug, trace, warn};

use crate::graph::{BaseNode, Graph, GraphRunContext, NodeRegistry, NodeStep};
use crate::persistence::StatePersistence;
use crate::Result;

use super::GraphRuntimeError;

/// The outcome of a completed [`Graph::run`]: the run's output and the
/// final state. Matches the original source's own `GraphRunResult`, which
/// carries only these two fields — history remains queryable through the
/// `persistence` handle the caller already owns for the run's duration
/// (§9, Design Notes).
#[derive(Debug, Clone)]
pub struct RunResult<S, R> {
    /// The value the run ended with.
    pub output: R,
    /// The state as it was at termination.
    pub state: S,
}

impl<S, D, R> Graph<S, D, R>
where
    S: Clone + Send + Sync + 'static,
    D: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Executes `start_node` and every node it hands off to, until a node
    /// returns [`crate::graph::End`]. Records a node snapshot before each
    /// step and an end snapshot once the run terminates (§4.E).
    ///
    /// Node failures propagate as [`GraphRuntimeError::Node`]: the
    /// recording region has already marked the failing snapshot `error`
    /// with its elapsed duration before this returns, and no end snapshot
    /// is recorded for the run. A node that hands off to a node type never
    /// registered with this graph propagates as
    /// [`GraphRuntimeError::NotInGraph`] instead, after the handing-off
    /// node's own snapshot has already settled `success`.
    pub async fn run(
        &self,
        start_node: Box<dyn BaseNode<S, D, R>>,
        mut state: S,
        deps: &D,
        persistence: &mut dyn StatePersistence<S, D, R>,
    ) -> Result<RunResult<S, R>> {
        debug!(graph = self.name(), "starting run");
        let mut cursor = start_node;
        loop {
            match step_once(&mut cursor, &mut state, deps, persistence, self.registry()).await? {
                NodeStep::Next(node) => cursor = node,
                NodeStep::Done(end) => {
                    persistence.snapshot_end(&state, end.clone()).await;
                    debug!(graph = self.name(), "run finished");
                    return Ok(RunResult {
                        output: end.data,
                        state,
                    });
                }
            }
        }
    }

    /// Executes exactly one step: records a node snapshot for `cursor`,
    /// runs it inside the recording region, and returns the raw next step
    /// (which may be [`crate::graph::End`]) without recording an end
    /// snapshot — that is the caller's responsibility in this path
    /// (§4.E). Checks a returned [`NodeStep::Next`] against the graph's
    /// registry exactly like a single iteration of `run`'s loop, failing
    /// with [`GraphRuntimeError::NotInGraph`] on the same terms.
    pub async fn next(
        &self,
        mut cursor: Box<dyn BaseNode<S, D, R>>,
        state: &mut S,
        deps: &D,
        persistence: &mut dyn StatePersistence<S, D, R>,
    ) -> Result<NodeStep<S, D, R>> {
        Ok(step_once(&mut cursor, state, deps, persistence, self.registry()).await?)
    }
}

async fn step_once<S, D, R>(
    cursor: &mut Box<dyn BaseNode<S, D, R>>,
    state: &mut S,
    deps: &D,
    persistence: &mut dyn StatePersistence<S, D, R>,
    registry: &NodeRegistry<S, D, R>,
) -> std::result::Result<NodeStep<S, D, R>, GraphRuntimeError>
where
    S: Clone + Send + Sync + 'static,
    D: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    let node_id = cursor.id();
    let snapshot_id = persistence.snapshot_node(state, cursor.as_ref()).await;
    trace!(node_id = %node_id, snapshot_id = %snapshot_id, "entering node");

    let outcome = {
        let guard = persistence
            .record_run(&snapshot_id)
            .expect("the snapshot just recorded above must be found by its own ID");
        let outcome = cursor.run(&mut GraphRunContext::new(state, deps)).await;
        if outcome.is_ok() {
            guard.mark_success();
        }
        // On `Err`, the guard drops here unmarked and finalizes as `error`.
        outcome
    };

    match outcome {
        Ok(NodeStep::Next(node)) => {
            let next_id = node.id();
            if !registry.contains(&next_id) {
                warn!(node_id = %node_id, snapshot_id = %snapshot_id, next_id = %next_id, "returned node is not in the graph");
                return Err(GraphRuntimeError::NotInGraph { repr: format!("{next_id}()") });
            }
            trace!(node_id = %node_id, snapshot_id = %snapshot_id, "node finished");
            Ok(NodeStep::Next(node))
        }
        Ok(step) => {
            trace!(node_id = %node_id, snapshot_id = %snapshot_id, "node finished");
            Ok(step)
        }
        Err(source) => {
            warn!(node_id = %node_id, snapshot_id = %snapshot_id, error = %source, "node failed");
            Err(GraphRuntimeError::Node { node_id, source })
        }
    }
}
