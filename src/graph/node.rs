//! The node protocol: what a node is and how it produces the next step.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// A terminal step value carrying a run's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct End<R> {
    /// The run's output payload.
    pub data: R,
}

impl<R> End<R> {
    /// Wraps a value as the terminal step of a run.
    pub fn new(data: R) -> Self {
        Self { data }
    }
}

/// The outcome of one node invocation: either another node to run next, or
/// a terminal value. Unlike the dynamically-typed source this crate was
/// adapted from, this is a closed two-variant enum: there is no runtime
/// representation of "neither a node nor an end marker".
pub enum NodeStep<S, D, R> {
    /// Continue the run with this node as the next step.
    Next(Box<dyn BaseNode<S, D, R>>),
    /// End the run with this value.
    Done(End<R>),
}

/// The value passed to a node's `run`: the current mutable state and the
/// caller-owned, read-only dependencies.
pub struct GraphRunContext<'a, S, D> {
    /// The run's state, exclusively mutable for the duration of the step.
    pub state: &'a mut S,
    /// The run's dependencies, read-only and owned by the caller.
    pub deps: &'a D,
}

impl<'a, S, D> GraphRunContext<'a, S, D> {
    /// Builds a context borrowing `state` and `deps` for one step.
    pub fn new(state: &'a mut S, deps: &'a D) -> Self {
        Self { state, deps }
    }
}

/// One entry in a node type's declared set of possible next steps, used by
/// the validator to compute the graph's closure (§4.D).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredReturn {
    /// This node may hand off to the node type named here.
    Node(&'static str),
    /// This node may end the run.
    End,
}

/// A user-defined unit of work producing the next step of a run.
///
/// Node types declare the shared `State`, `Deps`, `RunEnd` triple as the
/// trait's generic parameters; a [`crate::graph::Graph`] accepts only node
/// types sharing its own triple, so type consistency across a graph's
/// nodes is enforced by the compiler rather than at runtime.
#[async_trait]
pub trait BaseNode<S, D, R>: Send + Sync + 'static
where
    S: Send + 'static,
    D: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Stable identifier for this node type; defaults to the type's own
    /// simple name. Override to customize; the override applies to every
    /// instance of the type, keeping the ID stable within a graph.
    fn node_id() -> &'static str
    where
        Self: Sized,
    {
        simple_type_name::<Self>()
    }

    /// Instance-level accessor for [`BaseNode::node_id`]. Rust cannot call
    /// a `Self: Sized`-bounded associated function such as `node_id` from
    /// a method callable through `dyn BaseNode`, so this has no default
    /// and must be implemented per node type — matching
    /// [`BaseNode::clone_node`] and [`BaseNode::to_json`], which are
    /// required for the same reason. The expected implementation is
    /// always the same one-liner:
    ///
    /// ```ignore
    /// fn id(&self) -> String {
    ///     Self::node_id().to_string()
    /// }
    /// ```
    ///
    /// Implementing it any other way desyncs the snapshot IDs and JSON
    /// `node_id` discriminator this method feeds from the key the node
    /// is registered under, breaking lookup for any node overriding
    /// `node_id`.
    fn id(&self) -> String;

    /// The set of possible next-step shapes this node type may produce.
    /// Used only by the validator to compute the graph's closure; the
    /// default (no declared returns) is appropriate for types that are
    /// never reachable as a declared return themselves.
    fn declared_returns() -> Vec<DeclaredReturn>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Executes this node, producing the next step.
    async fn run(&mut self, ctx: &mut GraphRunContext<'_, S, D>) -> anyhow::Result<NodeStep<S, D, R>>;

    /// Returns an independent clone of this node's payload.
    fn clone_node(&self) -> Box<dyn BaseNode<S, D, R>>;

    /// Serializes this node to JSON, including the reserved `node_id`
    /// discriminator field.
    fn to_json(&self) -> Value;
}

/// Simple (final path segment) name of a type, used as the default node ID.
pub fn simple_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Serializes a node's payload and stamps the `node_id` discriminator
/// field onto the resulting JSON object. Node types call this from their
/// `to_json` implementation rather than duplicating the stamping logic.
///
/// Requires `T` to serialize as a JSON object (a struct with named
/// fields, `{}` for no payload); tuple and unit structs serialize to a
/// bare value or `null` and silently skip the `node_id` stamp, which then
/// fails to round-trip through [`crate::persistence::FullStatePersistence`].
pub fn node_to_json<T: Serialize + ?Sized>(node: &T, node_id: &str) -> Value {
    let mut value = serde_json::to_value(node).unwrap_or(Value::Null);
    if let Value::Object(ref mut map) = value {
        map.insert("node_id".to_string(), Value::String(node_id.to_string()));
    }
    value
}
