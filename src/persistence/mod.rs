//! Snapshot model and persistence backends (§3, §4.B, §4.C).
//!
//! Two backends implement the same [`StatePersistence`] contract: a
//! latest-only store for cheap inspection ([`SimpleStatePersistence`]) and
//! a full-history store that round-trips through JSON
//! ([`FullStatePersistence`]).

mod full;
mod memory;
mod record;

pub use full::FullStatePersistence;
pub use memory::SimpleStatePersistence;
pub use record::RecordGuard;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{BaseNode, End};

/// Errors raised by a persistence backend. Both variants are programmer
/// errors: they indicate the caller used a snapshot ID the backend does
/// not recognize, or attempted to decode JSON with an unregistered
/// `node_id`.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// `record_run` was called with an ID no node snapshot carries.
    #[error("snapshot `{0}` not found")]
    NotFound(String),

    /// `record_run` was called with the ID of an end snapshot.
    #[error("snapshot `{0}` is not a node snapshot")]
    WrongKind(String),

    /// JSON decoding referenced a `node_id` absent from the registry.
    #[error("unknown node_id `{0}`")]
    UnknownNodeId(String),

    /// A loaded history document was not a JSON array of snapshots.
    #[error("history document must be a JSON array")]
    NotAnArray,

    /// The JSON document was malformed for any other reason.
    #[error("malformed history document: {0}")]
    Codec(#[from] serde_json::Error),
}

/// The monotonic status of a node snapshot. Transitions only forward:
/// `Created → Running → (Success | Error)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Recorded but not yet entered the recording region.
    Created,
    /// Queued to run but not yet started (reserved for future schedulers).
    Pending,
    /// Inside the recording region; timing has started.
    Running,
    /// The recording region exited normally.
    Success,
    /// The recording region exited via an error or cancellation.
    Error,
}

/// A snapshot describing that `node` is the next step to run, captured
/// from `state` as it was *before* `node` executes.
///
/// Does not derive `Serialize`/`Deserialize`: `node` is a trait object, so
/// encoding goes through manual helper functions in the `full` module
/// instead, keyed on the `node_id` discriminator (§4.B, §9).
pub struct NodeSnapshot<S, D, R> {
    /// Unique within one persistence instance.
    pub id: String,
    /// The state captured before this node ran.
    pub state: S,
    /// The node about to run.
    pub node: Box<dyn BaseNode<S, D, R>>,
    /// Set once the recording region is entered.
    pub start_ts: Option<DateTime<Utc>>,
    /// Set once the recording region exits.
    pub duration: Option<f64>,
    /// Monotonic; see [`Status`].
    pub status: Status,
}

/// A snapshot describing the terminal step of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndSnapshot<S, R> {
    /// Unique within one persistence instance.
    pub id: String,
    /// The state as it was at termination.
    pub state: S,
    /// The run's output.
    pub result: End<R>,
    /// When the run ended.
    pub ts: DateTime<Utc>,
}

/// One entry in a run's history: either a pending/running/finished node
/// step, or the terminal step.
pub enum Snapshot<S, D, R> {
    /// A node snapshot (§3).
    Node(NodeSnapshot<S, D, R>),
    /// An end snapshot (§3), always last when present.
    End(EndSnapshot<S, R>),
}

impl<S, D, R> Snapshot<S, D, R> {
    /// The snapshot's ID, regardless of kind.
    pub fn id(&self) -> &str {
        match self {
            Snapshot::Node(n) => &n.id,
            Snapshot::End(e) => &e.id,
        }
    }
}

/// The persistence contract shared by every backend (§4.C).
///
/// Implementors own the storage for one run's history; the engine borrows
/// one for the duration of a run and must not share it across concurrent
/// runs (§5).
#[async_trait]
pub trait StatePersistence<S, D, R>: Send
where
    S: Clone + Send + Sync + 'static,
    D: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Appends a new node snapshot with status [`Status::Created`],
    /// capturing the state and node per the backend's deep-copy policy.
    /// Returns the snapshot's newly allocated ID.
    async fn snapshot_node(&mut self, state: &S, next_node: &dyn BaseNode<S, D, R>) -> String;

    /// Appends an end snapshot. Returns the snapshot's newly allocated ID.
    async fn snapshot_end(&mut self, state: &S, end: End<R>) -> String;

    /// Locates the node snapshot with `snapshot_id` and returns a scoped
    /// region that sets `status = running`, `start_ts = now_utc()`, and
    /// guarantees a terminal status and `duration` on every exit path.
    fn record_run(&mut self, snapshot_id: &str) -> Result<RecordGuard<'_>, PersistenceError>;

    /// Returns the most recently appended snapshot, if any.
    fn restore(&self) -> Option<&Snapshot<S, D, R>>;
}
