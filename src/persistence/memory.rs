//! The latest-only persistence backend: keeps at most one snapshot,
//! overwritten on each new call. Intended for cheap, lightweight
//! inspection rather than audit (§4.C).

use async_trait::async_trait;

use crate::graph::{BaseNode, End};
use crate::util::IdAllocator;

use super::{NodeSnapshot, PersistenceError, RecordGuard, Snapshot, StatePersistence, Status};

/// Keeps only the most recently recorded snapshot. Like the full-history
/// backend, every capture clones its `state` and `node` payloads — the
/// cheapness of this backend comes from keeping at most one snapshot
/// alive, not from skipping the clone on the one it keeps.
pub struct SimpleStatePersistence<S, D, R> {
    current: Option<Snapshot<S, D, R>>,
    ids: IdAllocator,
}

impl<S, D, R> SimpleStatePersistence<S, D, R> {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self {
            current: None,
            ids: IdAllocator::new(),
        }
    }
}

impl<S, D, R> Default for SimpleStatePersistence<S, D, R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S, D, R> StatePersistence<S, D, R> for SimpleStatePersistence<S, D, R>
where
    S: Clone + Send + Sync + 'static,
    D: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    async fn snapshot_node(&mut self, state: &S, next_node: &dyn BaseNode<S, D, R>) -> String {
        let id = self.ids.alloc_node_id(&next_node.id());
        self.current = Some(Snapshot::Node(NodeSnapshot {
            id: id.clone(),
            state: state.clone(),
            node: next_node.clone_node(),
            start_ts: None,
            duration: None,
            status: Status::Created,
        }));
        id
    }

    async fn snapshot_end(&mut self, state: &S, end: End<R>) -> String {
        let id = self.ids.alloc_end_id();
        self.current = Some(Snapshot::End(super::EndSnapshot {
            id: id.clone(),
            state: state.clone(),
            result: end,
            ts: crate::util::now_utc(),
        }));
        id
    }

    fn record_run(&mut self, snapshot_id: &str) -> Result<RecordGuard<'_>, PersistenceError> {
        match &mut self.current {
            Some(Snapshot::Node(n)) if n.id == snapshot_id => {
                Ok(RecordGuard::enter(&mut n.status, &mut n.start_ts, &mut n.duration))
            }
            // A caller allocated a new snapshot since requesting this ID: the
            // source treats this as a programmer error rather than attempting
            // implicit reconciliation (§9, resolved Open Question).
            Some(_) => Err(PersistenceError::NotFound(snapshot_id.to_string())),
            None => Err(PersistenceError::NotFound(snapshot_id.to_string())),
        }
    }

    fn restore(&self) -> Option<&Snapshot<S, D, R>> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphRunContext, NodeStep};

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    struct Marker;

    #[async_trait]
    impl BaseNode<i32, (), i32> for Marker {
        fn id(&self) -> String {
            Self::node_id().to_string()
        }

        async fn run(&mut self, _ctx: &mut GraphRunContext<'_, i32, ()>) -> anyhow::Result<NodeStep<i32, (), i32>> {
            unreachable!()
        }

        fn clone_node(&self) -> Box<dyn BaseNode<i32, (), i32>> {
            Box::new(self.clone())
        }

        fn to_json(&self) -> serde_json::Value {
            crate::graph::node_to_json(self, &self.id())
        }
    }

    #[tokio::test]
    async fn keeps_only_the_latest_snapshot() {
        let mut sp: SimpleStatePersistence<i32, (), i32> = SimpleStatePersistence::new();
        let first = sp.snapshot_node(&1, &Marker).await;
        let second = sp.snapshot_node(&2, &Marker).await;
        assert_ne!(first, second);
        assert_eq!(sp.restore().unwrap().id(), second);
        // The overwritten ID no longer resolves.
        assert!(sp.record_run(&first).is_err());
    }

    #[tokio::test]
    async fn record_run_marks_success_on_explicit_completion() {
        let mut sp: SimpleStatePersistence<i32, (), i32> = SimpleStatePersistence::new();
        let id = sp.snapshot_node(&1, &Marker).await;
        {
            let guard = sp.record_run(&id).unwrap();
            guard.mark_success();
        }
        match sp.restore().unwrap() {
            Snapshot::Node(n) => assert_eq!(n.status, Status::Success),
            _ => panic!("expected node snapshot"),
        }
    }
}
