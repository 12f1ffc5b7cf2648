//! A node whose `run` returns an error: the recording region marks the
//! failing snapshot `error` with its elapsed duration, the error
//! propagates unchanged, and no end snapshot is ever appended.

use async_trait::async_trait;
use graphflow::graph::{node_to_json, BaseNode, GraphBuilder, GraphRunContext, NodeStep};
use graphflow::persistence::{FullStatePersistence, Snapshot, StatePersistence, Status};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Spam {}

#[async_trait]
impl BaseNode<(), (), ()> for Spam {
    fn id(&self) -> String {
        Self::node_id().to_string()
    }

    async fn run(&mut self, _ctx: &mut GraphRunContext<'_, (), ()>) -> anyhow::Result<NodeStep<(), (), ()>> {
        anyhow::bail!("test error")
    }

    fn clone_node(&self) -> Box<dyn BaseNode<(), (), ()>> {
        Box::new(self.clone())
    }

    fn to_json(&self) -> serde_json::Value {
        node_to_json(self, &self.id())
    }
}

#[tokio::test]
async fn node_failure_propagates_and_leaves_an_error_snapshot() {
    let graph = GraphBuilder::<(), (), ()>::new("spam")
        .register_node::<Spam>()
        .build()
        .unwrap();

    let mut persistence: FullStatePersistence<(), (), ()> = FullStatePersistence::new();
    let err = graph.run(Box::new(Spam {}), (), &(), &mut persistence).await.unwrap_err();

    assert!(err.to_string().contains("test error"));

    let history = persistence.history();
    assert_eq!(history.len(), 1);
    match history.last().unwrap() {
        Snapshot::Node(n) => {
            assert_eq!(n.status, Status::Error);
            assert!(n.duration.expect("duration recorded even on error") >= 0.0);
        }
        Snapshot::End(_) => panic!("an errored run must not record an end snapshot"),
    }
}
