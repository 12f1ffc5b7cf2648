//! Mutable state carried across steps: `Foo` increments `x`, `Bar`
//! appends to `y` and ends with `2 * x`. Verifies that each snapshot's
//! captured `state` reflects the state *before* that step ran (P2).

use async_trait::async_trait;
use graphflow::graph::{node_to_json, BaseNode, DeclaredReturn, End, GraphBuilder, GraphRunContext, NodeStep};
use graphflow::persistence::{FullStatePersistence, Snapshot, StatePersistence};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MyState {
    x: i64,
    y: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Foo {}

#[async_trait]
impl BaseNode<MyState, (), i64> for Foo {
    fn declared_returns() -> Vec<DeclaredReturn> {
        vec![DeclaredReturn::Node("Bar")]
    }

    fn id(&self) -> String {
        Self::node_id().to_string()
    }

    async fn run(&mut self, ctx: &mut GraphRunContext<'_, MyState, ()>) -> anyhow::Result<NodeStep<MyState, (), i64>> {
        ctx.state.x += 1;
        Ok(NodeStep::Next(Box::new(Bar {})))
    }

    fn clone_node(&self) -> Box<dyn BaseNode<MyState, (), i64>> {
        Box::new(self.clone())
    }

    fn to_json(&self) -> serde_json::Value {
        node_to_json(self, &self.id())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Bar {}

#[async_trait]
impl BaseNode<MyState, (), i64> for Bar {
    fn declared_returns() -> Vec<DeclaredReturn> {
        vec![DeclaredReturn::End]
    }

    fn id(&self) -> String {
        Self::node_id().to_string()
    }

    async fn run(&mut self, ctx: &mut GraphRunContext<'_, MyState, ()>) -> anyhow::Result<NodeStep<MyState, (), i64>> {
        ctx.state.y.push('y');
        Ok(NodeStep::Done(End::new(2 * ctx.state.x)))
    }

    fn clone_node(&self) -> Box<dyn BaseNode<MyState, (), i64>> {
        Box::new(self.clone())
    }

    fn to_json(&self) -> serde_json::Value {
        node_to_json(self, &self.id())
    }
}

#[tokio::test]
async fn state_mutations_land_in_the_right_snapshots() {
    let graph = GraphBuilder::<MyState, (), i64>::new("mutable_state")
        .register_node::<Foo>()
        .register_node::<Bar>()
        .build()
        .unwrap();

    let start = MyState { x: 1, y: String::new() };
    let mut persistence: FullStatePersistence<MyState, (), i64> = FullStatePersistence::new();
    let result = graph.run(Box::new(Foo {}), start, &(), &mut persistence).await.unwrap();

    assert_eq!(result.output, 4);
    assert_eq!(result.state, MyState { x: 2, y: "y".to_string() });

    let history = persistence.history();
    assert_eq!(history.len(), 3);
    let captured_states: Vec<MyState> = history
        .iter()
        .map(|s| match s {
            Snapshot::Node(n) => n.state.clone(),
            Snapshot::End(e) => e.state.clone(),
        })
        .collect();
    assert_eq!(
        captured_states,
        vec![
            MyState { x: 1, y: String::new() },
            MyState { x: 2, y: String::new() },
            MyState { x: 2, y: "y".to_string() },
        ]
    );
}
