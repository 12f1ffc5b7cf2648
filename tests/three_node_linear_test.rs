//! The three-node linear graph from the crate's worked examples:
//! `Float2String -> String2Length -> Double`, with `Double` looping back
//! into `String2Length` on the unlucky input length 7.

use async_trait::async_trait;
use graphflow::graph::{node_to_json, BaseNode, DeclaredReturn, End, GraphBuilder, GraphRunContext, NodeStep};
use graphflow::persistence::{FullStatePersistence, Snapshot, StatePersistence};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Float2String {
    value: f64,
}

#[async_trait]
impl BaseNode<(), (), usize> for Float2String {
    fn declared_returns() -> Vec<DeclaredReturn> {
        vec![DeclaredReturn::Node("String2Length")]
    }

    fn id(&self) -> String {
        Self::node_id().to_string()
    }

    async fn run(&mut self, _ctx: &mut GraphRunContext<'_, (), ()>) -> anyhow::Result<NodeStep<(), (), usize>> {
        Ok(NodeStep::Next(Box::new(String2Length { text: self.value.to_string() })))
    }

    fn clone_node(&self) -> Box<dyn BaseNode<(), (), usize>> {
        Box::new(self.clone())
    }

    fn to_json(&self) -> serde_json::Value {
        node_to_json(self, &self.id())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct String2Length {
    text: String,
}

#[async_trait]
impl BaseNode<(), (), usize> for String2Length {
    fn declared_returns() -> Vec<DeclaredReturn> {
        vec![DeclaredReturn::Node("Double")]
    }

    fn id(&self) -> String {
        Self::node_id().to_string()
    }

    async fn run(&mut self, _ctx: &mut GraphRunContext<'_, (), ()>) -> anyhow::Result<NodeStep<(), (), usize>> {
        Ok(NodeStep::Next(Box::new(Double { length: self.text.len() })))
    }

    fn clone_node(&self) -> Box<dyn BaseNode<(), (), usize>> {
        Box::new(self.clone())
    }

    fn to_json(&self) -> serde_json::Value {
        node_to_json(self, &self.id())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Double {
    length: usize,
}

#[async_trait]
impl BaseNode<(), (), usize> for Double {
    fn declared_returns() -> Vec<DeclaredReturn> {
        vec![DeclaredReturn::Node("String2Length"), DeclaredReturn::End]
    }

    fn id(&self) -> String {
        Self::node_id().to_string()
    }

    async fn run(&mut self, _ctx: &mut GraphRunContext<'_, (), ()>) -> anyhow::Result<NodeStep<(), (), usize>> {
        if self.length == 7 {
            Ok(NodeStep::Next(Box::new(String2Length { text: "x".repeat(21) })))
        } else {
            Ok(NodeStep::Done(End::new(self.length * 2)))
        }
    }

    fn clone_node(&self) -> Box<dyn BaseNode<(), (), usize>> {
        Box::new(self.clone())
    }

    fn to_json(&self) -> serde_json::Value {
        node_to_json(self, &self.id())
    }
}

fn build_graph() -> graphflow::graph::Graph<(), (), usize> {
    GraphBuilder::<(), (), usize>::new("string_length")
        .register_node::<Float2String>()
        .register_node::<String2Length>()
        .register_node::<Double>()
        .build()
        .expect("closed graph should validate")
}

#[tokio::test]
async fn straight_line_run_doubles_the_length() {
    let graph = build_graph();
    let mut persistence: FullStatePersistence<(), (), usize> = FullStatePersistence::new();

    let result = graph
        .run(Box::new(Float2String { value: 3.14 }), (), &(), &mut persistence)
        .await
        .unwrap();

    assert_eq!(result.output, 8);
    assert_eq!(persistence.history().len(), 4);
    assert!(matches!(persistence.history().last().unwrap(), Snapshot::End(_)));
}

#[tokio::test]
async fn length_seven_triggers_a_loopback() {
    let graph = build_graph();
    let mut persistence: FullStatePersistence<(), (), usize> = FullStatePersistence::new();

    let result = graph
        .run(Box::new(Float2String { value: 3.14159 }), (), &(), &mut persistence)
        .await
        .unwrap();

    assert_eq!(result.output, 42);
    let history = persistence.history();
    assert_eq!(history.len(), 6);

    let node_ids: Vec<String> = history[..5]
        .iter()
        .map(|s| match s {
            Snapshot::Node(n) => n.node.id(),
            Snapshot::End(_) => panic!("expected a node snapshot"),
        })
        .collect();
    assert_eq!(node_ids, vec!["Float2String", "String2Length", "Double", "String2Length", "Double"]);
    assert!(matches!(history.last().unwrap(), Snapshot::End(_)));
}
