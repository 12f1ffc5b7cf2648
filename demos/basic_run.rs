//! Runs the three-node linear graph from the crate's worked examples
//! (`Float2String -> String2Length -> Double`, with a loopback on the
//! unlucky length 7) and prints the resulting history as JSON.
//!
//! ```text
//! cargo run --example basic_run
//! ```

use async_trait::async_trait;
use graphflow::graph::{node_to_json, BaseNode, DeclaredReturn, End, GraphBuilder, GraphRunContext, NodeStep};
use graphflow::persistence::{FullStatePersistence, StatePersistence};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("graphflow=debug")))
        .init();

    let graph = GraphBuilder::<(), (), usize>::new("string_length_demo")
        .register_node::<Float2String>()
        .register_node::<String2Length>()
        .register_node::<Double>()
        .build()?;

    let mut persistence: FullStatePersistence<(), (), usize> = FullStatePersistence::new();
    let result = graph
        .run(Box::new(Float2String { value: 3.14159 }), (), &(), &mut persistence)
        .await?;

    println!("output = {}", result.output);
    println!("history = {}", persistence.dump_json(Some(2)));
    Ok(())
}
