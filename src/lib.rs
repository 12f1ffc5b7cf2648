//! # graphflow
//!
//! A typed, persisted graph execution engine: runs a directed graph of
//! user-defined nodes, where each node's execution produces the next
//! node (or a terminal value), while a persistence layer records an
//! ordered history of snapshots for audit, inspection, and resume.
//!
//! ## Key features
//!
//! - **Static node protocol**: nodes implement [`graph::BaseNode`], sharing
//!   a `State`/`Deps`/`RunEnd` type triple checked by the compiler.
//! - **Eager validation**: a [`graph::Graph`] is built once via
//!   [`graph::GraphBuilder`], which closes over the declared node set and
//!   rejects missing references or duplicate node IDs before any run.
//! - **Durable history**: [`persistence::StatePersistence`] backends record
//!   every step as a snapshot; [`persistence::FullStatePersistence`]
//!   round-trips the full history through JSON.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use thiserror::Error;

/// Result type for graphflow operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Top-level error type for graphflow operations.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Graph construction failed validation.
    #[error("graph setup error: {0}")]
    Setup(#[from] graph::GraphSetupError),

    /// A run failed while executing a step.
    #[error("graph runtime error: {0}")]
    Runtime(#[from] engine::GraphRuntimeError),

    /// A persistence backend rejected an operation.
    #[error("persistence error: {0}")]
    Persistence(#[from] persistence::PersistenceError),
}

/// Node protocol, graph definition, and the validator.
pub mod graph;

/// The run engine: the step loop, run context, and run results.
pub mod engine;

/// Snapshot model and persistence backends.
pub mod persistence;

/// Identity and time utilities shared across the engine.
pub mod util;
