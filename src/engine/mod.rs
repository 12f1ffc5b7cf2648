//! The run engine: drives the step loop, coordinates snapshots and
//! status/timing updates, and routes node failures (§4.E).
//!
//! [`Graph::run`](crate::graph::Graph::run) and
//! [`Graph::next`](crate::graph::Graph::next) are inherent methods added
//! to [`crate::graph::Graph`] by this module; there is nothing to import
//! from here beyond [`GraphRuntimeError`] and [`RunResult`].

mod error;
mod executor;

pub use error::GraphRuntimeError;
pub use executor::RunResult;
