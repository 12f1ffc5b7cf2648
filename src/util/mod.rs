//! Identity and time utilities used by the persistence and run-engine layers.

pub mod ids;
pub mod time;

pub use ids::IdAllocator;
pub use time::now_utc;
