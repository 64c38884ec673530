//! Domain types shared across the coordinator

mod id;
mod priority;

pub use id::RequestId;
pub use priority::{DEFAULT_PRIORITY, Priority};
