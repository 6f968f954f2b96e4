//! Input data and serialization helpers.

pub mod snapshot;
pub mod yaml;

pub use snapshot::{Author, Entry, Snapshot, Tag};
pub use yaml::{from_yaml, to_yaml};
