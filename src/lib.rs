//! A direct-mapped, write-through cache hierarchy in front of a flat main
//! memory, charging simulated cycles for every load and store.
pub mod cache;
pub mod config;
pub mod driver;
pub mod error;
pub mod hierarchy;
pub mod mem;

pub use crate::cache::{CacheLevel, CacheLine, LevelStats, Lookup};
pub use crate::config::{HierarchyConfig, LevelConfig, Policy};
pub use crate::error::{SimError, SimResult};
pub use crate::hierarchy::{Access, MemoryHierarchy, Source};
