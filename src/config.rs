use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::{SimError, SimResult};

pub const MEMORY_SIZE: usize = 1024;
pub const L1_CAPACITY: usize = 32;
pub const L2_CAPACITY: usize = 128;
pub const BLOCK_SIZE: usize = 1;

pub const HIT_LATENCY: u64 = 1;
pub const MISS_PENALTY: u64 = 5;
pub const WRITE_PENALTY: u64 = 10;
pub const MEMORY_LATENCY: u64 = 50;

/// A single direct-mapped level, capacity counted in lines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
  pub name: String,
  pub capacity: usize,
  pub hit_latency: u64,
  pub miss_penalty: u64,
  pub write_penalty: u64,
}

impl LevelConfig {
  pub fn new<S: Into<String>>(name: S, capacity: usize) -> Self {
    LevelConfig { name: name.into(), capacity, ..Default::default() }
  }
}

impl Default for LevelConfig {
  fn default() -> Self {
    LevelConfig {
      name: String::from("cache"),
      capacity: L1_CAPACITY,
      hit_latency: HIT_LATENCY,
      miss_penalty: MISS_PENALTY,
      write_penalty: WRITE_PENALTY,
    }
  }
}

/// Knobs for the fill/write behavior. The defaults leave every line invalid
/// forever and charge a memory write at each level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
  /// Install the block into every level that missed once a load resolves.
  pub fill_on_read_miss: bool,
  /// Install the block into a level when a store misses it.
  pub allocate_on_write_miss: bool,
  /// Every level re-writes memory and charges its own write penalty.
  pub write_per_level: bool,
}

impl Default for Policy {
  fn default() -> Self {
    Policy { fill_on_read_miss: false, allocate_on_write_miss: false, write_per_level: true }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
  pub memory_size: usize,
  pub block_size: usize,
  pub memory_latency: u64,
  /// Ordered closest to the core first.
  pub levels: Vec<LevelConfig>,
  pub policy: Policy,
}

impl Default for HierarchyConfig {
  fn default() -> Self {
    HierarchyConfig {
      memory_size: MEMORY_SIZE,
      block_size: BLOCK_SIZE,
      memory_latency: MEMORY_LATENCY,
      levels: vec![LevelConfig::new("L1", L1_CAPACITY), LevelConfig::new("L2", L2_CAPACITY)],
      policy: Policy::default(),
    }
  }
}

impl HierarchyConfig {
  /// Reads a JSON configuration; omitted fields keep their defaults.
  pub fn from_file<P: AsRef<Path>>(path: P) -> SimResult<HierarchyConfig> {
    let file = File::open(path.as_ref())?;
    let config: HierarchyConfig = serde_json::from_reader(BufReader::new(file))?;
    config.validate()?;
    log::info!("loaded configuration from {}", path.as_ref().display());
    Ok(config)
  }

  pub fn from_json(s: &str) -> SimResult<HierarchyConfig> {
    let config: HierarchyConfig = serde_json::from_str(s)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> SimResult<()> {
    if self.memory_size == 0 { return Err(SimError::config("memory size must be non-zero")) };
    if self.block_size == 0 { return Err(SimError::config("block size must be non-zero")) };
    if self.memory_size % self.block_size != 0 {
      return Err(SimError::config(format!(
        "memory size {} is not a multiple of block size {}", self.memory_size, self.block_size)));
    }
    if self.levels.is_empty() { return Err(SimError::config("at least one cache level is required")) };
    if let Some(l) = self.levels.iter().find(|l| l.capacity == 0) {
      return Err(SimError::config(format!("level {} has zero capacity", l.name)));
    }
    Ok(())
  }
}
