use crate::cache::{CacheLevel, LevelStats, Lookup};
use crate::config::{HierarchyConfig, Policy};
use crate::error::SimResult;
use crate::mem::{MemView, Memory};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Source {
  /// Index into the level arena, 0 is closest to the core
  Level(usize),
  Memory,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Access {
  pub value: u8,
  pub cycles: u64,
  pub served_by: Source,
}

/// Main memory plus an ordered arena of direct-mapped levels.
#[derive(Clone, Debug)]
pub struct MemoryHierarchy {
  levels: Vec<CacheLevel>,
  mem: Memory,
  memory_latency: u64,
  policy: Policy,
  total_cycles: u64,
  loads: u64,
  stores: u64,
}

impl Default for MemoryHierarchy {
  fn default() -> Self {
    let config = HierarchyConfig::default();
    MemoryHierarchy::build(&config)
  }
}

impl MemoryHierarchy {
  pub fn new(config: &HierarchyConfig) -> SimResult<MemoryHierarchy> {
    config.validate()?;
    Ok(MemoryHierarchy::build(config))
  }

  fn build(config: &HierarchyConfig) -> MemoryHierarchy {
    let levels = config.levels.iter()
      .map(|l| CacheLevel::new(l.clone(), config.block_size))
      .collect::<Vec<_>>();
    log::info!("memory hierarchy: {} bytes of memory behind {}", config.memory_size,
      levels.iter().map(|l| format!("{}({})", l.name(), l.capacity())).collect::<Vec<_>>().join(" -> "));
    MemoryHierarchy {
      levels,
      mem: Memory::new(config.memory_size),
      memory_latency: config.memory_latency,
      policy: config.policy,
      total_cycles: 0,
      loads: 0,
      stores: 0,
    }
  }

  /// Walks the levels in order, charging each miss, and falls back to memory
  /// when every level misses.
  pub fn load(&mut self, addr: usize) -> SimResult<Access> {
    self.mem.check(addr)?;
    let mut cycles = 0;
    let mut found = None;
    for (i, level) in self.levels.iter_mut().enumerate() {
      let (lookup, charge) = level.load(addr);
      cycles += charge;
      if let Lookup::Hit(v) = lookup {
        found = Some((v, Source::Level(i)));
        break;
      }
    }
    let (value, served_by) = match found {
      Some(f) => f,
      None => {
        cycles += self.memory_latency;
        (self.mem.read(addr)?, Source::Memory)
      },
    };
    if self.policy.fill_on_read_miss {
      let missed = match served_by {
        Source::Level(i) => i,
        Source::Memory => self.levels.len(),
      };
      for level in &mut self.levels[..missed] {
        level.install(addr, &self.mem)?;
      }
    }
    self.loads += 1;
    self.total_cycles += cycles;
    log::debug!("load {} -> {} in {} cycles from {:?}", addr, value, cycles, served_by);
    Ok(Access { value, cycles, served_by })
  }

  /// Write-through store. Every level sees the store; with `write_per_level`
  /// each one also writes memory and charges its write penalty.
  pub fn store(&mut self, addr: usize, value: u8) -> SimResult<u64> {
    self.mem.check(addr)?;
    let mut cycles = 0;
    for (i, level) in self.levels.iter_mut().enumerate() {
      let write_through = self.policy.write_per_level || i == 0;
      let (hit, charge) = level.store(addr, value, &mut self.mem, write_through)?;
      cycles += charge;
      if !hit && self.policy.allocate_on_write_miss {
        level.install(addr, &self.mem)?;
      }
    }
    self.stores += 1;
    self.total_cycles += cycles;
    log::debug!("store {} <- {} in {} cycles", addr, value, cycles);
    Ok(cycles)
  }

  /// Drops every cached line. Memory is already current.
  pub fn flush(&mut self) {
    self.levels.iter_mut().for_each(CacheLevel::invalidate);
  }

  pub fn reset_stats(&mut self) {
    self.levels.iter_mut().for_each(CacheLevel::reset_stats);
    self.total_cycles = 0;
    self.loads = 0;
    self.stores = 0;
  }

  pub fn levels(&self) -> &[CacheLevel] { &self.levels }
  pub fn level(&self, i: usize) -> Option<&CacheLevel> { self.levels.get(i) }
  pub fn stats(&self) -> Vec<(&str, LevelStats)> {
    self.levels.iter().map(|l| (l.name(), l.stats())).collect()
  }
  pub fn policy(&self) -> Policy { self.policy }
  pub fn total_cycles(&self) -> u64 { self.total_cycles }
  pub fn loads(&self) -> u64 { self.loads }
  pub fn stores(&self) -> u64 { self.stores }
  pub fn memory(&self) -> &[u8] { self.mem.as_slice() }
  pub fn memory_size(&self) -> usize { self.mem.size() }
  pub fn dump(&self) -> MemView { self.mem.view(0..self.mem.size()) }
}

#[cfg(test)]
mod test_hierarchy {
  use super::*;
  use crate::config::LevelConfig;
  use crate::error::SimError;
  use proptest::prelude::*;

  fn with_policy(policy: Policy) -> MemoryHierarchy {
    let config = HierarchyConfig { policy, ..Default::default() };
    MemoryHierarchy::new(&config).unwrap()
  }

  fn filling() -> MemoryHierarchy {
    with_policy(Policy { fill_on_read_miss: true, ..Default::default() })
  }

  #[test]
  fn test_cold_scenario() {
    let mut h = MemoryHierarchy::default();
    assert_eq!(h.load(5).unwrap(), Access { value: 0, cycles: 60, served_by: Source::Memory });
    assert_eq!(h.store(5, 42).unwrap(), 20);
    assert_eq!(h.memory()[5], 42);
    assert_eq!(h.load(5).unwrap(), Access { value: 42, cycles: 60, served_by: Source::Memory });
    assert!(h.levels().iter().all(|l| (0..l.capacity()).all(|i| !l.line(i).unwrap().is_valid())));
    assert_eq!(h.total_cycles(), 140);
    assert_eq!((h.loads(), h.stores()), (2, 1));
  }

  #[test]
  fn test_out_of_range() {
    let mut h = MemoryHierarchy::default();
    assert!(matches!(h.load(1024), Err(SimError::OutOfRange { address: 1024, size: 1024 })));
    assert!(matches!(h.store(5000, 1), Err(SimError::OutOfRange { .. })));
    assert_eq!(h.total_cycles(), 0);
    assert!(h.stats().iter().all(|(_, s)| s.accesses() == 0));
  }

  #[test]
  fn test_fill_latencies() {
    let mut h = filling();
    assert_eq!(h.load(7).unwrap().cycles, 60);
    assert_eq!(h.load(7).unwrap(), Access { value: 0, cycles: 1, served_by: Source::Level(0) });
    // 39 shares L1 index 7 but lives in its own L2 line
    assert_eq!(h.load(39).unwrap().cycles, 60);
    assert_eq!(h.load(7).unwrap(), Access { value: 0, cycles: 6, served_by: Source::Level(1) });
    assert_eq!(h.load(7).unwrap().cycles, 1);
  }

  #[test]
  fn test_store_hit_costs() {
    let mut h = filling();
    h.load(9).unwrap();
    assert_eq!(h.store(9, 3).unwrap(), 22);
    assert_eq!(h.load(9).unwrap(), Access { value: 3, cycles: 1, served_by: Source::Level(0) });
    // evict from L1 only
    h.load(41).unwrap();
    assert_eq!(h.store(9, 4).unwrap(), 21);
    assert_eq!(h.load(9).unwrap().served_by, Source::Level(1));
  }

  #[test]
  fn test_single_write_charge() {
    let mut h = with_policy(Policy { write_per_level: false, ..Default::default() });
    assert_eq!(h.store(12, 8).unwrap(), 10);
    assert_eq!(h.memory()[12], 8);
  }

  #[test]
  fn test_allocate_on_write_miss() {
    let mut h = with_policy(Policy { allocate_on_write_miss: true, ..Default::default() });
    assert_eq!(h.store(100, 77).unwrap(), 20);
    assert_eq!(h.load(100).unwrap(), Access { value: 77, cycles: 1, served_by: Source::Level(0) });
    assert_eq!(h.store(100, 78).unwrap(), 22);
    h.flush();
    assert_eq!(h.load(100).unwrap(), Access { value: 78, cycles: 60, served_by: Source::Memory });
  }

  #[test]
  fn test_three_levels() {
    let config = HierarchyConfig {
      levels: vec![LevelConfig::new("L1", 4), LevelConfig::new("L2", 16), LevelConfig::new("L3", 64)],
      policy: Policy { fill_on_read_miss: true, ..Default::default() },
      ..Default::default()
    };
    let mut h = MemoryHierarchy::new(&config).unwrap();
    assert_eq!(h.load(0).unwrap().cycles, 65);
    assert_eq!(h.store(0, 1).unwrap(), 33);
    h.load(16).unwrap();
    assert_eq!(h.load(0).unwrap(), Access { value: 1, cycles: 11, served_by: Source::Level(2) });
    assert_eq!(h.stats()[2].1.load_hits, 1);
  }

  #[test]
  fn test_rejects_invalid_config() {
    let config = HierarchyConfig { levels: vec![], ..Default::default() };
    assert!(matches!(MemoryHierarchy::new(&config), Err(SimError::InvalidConfig(_))));
  }

  #[test]
  fn test_dump_covers_memory() {
    let mut h = MemoryHierarchy::default();
    h.store(1023, 255).unwrap();
    let dump = h.dump().to_string();
    assert_eq!(dump.lines().count(), 1 + 1024 / 16);
    assert!(dump.lines().last().unwrap().ends_with(" 255"));
  }

  proptest! {
    #[test]
    fn test_store_then_load(addr in 0usize..1024, v in any::<u8>(), fill in any::<bool>(), alloc in any::<bool>()) {
      let mut h = with_policy(Policy { fill_on_read_miss: fill, allocate_on_write_miss: alloc, write_per_level: true });
      h.load(addr).unwrap();
      h.store(addr, v).unwrap();
      prop_assert_eq!(h.load(addr).unwrap().value, v);
      prop_assert_eq!(h.memory()[addr], v);
    }

    #[test]
    fn test_cold_costs(addr in 0usize..1024, v in any::<u8>()) {
      let mut h = MemoryHierarchy::default();
      prop_assert_eq!(h.load(addr).unwrap().cycles, 60);
      let first = h.store(addr, v).unwrap();
      prop_assert_eq!(first, 20);
      prop_assert_eq!(h.store(addr, v).unwrap(), first);
      prop_assert_eq!(h.memory()[addr], v);
    }

    #[test]
    fn test_colliding_tags(a in 0usize..32, k in 1usize..32) {
      // a and b share L1 index a but differ in tag
      let b = a + 32 * k;
      let mut h = filling();
      h.load(a).unwrap();
      h.load(b).unwrap();
      prop_assert_eq!(h.load(b).unwrap().served_by, Source::Level(0));
      prop_assert_ne!(h.load(a).unwrap().served_by, Source::Level(0));
    }
  }
}
