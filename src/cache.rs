use crate::config::LevelConfig;
use crate::error::SimResult;
use crate::mem::Memory;

/// One slot of a direct-mapped level. `tag` is `None` until something is installed.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CacheLine {
  tag: Option<usize>,
  data: Vec<u8>,
  valid: bool,
}

impl CacheLine {
  fn empty(block_size: usize) -> Self {
    CacheLine { tag: None, data: vec![0; block_size], valid: false }
  }
  pub fn tag(&self) -> Option<usize> { self.tag }
  pub fn data(&self) -> &[u8] { &self.data }
  pub fn is_valid(&self) -> bool { self.valid }
  fn holds(&self, tag: usize) -> bool { self.valid && self.tag == Some(tag) }
}

impl std::fmt::Display for CacheLine {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self.tag {
      Some(t) => write!(f, "valid={}, tag={}, data={:?}", self.valid, t, self.data),
      None => write!(f, "valid={}, tag=-, data={:?}", self.valid, self.data),
    }
  }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Lookup {
  Hit(u8),
  Miss,
}

#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct LevelStats {
  pub load_hits: u64,
  pub load_misses: u64,
  pub store_hits: u64,
  pub store_misses: u64,
}

impl LevelStats {
  pub fn accesses(&self) -> u64 {
    self.load_hits + self.load_misses + self.store_hits + self.store_misses
  }
  pub fn hit_rate(&self) -> f64 {
    match self.accesses() {
      0 => 0.0,
      n => (self.load_hits + self.store_hits) as f64 / n as f64,
    }
  }
}

/// Where an address lands inside a level.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Slot {
  pub index: usize,
  pub tag: usize,
  pub offset: usize,
}

/// A single direct-mapped cache level. Capacity is fixed at construction.
#[derive(Clone, Debug)]
pub struct CacheLevel {
  config: LevelConfig,
  block_size: usize,
  lines: Vec<CacheLine>,
  stats: LevelStats,
}

impl CacheLevel {
  pub fn new(config: LevelConfig, block_size: usize) -> Self {
    let lines = vec![CacheLine::empty(block_size); config.capacity];
    CacheLevel { config, block_size, lines, stats: LevelStats::default() }
  }
  pub fn name(&self) -> &str { &self.config.name }
  pub fn capacity(&self) -> usize { self.lines.len() }
  pub fn config(&self) -> &LevelConfig { &self.config }
  pub fn stats(&self) -> LevelStats { self.stats }
  pub fn reset_stats(&mut self) { self.stats = LevelStats::default() }
  pub fn line(&self, index: usize) -> Option<&CacheLine> { self.lines.get(index) }

  pub fn slot(&self, addr: usize) -> Slot {
    let block = addr / self.block_size;
    Slot {
      index: block % self.capacity(),
      tag: block / self.capacity(),
      offset: addr % self.block_size,
    }
  }

  /// Hit costs `hit_latency`; a miss costs `miss_penalty` and leaves the line alone.
  pub fn load(&mut self, addr: usize) -> (Lookup, u64) {
    let Slot { index, tag, offset } = self.slot(addr);
    let line = &self.lines[index];
    if line.holds(tag) {
      self.stats.load_hits += 1;
      log::trace!("{}: load hit at {} (index {}, tag {})", self.config.name, addr, index, tag);
      (Lookup::Hit(line.data[offset]), self.config.hit_latency)
    } else {
      self.stats.load_misses += 1;
      log::trace!("{}: load miss at {} (index {}, tag {})", self.config.name, addr, index, tag);
      (Lookup::Miss, self.config.miss_penalty)
    }
  }

  /// Updates a resident line in place, then writes through to memory when
  /// `write_through` is set. Never allocates. Returns whether it hit and the
  /// cycles charged by this level alone.
  pub fn store(&mut self, addr: usize, value: u8, mem: &mut Memory, write_through: bool)
    -> SimResult<(bool, u64)> {
    let Slot { index, tag, offset } = self.slot(addr);
    let mut cycles = 0;
    let line = &mut self.lines[index];
    let hit = line.holds(tag);
    if hit {
      line.data[offset] = value;
      cycles += self.config.hit_latency;
      self.stats.store_hits += 1;
    } else {
      self.stats.store_misses += 1;
    }
    log::trace!("{}: store {} at {} (index {}, tag {})",
      self.config.name, if hit { "hit" } else { "miss" }, addr, index, tag);
    if write_through {
      mem.write(addr, value)?;
      cycles += self.config.write_penalty;
    }
    Ok((hit, cycles))
  }

  /// Copies the block containing `addr` out of memory and marks the line valid,
  /// evicting whatever was there.
  pub fn install(&mut self, addr: usize, mem: &Memory) -> SimResult<()> {
    let Slot { index, tag, .. } = self.slot(addr);
    let base = addr - addr % self.block_size;
    let block = mem.block(base, self.block_size)?;
    let line = &mut self.lines[index];
    if line.valid && line.tag != Some(tag) {
      log::trace!("{}: evicting tag {:?} from index {}", self.config.name, line.tag, index);
    }
    line.data.copy_from_slice(block);
    line.tag = Some(tag);
    line.valid = true;
    Ok(())
  }

  pub fn invalidate(&mut self) {
    let block_size = self.block_size;
    self.lines.iter_mut().for_each(|l| *l = CacheLine::empty(block_size));
  }
}
