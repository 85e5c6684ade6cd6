use std::ops::Range;
use crate::error::{SimError, SimResult};

pub const ROW_SIZE: usize = 16;

/// Flat, byte addressed main memory.
#[derive(PartialEq, Clone, Debug)]
pub struct Memory {
  data: Vec<u8>,
  size: usize,
}

pub struct MemView <'a> {
  range: Range<usize>,
  m: &'a Memory,
}

impl Memory {
  pub fn new(size: usize) -> Memory {
    Memory { data: vec![0; size], size }
  }
  pub fn size(&self) -> usize { self.size }
  pub fn as_slice(&self) -> &[u8] { &self.data }

  pub fn check(&self, loc: usize) -> SimResult<()> {
    if loc >= self.size { return Err(SimError::OutOfRange { address: loc, size: self.size }) };
    Ok(())
  }
  pub fn read(&self, loc: usize) -> SimResult<u8> {
    self.check(loc)?;
    Ok(self.data[loc])
  }
  pub fn write(&mut self, loc: usize, v: u8) -> SimResult<()> {
    self.check(loc)?;
    self.data[loc] = v;
    Ok(())
  }
  /// The `len` bytes starting at `base`, used to fill a cache line.
  pub fn block(&self, base: usize, len: usize) -> SimResult<&[u8]> {
    let end = base.checked_add(len).unwrap_or(usize::MAX);
    if end > self.size {
      return Err(SimError::OutOfRange { address: end.saturating_sub(1), size: self.size });
    }
    Ok(&self.data[base..end])
  }
  /// Clamps the range to memory, so `view(0..usize::MAX)` shows everything.
  pub fn view(&self, range: Range<usize>) -> MemView {
    let end = range.end.min(self.size);
    MemView { range: range.start.min(end)..end, m: self }
  }
}

impl <'a> std::fmt::Display for MemView<'a> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    writeln!(f, "Memory Contents:")?;
    let rows = self.range.clone().step_by(ROW_SIZE);
    for start in rows {
      let end = (start + ROW_SIZE).min(self.range.end);
      write!(f, "Addr {}:", start)?;
      for b in &self.m.data[start..end] {
        write!(f, " {}", b)?;
      }
      writeln!(f)?;
    }
    Ok(())
  }
}

#[test]
fn test_memory_byte() {
  let mut mem = Memory::new(0x40);
  mem.write(5, 42).expect("Failed to write memory correctly");
  assert_eq!(mem.read(5).unwrap(), 42);
  assert_eq!(mem.read(4).unwrap(), 0);
  assert_eq!(mem.as_slice()[5], 42);
}

#[test]
fn test_memory_out_of_bounds() {
  let mut mem = Memory::new(0x10);
  assert!(matches!(mem.read(0x10), Err(SimError::OutOfRange { address: 0x10, size: 0x10 })));
  assert!(mem.write(0x20, 1).is_err());
  assert!(mem.block(0x0c, 8).is_err());
  assert_eq!(mem.block(0x0c, 4).unwrap().len(), 4);
}

#[test]
fn test_view_rows() {
  let mut mem = Memory::new(32);
  mem.write(17, 9).unwrap();
  let dump = mem.view(0..usize::MAX).to_string();
  let lines: Vec<&str> = dump.lines().collect();
  assert_eq!(lines.len(), 3);
  assert_eq!(lines[0], "Memory Contents:");
  assert!(lines[1].starts_with("Addr 0: 0 0"));
  assert_eq!(lines[2], "Addr 16: 0 9 0 0 0 0 0 0 0 0 0 0 0 0 0 0");
}
