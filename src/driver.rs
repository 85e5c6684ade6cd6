//! Interactive menu over a [MemoryHierarchy].
use std::collections::VecDeque;
use std::io::{BufRead, Lines, Write};
use num::ToPrimitive;
use crate::error::{SimError, SimResult};
use crate::hierarchy::MemoryHierarchy;

const MENU: &str = "\n1. Read Memory\n2. Write Memory\n3. Display Memory\n4. Exit\n5. Cache Statistics\n6. Inspect Cache Line\nChoose an option: ";

/// Whitespace separated tokens, possibly several per line.
struct Tokens<R: BufRead> {
  lines: Lines<R>,
  pending: VecDeque<String>,
}

impl <R: BufRead> Tokens<R> {
  fn new(input: R) -> Self { Tokens { lines: input.lines(), pending: VecDeque::new() } }
  fn next(&mut self) -> SimResult<Option<String>> {
    while self.pending.is_empty() {
      match self.lines.next() {
        Some(line) => self.pending.extend(line?.split_whitespace().map(String::from)),
        None => return Ok(None),
      }
    }
    Ok(self.pending.pop_front())
  }
  fn discard_line(&mut self) { self.pending.clear() }
}

enum Input<T> {
  Value(T),
  Rejected(String),
  Eof,
}

fn number<R: BufRead>(tokens: &mut Tokens<R>) -> SimResult<Input<i64>> {
  Ok(match tokens.next()? {
    None => Input::Eof,
    Some(t) => match t.parse::<i64>() {
      Ok(n) => Input::Value(n),
      Err(_) => Input::Rejected(format!("Invalid number: {}", t)),
    },
  })
}

fn address<R: BufRead>(tokens: &mut Tokens<R>) -> SimResult<Input<usize>> {
  Ok(match number(tokens)? {
    Input::Value(n) => match n.to_usize() {
      Some(a) => Input::Value(a),
      None => Input::Rejected(format!("Invalid address: {}", n)),
    },
    Input::Rejected(m) => Input::Rejected(m),
    Input::Eof => Input::Eof,
  })
}

fn byte<R: BufRead>(tokens: &mut Tokens<R>) -> SimResult<Input<u8>> {
  Ok(match number(tokens)? {
    Input::Value(n) => match n.to_u8() {
      Some(v) => Input::Value(v),
      None => Input::Rejected(format!("Value must be between 0 and 255, got {}", n)),
    },
    Input::Rejected(m) => Input::Rejected(m),
    Input::Eof => Input::Eof,
  })
}

macro_rules! take {
  ($tokens:ident, $out:ident, $parse:ident) => {
    match $parse(&mut $tokens)? {
      Input::Value(v) => v,
      Input::Rejected(msg) => {
        writeln!($out, "{}", msg)?;
        $tokens.discard_line();
        continue;
      },
      Input::Eof => return Ok(()),
    }
  };
}

/// Runs the menu until the user exits or the input ends. Out of range
/// accesses are reported and the loop continues; I/O errors end it.
pub fn run<R: BufRead, W: Write>(h: &mut MemoryHierarchy, input: R, out: &mut W) -> SimResult<()> {
  let mut tokens = Tokens::new(input);
  loop {
    write!(out, "{}", MENU)?;
    out.flush()?;
    let choice = match tokens.next()? {
      Some(c) => c,
      None => return Ok(()),
    };
    match choice.as_str() {
      "1" => {
        write!(out, "Enter address to read: ")?;
        out.flush()?;
        let addr = take!(tokens, out, address);
        match h.load(addr) {
          Ok(a) => writeln!(out, "Value: {}, Cycles: {}", a.value, a.cycles)?,
          Err(e) => report(out, e)?,
        }
      },
      "2" => {
        write!(out, "Enter address and value to write: ")?;
        out.flush()?;
        let addr = take!(tokens, out, address);
        let value = take!(tokens, out, byte);
        match h.store(addr, value) {
          Ok(cycles) => writeln!(out, "Stored {} at {}, Cycles: {}", value, addr, cycles)?,
          Err(e) => report(out, e)?,
        }
      },
      "3" => write!(out, "{}", h.dump())?,
      "4" => return Ok(()),
      "5" => {
        for (name, s) in h.stats() {
          writeln!(out, "{}: load {}/{} store {}/{} (hit/miss), hit rate {:.2}",
            name, s.load_hits, s.load_misses, s.store_hits, s.store_misses, s.hit_rate())?;
        }
        writeln!(out, "Loads: {}, Stores: {}, Total cycles: {}", h.loads(), h.stores(), h.total_cycles())?;
      },
      "6" => {
        write!(out, "Enter level and line index: ")?;
        out.flush()?;
        let level = take!(tokens, out, address);
        let index = take!(tokens, out, address);
        match h.level(level) {
          Some(l) => match l.line(index) {
            Some(line) => writeln!(out, "{} line {}: {}", l.name(), index, line)?,
            None => writeln!(out, "{} has only {} lines", l.name(), l.capacity())?,
          },
          None => writeln!(out, "No cache level {} (have {})", level, h.levels().len())?,
        }
      },
      _ => {
        tokens.discard_line();
        writeln!(out, "Invalid choice. Try again.")?;
      },
    }
  }
}

fn report<W: Write>(out: &mut W, e: SimError) -> SimResult<()> {
  log::warn!("{}", e);
  writeln!(out, "Error: {}", e)?;
  Ok(())
}
