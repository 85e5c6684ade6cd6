use std::io::{self, BufReader};
use std::path::PathBuf;
use argh::FromArgs;
use cachesim::{driver, HierarchyConfig, MemoryHierarchy, SimResult};

#[derive(FromArgs)]
/// Interactive L1/L2 cache hierarchy simulator
struct Opts {
  /// JSON hierarchy configuration, defaults to 1KB memory behind 32/128 line caches
  #[argh(option, short = 'c')]
  config: Option<PathBuf>,

  /// logging level written to stderr
  #[argh(option, long = "log-level", default = "log::LevelFilter::Warn")]
  log_level: log::LevelFilter,

  /// fill every missed level once a load resolves
  #[argh(switch, long = "fill-on-read-miss")]
  fill_on_read_miss: bool,

  /// install the block into a level when a store misses it
  #[argh(switch, long = "allocate-on-write-miss")]
  allocate_on_write_miss: bool,

  /// only the first level writes memory and pays the write penalty
  #[argh(switch, long = "single-write-charge")]
  single_write_charge: bool,
}

fn main() -> SimResult<()> {
  let opts: Opts = argh::from_env();

  env_logger::Builder::new()
    .format_timestamp(None)
    .filter_level(opts.log_level)
    .target(env_logger::Target::Stderr)
    .init();

  let mut config = match &opts.config {
    Some(path) => HierarchyConfig::from_file(path)?,
    None => HierarchyConfig::default(),
  };
  config.policy.fill_on_read_miss |= opts.fill_on_read_miss;
  config.policy.allocate_on_write_miss |= opts.allocate_on_write_miss;
  if opts.single_write_charge {
    config.policy.write_per_level = false;
  }

  let mut hierarchy = MemoryHierarchy::new(&config)?;
  let stdin = io::stdin();
  driver::run(&mut hierarchy, BufReader::new(stdin.lock()), &mut io::stdout())
}
