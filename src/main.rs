use std::io::{self, IsTerminal};

use clap::{CommandFactory, Parser, error::ErrorKind};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use mapchurn::{ChurnConfig, StrategyKind};

/// Churns large buffers through mmap or malloc from several threads.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Strategy to exercise: 1 = mmap, 2 = malloc
  #[arg(value_name = "MODE")]
  strategy: StrategyKind,
}

/// Parses the command line, exiting with a usage message on bad input.
/// Value errors get the usage line appended, as missing arguments already do.
fn parse_args() -> Cli {
  match Cli::try_parse() {
    Ok(cli) => cli,
    Err(err) if err.kind() == ErrorKind::ValueValidation => {
      // stderr is the only place left to report a failed write
      err.print().ok();
      eprintln!("\n{}", Cli::command().render_usage());
      std::process::exit(err.exit_code());
    }
    Err(err) => err.exit(),
  }
}

/// Buffers in the serial touched pass. The full 10 000 would keep about 2 GB
/// resident.
const SERIAL_BATCH_COUNT: usize = 1_000;

/// A serial pass that touches every byte, then the concurrent pass.
fn workloads(strategy: StrategyKind) -> [ChurnConfig; 2] {
  [
    ChurnConfig::baseline(strategy).with_batch_count(SERIAL_BATCH_COUNT),
    ChurnConfig::concurrent(strategy),
  ]
}

fn init_tracing() {
  fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_thread_names(true)
    .with_ansi(io::stderr().is_terminal())
    .with_writer(io::stderr)
    .init();
}

fn main() -> anyhow::Result<()> {
  let cli = parse_args();
  init_tracing();

  println!("{}", cli.strategy);

  for config in workloads(cli.strategy) {
    let report = mapchurn::run(&config)?;

    info!(
      workers = config.worker_count,
      touch = config.touch,
      completed = report.completed,
      elapsed_ms = report.elapsed.as_millis() as u64,
      "pass done"
    );
  }

  Ok(())
}
