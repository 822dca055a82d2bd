use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod build_dir;
mod cli;
mod dispatch;
mod error;
mod external;
mod files;
mod flags;
mod segregate;
mod settings;
mod toolchain;
mod util;

use crate::cli::parse_args;
use crate::external::ExternalToolchain;

fn init_tracing(quiet: bool) {
  let default = if quiet { "warn" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .with_target(false)
    .try_init();
}

fn main() -> Result<()> {
  let args: Vec<String> = std::env::args().skip(1).collect();

  init_tracing(args.iter().any(|a| a == "--quiet"));

  // Phase 1: interpret the command line; bad values abort here, before any side effect
  let opts = parse_args(&args)?;

  // Phase 2: dispatch against the external toolchain
  let toolchain = ExternalToolchain::from_env();
  let stdout = std::io::stdout();
  let mut out = stdout.lock();
  let outcome = dispatch::run(&opts, &toolchain, &mut out)?;
  tracing::debug!("done: {:?}", outcome);
  Ok(())
}
