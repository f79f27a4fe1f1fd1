// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, hand off to `cli::run`.
// - Returns `anyhow::Result` so any uncaught error is printed with its
//   causes and the process exits non-zero.

use clap::Parser;
use qna_cli::{cli, logging};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    logging::init_tracing(args.common.debug)?;
    cli::run(args)
}
