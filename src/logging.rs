// Tracing setup. Diagnostics go to stderr so they never mix with rendered
// responses on stdout.
//
//   qna --debug ...             # debug level for this crate
//   RUST_LOG=qna_cli=trace qna  # fine-grained control, wins over --debug

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

pub fn init_tracing(debug: bool) -> Result<()> {
    let default = if debug { "qna_cli=debug,qna=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
