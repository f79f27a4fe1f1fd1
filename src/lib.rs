// Library root
// -----------
// A thin client for a hosted QnA / retrieval service plus the pieces the
// `qna` binary is built from.
//
// Module responsibilities:
// - `api`: endpoint templates, the blocking HTTP client and response
//   classification.
// - `config`: properties-file loading and flag/config precedence.
// - `commands`: the command table (required options, batch input slot,
//   view) and dispatch to `api`.
// - `render` / `views`: generic and per-command response printers.
// - `output`: output formats and sinks.
// - `batch`: single and per-line runners.
// - `ui`: progress feedback on stderr.
// - `logging`: tracing setup.
// - `cli`: clap definitions tying it all together.
pub mod api;
pub mod batch;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod output;
pub mod render;
pub mod ui;
pub mod views;
