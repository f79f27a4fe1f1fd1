// Where rendered responses go: stdout, or an output file that is truncated
// once and then appended to.

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Colored text when writing to a terminal
    #[default]
    Console,
    /// Text without ANSI styles
    ConsolePlain,
    /// Raw response body
    Json,
    /// Discard responses
    #[value(name = "none")]
    Silent,
}

impl OutputFormat {
    pub fn is_console(self) -> bool {
        matches!(self, OutputFormat::Console | OutputFormat::ConsolePlain)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    Stdout,
    File(PathBuf),
}

impl OutputSink {
    /// Prepare a file sink: create parent directories and empty the file,
    /// since every later write appends.
    pub fn file(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Output file cannot be written: {}", path.display()))?;
        }
        fs::write(path, "")
            .with_context(|| format!("Output file cannot be written: {}", path.display()))?;
        Ok(OutputSink::File(path.to_path_buf()))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, OutputSink::File(_))
    }

    /// Stdout gets a newline after `text`; a file gets `text` verbatim.
    pub fn write(&self, text: &str) -> Result<()> {
        match self {
            OutputSink::Stdout => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{text}").context("Failed to write to stdout")?;
            }
            OutputSink::File(path) => {
                let mut file = OpenOptions::new()
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open output file {}", path.display()))?;
                file.write_all(text.as_bytes())
                    .with_context(|| format!("Failed to write output file {}", path.display()))?;
            }
        }
        Ok(())
    }
}
