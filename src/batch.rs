// Runners: one call for a plain invocation, or one call per input line
// with a fixed pause between calls. Responses are rendered according to
// the output format and written to the configured sink.

use crate::api::{ApiError, ServiceResponse};
use crate::commands::{CommandDescriptor, CommandOptions};
use crate::output::{OutputFormat, OutputSink};
use crate::render::{render_response, RenderContext};
use crate::ui::Progress;
use anyhow::{Context, Result};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How a line of an input file is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLine<'a> {
    Comment(&'a str),
    Blank,
    Input(&'a str),
}

impl<'a> InputLine<'a> {
    pub fn classify(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            InputLine::Blank
        } else if trimmed.starts_with('#') {
            InputLine::Comment(trimmed)
        } else {
            InputLine::Input(trimmed)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub calls: usize,
    pub failures: usize,
}

pub struct Runner {
    pub descriptor: &'static CommandDescriptor,
    pub options: CommandOptions,
    pub format: OutputFormat,
    pub sink: OutputSink,
    pub render: RenderContext,
    pub delay: Duration,
}

impl Runner {
    /// Single call with the options as given.
    pub fn run_once<F>(&self, mut call: F) -> Result<ServiceResponse>
    where
        F: FnMut(&CommandOptions) -> Result<ServiceResponse, ApiError>,
    {
        let response = call(&self.options)
            .with_context(|| format!("{} failed", self.descriptor.name))?;
        self.emit(&response)?;
        Ok(response)
    }

    /// One call per input line in order. Comment lines are echoed, blank
    /// lines skipped. A transport error stops the run; a non-200 response is
    /// reported and the run continues.
    pub fn run_batch<F>(&self, text: &str, mut call: F) -> Result<BatchSummary>
    where
        F: FnMut(&CommandOptions) -> Result<ServiceResponse, ApiError>,
    {
        let lines: Vec<InputLine<'_>> = text.lines().map(InputLine::classify).collect();
        let total = lines
            .iter()
            .filter(|line| matches!(line, InputLine::Input(_)))
            .count();
        let wrap_json = self.format == OutputFormat::Json && self.sink.is_file();
        info!(total = total as u64, delay_secs = self.delay.as_secs_f64(), "starting batch");

        let progress = Progress::start(total, self.delay);
        if wrap_json {
            self.sink.write("[\n")?;
        }

        let mut summary = BatchSummary::default();
        for line in lines {
            let input = match line {
                InputLine::Comment(comment) => {
                    progress.comment(comment);
                    continue;
                }
                InputLine::Blank => continue,
                InputLine::Input(input) => input,
            };
            if summary.calls > 0 {
                debug!(delay_ms = self.delay.as_millis() as u64, "pausing between calls");
                thread::sleep(self.delay);
            }
            summary.calls += 1;
            progress.begin(summary.calls, input);

            let started = Instant::now();
            let options = self.descriptor.with_input(&self.options, input);
            let response = call(&options)
                .with_context(|| format!("{} failed for input `{input}`", self.descriptor.name))?;
            progress.done(summary.calls, input, started.elapsed());
            if !response.has_payload() {
                summary.failures += 1;
                warn!(input, status = response.raw().status.as_u16(), "call did not succeed");
            }
            if wrap_json && summary.calls > 1 {
                self.sink.write(",\n")?;
            }
            self.emit(&response)?;
        }

        if wrap_json {
            self.sink.write("]\n")?;
        }
        progress.finish();
        info!(
            calls = summary.calls as u64,
            failures = summary.failures as u64,
            "batch finished"
        );
        Ok(summary)
    }

    fn emit(&self, response: &ServiceResponse) -> Result<()> {
        if self.format == OutputFormat::Silent {
            return Ok(());
        }
        let text = if self.format.is_console() {
            render_response(
                response,
                self.descriptor.view,
                &self.descriptor.view_options(&self.options),
                &self.render,
            )?
        } else {
            response.raw().body.clone()
        };
        self.sink.write(&text)
    }
}
