// UI layer: progress feedback for batch runs. Everything here goes to
// stderr so stdout only ever carries rendered responses. When stderr is a
// terminal an `indicatif` bar tracks the run; otherwise plain lines are
// printed.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

pub struct Progress {
    bar: Option<ProgressBar>,
    total: usize,
}

impl Progress {
    /// Announce a batch of `total` calls.
    pub fn start(total: usize, delay: Duration) -> Self {
        let bar = std::io::stderr().is_terminal().then(|| {
            let bar = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}") {
                bar.set_style(style);
            }
            bar
        });
        let progress = Progress { bar, total };
        progress.println(&format!(
            "Running {total} commands. Delay between commands : {} secs",
            delay.as_secs_f64()
        ));
        progress
    }

    fn println(&self, msg: &str) {
        match &self.bar {
            Some(bar) => bar.println(msg),
            None => eprintln!("{msg}"),
        }
    }

    /// Echo a comment line from the input file.
    pub fn comment(&self, line: &str) {
        self.println(line);
    }

    pub fn begin(&self, index: usize, input: &str) {
        match &self.bar {
            Some(bar) => {
                bar.set_message(input.to_string());
                bar.enable_steady_tick(Duration::from_millis(100));
            }
            None => eprint!("Running command {index}/{} :: {input}", self.total),
        }
    }

    pub fn done(&self, index: usize, input: &str, elapsed: Duration) {
        let took = elapsed.as_millis();
        match &self.bar {
            Some(bar) => {
                bar.inc(1);
                bar.println(format!(
                    "Running command {index}/{} :: {input}... Done. Took {took} msecs",
                    self.total
                ));
            }
            None => eprintln!("... Done. Took {took} msecs"),
        }
    }

    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
