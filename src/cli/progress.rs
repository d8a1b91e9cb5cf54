//! Progress display for the analyze flow.
//!
//! The orchestrator owns the progress value and emits events; this is the
//! rendering side only.

use indicatif::{ProgressBar, ProgressStyle};

use crate::analyze::{AnalyzeEvent, AnalyzeStatus};

/// Terminal progress bar fed by `AnalyzeEvent`s.
#[derive(Clone)]
pub struct AnalyzeProgress {
    bar: ProgressBar,
}

impl AnalyzeProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("  [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .expect("static progress template")
                .progress_chars("=> "),
        );
        bar.set_message(AnalyzeStatus::Idle.label());
        Self { bar }
    }

    /// Apply one orchestrator event to the display.
    pub fn handle(&self, event: &AnalyzeEvent) {
        match event {
            AnalyzeEvent::Progress(value) => self.bar.set_position(*value as u64),
            AnalyzeEvent::Status(status) => {
                self.bar.set_message(status.label());
                if *status == AnalyzeStatus::Done {
                    self.bar.set_position(100);
                }
            }
        }
    }

    /// Tear the bar down, leaving the final status line when done.
    pub fn finish(&self, done: bool) {
        if done {
            self.bar.finish_with_message(AnalyzeStatus::Done.label());
        } else {
            self.bar.finish_and_clear();
        }
    }
}

impl Default for AnalyzeProgress {
    fn default() -> Self {
        Self::new()
    }
}
