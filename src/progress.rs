//! Progress callbacks for long insert and traversal loops.
//!
//! Loops call [`ProgressReporter::report`] once per unit of work; reporters
//! decide for themselves whether the unit lands on a ~1% boundary.

use std::fmt;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

/// Callback invoked after every completed unit of work.
pub trait ProgressReporter {
    /// `current` is the zero-based index of the unit just finished.
    fn report(&mut self, current: u64, total: u64, start: Instant);

    /// Shows a status line ahead of a phase. Returns whether it was shown.
    fn announce(&mut self, _message: &str) -> bool {
        false
    }
}

impl<P: ProgressReporter + ?Sized> ProgressReporter for &mut P {
    fn report(&mut self, current: u64, total: u64, start: Instant) {
        (**self).report(current, total, start)
    }

    fn announce(&mut self, message: &str) -> bool {
        (**self).announce(message)
    }
}

impl<P: ProgressReporter + ?Sized> ProgressReporter for Box<P> {
    fn report(&mut self, current: u64, total: u64, start: Instant) {
        (**self).report(current, total, start)
    }

    fn announce(&mut self, message: &str) -> bool {
        (**self).announce(message)
    }
}

/// Percentage to print when `current` sits on a ~1% boundary of `total`.
///
/// The boundary test is `(current + 1) % (total / 100) == 0`. With fewer than
/// 100 units the step is zero and nothing ever qualifies, so small runs stay
/// silent.
pub fn percent_boundary(current: u64, total: u64) -> Option<u64> {
    let step = total / 100;
    match (current + 1).checked_rem(step) {
        Some(0) => Some(current * 100 / total + 1),
        _ => None,
    }
}

/// Prints `N% -- S s` lines to stdout.
#[derive(Debug, Default)]
pub struct LineProgress;

impl ProgressReporter for LineProgress {
    fn report(&mut self, current: u64, total: u64, start: Instant) {
        if let Some(percent) = percent_boundary(current, total) {
            println!("{percent}% -- {}s", start.elapsed().as_secs_f64());
        }
    }

    fn announce(&mut self, message: &str) -> bool {
        println!("{message}");
        true
    }
}

/// Drives an indicatif bar, touching it only on ~1% boundaries.
pub struct BarProgress {
    bar: Option<ProgressBar>,
    label: String,
}

impl fmt::Debug for BarProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BarProgress")
            .field("label", &self.label)
            .field("started", &self.bar.is_some())
            .finish()
    }
}

impl BarProgress {
    /// Creates a bar that appears on the first report.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            bar: None,
            label: label.into(),
        }
    }

    fn bar(&mut self, total: u64) -> &ProgressBar {
        let label = &self.label;
        self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(100);
            if let Ok(style) =
                ProgressStyle::with_template("{prefix} [{bar:40}] {pos:>3}% {msg}")
            {
                bar.set_style(style.progress_chars("=> "));
            }
            bar.set_prefix(label.clone());
            bar.set_message(format!("of {total}"));
            bar
        })
    }
}

impl ProgressReporter for BarProgress {
    fn report(&mut self, current: u64, total: u64, start: Instant) {
        let Some(percent) = percent_boundary(current, total) else {
            return;
        };
        let bar = self.bar(total);
        bar.set_position(percent.min(100));
        if percent >= 100 {
            bar.finish_with_message(format!("{:.3}s", start.elapsed().as_secs_f64()));
        }
    }

    fn announce(&mut self, message: &str) -> bool {
        match &self.bar {
            Some(bar) => bar.println(message),
            None => println!("{message}"),
        }
        true
    }
}

impl Drop for BarProgress {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
    }
}

/// Swallows every report.
#[derive(Debug, Default)]
pub struct Silent;

impl ProgressReporter for Silent {
    fn report(&mut self, _current: u64, _total: u64, _start: Instant) {}
}
