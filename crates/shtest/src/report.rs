//! Status-line reporting.

use std::io::Write;

use console::style;
use shtest_catalog::TestId;

use crate::runner::{Outcome, Reporter, TestResult};

/// Width of the identifier column.
pub const NAME_COLUMN_WIDTH: usize = 45;

/// Writes one aligned status line per executed test.
///
/// ```text
/// test: arithmetics/add                        success
/// test: arithmetics/add_imm                    failure! (Files do not match! ...)
/// ```
pub struct StatusReporter<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> StatusReporter<W> {
    /// Plain (uncoloured) reporter.
    pub const fn new(out: W) -> Self {
        Self { out, color: false }
    }

    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for StatusReporter<W> {
    fn test_started(&mut self, id: &TestId) {
        let label = format!("test: {id}");
        let _ = write!(self.out, "{label:<width$}", width = NAME_COLUMN_WIDTH);
        // The verdict lands on the same line, possibly seconds later
        let _ = self.out.flush();
    }

    fn test_finished(&mut self, result: &TestResult) {
        let line = match &result.outcome {
            Outcome::Pass => "success".to_string(),
            Outcome::Fail(e) => format!("failure! ({e})"),
        };
        let _ = if self.color {
            match result.outcome {
                Outcome::Pass => writeln!(self.out, "{}", style(line).green()),
                Outcome::Fail(_) => writeln!(self.out, "{}", style(line).red().bold()),
            }
        } else {
            writeln!(self.out, "{line}")
        };
        let _ = self.out.flush();
    }
}
