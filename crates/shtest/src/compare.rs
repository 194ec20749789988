//! Golden-file comparison.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, TestError};

/// Exact comparison of produced output against the golden reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct Comparator {
    keep_output: bool,
}

impl Comparator {
    pub const fn new(keep_output: bool) -> Self {
        Self { keep_output }
    }

    /// Compare `actual` against `expected` byte for byte.
    ///
    /// On a match the artifact is deleted (unless configured to keep it).
    /// On a mismatch it is left in place for inspection.
    pub fn compare(&self, expected: &Path, actual: &Path) -> Result<()> {
        let golden = read_required(expected, "expected output")?;
        let produced = read_required(actual, "produced output")?;

        if let Some(offset) = first_difference(&golden, &produced) {
            let line = line_of(&produced, offset);
            warn!(
                actual = %actual.display(),
                offset,
                line,
                "output mismatch, keeping artifact"
            );
            return Err(TestError::OutputMismatch {
                expected: expected.to_path_buf(),
                actual: actual.to_path_buf(),
                offset,
                line,
            });
        }

        if self.keep_output {
            debug!(path = %actual.display(), "keeping matched output");
        } else {
            fs::remove_file(actual)?;
            debug!(path = %actual.display(), "removed matched output");
        }
        Ok(())
    }
}

fn read_required(path: &Path, what: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => {
            TestError::environment(format!("{what} not found: {}", path.display()))
        }
        _ => TestError::environment(format!("cannot read {what} {}: {e}", path.display())),
    })
}

/// Offset of the first differing byte, or `None` if the contents are equal.
///
/// When one side is a prefix of the other the offset is the shorter length.
pub fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    if a == b {
        return None;
    }
    Some(
        a.iter()
            .zip(b)
            .position(|(x, y)| x != y)
            .unwrap_or_else(|| a.len().min(b.len())),
    )
}

/// 1-based line number containing byte `offset`.
fn line_of(data: &[u8], offset: usize) -> usize {
    let end = offset.min(data.len());
    data[..end].iter().filter(|&&b| b == b'\n').count() + 1
}
