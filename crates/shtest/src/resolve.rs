//! Choosing the actual-output artifact.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// Locate the produced output for a finished test.
///
/// A file written by the simulator itself wins and is left untouched.
/// Otherwise the captured stdout (register dumps and the like) is written
/// verbatim under `output_file` and becomes the artifact.
pub fn resolve_output(test_dir: &Path, stdout: &str, output_file: &str) -> Result<PathBuf> {
    let path = test_dir.join(output_file);
    if path.exists() {
        debug!(path = %path.display(), "using simulator-written output");
        return Ok(path);
    }

    fs::write(&path, stdout)?;
    debug!(path = %path.display(), bytes = stdout.len(), "synthesized output from stdout");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesizes_from_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_output(dir.path(), "R0=5\nR1=10\n", "out.txt").unwrap();
        assert_eq!(path, dir.path().join("out.txt"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "R0=5\nR1=10\n");
    }

    #[test]
    fn test_prefers_simulator_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("out.txt"), "written by msim\r\n").unwrap();
        let path = resolve_output(dir.path(), "ignored stdout\n", "out.txt").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "written by msim\r\n");
    }

    #[test]
    fn test_empty_stdout_still_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_output(dir.path(), "", "out.txt").unwrap();
        assert!(path.is_file());
        assert_eq!(fs::metadata(path).unwrap().len(), 0);
    }
}
