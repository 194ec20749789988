//! Run configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use shtest_catalog::TestId;

/// Simulator location relative to the suite root.
pub const DEFAULT_SIMULATOR: &str = "../../msim";
/// Per-test wall-clock limit.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// File the simulator (or the stdout fallback) produces.
pub const OUTPUT_FILENAME: &str = "out.txt";
/// Committed golden reference.
pub const EXPECTED_FILENAME: &str = "expected-output.txt";

/// Configuration for a suite run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Suite root; test identifiers are directories below it.
    pub root: PathBuf,
    /// Simulator executable, relative to `root` unless absolute.
    pub simulator: PathBuf,
    /// Timeout for each simulator invocation.
    pub timeout: Duration,
    /// Keep the produced output even when it matches.
    pub keep_output: bool,
    pub output_file: String,
    pub expected_file: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            simulator: PathBuf::from(DEFAULT_SIMULATOR),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            keep_output: false,
            output_file: OUTPUT_FILENAME.to_string(),
            expected_file: EXPECTED_FILENAME.to_string(),
        }
    }
}

impl RunConfig {
    /// Set the suite root.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Set the simulator path.
    #[must_use]
    pub fn with_simulator(mut self, simulator: impl Into<PathBuf>) -> Self {
        self.simulator = simulator.into();
        self
    }

    /// Set timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Set the timeout as a duration.
    #[must_use]
    pub const fn with_timeout_duration(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retain produced output files after a successful comparison.
    #[must_use]
    pub const fn with_keep_output(mut self, keep: bool) -> Self {
        self.keep_output = keep;
        self
    }

    /// Make `root` absolute against `cwd`; the simulator stays relative to it.
    #[must_use]
    pub fn anchored(mut self, cwd: &Path) -> Self {
        self.root = crate::workdir::normalize(&cwd.join(&self.root));
        self
    }

    /// Directory of a test.
    pub fn test_dir(&self, id: &TestId) -> PathBuf {
        self.root.join(id.dir())
    }

    /// Absolute, normalised simulator location.
    pub fn simulator_path(&self) -> PathBuf {
        crate::workdir::normalize(&self.root.join(&self.simulator))
    }
}
