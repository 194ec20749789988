//! Golden-output conformance runner for the msim SH-2E simulator.
//!
//! Each catalog entry names a test directory holding `expected-output.txt`.
//! The runner launches the shared simulator inside that directory, takes the
//! output it wrote (or its captured stdout), and compares it byte for byte
//! against the golden file. The first failure aborts the run.
//!
//! # Example
//!
//! ```ignore
//! use shtest::{Catalog, RunConfig, Runner, StatusReporter};
//!
//! let runner = Runner::new(RunConfig::default().with_root("tests/shtests"))?;
//! let mut reporter = StatusReporter::new(std::io::stdout());
//! let summary = runner.run(&Catalog::builtin()?, &mut reporter);
//! std::process::exit(summary.exit_code());
//! ```

pub mod compare;
pub mod config;
pub mod error;
pub mod executor;
pub mod report;
pub mod resolve;
pub mod runner;
pub mod workdir;

pub use compare::Comparator;
pub use config::{
    DEFAULT_SIMULATOR, DEFAULT_TIMEOUT_SECS, EXPECTED_FILENAME, OUTPUT_FILENAME, RunConfig,
};
pub use error::{Result, TestError, TestState};
pub use executor::{ExecutionResult, Executor};
pub use report::StatusReporter;
pub use resolve::resolve_output;
pub use runner::{EXIT_FAILURE, EXIT_SUCCESS, Outcome, Reporter, RunSummary, Runner, TestResult};
pub use shtest_catalog::{Catalog, CatalogError, TestId};
pub use workdir::WorkDirGuard;
