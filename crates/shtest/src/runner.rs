//! Suite orchestration.
//!
//! Tests run strictly in catalog order, one at a time. The first failure of
//! any kind stops the run; tests after it are neither executed nor reported.

use std::panic::{self, AssertUnwindSafe};

use shtest_catalog::{Catalog, TestId};
use tracing::info;

use crate::compare::Comparator;
use crate::config::RunConfig;
use crate::error::{Result, TestError, TestState};
use crate::executor::Executor;
use crate::resolve::resolve_output;

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

/// Result of a single test.
#[derive(Debug)]
pub enum Outcome {
    Pass,
    Fail(TestError),
}

impl Outcome {
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Terminal failure state, `None` for a pass.
    pub const fn state(&self) -> Option<TestState> {
        match self {
            Self::Pass => None,
            Self::Fail(e) => Some(e.state()),
        }
    }
}

impl From<Result<()>> for Outcome {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::Pass,
            Err(e) => Self::Fail(e),
        }
    }
}

/// Result of running a single test.
#[derive(Debug)]
pub struct TestResult {
    pub id: TestId,
    pub outcome: Outcome,
}

/// Receives progress as the run advances.
pub trait Reporter {
    /// Called before the simulator is launched.
    fn test_started(&mut self, id: &TestId);
    /// Called once the outcome is known.
    fn test_finished(&mut self, result: &TestResult);
}

/// Summary of a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Tests in the catalog.
    pub total: usize,
    /// Tests that passed before the run stopped.
    pub passed: usize,
    /// The failure that aborted the run, if any.
    pub failure: Option<TestResult>,
}

impl RunSummary {
    pub const fn all_passed(&self) -> bool {
        self.failure.is_none()
    }

    /// Tests that were never executed because of fail-fast.
    pub const fn skipped(&self) -> usize {
        let executed = self.passed + if self.failure.is_some() { 1 } else { 0 };
        self.total.saturating_sub(executed)
    }

    pub const fn exit_code(&self) -> i32 {
        if self.all_passed() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }
}

/// Drives the catalog through execute → resolve → compare.
pub struct Runner {
    config: RunConfig,
    executor: Executor,
    comparator: Comparator,
}

impl Runner {
    /// Create a runner, anchoring a relative root at the current directory.
    pub fn new(config: RunConfig) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let config = config.anchored(&cwd);
        Ok(Self {
            executor: Executor::new(&config),
            comparator: Comparator::new(config.keep_output),
            config,
        })
    }

    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    pub const fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Run the whole catalog, stopping at the first failure.
    pub fn run(&self, catalog: &Catalog, reporter: &mut dyn Reporter) -> RunSummary {
        let mut summary = RunSummary {
            total: catalog.len(),
            ..RunSummary::default()
        };

        for id in catalog {
            reporter.test_started(id);
            let result = self.run_test(id);
            reporter.test_finished(&result);

            if result.outcome.is_pass() {
                summary.passed += 1;
                continue;
            }
            if let Outcome::Fail(e) = &result.outcome {
                info!(test = %id, state = ?e.state(), error = %e, "test failed, aborting run");
            }
            summary.failure = Some(result);
            break;
        }

        if summary.all_passed() {
            info!(passed = summary.passed, "all tests passed");
        } else {
            info!(
                passed = summary.passed,
                skipped = summary.skipped(),
                "run aborted"
            );
        }
        summary
    }

    /// Run one test, converting every failure (including panics) to an outcome.
    pub fn run_test(&self, id: &TestId) -> TestResult {
        let outcome: Outcome = panic::catch_unwind(AssertUnwindSafe(|| self.evaluate(id)))
            .unwrap_or_else(|payload| Err(TestError::Internal(panic_message(&*payload))))
            .into();
        TestResult {
            id: id.clone(),
            outcome,
        }
    }

    fn evaluate(&self, id: &TestId) -> Result<()> {
        let execution = self.executor.execute(id)?;
        let test_dir = execution.test_dir.clone();
        let stdout = execution.into_stdout(self.config.timeout)?;
        let actual = resolve_output(&test_dir, &stdout, &self.config.output_file)?;
        self.comparator
            .compare(&test_dir.join(&self.config.expected_file), &actual)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string())
}
