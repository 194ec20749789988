//! Simulator invocation.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use shtest_catalog::TestId;
use tracing::{debug, error};

use crate::config::RunConfig;
use crate::error::{Result, TestError};
use crate::workdir::{WorkDirGuard, relative_path};

/// Interval between exit polls while the simulator runs.
const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// How long to wait for pipes to close once the child has exited or been killed.
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// What one simulator invocation produced.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Directory the simulator ran in.
    pub test_dir: PathBuf,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error (diagnostics only, never compared).
    pub stderr: String,
    /// Exit status, `None` if the process was killed on timeout.
    pub status: Option<ExitStatus>,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl ExecutionResult {
    /// Turn timeouts and non-zero exits into failures, yielding stdout otherwise.
    pub fn into_stdout(self, timeout: Duration) -> Result<String> {
        if self.timed_out {
            return Err(TestError::Timeout(timeout));
        }
        match self.status {
            Some(status) if status.success() => Ok(self.stdout),
            Some(status) => Err(TestError::Execution {
                code: status.code(),
                stderr: self.stderr,
            }),
            None => Err(TestError::Execution {
                code: None,
                stderr: self.stderr,
            }),
        }
    }
}

/// Runs the shared simulator inside each test directory.
#[derive(Debug, Clone)]
pub struct Executor {
    root: PathBuf,
    simulator: PathBuf,
    timeout: Duration,
}

impl Executor {
    /// Create an executor; `config.root` should already be absolute.
    pub fn new(config: &RunConfig) -> Self {
        Self {
            root: config.root.clone(),
            simulator: config.simulator_path(),
            timeout: config.timeout,
        }
    }

    /// Absolute simulator location.
    pub fn simulator(&self) -> &Path {
        &self.simulator
    }

    /// Run the simulator for one test.
    ///
    /// The process working directory is switched into the test directory for
    /// the duration of the call and restored before returning.
    pub fn execute(&self, id: &TestId) -> Result<ExecutionResult> {
        let test_dir = self.root.join(id.dir());
        if !test_dir.is_dir() {
            return Err(TestError::environment(format!(
                "test directory not found: {}",
                test_dir.display()
            )));
        }

        let program = relative_path(&self.simulator, &test_dir);
        debug!(test = %id, program = %program.display(), "resolved simulator");

        let guard = WorkDirGuard::enter(&test_dir).map_err(|e| {
            TestError::environment(format!("cannot enter {}: {e}", test_dir.display()))
        })?;

        let mut cmd = Command::new(&program);
        cmd.current_dir(&test_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let result = run_with_timeout(&mut cmd, self.timeout).map_err(|e| {
            error!(test = %id, program = %program.display(), error = %e, "failed to launch simulator");
            TestError::environment(format!(
                "failed to launch simulator {}: {e}",
                program.display()
            ))
        });

        guard.restore().map_err(|e| {
            TestError::environment(format!("cannot restore working directory: {e}"))
        })?;

        let captured = result?;
        debug!(
            test = %id,
            status = ?captured.status,
            timed_out = captured.timed_out,
            stdout_bytes = captured.stdout.len(),
            elapsed = ?captured.elapsed,
            "simulator finished"
        );

        // Only output that will be compared has to be valid text
        let clean = !captured.timed_out && captured.status.is_some_and(|s| s.success());
        let stdout = if clean {
            String::from_utf8(captured.stdout).map_err(|_| {
                TestError::environment("simulator wrote non-UTF-8 data to stdout")
            })?
        } else {
            String::from_utf8_lossy(&captured.stdout).into_owned()
        };

        Ok(ExecutionResult {
            test_dir,
            stdout,
            stderr: String::from_utf8_lossy(&captured.stderr).into_owned(),
            status: captured.status,
            timed_out: captured.timed_out,
            elapsed: captured.elapsed,
        })
    }
}

/// Raw output of a child process.
#[derive(Debug)]
pub struct Captured {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status: Option<ExitStatus>,
    pub timed_out: bool,
    pub elapsed: Duration,
}

/// Spawn `cmd`, wait up to `timeout`, and collect its output.
///
/// The child is killed and reaped when the deadline passes. Output pipes are
/// drained on helper threads so a chatty child cannot block on a full pipe.
/// Pipes still held open by descendants of the child are abandoned rather
/// than waited on, so the deadline bounds the whole call.
pub fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> std::io::Result<Captured> {
    let mut child = cmd.spawn()?;
    let start = Instant::now();
    let deadline = start + timeout;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let (status, mut timed_out) = loop {
        if let Some(status) = child.try_wait()? {
            break (Some(status), false);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            break (None, true);
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    // After a kill only grab what is already buffered
    let pipe_deadline = if timed_out {
        Instant::now() + DRAIN_GRACE
    } else {
        deadline.max(Instant::now() + DRAIN_GRACE)
    };
    let (stdout, stdout_closed) = collect(stdout, pipe_deadline);
    let (stderr, stderr_closed) = collect(stderr, pipe_deadline);
    if !stdout_closed || !stderr_closed {
        debug!("output pipe still open at deadline, abandoning reader");
        timed_out = true;
    }

    Ok(Captured {
        stdout,
        stderr,
        status,
        timed_out,
        elapsed: start.elapsed(),
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// Wait for a drained pipe until `deadline`; the flag is false if it never closed.
fn collect(rx: Option<Receiver<Vec<u8>>>, deadline: Instant) -> (Vec<u8>, bool) {
    let Some(rx) = rx else {
        return (Vec::new(), true);
    };
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(buf) => (buf, true),
        Err(RecvTimeoutError::Disconnected) => (Vec::new(), true),
        Err(RecvTimeoutError::Timeout) => (Vec::new(), false),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_output_and_status() {
        let mut cmd = Command::new("/bin/sh");
        cmd.args(["-c", "printf 'R0=5\\n'; echo oops >&2; exit 3"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let captured = run_with_timeout(&mut cmd, Duration::from_secs(10)).unwrap();
        assert_eq!(captured.stdout, b"R0=5\n");
        assert_eq!(captured.stderr, b"oops\n");
        assert_eq!(captured.status.and_then(|s| s.code()), Some(3));
        assert!(!captured.timed_out);
    }

    #[test]
    fn test_kills_on_timeout() {
        let mut cmd = Command::new("/bin/sh");
        cmd.args(["-c", "exec sleep 5"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let captured = run_with_timeout(&mut cmd, Duration::from_millis(200)).unwrap();
        assert!(captured.timed_out);
        assert!(captured.status.is_none());
        assert!(captured.elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_timeout_not_held_by_grandchild() {
        let mut cmd = Command::new("/bin/sh");
        cmd.args(["-c", "sleep 6; echo x"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let captured = run_with_timeout(&mut cmd, Duration::from_millis(300)).unwrap();
        assert!(captured.timed_out);
        assert!(captured.elapsed < Duration::from_secs(2), "{:?}", captured.elapsed);
    }

    #[test]
    fn test_exited_child_with_lingering_pipe_times_out() {
        let mut cmd = Command::new("/bin/sh");
        cmd.args(["-c", "sleep 6 & echo started"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let captured = run_with_timeout(&mut cmd, Duration::from_millis(300)).unwrap();
        assert!(captured.timed_out);
        assert!(captured.elapsed < Duration::from_secs(2), "{:?}", captured.elapsed);
    }

    #[test]
    fn test_large_output_does_not_block() {
        let mut cmd = Command::new("/bin/sh");
        cmd.args(["-c", "i=0; while [ $i -lt 20000 ]; do echo line$i; i=$((i+1)); done"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let captured = run_with_timeout(&mut cmd, Duration::from_secs(30)).unwrap();
        assert!(!captured.timed_out);
        assert!(captured.stdout.len() > 65536);
    }

    #[test]
    fn test_into_stdout() {
        let mut cmd = Command::new("/bin/sh");
        cmd.args(["-c", "exit 1"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let captured = run_with_timeout(&mut cmd, Duration::from_secs(10)).unwrap();
        let result = ExecutionResult {
            test_dir: PathBuf::new(),
            stdout: String::new(),
            stderr: String::new(),
            status: captured.status,
            timed_out: false,
            elapsed: captured.elapsed,
        };
        let err = result.into_stdout(Duration::from_secs(10)).unwrap_err();
        assert!(matches!(err, TestError::Execution { code: Some(1), .. }));
    }
}
