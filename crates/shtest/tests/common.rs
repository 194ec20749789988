#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use shtest::{Reporter, TestId, TestResult};
use tempfile::TempDir;

/// The working directory is process-global; tests touching it run one at a time.
pub fn cwd_guard() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Fake simulator driven by control files in its working directory:
/// `sleep` hangs, `exitcode` exits with that status, `produce` is copied to
/// `out.txt`, `stdout` is echoed. Every launch appends to `invoked`.
const FAKE_SIMULATOR: &str = r#"#!/bin/sh
echo run >> invoked
if [ -f sleep ]; then exec sleep 30; fi
if [ -f stderr ]; then cat stderr >&2; fi
if [ -f exitcode ]; then exit "$(cat exitcode)"; fi
if [ -f produce ]; then cp produce out.txt; fi
if [ -f stdout ]; then cat stdout; fi
exit 0
"#;

/// Throwaway suite laid out like the real one: `<tmp>/msim` and `<tmp>/tests/shtests/<id>`.
pub struct Suite {
    _dir: TempDir,
    pub root: PathBuf,
    pub simulator: PathBuf,
}

impl Suite {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("tests/shtests");
        fs::create_dir_all(&root).expect("create root");
        let simulator = dir.path().join("msim");
        fs::write(&simulator, FAKE_SIMULATOR).expect("write simulator");
        make_executable(&simulator);
        Self {
            _dir: dir,
            root,
            simulator,
        }
    }

    /// Create a test directory with a golden file.
    pub fn case(&self, id: &str, expected: &str) -> Case {
        let dir = self.root.join(id);
        fs::create_dir_all(&dir).expect("create case dir");
        fs::write(dir.join("expected-output.txt"), expected).expect("write golden");
        Case { dir }
    }

    /// Create a test directory without a golden file.
    pub fn bare_case(&self, id: &str) -> Case {
        let dir = self.root.join(id);
        fs::create_dir_all(&dir).expect("create case dir");
        Case { dir }
    }
}

pub struct Case {
    pub dir: PathBuf,
}

impl Case {
    pub fn prints(self, stdout: &str) -> Self {
        fs::write(self.dir.join("stdout"), stdout).expect("write stdout");
        self
    }

    pub fn writes(self, output: &str) -> Self {
        fs::write(self.dir.join("produce"), output).expect("write produce");
        self
    }

    pub fn exits(self, code: i32, stderr: &str) -> Self {
        fs::write(self.dir.join("exitcode"), code.to_string()).expect("write exitcode");
        fs::write(self.dir.join("stderr"), stderr).expect("write stderr");
        self
    }

    pub fn hangs(self) -> Self {
        fs::write(self.dir.join("sleep"), "").expect("write sleep");
        self
    }

    pub fn output(&self) -> PathBuf {
        self.dir.join("out.txt")
    }

    pub fn invocations(&self) -> usize {
        fs::read_to_string(self.dir.join("invoked"))
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}

/// Reporter that records events for assertions.
#[derive(Default)]
pub struct Recorder {
    pub events: Vec<String>,
}

impl Reporter for Recorder {
    fn test_started(&mut self, id: &TestId) {
        self.events.push(format!("start {id}"));
    }

    fn test_finished(&mut self, result: &TestResult) {
        let verdict = if result.outcome.is_pass() { "pass" } else { "fail" };
        self.events.push(format!("{verdict} {}", result.id));
    }
}

pub fn ids(names: &[&str]) -> shtest::Catalog {
    let ids = names.iter().map(|name| {
        let (category, leaf) = match name.rsplit_once('/') {
            Some((c, l)) => (Some(c), l),
            None => (None, *name),
        };
        TestId::new(category, leaf).expect("valid id")
    });
    shtest::Catalog::from_ids(ids).expect("unique ids")
}
