//! Process working-directory handling.
//!
//! The current directory is process-global, so tests are evaluated strictly
//! one at a time and every switch goes through [`WorkDirGuard`].

use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, error};

/// Scoped change of the process working directory.
///
/// The previous directory is restored when the guard is dropped, including
/// on early returns and panics.
pub struct WorkDirGuard {
    previous: PathBuf,
    restored: bool,
}

impl WorkDirGuard {
    /// Switch into `dir`, remembering the directory currently in effect.
    pub fn enter(dir: &Path) -> io::Result<Self> {
        let previous = std::env::current_dir()?;
        std::env::set_current_dir(dir)?;
        debug!(from = %previous.display(), to = %dir.display(), "entered test directory");
        Ok(Self {
            previous,
            restored: false,
        })
    }

    /// Restore the previous directory now, reporting failure to the caller.
    pub fn restore(mut self) -> io::Result<()> {
        self.restored = true;
        std::env::set_current_dir(&self.previous)
    }
}

impl Drop for WorkDirGuard {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            error!(dir = %self.previous.display(), error = %e, "failed to restore working directory");
        }
    }
}

/// Lexically resolve `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_) | Component::ParentDir)
                );
                if at_root {
                    // `/..` is `/`; a leading `..` on a relative path must be kept
                    if !out.has_root() {
                        out.push("..");
                    }
                } else {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Express `target` relative to `base`.
///
/// Both paths are normalised lexically; they should be absolute (or both
/// relative to the same directory). The result always contains a separator so
/// that it is never looked up on `PATH` when used as a program name.
pub fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target = normalize(target);
    let base = normalize(base);

    let target_parts: Vec<Component<'_>> = target.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();
    let common = target_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base_parts.len() {
        out.push("..");
    }
    for part in &target_parts[common..] {
        out.push(part.as_os_str());
    }

    match out.components().count() {
        0 => PathBuf::from("."),
        1 if !out.starts_with("..") => Path::new(".").join(out),
        _ => out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("../x/../y")), PathBuf::from("../y"));
        assert_eq!(normalize(Path::new("a/../..")), PathBuf::from(".."));
    }

    #[test]
    fn test_relative_path_by_depth() {
        let sim = Path::new("/repo/msim");
        assert_eq!(
            relative_path(sim, Path::new("/repo/tests/shtests/simple")),
            PathBuf::from("../../../msim")
        );
        assert_eq!(
            relative_path(sim, Path::new("/repo/tests/shtests/arithmetics/add")),
            PathBuf::from("../../../../msim")
        );
        assert_eq!(
            relative_path(
                Path::new("/repo/tests/shtests/../../msim"),
                Path::new("/repo/tests/shtests/fpu/single_precision/fadd")
            ),
            PathBuf::from("../../../../../msim")
        );
    }

    #[test]
    fn test_relative_path_inside_base() {
        assert_eq!(
            relative_path(Path::new("/t/case/sim"), Path::new("/t/case")),
            PathBuf::from("./sim")
        );
        assert_eq!(
            relative_path(Path::new("/t/case/bin/sim"), Path::new("/t/case")),
            PathBuf::from("bin/sim")
        );
        assert_eq!(
            relative_path(Path::new("/t/case"), Path::new("/t/case")),
            PathBuf::from(".")
        );
    }
}
