//! Ordered catalog of instruction conformance tests.
//!
//! The catalog is a manifest of `[[group]]` tables, each naming an optional
//! category directory and the tests inside it. Declaration order is execution
//! order: it decides both the reporting order and where a fail-fast run stops.
//!
//! The default manifest is embedded at compile time:
//!
//! ```toml
//! [[group]]
//! tests = ["simple"]
//!
//! [[group]]
//! category = "arithmetics"
//! tests = ["add", "add_imm"]
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Manifest shipped with the suite.
const BUILTIN_MANIFEST: &str = include_str!("../catalog.toml");

/// Catalog errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid manifest: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duplicate test identifier: {0}")]
    Duplicate(String),
    #[error("empty test name")]
    EmptyName,
    #[error("test name '{0}' must not contain '/' (use the group category)")]
    NestedName(String),
    #[error("test name '{0}' must be a plain directory name")]
    InvalidName(String),
    #[error("category '{0}' must be a relative path of plain directory names")]
    InvalidCategory(String),
    #[error("group {index}: {source}")]
    Group {
        index: usize,
        source: Box<CatalogError>,
    },
}

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default, rename = "group")]
    groups: Vec<Group>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Group {
    #[serde(default)]
    category: Option<String>,
    tests: Vec<String>,
}

/// Hierarchical test identifier (`category/name`, or just `name`).
///
/// The identifier doubles as the test directory relative to the suite root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestId {
    category: Option<String>,
    name: String,
}

impl TestId {
    /// Create an identifier, validating both parts.
    pub fn new(category: Option<&str>, name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if name.contains('/') {
            return Err(CatalogError::NestedName(name.to_string()));
        }
        if !is_plain_segment(name) {
            return Err(CatalogError::InvalidName(name.to_string()));
        }
        let category = match category {
            None => None,
            Some(c) => {
                if !c.split('/').all(is_plain_segment) {
                    return Err(CatalogError::InvalidCategory(c.to_string()));
                }
                Some(c.to_string())
            }
        };
        Ok(Self {
            category,
            name: name.to_string(),
        })
    }

    /// Category prefix, if any (e.g. `fpu/single_precision`).
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Leaf test name (e.g. `fadd`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory of this test relative to the suite root.
    pub fn dir(&self) -> PathBuf {
        let mut path = PathBuf::new();
        if let Some(category) = &self.category {
            path.push(category);
        }
        path.push(&self.name);
        path
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.category {
            Some(category) => write!(f, "{category}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A single directory name: non-empty, not `.`/`..`, no separators or
/// surrounding whitespace.
fn is_plain_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(components.next(), Some(Component::Normal(c)) if c == segment)
        && components.next().is_none()
        && segment.trim() == segment
}

/// Ordered, duplicate-free list of tests.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tests: Vec<TestId>,
}

impl Catalog {
    /// The catalog embedded in the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_MANIFEST)
    }

    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse a manifest.
    pub fn from_toml(text: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(text)?;
        let mut seen = HashSet::new();
        let mut tests = Vec::new();

        for (index, group) in manifest.groups.iter().enumerate() {
            for name in &group.tests {
                let id = TestId::new(group.category.as_deref(), name).map_err(|e| {
                    CatalogError::Group {
                        index: index + 1,
                        source: Box::new(e),
                    }
                })?;
                if !seen.insert(id.clone()) {
                    return Err(CatalogError::Duplicate(id.to_string()));
                }
                tests.push(id);
            }
        }

        Ok(Self { tests })
    }

    /// Build a catalog from already-validated identifiers.
    pub fn from_ids(ids: impl IntoIterator<Item = TestId>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut tests = Vec::new();
        for id in ids {
            if !seen.insert(id.clone()) {
                return Err(CatalogError::Duplicate(id.to_string()));
            }
            tests.push(id);
        }
        Ok(Self { tests })
    }

    /// Iterate tests in declared order.
    pub fn iter(&self) -> std::slice::Iter<'_, TestId> {
        self.tests.iter()
    }

    /// All identifiers in declared order.
    pub fn ids(&self) -> &[TestId] {
        &self.tests
    }

    /// Keep only tests whose identifier contains `pattern`, preserving order.
    #[must_use]
    pub fn filter(&self, pattern: &str) -> Self {
        Self {
            tests: self
                .tests
                .iter()
                .filter(|id| id.to_string().contains(pattern))
                .cloned()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a TestId;
    type IntoIter = std::slice::Iter<'a, TestId>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
