//! Test environment abstraction for isolated testing.
//!
//! Provides `TestEnvironment` to manage:
//! - One temporary host directory per default virtual volume
//! - Fixture files written under a virtual path
//! - A config pointing its `[mounts]` at those directories
//!
//! # Usage
//!
//! ```ignore
//! use vfhash_config::testing::TestEnvironment;
//!
//! let env = TestEnvironment::new()?;
//! env.write_file("platform:/data/a.bin", b"hello")?;
//! let config = env.config();
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Context;
use tempfile::TempDir;

use crate::{Config, DEFAULT_PREFIXES};

/// Atomic counter for unique test IDs
static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Isolated test environment with one host directory per volume
pub struct TestEnvironment {
    /// Temporary directory (dropped on cleanup)
    _temp_dir: TempDir,
    /// Parent of all volume directories
    pub root: PathBuf,
    /// Unique test ID
    pub test_id: u32,
}

impl TestEnvironment {
    /// Create a new isolated test environment
    pub fn new() -> anyhow::Result<Self> {
        let test_id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join(format!("volumes-{}", test_id));

        for prefix in DEFAULT_PREFIXES {
            std::fs::create_dir_all(root.join(volume_name(prefix)))?;
        }

        Ok(Self {
            _temp_dir: temp_dir,
            root,
            test_id,
        })
    }

    /// Host directory backing a virtual prefix such as `platform:/`
    pub fn volume_dir(&self, prefix: &str) -> PathBuf {
        self.root.join(volume_name(prefix))
    }

    /// Write `data` at the host location of a virtual path, returning the host path
    pub fn write_file(&self, virtual_path: &str, data: &[u8]) -> anyhow::Result<PathBuf> {
        let prefix = DEFAULT_PREFIXES
            .iter()
            .filter(|p| virtual_path.starts_with(**p))
            .max_by_key(|p| p.len())
            .with_context(|| format!("no test volume for {}", virtual_path))?;

        let host = self.volume_dir(prefix).join(&virtual_path[prefix.len()..]);
        if let Some(parent) = host.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&host, data)?;
        Ok(host)
    }

    /// Default config with every volume mounted
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        for prefix in DEFAULT_PREFIXES {
            config
                .mounts
                .insert(prefix.to_string(), self.volume_dir(prefix));
        }
        config
    }

    /// Root of the environment on the host
    pub fn path(&self) -> &Path {
        &self.root
    }
}

/// `platform:/` -> `platform`
fn volume_name(prefix: &str) -> &str {
    prefix.trim_end_matches(":/")
}
