//! Test run identity and the on-disk layout derived from it.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Checks that `value` can be used as a single path component.
///
/// Every result file must land under exactly one `test_id/phase/device`
/// directory, so none of those names may contain a separator or climb up
/// the tree. Device names are also handed to `ssh` and `scp` as arguments
/// and must not be mistaken for options.
fn validate_name(kind: &'static str, value: &str) -> Result<()> {
    let reason = if value.is_empty() {
        Some("must not be empty")
    } else if value == "." || value == ".." {
        Some("must not be a relative directory reference")
    } else if value.contains('/') || value.contains('\\') {
        Some("must not contain a path separator")
    } else if value.starts_with('-') {
        Some("must not start with '-'")
    } else if value.contains('\0') {
        Some("must not contain a NUL byte")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidName {
            kind,
            value: value.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// One invocation of the gatherer: a test identifier plus the phase the
/// output belongs to (e.g. `pre`, `during`, `post`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRun {
    /// Test identifier, e.g. `1.1.1-bgp-failover`.
    pub test_id: String,
    /// Free-form phase label.
    pub phase: String,
}

impl TestRun {
    /// Create a new test run, validating both names.
    pub fn new(test_id: impl Into<String>, phase: impl Into<String>) -> Result<Self> {
        let test_id = test_id.into();
        let phase = phase.into();
        validate_name("test id", &test_id)?;
        validate_name("phase", &phase)?;
        Ok(Self { test_id, phase })
    }

    /// `<root>/<test_id>`, the tree that gets archived.
    pub fn test_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.test_id)
    }

    /// `<root>/<test_id>/<phase>`.
    pub fn phase_dir(&self, root: &Path) -> PathBuf {
        self.test_dir(root).join(&self.phase)
    }

    /// `<root>/<test_id>/<phase>/<device>`.
    pub fn device_dir(&self, root: &Path, device: &DeviceTarget) -> PathBuf {
        self.phase_dir(root).join(device.as_str())
    }

    /// `<root>/<test_id>.tgz`.
    pub fn archive_path(&self, root: &Path) -> PathBuf {
        root.join(format!("{}.tgz", self.test_id))
    }
}

impl fmt::Display for TestRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.test_id, self.phase)
    }
}

/// A device hostname or address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceTarget(String);

impl DeviceTarget {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        validate_name("device", &value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the contents of a device list file, one device per line.
    ///
    /// Lines are used as written apart from surrounding whitespace, there is
    /// no comment syntax. Blank lines are skipped.
    pub fn parse_list(contents: &str) -> Result<Vec<Self>> {
        contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(DeviceTarget::new)
            .collect()
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
