//! Core configuration types for netgather.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::prelude::*;
use crate::ssh::{SshConfig, SshUserConfig};

/// Directory holding one command file per output group.
pub const DEFAULT_COMMANDS_DIR: &str = "output_commands";
/// File listing the remote logs to copy off every device.
pub const DEFAULT_MANIFEST: &str = "scp.txt";
/// Remote directory the manifest entries are relative to.
pub const DEFAULT_REMOTE_LOG_DIR: &str = "/var/log/";
/// Lines starting with this character are ignored in command files and in the manifest.
pub const DEFAULT_COMMENT_MARKER: char = '#';
/// Width of the `=` separator written before every command in a result file.
pub const SEPARATOR_WIDTH: usize = 100;

/// User-provided configuration, usually loaded from a TOML file.
///
/// Every field is optional so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatherUserConfig {
    /// Login used for every device.
    pub user: Option<String>,
    /// Directory under which `test_id/` is created.
    pub output_root: Option<PathBuf>,
    /// Directory of command files.
    pub commands_dir: Option<PathBuf>,
    /// Transfer manifest path.
    pub manifest: Option<PathBuf>,
    /// Base directory of the manifest entries on the device.
    pub remote_log_dir: Option<String>,
    /// Comment marker for command files and the manifest. Must be one character.
    pub comment_marker: Option<String>,
    /// Separator line written before every command in a result file.
    pub separator: Option<String>,
    /// Stop the whole run on the first failing device.
    pub fail_fast: Option<bool>,
    /// SSH transport settings.
    #[serde(default)]
    pub ssh: SshUserConfig,
}

impl GatherUserConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(file_path: &Path) -> Result<Self> {
        debug!("Loading configuration from {:?}", file_path);
        let contents = std::fs::read_to_string(file_path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(value: &str) -> Result<Self> {
        Ok(toml::from_str(value)?)
    }
}

/// Resolved configuration passed explicitly to the run orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatherConfig {
    /// Login used for every device. `None` lets the SSH client pick (ssh config or local user).
    pub user: Option<String>,
    pub output_root: PathBuf,
    pub commands_dir: PathBuf,
    pub manifest: PathBuf,
    pub remote_log_dir: String,
    pub comment_marker: char,
    pub separator: String,
    pub fail_fast: bool,
    pub ssh: SshConfig,
}

impl GatherConfig {
    /// Convert user configuration to the resolved configuration, applying defaults.
    pub fn from_user_config(config: GatherUserConfig) -> Result<Self> {
        let comment_marker = match config.comment_marker {
            Some(marker) => {
                let mut chars = marker.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => return Err(Error::InvalidCommentMarker(marker)),
                }
            }
            None => DEFAULT_COMMENT_MARKER,
        };

        Ok(Self {
            user: config.user,
            output_root: config.output_root.unwrap_or_else(|| PathBuf::from(".")),
            commands_dir: config
                .commands_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COMMANDS_DIR)),
            manifest: config
                .manifest
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST)),
            remote_log_dir: config
                .remote_log_dir
                .unwrap_or_else(|| String::from(DEFAULT_REMOTE_LOG_DIR)),
            comment_marker,
            separator: config
                .separator
                .unwrap_or_else(|| "=".repeat(SEPARATOR_WIDTH)),
            fail_fast: config.fail_fast.unwrap_or(false),
            ssh: SshConfig::from_user_config(config.ssh),
        })
    }

    /// Full remote path of a manifest entry.
    pub fn remote_log_path(&self, entry: &str) -> String {
        if self.remote_log_dir.ends_with('/') {
            format!("{}{}", self.remote_log_dir, entry)
        } else {
            format!("{}/{}", self.remote_log_dir, entry)
        }
    }
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            user: None,
            output_root: PathBuf::from("."),
            commands_dir: PathBuf::from(DEFAULT_COMMANDS_DIR),
            manifest: PathBuf::from(DEFAULT_MANIFEST),
            remote_log_dir: String::from(DEFAULT_REMOTE_LOG_DIR),
            comment_marker: DEFAULT_COMMENT_MARKER,
            separator: "=".repeat(SEPARATOR_WIDTH),
            fail_fast: false,
            ssh: SshConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    pub fn deserialize() -> Result<()> {
        let content = r#"
            # Gather settings for the lab
            user = "netops"
            output_root = "/srv/results"
            commands_dir = "commands"
            manifest = "logs.txt"
            remote_log_dir = "/var/tmp"
            comment_marker = ";"
            fail_fast = true

            [ssh]
            port = 830
            identity_file = "/home/netops/.ssh/lab_ed25519"
            connect_timeout_secs = 5
            command_timeout_secs = 120
        "#;
        let config = GatherConfig::from_user_config(GatherUserConfig::from_toml(content)?)?;

        assert_eq!(config.user.as_deref(), Some("netops"));
        assert_eq!(config.output_root, PathBuf::from("/srv/results"));
        assert_eq!(config.commands_dir, PathBuf::from("commands"));
        assert_eq!(config.manifest, PathBuf::from("logs.txt"));
        assert_eq!(config.comment_marker, ';');
        assert!(config.fail_fast);
        assert_eq!(config.ssh.port, 830);
        assert_eq!(config.ssh.connect_timeout_secs, 5);
        assert_eq!(config.ssh.command_timeout_secs, Some(120));
        assert_eq!(config.remote_log_path("messages"), "/var/tmp/messages");
        Ok(())
    }

    #[test]
    fn empty_file_uses_defaults() -> Result<()> {
        let config = GatherConfig::from_user_config(GatherUserConfig::from_toml("")?)?;
        assert_eq!(config, GatherConfig::default());
        assert_eq!(config.separator.len(), SEPARATOR_WIDTH);
        assert_eq!(config.remote_log_path("messages"), "/var/log/messages");
        Ok(())
    }

    #[test]
    fn rejects_long_comment_marker() -> Result<()> {
        let user = GatherUserConfig::from_toml(r#"comment_marker = "//""#)?;
        assert!(matches!(
            GatherConfig::from_user_config(user),
            Err(Error::InvalidCommentMarker(_))
        ));
        Ok(())
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(GatherUserConfig::from_toml("usr = \"typo\"").is_err());
    }

    #[test]
    fn from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "user = \"lab\"")?;
        let config = GatherUserConfig::from_file(file.path())?;
        assert_eq!(config.user.as_deref(), Some("lab"));
        Ok(())
    }
}
