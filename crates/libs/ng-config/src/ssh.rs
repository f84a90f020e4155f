//! SSH transport settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default SSH port used when none is configured.
pub const DEFAULT_SSH_PORT: u16 = 22;
/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// User-defined SSH settings. Usually loaded from the `[ssh]` table of the TOML file.
///
/// Every field is optional, missing values fall back to the defaults of [`SshConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshUserConfig {
    /// TCP port of the management interface.
    pub port: Option<u16>,
    /// Private key passed to `ssh -i`. When absent the agent and the default keys are used.
    pub identity_file: Option<PathBuf>,
    /// Seconds to wait for the TCP connection and the authentication to complete.
    pub connect_timeout_secs: Option<u64>,
    /// Seconds a single command or transfer may take. Unlimited when absent.
    pub command_timeout_secs: Option<u64>,
    /// Directory where control sockets are created. Defaults to the system temp dir.
    pub control_dir: Option<PathBuf>,
}

/// Resolved SSH settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshConfig {
    pub port: u16,
    pub identity_file: Option<PathBuf>,
    pub connect_timeout_secs: u64,
    pub command_timeout_secs: Option<u64>,
    pub control_dir: PathBuf,
}

impl SshConfig {
    /// Apply defaults to the user supplied values.
    pub fn from_user_config(value: SshUserConfig) -> Self {
        Self {
            port: value.port.unwrap_or(DEFAULT_SSH_PORT),
            identity_file: value.identity_file,
            connect_timeout_secs: value
                .connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            command_timeout_secs: value.command_timeout_secs,
            control_dir: value.control_dir.unwrap_or_else(std::env::temp_dir),
        }
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self::from_user_config(SshUserConfig::default())
    }
}
