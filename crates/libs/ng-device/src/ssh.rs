//! OpenSSH backed device sessions.
//!
//! `open` starts a control master (`ssh -M`) so the authentication happens
//! once per device. CLI commands, structured queries and `scp` transfers are
//! multiplexed over the master's control socket, and `close` asks the master
//! to exit (`ssh -O exit`).

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use ng_config::{DeviceTarget, SshConfig};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::prelude::*;
use crate::process::{ProcessOutput, run_detaching, run_to_completion};
use crate::session::{DeviceConnector, DeviceSession, FileTransfer};

const SSH: &str = "ssh";
const SCP: &str = "scp";
/// Exit code OpenSSH uses for its own failures, as opposed to the remote command's.
const SSH_ERROR_EXIT: i32 = 255;
/// Hex digits of the connection digest kept in the control socket name.
const CONTROL_DIGEST_LEN: usize = 16;

/// Control socket path for one connection.
///
/// Unix socket paths are limited to 104 bytes on some platforms, so the name
/// is built from a digest of the connection rather than the hostname.
fn control_path(dir: &Path, user: Option<&str>, host: &str, port: u16) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}@{}:{}", std::process::id(), user.unwrap_or(""), host, port));
    let digest: String = hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect();
    dir.join(format!("ng-{}.sock", &digest[..CONTROL_DIGEST_LEN]))
}

/// Creates [`SshSession`]s sharing one credential profile.
#[derive(Debug, Clone)]
pub struct SshConnector {
    user: Option<String>,
    config: SshConfig,
    command_timeout: Option<Duration>,
}

impl SshConnector {
    pub fn new(user: Option<String>, config: SshConfig) -> Self {
        Self {
            user,
            config,
            command_timeout: None,
        }
    }

    /// Give up on a single command or transfer after `timeout`.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }
}

impl DeviceConnector for SshConnector {
    type Session = SshSession;

    fn session(&self, device: &DeviceTarget) -> SshSession {
        SshSession::new(
            device.as_str(),
            self.user.clone(),
            self.config.clone(),
            self.command_timeout,
        )
    }

    fn name(&self) -> &'static str {
        "openssh"
    }
}

/// A session multiplexed over an OpenSSH control master.
#[derive(Debug)]
pub struct SshSession {
    host: String,
    user: Option<String>,
    config: SshConfig,
    control_path: PathBuf,
    command_timeout: Option<Duration>,
    open: bool,
}

impl SshSession {
    fn new(
        host: &str,
        user: Option<String>,
        config: SshConfig,
        command_timeout: Option<Duration>,
    ) -> Self {
        let control_path = control_path(&config.control_dir, user.as_deref(), host, config.port);
        Self {
            host: host.to_string(),
            user,
            config,
            control_path,
            command_timeout,
            open: false,
        }
    }

    fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }

    /// Options shared by `ssh` and `scp`. The port flag differs and is added by the caller.
    fn common_options(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout_secs),
            "-o".to_string(),
            format!("ControlPath={}", self.control_path.display()),
        ];
        if let Some(identity) = &self.config.identity_file {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        args
    }

    fn ssh_args(&self, extra: &[&str]) -> Vec<String> {
        let mut args = vec!["-p".to_string(), self.config.port.to_string()];
        args.extend(self.common_options());
        args.extend(extra.iter().map(|s| s.to_string()));
        args
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(Error::NotOpen(self.host.clone()))
        }
    }

    async fn exec(&self, command: &str) -> Result<ProcessOutput> {
        self.ensure_open()?;
        let destination = self.destination();
        let args = self.ssh_args(&[
            "-o",
            "ControlMaster=no",
            "-T",
            destination.as_str(),
            command,
        ]);
        let output = run_to_completion(SSH, args, self.command_timeout)
            .await
            .map_err(|err| Error::Command {
                command: command.to_string(),
                reason: err.to_string(),
            })?;

        if output.status.code() == Some(SSH_ERROR_EXIT) {
            return Err(Error::Connection {
                host: self.host.clone(),
                reason: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    fn stop_master_blocking(&self) {
        let destination = self.destination();
        let _ = std::process::Command::new(SSH)
            .args(self.ssh_args(&["-O", "exit", destination.as_str()]))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();
    }
}

#[async_trait]
impl DeviceSession for SshSession {
    fn host(&self) -> &str {
        &self.host
    }

    async fn open(&mut self) -> Result<()> {
        if self.open {
            return Ok(());
        }
        let destination = self.destination();
        let log_path = self.control_path.with_extension("log");
        let log = File::create(&log_path)?;
        let args = self.ssh_args(&[
            "-M",
            "-f",
            "-N",
            "-o",
            "ControlPersist=yes",
            destination.as_str(),
        ]);

        debug!("Starting ssh control master for {}", self.host);
        let status = run_detaching(SSH, args, log).await;
        let reason = std::fs::read_to_string(&log_path).unwrap_or_default();
        let _ = std::fs::remove_file(&log_path);

        match status {
            Ok(status) if status.success() => {
                self.open = true;
                info!("Connected to {}", self.host);
                Ok(())
            }
            Ok(status) => Err(Error::Connection {
                host: self.host.clone(),
                reason: if reason.trim().is_empty() {
                    format!("ssh exited with {status}")
                } else {
                    reason.trim().to_string()
                },
            }),
            Err(err) => Err(Error::Connection {
                host: self.host.clone(),
                reason: err.to_string(),
            }),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        let destination = self.destination();
        let args = self.ssh_args(&["-O", "exit", destination.as_str()]);
        let output = run_to_completion(SSH, args, self.command_timeout).await?;
        if !output.status.success() {
            return Err(Error::Connection {
                host: self.host.clone(),
                reason: format!(
                    "control master did not exit: {}",
                    output.stderr.trim()
                ),
            });
        }
        self.open = false;
        info!("Disconnected from {}", self.host);
        Ok(())
    }

    async fn query(&mut self, rpc: &str) -> Result<Value> {
        let command = format!("{rpc} | display json");
        let output = self.exec(&command).await?;
        serde_json::from_str(&output.stdout).map_err(|err| Error::Query {
            rpc: rpc.to_string(),
            reason: format!("{err}: {}", output.combined().trim()),
        })
    }

    async fn cli(&mut self, command: &str) -> Result<String> {
        Ok(self.exec(command).await?.combined())
    }

    async fn open_transfer<'a>(&'a mut self) -> Result<Box<dyn FileTransfer + 'a>> {
        self.ensure_open()?;
        Ok(Box::new(ScpTransfer { session: self }))
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if self.open {
            warn!("Session to {} dropped while open, stopping master", self.host);
            self.stop_master_blocking();
        }
    }
}

/// `scp` transfers reusing the session's control socket.
pub struct ScpTransfer<'a> {
    session: &'a SshSession,
}

#[async_trait]
impl FileTransfer for ScpTransfer<'_> {
    async fn get(&mut self, remote: &str, local: &Path) -> Result<()> {
        let session = self.session;
        session.ensure_open()?;

        let mut args = vec![
            "-q".to_string(),
            "-P".to_string(),
            session.config.port.to_string(),
        ];
        args.extend(session.common_options());
        args.push(format!("{}:{}", session.destination(), remote));
        args.push(local.display().to_string());

        debug!("Copying {}:{} to {:?}", session.host, remote, local);
        let output = run_to_completion(SCP, args, session.command_timeout)
            .await
            .map_err(|err| Error::Transfer {
                path: remote.to_string(),
                reason: err.to_string(),
            })?;
        if !output.status.success() {
            return Err(Error::Transfer {
                path: remote.to_string(),
                reason: output.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(user: Option<&str>) -> SshSession {
        let config = SshConfig {
            port: 830,
            identity_file: Some(PathBuf::from("/keys/lab")),
            connect_timeout_secs: 7,
            command_timeout_secs: None,
            control_dir: PathBuf::from("/tmp/ng"),
        };
        let connector = SshConnector::new(user.map(String::from), config);
        connector.session(&DeviceTarget::new("r1.lab").unwrap())
    }

    #[test]
    fn destination_includes_user() {
        assert_eq!(session(Some("netops")).destination(), "netops@r1.lab");
        assert_eq!(session(None).destination(), "r1.lab");
    }

    #[test]
    fn ssh_arguments() {
        let session = session(Some("netops"));
        let args = session.ssh_args(&["-O", "exit", "netops@r1.lab"]);
        assert_eq!(&args[..2], &["-p", "830"]);
        assert!(args.contains(&"BatchMode=yes".to_string()));
        assert!(args.contains(&"ConnectTimeout=7".to_string()));
        assert!(args.iter().any(|a| a.starts_with("ControlPath=/tmp/ng/ng-")));
        assert!(args.windows(2).any(|w| w == ["-i", "/keys/lab"]));
        assert_eq!(args.last().map(String::as_str), Some("netops@r1.lab"));
    }

    #[tokio::test]
    async fn operations_require_an_open_session() {
        let mut session = session(None);
        assert!(matches!(
            session.cli("show version").await,
            Err(Error::NotOpen(_))
        ));
        assert!(session.open_transfer().await.is_err());
        // Closing a session that was never opened doesn't touch ssh
        assert!(session.close().await.is_ok());
    }

    #[test]
    fn control_path_is_bounded_for_long_hosts() {
        let host = format!("{}.example.net", "a".repeat(241));
        assert_eq!(host.len(), 253);
        let dir = PathBuf::from("/var/folders/zz/zyxvpxvq6csfxvn_n0000000000000/T");
        let path = control_path(&dir, Some("netops"), &host, 22);
        assert!(path.as_os_str().len() < 104, "{} bytes", path.as_os_str().len());
        assert_eq!(path, control_path(&dir, Some("netops"), &host, 22));
        assert_ne!(path, control_path(&dir, Some("netops"), &host, 830));
        assert_ne!(path, control_path(&dir, None, &host, 22));
    }

    #[tokio::test]
    async fn failed_close_keeps_session_open() {
        let dir = tempfile::tempdir().unwrap();
        let config = SshConfig {
            control_dir: dir.path().to_path_buf(),
            connect_timeout_secs: 1,
            ..SshConfig::default()
        };
        let mut session = SshConnector::new(None, config)
            .session(&DeviceTarget::new("r1.invalid").unwrap());
        // No master is listening on the control socket, so `-O exit` fails
        session.open = true;

        assert!(session.close().await.is_err());
        assert!(session.open);
        session.open = false;
    }
}
