//! Low-level async process management for the OpenSSH client programs.

use std::{
    ffi::OsStr,
    fs::File,
    io,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use tokio::process::{Child, Command};

/// Captured result of a finished process.
#[derive(Debug)]
pub struct ProcessOutput {
    /// Exit status of the process.
    pub status: ExitStatus,
    /// Everything written to stdout, lossily decoded.
    pub stdout: String,
    /// Everything written to stderr, lossily decoded.
    pub stderr: String,
}

impl ProcessOutput {
    /// Stdout followed by stderr, the way an operator would see it on a terminal.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        text.push_str(&self.stderr);
        text
    }
}

/// Spawn a new async process with piped stdout and stderr.
///
/// Stdin is closed so the child can never block waiting for a password.
/// The child is killed if the returned handle is dropped.
///
/// # Examples
///
/// ```rust
/// use ng_device::process::spawn_process;
///
/// #[tokio::main]
/// async fn main() {
///     let child = spawn_process("echo", vec!["Hello".to_string()]).unwrap();
///     let output = child.wait_with_output().await.unwrap();
///     assert!(output.status.success());
/// }
/// ```
pub fn spawn_process(cmd: &str, args: Vec<String>) -> Result<Child, io::Error> {
    Command::new(OsStr::new(&cmd))
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
}

/// Run a process to completion and capture its output.
///
/// A `timeout` of `None` waits forever.
///
/// # Examples
///
/// ```rust
/// use ng_device::process::run_to_completion;
///
/// #[tokio::main]
/// async fn main() {
///     let output = run_to_completion("echo", vec!["done".to_string()], None)
///         .await
///         .unwrap();
///     assert_eq!(output.stdout, "done\n");
/// }
/// ```
pub async fn run_to_completion(
    cmd: &str,
    args: Vec<String>,
    timeout: Option<Duration>,
) -> Result<ProcessOutput, io::Error> {
    let child = spawn_process(cmd, args)?;
    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("{cmd} did not finish within {}s", limit.as_secs()),
                )
            })??,
        None => child.wait_with_output().await?,
    };

    Ok(ProcessOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run a process that may leave a daemon behind and wait for its exit status.
///
/// Pipes can't be used here: a forked daemon keeps them open and reading to
/// EOF would never return. Stdout is discarded and stderr goes to `stderr_log`.
pub async fn run_detaching(
    cmd: &str,
    args: Vec<String>,
    stderr_log: File,
) -> Result<ExitStatus, io::Error> {
    let mut child = Command::new(OsStr::new(&cmd))
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::from(stderr_log))
        .spawn()?;
    child.wait().await
}
