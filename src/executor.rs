//! Running package manager commands.
//!
//! The executor owns three collaborators: a [`ProcessRunner`] that spawns the
//! command, an [`Elevation`] describing whether and how to gain root, and an
//! [`AuditLog`] that records every invocation.

use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Outcome of one executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Command line exactly as run, including any elevation prefix.
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

/// Raw output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Capability to run a command line and wait for it to finish.
pub trait ProcessRunner {
    fn run(&self, command: &str) -> io::Result<ProcessOutput>;
}

/// Runs command lines through the platform shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellRunner {
    /// `sh -c <command>`
    Posix,
    /// `cmd.exe /C <command>`
    Cmd,
}

impl ShellRunner {
    /// Pick the shell for the operating system we are running on.
    pub fn detect() -> Self {
        Self::for_os(std::env::consts::OS)
    }

    pub fn for_os(os: &str) -> Self {
        if os == "windows" {
            ShellRunner::Cmd
        } else {
            ShellRunner::Posix
        }
    }

    fn invocation(self) -> (&'static str, &'static str) {
        match self {
            ShellRunner::Posix => ("sh", "-c"),
            ShellRunner::Cmd => ("cmd.exe", "/C"),
        }
    }
}

impl ProcessRunner for ShellRunner {
    fn run(&self, command: &str) -> io::Result<ProcessOutput> {
        let (shell, flag) = self.invocation();
        debug!(shell, command, "spawning command");

        let output = Command::new(shell)
            .arg(flag)
            .arg(command)
            .stdin(Stdio::inherit())
            .output()?;

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            // Killed by a signal: no exit code.
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Privilege state of the current process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Elevation {
    /// Already running as root / administrator.
    pub privileged: bool,
    /// Helper used to gain root, e.g. `sudo`, if one is installed.
    pub helper: Option<String>,
}

impl Elevation {
    pub fn detect() -> Self {
        let helper = if std::env::consts::OS == "windows" {
            None
        } else {
            which::which("sudo").ok().map(|_| "sudo".to_string())
        };

        Self {
            privileged: is_privileged(),
            helper,
        }
    }

    /// Prefix `command` with the elevation helper when root is required and
    /// we do not already have it. Without a helper the command is returned
    /// unchanged.
    pub fn apply(&self, command: &str, requires_root: bool) -> String {
        match &self.helper {
            Some(helper) if requires_root && !self.privileged => format!("{helper} {command}"),
            _ => {
                if requires_root && !self.privileged {
                    debug!(command, "root required but no elevation helper found");
                }
                command.to_string()
            }
        }
    }
}

fn is_privileged() -> bool {
    #[cfg(unix)]
    return nix::unistd::geteuid().is_root();

    #[cfg(windows)]
    return is_elevated::is_elevated();

    #[cfg(not(any(unix, windows)))]
    return false;
}

/// Marker written in front of each audit log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Attempt,
    Success,
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditStatus::Attempt => write!(f, "ATTEMPT"),
            AuditStatus::Success => write!(f, "SUCCESS"),
        }
    }
}

/// Append-only history of executed commands.
///
/// The file is opened, appended and closed on every record. There is no
/// locking; concurrent processes may interleave lines.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    path: Option<PathBuf>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// An audit log that records nothing.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one entry. Failures are logged and otherwise ignored.
    pub fn record(&self, status: AuditStatus, command: &str) {
        let Some(path) = &self.path else {
            return;
        };
        let line = format_entry(&Local::now(), status, command);
        if let Err(err) = append_line(path, &line) {
            warn!(path = %path.display(), error = %err, "failed to write audit log");
        }
    }
}

/// `[YYYY-MM-DD HH:MM:SS] STATUS: command`
pub fn format_entry(timestamp: &DateTime<Local>, status: AuditStatus, command: &str) -> String {
    format!(
        "[{}] {}: {}",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        status,
        command
    )
}

fn append_line(path: &Path, line: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}

pub struct Executor<R = ShellRunner> {
    runner: R,
    elevation: Elevation,
    audit: AuditLog,
}

impl Executor<ShellRunner> {
    /// Executor for the current host: platform shell and detected privileges.
    pub fn for_host(audit: AuditLog) -> Self {
        Self::new(ShellRunner::detect(), Elevation::detect(), audit)
    }
}

impl<R: ProcessRunner> Executor<R> {
    pub fn new(runner: R, elevation: Elevation, audit: AuditLog) -> Self {
        Self {
            runner,
            elevation,
            audit,
        }
    }

    pub fn elevation(&self) -> &Elevation {
        &self.elevation
    }

    /// The command line [`Executor::execute`] would run. Spawns nothing.
    pub fn preview(&self, command: &str, requires_root: bool) -> String {
        self.elevation.apply(command, requires_root)
    }

    /// Run `command`, blocking until it exits.
    ///
    /// Never fails: spawn errors and non-zero exits are reported through the
    /// returned [`ExecutionResult`].
    pub fn execute(&self, command: &str, requires_root: bool) -> ExecutionResult {
        let final_command = self.elevation.apply(command, requires_root);
        self.audit.record(AuditStatus::Attempt, &final_command);

        let result = match self.runner.run(&final_command) {
            Ok(output) => ExecutionResult {
                success: output.exit_code == 0,
                command: final_command,
                stdout: output.stdout,
                stderr: output.stderr,
                exit_code: output.exit_code,
            },
            Err(err) => {
                warn!(command = %final_command, error = %err, "failed to spawn command");
                ExecutionResult {
                    stderr: format!("Failed to execute command: {err}"),
                    command: final_command,
                    stdout: String::new(),
                    exit_code: -1,
                    success: false,
                }
            }
        };

        let status = if result.success {
            AuditStatus::Success
        } else {
            AuditStatus::Attempt
        };
        self.audit.record(status, &result.command);
        debug!(command = %result.command, exit_code = result.exit_code, "command finished");
        result
    }
}
