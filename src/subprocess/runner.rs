use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use super::error::ProcessError;

/// An external program invocation. Arguments are passed verbatim, never
/// through a shell.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ProcessCommand {
    /// Render the command as a single shell-quoted line, for logs and dry runs
    pub fn display_line(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Signal(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    /// Status as a shell would report it: 128+N for death by signal N
    pub fn shell_code(&self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Error(code) => *code,
            ExitStatus::Signal(signal) => 128 + signal,
        }
    }

    fn from_std(status: std::process::ExitStatus) -> Self {
        if status.success() {
            return ExitStatus::Success;
        }
        if let Some(code) = status.code() {
            return ExitStatus::Error(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitStatus::Signal(signal);
            }
        }
        ExitStatus::Error(1)
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;
}

/// Runs commands as child processes on the tokio runtime.
///
/// The parent environment is inherited: GDAL and its python bindings depend
/// on variables such as `GDAL_DATA` and `PYTHONPATH`.
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    fn spawn(command: &ProcessCommand) -> Result<tokio::process::Child, ProcessError> {
        tokio::process::Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => {
                    ProcessError::CommandNotFound(command.program.clone())
                }
                _ => ProcessError::SpawnFailed {
                    command: command.display_line(),
                    source,
                },
            })
    }

}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        debug!("Running: {}", command.display_line());
        let started = Instant::now();

        // Tools run to completion; no time limit is imposed
        let output = Self::spawn(&command)?.wait_with_output().await?;

        let result = ProcessOutput {
            status: ExitStatus::from_std(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: started.elapsed(),
        };

        match result.status {
            ExitStatus::Success => {
                debug!("{} finished in {:?}", command.program, result.duration)
            }
            ExitStatus::Error(code) => {
                debug!("{} exited with {} after {:?}", command.program, code, result.duration);
                trace!("{} stderr: {}", command.program, result.stderr.trim());
            }
            ExitStatus::Signal(signal) => {
                warn!("{} killed by signal {} after {:?}", command.program, signal, result.duration)
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_line_quotes_arguments() {
        let command = ProcessCommand {
            program: "gdal_pansharpen.py".to_string(),
            args: vec!["-co".to_string(), "two words".to_string()],
        };
        assert_eq!(command.display_line(), "gdal_pansharpen.py -co 'two words'");
    }

    #[test]
    fn test_shell_code() {
        assert_eq!(ExitStatus::Success.shell_code(), 0);
        assert_eq!(ExitStatus::Error(4).shell_code(), 4);
        assert_eq!(ExitStatus::Signal(9).shell_code(), 137);
        assert!(!ExitStatus::Signal(9).success());
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_from_std() {
        use std::os::unix::process::ExitStatusExt;

        let status = |raw| ExitStatus::from_std(std::process::ExitStatus::from_raw(raw));
        assert_eq!(status(0), ExitStatus::Success);
        // Exit code 1
        assert_eq!(status(256), ExitStatus::Error(1));
        // SIGKILL
        assert_eq!(status(9), ExitStatus::Signal(9));
    }
}
