//! Subprocess execution with line-streamed output.

use super::{EXIT_NOT_FOUND, ToolCommand, ToolRunner, detection};
use crate::bundler::error::{Error, Result};
use std::{collections::VecDeque, path::PathBuf, process::Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Stderr lines kept for the failure message.
const STDERR_TAIL: usize = 20;

/// Runs tools as real child processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner;

#[async_trait::async_trait]
impl ToolRunner for ProcessRunner {
    fn probe(&self, program: &str) -> Option<PathBuf> {
        detection::probe(program)
    }

    async fn run(&self, command: &ToolCommand) -> Result<()> {
        log::debug!("Running {}", command);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ExternalToolFailure {
                    tool: command.program.clone(),
                    code: Some(EXIT_NOT_FOUND),
                    detail: "tool absent".to_string(),
                });
            }
            Err(error) => {
                return Err(Error::CommandFailed {
                    command: command.to_string(),
                    error,
                });
            }
        };

        // Both pipes are drained before waiting so a chatty tool cannot block.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (_, tail) = tokio::join!(
            async {
                if let Some(stdout) = stdout {
                    let mut lines = BufReader::new(stdout).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        log::debug!("[{}] {}", command.program, line);
                    }
                }
            },
            async {
                let mut tail = VecDeque::with_capacity(STDERR_TAIL);
                if let Some(stderr) = stderr {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        log::warn!("[{}] {}", command.program, line);
                        if tail.len() == STDERR_TAIL {
                            tail.pop_front();
                        }
                        tail.push_back(line);
                    }
                }
                tail
            }
        );

        let status = child.wait().await.map_err(|error| Error::CommandFailed {
            command: command.to_string(),
            error,
        })?;

        if status.success() {
            return Ok(());
        }

        let code = status.code();
        let detail = if code == Some(EXIT_NOT_FOUND) {
            "tool absent".to_string()
        } else if tail.is_empty() {
            "exited unsuccessfully".to_string()
        } else {
            Vec::from(tail).join("\n")
        };
        Err(Error::ExternalToolFailure {
            tool: command.program.clone(),
            code,
            detail,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::bundler::error::ErrorKind;

    #[tokio::test]
    async fn test_successful_command() {
        let cmd = ToolCommand::new("sh").args(["-c", "echo packaged"]);
        ProcessRunner.run(&cmd).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_zero_exit_keeps_stderr() {
        let cmd = ToolCommand::new("sh").args(["-c", "echo broken control file >&2; exit 3"]);
        let err = ProcessRunner.run(&cmd).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalToolFailure);
        match err {
            Error::ExternalToolFailure { code, detail, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(detail, "broken control file");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_tool_absent() {
        let cmd = ToolCommand::new("no-such-packager-binary");
        let err = ProcessRunner.run(&cmd).await.unwrap_err();
        assert!(err.to_string().contains("tool absent"));
        assert_eq!(err.kind(), ErrorKind::ExternalToolFailure);
    }

    #[tokio::test]
    async fn test_working_directory_is_applied() {
        let dir = tempfile::TempDir::new().unwrap();
        let cmd = ToolCommand::new("sh")
            .args(["-c", "touch marker"])
            .current_dir(dir.path());
        ProcessRunner.run(&cmd).await.unwrap();
        assert!(dir.path().join("marker").exists());
    }
}
