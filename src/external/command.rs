//! Base command execution abstraction
//!
//! Provides the foundational trait for executing external commands, enabling
//! dependency injection for testing.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status_code == 0
    }
}

#[derive(Debug, Error, Clone)]
pub enum CommandError {
    #[error("Command not found: {command}")]
    CommandNotFound { command: String },
    #[error("IO error running {command}: {message}")]
    Io { command: String, message: String },
}

/// Trait for executing external commands
///
/// This abstraction allows the rest of the codebase to execute commands
/// without directly depending on the process API, enabling testing
/// with fake implementations.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args`, optionally inside `cwd`, and capture its output.
    ///
    /// A non-zero exit status is not an error at this level; callers decide.
    async fn execute(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> Result<CommandOutput, CommandError>;
}

/// Render a program and its arguments the way a shell user would type them.
pub fn command_line(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}

/// Real implementation backed by `tokio::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCommandExecutor;

#[async_trait]
impl CommandExecutor for ProcessCommandExecutor {
    async fn execute(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> Result<CommandOutput, CommandError> {
        use tokio::process::Command;

        debug!(command = %command_line(program, args), cwd = ?cwd, "spawning");

        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CommandError::CommandNotFound {
                    command: program.to_string(),
                }
            } else {
                CommandError::Io {
                    command: program.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        Ok(CommandOutput {
            status_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_process_command_executor_success() {
        let executor = ProcessCommandExecutor;
        let result = executor.execute("echo", &["hello"], None).await;

        assert!(result.is_ok());
        let output = result.unwrap();
        assert!(output.success());
        assert!(output.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_process_command_executor_command_not_found() {
        let executor = ProcessCommandExecutor;
        let result = executor.execute("nonexistent_command_xyz", &[], None).await;

        assert!(matches!(
            result.unwrap_err(),
            CommandError::CommandNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_process_command_executor_runs_in_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();

        let output = ProcessCommandExecutor
            .execute("ls", &[], Some(dir.path()))
            .await
            .unwrap();

        assert!(output.stdout.contains("marker.txt"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_not_an_error() {
        let output = ProcessCommandExecutor
            .execute("sh", &["-c", "echo oops >&2; exit 3"], None)
            .await
            .unwrap();

        assert!(!output.success());
        assert_eq!(output.status_code, 3);
        assert!(output.stderr.contains("oops"));
    }

    #[test]
    fn test_command_line_quotes_whitespace() {
        assert_eq!(
            command_line("svn", &["commit", "-m", "refreshed from trunk"]),
            "svn commit -m \"refreshed from trunk\""
        );
    }
}
