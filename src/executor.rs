//! Script execution
//!
//! Hands fetched text verbatim to an interpreter. Whatever the script does
//! to its environment is the point of running it; nothing is sandboxed.

use crate::config::schema::ExecutorConfig;
use crate::error::{LoaderError, LoaderResult};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::{debug, error};

/// Runs code once, synchronously
///
/// Failures are reported by the executor and never propagated; a broken
/// remote script must not take the loader down with it.
pub trait Executor: Send + Sync {
    fn execute(&self, code: &str);
}

/// Streams the script into an interpreter's stdin
#[derive(Debug, Clone)]
pub struct InterpreterExecutor {
    program: String,
    args: Vec<String>,
}

impl InterpreterExecutor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self::new(config.interpreter.clone(), config.args.clone())
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn run(&self, code: &str) -> LoaderResult<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                LoaderError::ExecutionFailed(format!("cannot start {}: {}", self.command_line(), e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A script that exits early closes its stdin; the exit status
            // below is what gets reported
            if let Err(e) = stdin.write_all(code.as_bytes()) {
                debug!("Interpreter stopped reading its input: {}", e);
            }
        }

        let status = child
            .wait()
            .map_err(|e| LoaderError::io(format!("waiting for {}", self.program), e))?;

        if !status.success() {
            return Err(LoaderError::ExecutionFailed(format!(
                "{} exited with {}",
                self.command_line(),
                status
            )));
        }

        Ok(())
    }
}

impl Executor for InterpreterExecutor {
    fn execute(&self, code: &str) {
        debug!("Executing {} bytes with {}", code.len(), self.command_line());
        if let Err(e) = self.run(code) {
            error!("{}", e);
        }
    }
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn runs_script_through_interpreter() {
        let temp = TempDir::new().unwrap();
        let marker = temp.path().join("ran");
        let executor = InterpreterExecutor::new("sh", vec![]);

        executor.execute(&format!("echo hello > '{}'", marker.display()));

        assert_eq!(std::fs::read_to_string(&marker).unwrap().trim(), "hello");
    }

    #[test]
    fn failing_script_is_reported_not_propagated() {
        let executor = InterpreterExecutor::new("sh", vec![]);
        let err = executor.run("exit 3").unwrap_err();
        assert!(matches!(err, LoaderError::ExecutionFailed(_)));

        // Through the trait boundary nothing escapes
        executor.execute("exit 3");
    }

    #[test]
    fn missing_interpreter_is_execution_failure() {
        let executor = InterpreterExecutor::new("ghload-no-such-interpreter", vec![]);
        let err = executor.run("anything").unwrap_err();
        assert!(err.to_string().contains("cannot start"));
    }

    #[test]
    fn args_are_passed_before_script() {
        let executor = InterpreterExecutor::new("sh", vec!["-s".to_string(), "--".to_string(), "x".to_string()]);
        assert_eq!(executor.command_line(), "sh -s -- x");
        assert!(executor.run("test \"$1\" = x").is_ok());
    }
}
