//! Process execution helpers.
//!
//! External commands are considered "world-touching" and must go through the HAL so we can
//! test workflows without spawning real processes. Calls block until the child exits; there
//! is no timeout.

use crate::{HalError, HalResult};
use std::process::Output;

/// A fully resolved external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn arg_refs(&self) -> Vec<&str> {
        self.args.iter().map(String::as_str).collect()
    }
}

/// Process execution trait (external command runner).
pub trait ProcessOps {
    fn command_output(&self, program: &str, args: &[&str]) -> HalResult<Output>;

    /// Run to completion; a non-zero exit becomes [`HalError::CommandFailed`].
    fn command_status(&self, program: &str, args: &[&str]) -> HalResult<()> {
        let output = self.command_output(program, args)?;
        if !output.status.success() {
            return Err(output_failed(program, &output));
        }
        Ok(())
    }

    fn run_spec(&self, spec: &CommandSpec) -> HalResult<()> {
        self.command_status(&spec.program, &spec.arg_refs())
    }
}

pub fn output_failed(program: &str, output: &Output) -> HalError {
    HalError::CommandFailed {
        program: program.to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}
