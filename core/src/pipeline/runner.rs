use super::command::ExternalCommand;
use crate::error::{GeomqaError, Result};
use log::{debug, warn};
use std::io::ErrorKind;
use std::process::Stdio;

/// Executes external commands on behalf of the pipeline
pub trait CommandRunner {
    /// Runs `command` to completion; a non-zero exit is an error
    fn run(&mut self, command: &ExternalCommand) -> Result<()>;

    /// Starts `command` without waiting for it
    fn spawn_detached(&mut self, command: &ExternalCommand) -> Result<()>;
}

/// Runs commands as child processes, inheriting stdout/stderr
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, command: &ExternalCommand) -> Result<()> {
        debug!("Running: {}", command);

        let status = command
            .to_command()
            .status()
            .map_err(|e| spawn_error(command, e))?;

        if status.success() {
            Ok(())
        } else {
            Err(GeomqaError::ToolFailed {
                program: command.program_name(),
                status,
            })
        }
    }

    fn spawn_detached(&mut self, command: &ExternalCommand) -> Result<()> {
        debug!("Spawning: {}", command);

        let child = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| spawn_error(command, e))?;

        debug!("{} started (pid {})", command.program_name(), child.id());
        Ok(())
    }
}

fn spawn_error(command: &ExternalCommand, e: std::io::Error) -> GeomqaError {
    if e.kind() == ErrorKind::NotFound {
        warn!("{} could not be started", command.program.display());
        GeomqaError::ToolNotFound {
            program: command.program_name(),
            hint: format!("unable to run {}", command.program.display()),
        }
    } else {
        e.into()
    }
}
