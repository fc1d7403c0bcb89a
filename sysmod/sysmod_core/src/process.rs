//! Process controller.
//!
//! Queries and mutates the running state of a module through the external
//! process service. Requests do not wait for the module to become ready;
//! the result is observed by querying again on a later refresh.

use std::io;
use std::process::{Command, Output, Stdio};

use tracing::{debug, info};

use crate::config::ProcessConfig;
use crate::error::ProcessError;
use crate::id::ProgramId;

/// Placeholder replaced by the program id in command templates.
pub const PROGRAM_ID_PLACEHOLDER: &str = "{program_id}";

/// Access to the process service.
pub trait ProcessController {
    /// Whether the service reports a live process for `id`. Failures read as `false`.
    fn is_running(&self, id: ProgramId) -> bool;

    /// Request a launch of `id`.
    fn start(&self, id: ProgramId) -> Result<(), ProcessError>;

    /// Request termination of `id`.
    fn stop(&self, id: ProgramId) -> Result<(), ProcessError>;
}

/// Process controller that shells out to configured service commands.
#[derive(Debug, Clone)]
pub struct CommandProcessController {
    shell: String,
    query: Option<String>,
    launch: Option<String>,
    terminate: Option<String>,
}

impl CommandProcessController {
    /// Create a controller from the `[process]` configuration table.
    pub fn new(config: &ProcessConfig) -> Self {
        Self {
            shell: config.shell.clone(),
            query: config.query.clone(),
            launch: config.launch.clone(),
            terminate: config.terminate.clone(),
        }
    }

    /// Live process id reported by the query command, if any.
    pub fn process_id(&self, id: ProgramId) -> Option<u64> {
        let output = match self.query_output(id) {
            Ok(output) => output,
            Err(e) => {
                debug!("Process query for {} failed: {}", id, e);
                return None;
            }
        };

        if !output.status.success() {
            debug!("Process query for {} exited with {}", id, output.status);
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout.trim().parse::<u64>().ok()
    }

    fn command(
        &self,
        operation: &'static str,
        template: Option<&str>,
        id: ProgramId,
    ) -> Result<Command, ProcessError> {
        let template = template.ok_or(ProcessError::NotConfigured(operation))?;
        let rendered = template.replace(PROGRAM_ID_PLACEHOLDER, &id.to_string());

        debug!("Running {} command: {}", operation, rendered);

        let mut command = Command::new(&self.shell);
        command.arg("-c").arg(rendered);
        Ok(command)
    }

    fn spawn_error(
        operation: &'static str,
        id: ProgramId,
    ) -> impl FnOnce(io::Error) -> ProcessError {
        move |source| ProcessError::Spawn {
            operation,
            program_id: id,
            source,
        }
    }

    fn query_output(&self, id: ProgramId) -> Result<Output, ProcessError> {
        self.command("query", self.query.as_deref(), id)?
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(Self::spawn_error("query", id))
    }

    /// Launch and terminate commands get no pipes, so a service they leave
    /// running in the background cannot hold the request open.
    fn request(
        &self,
        operation: &'static str,
        template: Option<&str>,
        id: ProgramId,
    ) -> Result<(), ProcessError> {
        let status = self
            .command(operation, template, id)?
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(Self::spawn_error(operation, id))?;

        if !status.success() {
            return Err(ProcessError::CommandFailed {
                operation,
                program_id: id,
                status: status.to_string(),
            });
        }

        info!("Requested {} of {}", operation, id);
        Ok(())
    }
}

impl ProcessController for CommandProcessController {
    fn is_running(&self, id: ProgramId) -> bool {
        self.process_id(id).is_some_and(|pid| pid > 0)
    }

    fn start(&self, id: ProgramId) -> Result<(), ProcessError> {
        self.request("launch", self.launch.as_deref(), id)
    }

    fn stop(&self, id: ProgramId) -> Result<(), ProcessError> {
        self.request("terminate", self.terminate.as_deref(), id)
    }
}
