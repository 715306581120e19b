use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::control::{JobControl, Launched};
use crate::env::Environment;
use crate::error::JobError;
use crate::interpreter::Factory;
use crate::job::WaitOutcome;
use crate::launcher::CommandLine;
use anyhow::Result;
use std::io::Write;

/// Command that is not a builtin: launched as a child process under job control.
pub struct ExternalCommand {
    line: CommandLine,
}

impl ExternalCommand {
    pub fn new(line: CommandLine) -> Self {
        Self { line }
    }
}

/// Command line that could not be turned into a launch.
struct Rejected {
    error: JobError,
}

impl ExecutableCommand for Rejected {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _env: &mut Environment,
        _jobs: &mut JobControl,
    ) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.error)?;
        Ok(1)
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    /// Accepts any name; it must be registered last.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        let tokens = std::iter::once(name).chain(args.iter().copied()).collect();
        Some(match CommandLine::parse(tokens) {
            Ok(line) => Box::new(ExternalCommand::new(line)),
            Err(error) => Box::new(Rejected { error }),
        })
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
        jobs: &mut JobControl,
    ) -> Result<ExitCode> {
        Ok(match jobs.launch(&self.line)? {
            Launched::Background(_) => 0,
            Launched::Stopped(_, outcome) | Launched::Finished(outcome) => exit_code(outcome),
        })
    }
}

/// Shell-style exit code for a foreground wait outcome.
pub(crate) fn exit_code(outcome: WaitOutcome) -> ExitCode {
    match outcome {
        WaitOutcome::Exited(code) => code,
        WaitOutcome::Signaled(signal) | WaitOutcome::Stopped(signal) => 128 + signal as i32,
        WaitOutcome::Vanished => 0,
    }
}
