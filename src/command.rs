use crate::control::JobControl;
use crate::env::Environment;
use anyhow::Result;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Commands killed or stopped by a signal report `128 + signal`.
pub type ExitCode = i32;

/// Object-safe trait for any command the shell can run.
///
/// Built-ins get it through a blanket impl; everything else is an
/// [`ExternalCommand`](crate::external::ExternalCommand) handed to job control.
pub trait ExecutableCommand {
    /// Executes the command.
    ///
    /// `stdout` receives the command's own messages. Launched programs inherit
    /// the shell's real standard output instead.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
        jobs: &mut JobControl,
    ) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}
