use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::control::{JobControl, Resume};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "fg" or "cd".
    fn name() -> &'static str;

    /// Executes the command.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        jobs: &mut JobControl,
    ) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
        jobs: &mut JobControl,
    ) -> Result<ExitCode> {
        match T::execute(*self, stdout, env, jobs) {
            Ok(x) => Ok(x),
            Err(e) => {
                tracing::debug!(command = T::name(), "{:#}", e);
                writeln!(stdout, "{:#}", e)?;
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _env: &mut Environment,
        _jobs: &mut JobControl,
    ) -> Result<ExitCode> {
        stdout.write_all(self.output.as_bytes())?;
        if !self.output.ends_with('\n') {
            writeln!(stdout)?;
        }
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        _jobs: &mut JobControl,
    ) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir.to_string_lossy())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
        _jobs: &mut JobControl,
    ) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => env
                .home()
                .ok_or_else(|| anyhow::anyhow!("cd: HOME not set"))?,
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: can't canonicalize {}", new_dir.display()))?;

        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Exit the shell. Jobs that are still running are left alone.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
        _jobs: &mut JobControl,
    ) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List background and stopped jobs as `<index>: <name> (<status>)`.
pub struct Jobs {}

impl BuiltinCommand for Jobs {
    fn name() -> &'static str {
        "jobs"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _env: &mut Environment,
        jobs: &mut JobControl,
    ) -> Result<ExitCode> {
        jobs.jobs().write_listing(stdout)?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Continue a job in the foreground and wait for it to exit or stop.
pub struct Fg {
    #[argh(positional)]
    /// job index as shown by `jobs`.
    pub index: usize,
}

impl BuiltinCommand for Fg {
    fn name() -> &'static str {
        "fg"
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
        jobs: &mut JobControl,
    ) -> Result<ExitCode> {
        jobs.resume(self.index, Resume::Foreground)
            .context("Failed to resume job in foreground")?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Continue a stopped job in the background.
pub struct Bg {
    #[argh(positional)]
    /// job index as shown by `jobs`.
    pub index: usize,
}

impl BuiltinCommand for Bg {
    fn name() -> &'static str {
        "bg"
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
        jobs: &mut JobControl,
    ) -> Result<ExitCode> {
        jobs.resume(self.index, Resume::Background)
            .context("Failed to resume job in background")?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Wait until a background job exits or stops.
pub struct WaitFor {
    #[argh(positional)]
    /// job index as shown by `jobs`.
    pub index: usize,
}

impl BuiltinCommand for WaitFor {
    fn name() -> &'static str {
        "wait-for"
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
        jobs: &mut JobControl,
    ) -> Result<ExitCode> {
        jobs.await_one(self.index)
            .context("Failed to wait for background job")?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Wait until every background job has exited or stopped.
pub struct WaitAll {}

impl BuiltinCommand for WaitAll {
    fn name() -> &'static str {
        "wait-all"
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
        jobs: &mut JobControl,
    ) -> Result<ExitCode> {
        jobs.await_all()
            .context("Failed to wait for all background jobs")?;
        Ok(0)
    }
}
