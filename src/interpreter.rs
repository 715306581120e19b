use crate::command::{CommandFactory, ExitCode};
use crate::config::Config;
use crate::control::JobControl;
use crate::env::Environment;
use crate::job::JobList;
use crate::lexer;
use crate::process::Posix;
use crate::{signals, terminal};
use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: built-ins and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Interactive shell with job control.
///
/// The interpreter owns the [`Environment`], the [`JobControl`] coordinator and
/// a list of [`CommandFactory`] objects queried in order for every line.
pub struct Interpreter {
    env: Environment,
    jobs: JobControl,
    config: Config,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(config: Config, jobs: JobControl, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            jobs,
            config,
            commands,
        }
    }

    /// Interpreter over real processes and the controlling terminal, if any.
    ///
    /// Ignores `SIGTTIN`/`SIGTTOU` for the shell so that passing the terminal to
    /// jobs and back never stops it.
    pub fn interactive(config: Config) -> anyhow::Result<Self> {
        signals::ignore_terminal_io().context("failed to ignore terminal I/O signals")?;
        let jobs = JobControl::new(terminal::detect(), Box::new(Posix::new(config.max_args)));
        Ok(Self::with_job_control(config, jobs))
    }

    /// Interpreter with the default commands on top of `jobs`.
    pub fn with_job_control(config: Config, jobs: JobControl) -> Self {
        use crate::builtin::*;
        use crate::external::ExternalCommand;
        Self::new(
            config,
            jobs,
            vec![
                Box::new(Factory::<Pwd>::default()),
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<Exit>::default()),
                Box::new(Factory::<Jobs>::default()),
                Box::new(Factory::<Fg>::default()),
                Box::new(Factory::<Bg>::default()),
                Box::new(Factory::<WaitFor>::default()),
                Box::new(Factory::<WaitAll>::default()),
                Box::new(Factory::<ExternalCommand>::default()),
            ],
        )
    }

    pub fn jobs(&self) -> &JobList {
        self.jobs.jobs()
    }

    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Returns the command's exit code, or an error if no factory accepts the
    /// name or the command fails outside its own error reporting.
    pub fn run(
        &mut self,
        name: &str,
        args: &[&str],
        stdout: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(name, args) {
                return cmd.execute(stdout, &mut self.env, &mut self.jobs);
            }
        }
        Err(anyhow::anyhow!("command not found: {}", name))
    }

    /// Tokenizes and runs one input line.
    ///
    /// Command failures are reported on `stdout` and turned into exit code 1.
    /// Only a tokenizer failure is returned as an error.
    pub fn execute_line(&mut self, line: &str, stdout: &mut dyn Write) -> anyhow::Result<ExitCode> {
        let tokens = lexer::tokenize(line).context("Failed to parse command")?;
        let words: Vec<&str> = tokens.iter().collect();
        let Some((name, args)) = words.split_first() else {
            return Ok(0);
        };

        match self.run(name, args, stdout) {
            Ok(code) => Ok(code),
            Err(err) => {
                tracing::debug!(command = %name, "{:#}", err);
                writeln!(stdout, "{:#}", err)?;
                Ok(1)
            }
        }
    }

    /// Read-eval-print loop until end of input or `exit`.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;

        while !self.env.should_exit {
            match rl.readline(&self.config.prompt) {
                Ok(line) => {
                    let code = self.execute_line(&line, &mut io::stdout())?;
                    tracing::trace!(code, "line done");
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                // The undecodable line has been consumed; carry on with the next one.
                Err(ReadlineError::Io(err)) if err.kind() == io::ErrorKind::InvalidData => {
                    tracing::debug!(%err, "unreadable input line");
                    writeln!(io::stdout(), "Failed to parse command: {}", err)?;
                }
                Err(err) => return Err(err).context("failed to read input"),
            }
        }

        if !self.jobs().is_empty() {
            tracing::debug!(count = self.jobs().len(), "leaving jobs behind");
        }
        Ok(())
    }
}
