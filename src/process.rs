//! Creating, continuing and reaping child processes.

use crate::error::JobError;
use crate::job::WaitOutcome;
use crate::launcher::{self, CommandLine};
use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork, setpgid};
use std::io::Write;

/// Operating-system side of job control, kept behind a trait so the
/// coordinator can be driven by a scripted fake.
pub trait ProcessControl {
    /// Starts `command` in a new child process group and returns its pid.
    fn spawn(&mut self, command: &CommandLine) -> Result<Pid, JobError>;

    /// Sends the continue signal to the job led by `pid`.
    fn resume(&mut self, pid: Pid) -> Result<(), JobError>;

    /// Blocks until `pid` exits or stops.
    fn wait(&mut self, pid: Pid) -> Result<WaitOutcome, JobError>;
}

/// Real processes via `fork`, `killpg` and `waitpid`.
#[derive(Debug)]
pub struct Posix {
    max_args: usize,
}

impl Posix {
    /// `max_args` caps the argument vector handed to exec; 0 disables the cap.
    pub fn new(max_args: usize) -> Self {
        Self { max_args }
    }
}

impl ProcessControl for Posix {
    fn spawn(&mut self, command: &CommandLine) -> Result<Pid, JobError> {
        let prepared = command.prepare(self.max_args)?;
        // Anything still buffered would otherwise be written twice.
        if let Err(err) = std::io::stdout().flush() {
            tracing::warn!(%err, "flushing stdout before fork");
        }

        // SAFETY: the child only performs the launch steps and then execs or exits.
        match unsafe { fork() }.map_err(JobError::sys("fork"))? {
            ForkResult::Parent { child } => {
                // Mirrors the child's own setpgid so the group exists before the
                // terminal is handed over. EACCES means the child already exec'd.
                if let Err(errno) = setpgid(child, child) {
                    tracing::debug!(%child, %errno, "parent setpgid");
                }
                tracing::debug!(%child, program = %command.name(), "spawned");
                Ok(child)
            }
            ForkResult::Child => {
                let err = match launcher::exec(&prepared) {
                    Ok(never) => match never {},
                    Err(err) => err,
                };
                eprintln!("{}", err);
                std::process::exit(1);
            }
        }
    }

    fn resume(&mut self, pid: Pid) -> Result<(), JobError> {
        tracing::debug!(%pid, "SIGCONT");
        killpg(pid, Signal::SIGCONT).map_err(JobError::sys("kill"))
    }

    fn wait(&mut self, pid: Pid) -> Result<WaitOutcome, JobError> {
        loop {
            let outcome = match waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
                Ok(WaitStatus::Exited(_, code)) => WaitOutcome::Exited(code),
                Ok(WaitStatus::Signaled(_, signal, _)) => WaitOutcome::Signaled(signal),
                Ok(WaitStatus::Stopped(_, signal)) => WaitOutcome::Stopped(signal),
                Ok(other) => {
                    tracing::debug!(%pid, ?other, "ignoring wait status");
                    continue;
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => {
                    tracing::warn!(%pid, "child already reaped");
                    WaitOutcome::Vanished
                }
                Err(errno) => return Err(JobError::Sys { call: "waitpid", errno }),
            };
            tracing::debug!(%pid, ?outcome, "wait");
            return Ok(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use std::fs;

    #[test]
    fn test_stopped_child_is_reported_once_and_then_exits() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("pause.sh");
        fs::write(&script, "kill -STOP $$\nexit 3\n").unwrap();
        let line = format!("sh {}", script.display());
        let command = CommandLine::parse(tokenize(&line).unwrap()).unwrap();

        let mut posix = Posix::new(0);
        let pid = posix.spawn(&command).unwrap();

        assert_eq!(posix.wait(pid).unwrap(), WaitOutcome::Stopped(Signal::SIGSTOP));
        posix.resume(pid).unwrap();
        // Continuing is not a wait outcome; the next one is the exit.
        assert_eq!(posix.wait(pid).unwrap(), WaitOutcome::Exited(3));
        assert_eq!(posix.wait(pid).unwrap(), WaitOutcome::Vanished);
    }
}
