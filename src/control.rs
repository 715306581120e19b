//! Job control: who owns the terminal, who the shell blocks on, and what the
//! registry looks like afterwards.
//!
//! Ordering rules for foreground work:
//! - the child's process group exists before the terminal is transferred;
//! - the terminal is transferred before the shell blocks in wait;
//! - the terminal is restored after wait returns, whatever it returned.

use crate::error::JobError;
use crate::job::{Job, JobList, JobStatus, Transition, WaitOutcome, reconcile};
use crate::launcher::CommandLine;
use crate::process::ProcessControl;
use crate::terminal::TerminalControl;
use nix::unistd::Pid;

/// Where a resumed job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    Foreground,
    Background,
}

/// Result of [`JobControl::launch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launched {
    /// Registered as a background job at this display index.
    Background(usize),
    /// Ran in the foreground and stopped; registered at this display index.
    Stopped(usize, WaitOutcome),
    /// Ran in the foreground to completion.
    Finished(WaitOutcome),
}

/// Coordinates launches and resumptions with the terminal and the registry.
pub struct JobControl {
    jobs: JobList,
    terminal: Box<dyn TerminalControl>,
    processes: Box<dyn ProcessControl>,
}

impl JobControl {
    pub fn new(terminal: Box<dyn TerminalControl>, processes: Box<dyn ProcessControl>) -> Self {
        Self {
            jobs: JobList::new(),
            terminal,
            processes,
        }
    }

    pub fn jobs(&self) -> &JobList {
        &self.jobs
    }

    /// Starts `command`, blocking on it unless it carries the background marker.
    pub fn launch(&mut self, command: &CommandLine) -> Result<Launched, JobError> {
        let pid = self.processes.spawn(command)?;

        if command.is_background() {
            let index = self.track(pid, command.name(), JobStatus::Background)?;
            return Ok(Launched::Background(index));
        }

        if let Err(err) = self.terminal.transfer_to(pid) {
            // The child is already running; keep it reapable.
            self.track(pid, command.name(), JobStatus::Background)?;
            return Err(err);
        }

        let (waited, restored) = self.wait_in_foreground(pid);
        let outcome = match waited {
            Ok(outcome) => outcome,
            Err(err) => {
                self.track(pid, command.name(), JobStatus::Background)?;
                return Err(err);
            }
        };

        let launched = match reconcile(outcome) {
            Transition::Removed => Launched::Finished(outcome),
            Transition::Status(status) => {
                Launched::Stopped(self.track(pid, command.name(), status)?, outcome)
            }
        };
        restored.map(|()| launched)
    }

    /// Continues the job at `index` in the foreground or background.
    pub fn resume(&mut self, index: usize, mode: Resume) -> Result<(), JobError> {
        let pid = self.jobs.lookup(index)?.pid();

        match mode {
            Resume::Background => {
                self.processes.resume(pid)?;
                self.jobs.apply(index, Transition::Status(JobStatus::Background));
                Ok(())
            }
            Resume::Foreground => {
                self.terminal.transfer_to(pid)?;
                if let Err(err) = self.processes.resume(pid) {
                    if let Err(restore) = self.terminal.restore_to_self() {
                        tracing::error!(%restore, "terminal not restored after failed resume");
                    }
                    return Err(err);
                }

                let (waited, restored) = self.wait_in_foreground(pid);
                match waited {
                    Ok(outcome) => self.settle(index, outcome),
                    Err(err) => {
                        // It was continued; that much is known.
                        self.jobs.apply(index, Transition::Status(JobStatus::Background));
                        return Err(err);
                    }
                }
                restored
            }
        }
    }

    /// Blocks on the background job at `index` until it exits or stops.
    pub fn await_one(&mut self, index: usize) -> Result<(), JobError> {
        let job = self.jobs.lookup(index)?;
        if job.status != JobStatus::Background {
            return Err(JobError::NotBackground(index));
        }
        let outcome = self.processes.wait(job.pid())?;
        self.settle(index, outcome);
        Ok(())
    }

    /// Blocks on every background job in turn. Stopped jobs are skipped.
    pub fn await_all(&mut self) -> Result<(), JobError> {
        let mut index = 0;
        while let Some(job) = self.jobs.get(index) {
            if job.status != JobStatus::Background {
                index += 1;
                continue;
            }
            let outcome = self.processes.wait(job.pid())?;
            let transition = reconcile(outcome);
            self.settle(index, outcome);
            if transition != Transition::Removed {
                index += 1;
            }
        }
        Ok(())
    }

    fn wait_in_foreground(&mut self, pid: Pid) -> (Result<WaitOutcome, JobError>, Result<(), JobError>) {
        let waited = self.processes.wait(pid);
        let restored = self.terminal.restore_to_self();
        if let Err(err) = &restored {
            tracing::error!(%err, "terminal not restored to shell");
        }
        (waited, restored)
    }

    fn track(&mut self, pid: Pid, name: &str, status: JobStatus) -> Result<usize, JobError> {
        let index = self.jobs.push(Job::new(pid, name, status))?;
        tracing::debug!(%pid, index, %status, "tracking job");
        Ok(index)
    }

    fn settle(&mut self, index: usize, outcome: WaitOutcome) {
        match self.jobs.apply(index, reconcile(outcome)) {
            Some(job) => tracing::debug!(pid = %job.pid(), ?outcome, "job reaped"),
            None => tracing::debug!(index, ?outcome, "job updated"),
        }
    }
}
