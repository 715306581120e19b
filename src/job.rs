//! Registry of jobs that are alive but not in the foreground.
//!
//! A job's display index is its position in the list, recomputed on every
//! lookup. Removing a job shifts every later index down by one.

use crate::error::JobError;
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use std::fmt;

/// Whether a tracked job is running detached from the terminal or suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Background,
    Stopped,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Background => f.write_str("background"),
            JobStatus::Stopped => f.write_str("stopped"),
        }
    }
}

/// One child process that the shell must eventually reap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pid: Pid,
    name: String,
    pub status: JobStatus,
}

impl Job {
    pub fn new(pid: Pid, name: impl Into<String>, status: JobStatus) -> Self {
        Self {
            pid,
            name: name.into(),
            status,
        }
    }

    /// Process id, which is also the job's process group id.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Program name the job was launched with.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// What a blocking wait observed about a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Exited(i32),
    Signaled(Signal),
    Stopped(Signal),
    /// The child was no longer ours to wait for (`ECHILD`).
    Vanished,
}

/// Registry effect of a [`WaitOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Status(JobStatus),
    Removed,
}

/// Maps a wait outcome onto the job state machine.
///
/// Every code path that waits on a child goes through here, so the stop/exit
/// branching lives in one place.
pub fn reconcile(outcome: WaitOutcome) -> Transition {
    match outcome {
        WaitOutcome::Stopped(_) => Transition::Status(JobStatus::Stopped),
        WaitOutcome::Exited(_) | WaitOutcome::Signaled(_) | WaitOutcome::Vanished => {
            Transition::Removed
        }
    }
}

/// Ordered collection of [`Job`]s with unique process ids.
#[derive(Debug, Default)]
pub struct JobList {
    jobs: Vec<Job>,
}

impl JobList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Appends a job and returns its display index.
    pub fn push(&mut self, job: Job) -> Result<usize, JobError> {
        if self.position(job.pid).is_some() {
            return Err(JobError::DuplicatePid(job.pid));
        }
        self.jobs.push(job);
        Ok(self.jobs.len() - 1)
    }

    pub fn get(&self, index: usize) -> Option<&Job> {
        self.jobs.get(index)
    }

    /// Like [`JobList::get`], but a missing index is an error.
    pub fn lookup(&self, index: usize) -> Result<&Job, JobError> {
        self.get(index).ok_or(JobError::IndexOutOfBounds(index))
    }

    /// Display index of the job with process id `pid`.
    pub fn position(&self, pid: Pid) -> Option<usize> {
        self.jobs.iter().position(|j| j.pid == pid)
    }

    pub fn remove(&mut self, index: usize) -> Option<Job> {
        if index < self.jobs.len() {
            Some(self.jobs.remove(index))
        } else {
            None
        }
    }

    /// Applies `transition` to the job at `index`.
    ///
    /// Returns the job when it was removed.
    pub fn apply(&mut self, index: usize, transition: Transition) -> Option<Job> {
        match transition {
            Transition::Removed => self.remove(index),
            Transition::Status(status) => {
                if let Some(job) = self.jobs.get_mut(index) {
                    job.status = status;
                }
                None
            }
        }
    }

    /// Iterates jobs together with their current display index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Job)> {
        self.jobs.iter().enumerate()
    }

    /// Writes the `jobs` listing, one `<index>: <name> (<status>)` line per job.
    pub fn write_listing(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        for (index, job) in self.iter() {
            writeln!(out, "{}: {} ({})", index, job.name, job.status)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(raw: i32) -> Pid {
        Pid::from_raw(raw)
    }

    #[test]
    fn test_duplicate_pid_is_rejected() {
        let mut jobs = JobList::new();
        assert_eq!(jobs.push(Job::new(pid(10), "sleep", JobStatus::Background)).unwrap(), 0);
        let err = jobs
            .push(Job::new(pid(10), "other", JobStatus::Stopped))
            .unwrap_err();
        assert!(matches!(err, JobError::DuplicatePid(p) if p == pid(10)));
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn test_indices_stay_contiguous_after_removal() {
        let mut jobs = JobList::new();
        for (raw, name) in [(1, "a"), (2, "b"), (3, "c")] {
            jobs.push(Job::new(pid(raw), name, JobStatus::Background)).unwrap();
        }

        jobs.remove(0);

        let listed: Vec<(usize, &str)> = jobs.iter().map(|(i, j)| (i, j.name())).collect();
        assert_eq!(listed, vec![(0, "b"), (1, "c")]);
        assert_eq!(jobs.position(pid(3)), Some(1));
    }

    #[test]
    fn test_lookup_out_of_bounds() {
        let jobs = JobList::new();
        assert!(matches!(jobs.lookup(3), Err(JobError::IndexOutOfBounds(3))));
    }

    #[test]
    fn test_reconcile_maps_outcomes() {
        assert_eq!(
            reconcile(WaitOutcome::Stopped(Signal::SIGTSTP)),
            Transition::Status(JobStatus::Stopped)
        );
        assert_eq!(reconcile(WaitOutcome::Exited(0)), Transition::Removed);
        assert_eq!(reconcile(WaitOutcome::Signaled(Signal::SIGKILL)), Transition::Removed);
        assert_eq!(reconcile(WaitOutcome::Vanished), Transition::Removed);
    }

    #[test]
    fn test_apply_updates_or_removes() {
        let mut jobs = JobList::new();
        jobs.push(Job::new(pid(7), "vim", JobStatus::Background)).unwrap();

        assert!(jobs.apply(0, Transition::Status(JobStatus::Stopped)).is_none());
        assert_eq!(jobs.get(0).unwrap().status, JobStatus::Stopped);

        let removed = jobs.apply(0, Transition::Removed).unwrap();
        assert_eq!(removed.pid(), pid(7));
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_listing_format() {
        let mut jobs = JobList::new();
        jobs.push(Job::new(pid(1), "sleep", JobStatus::Background)).unwrap();
        jobs.push(Job::new(pid(2), "vim", JobStatus::Stopped)).unwrap();

        let mut out = Vec::new();
        jobs.write_listing(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0: sleep (background)\n1: vim (stopped)\n"
        );
    }
}
