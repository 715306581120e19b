//! Ownership of the controlling terminal's foreground process group.
//!
//! The foreground group is process-wide state owned by the terminal. The
//! coordinator only touches it through a [`TerminalControl`] value, so the
//! order of transfers relative to waits is visible at the call sites.

use crate::error::JobError;
use nix::unistd::{Pid, getpgrp, tcsetpgrp};
use std::io::IsTerminal;

/// Capability to hand the terminal to a process group and take it back.
pub trait TerminalControl {
    /// Makes `pgid` the terminal's foreground process group.
    fn transfer_to(&mut self, pgid: Pid) -> Result<(), JobError>;

    /// Makes the shell's own process group the foreground group again.
    fn restore_to_self(&mut self) -> Result<(), JobError>;
}

/// The controlling terminal behind standard input.
#[derive(Debug)]
pub struct Tty {
    shell_pgid: Pid,
}

impl Tty {
    /// Remembers the shell's current process group as the one to restore to.
    pub fn new() -> Self {
        Self {
            shell_pgid: getpgrp(),
        }
    }

    pub fn shell_pgid(&self) -> Pid {
        self.shell_pgid
    }
}

impl TerminalControl for Tty {
    fn transfer_to(&mut self, pgid: Pid) -> Result<(), JobError> {
        tracing::debug!(%pgid, "terminal -> job");
        tcsetpgrp(std::io::stdin(), pgid).map_err(JobError::sys("tcsetpgrp"))
    }

    fn restore_to_self(&mut self) -> Result<(), JobError> {
        tracing::debug!(pgid = %self.shell_pgid, "terminal -> shell");
        tcsetpgrp(std::io::stdin(), self.shell_pgid)
            .map_err(JobError::sys("tcsetpgrp (restore shell)"))
    }
}

/// Stand-in used when standard input is not a terminal (scripts, pipes).
///
/// There is no foreground group to hand over, so both operations succeed
/// without doing anything.
#[derive(Debug, Default)]
pub struct Detached;

impl TerminalControl for Detached {
    fn transfer_to(&mut self, _pgid: Pid) -> Result<(), JobError> {
        Ok(())
    }

    fn restore_to_self(&mut self) -> Result<(), JobError> {
        Ok(())
    }
}

/// Picks [`Tty`] when standard input is a terminal and [`Detached`] otherwise.
pub fn detect() -> Box<dyn TerminalControl> {
    if std::io::stdin().is_terminal() {
        Box::new(Tty::new())
    } else {
        tracing::debug!("stdin is not a terminal; job control runs detached");
        Box::new(Detached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_accepts_everything() {
        let mut terminal = Detached;
        assert!(terminal.transfer_to(Pid::from_raw(12345)).is_ok());
        assert!(terminal.restore_to_self().is_ok());
    }

    #[test]
    fn test_tty_remembers_shell_group() {
        assert_eq!(Tty::new().shell_pgid(), getpgrp());
    }
}
