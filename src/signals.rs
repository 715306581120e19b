//! Disposition of the background terminal I/O signals (`SIGTTIN`, `SIGTTOU`).
//!
//! The shell ignores both so that handing the terminal around with
//! `tcsetpgrp` never stops the shell itself. Every launched child restores the
//! defaults before exec.

use crate::error::JobError;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

const TERMINAL_IO: [Signal; 2] = [Signal::SIGTTIN, Signal::SIGTTOU];

/// Ignore `SIGTTIN` and `SIGTTOU` in the calling process.
pub fn ignore_terminal_io() -> Result<(), JobError> {
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::all());
    install(&ignore)
}

/// Restore the default disposition of `SIGTTIN` and `SIGTTOU`.
pub fn restore_terminal_io() -> Result<(), JobError> {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    install(&default)
}

fn install(action: &SigAction) -> Result<(), JobError> {
    for signal in TERMINAL_IO {
        // SAFETY: SigIgn and SigDfl install no handler code.
        unsafe { sigaction(signal, action) }.map_err(JobError::sys("sigaction"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignore_then_restore() {
        ignore_terminal_io().unwrap();
        let previous = unsafe {
            sigaction(
                Signal::SIGTTOU,
                &SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty()),
            )
        }
        .unwrap();
        assert!(matches!(previous.handler(), SigHandler::SigIgn));

        restore_terminal_io().unwrap();
        let previous = unsafe {
            sigaction(
                Signal::SIGTTOU,
                &SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty()),
            )
        }
        .unwrap();
        assert!(matches!(previous.handler(), SigHandler::SigDfl));
    }
}
