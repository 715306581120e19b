use nix::errno::Errno;
use nix::unistd::Pid;
use std::path::PathBuf;

/// Errors raised by the job-control core.
///
/// User errors (bad index, wrong job state, malformed command line) and
/// resource errors (failed system calls) share one type; neither is fatal to
/// the shell.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Job index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    #[error("Job index is for stopped process not background process: {0}")]
    NotBackground(usize),

    #[error("process {0} is already tracked")]
    DuplicatePid(Pid),

    #[error("empty command")]
    EmptyCommand,

    #[error("missing filename after `{0}`")]
    MissingRedirectTarget(&'static str),

    #[error("more than one {0} redirection")]
    DuplicateRedirect(&'static str),

    #[error("argument contains a NUL byte: {0:?}")]
    InvalidArgument(String),

    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{call}: {errno}")]
    Sys {
        call: &'static str,
        #[source]
        errno: Errno,
    },

    #[error("{program}: {errno}")]
    Exec {
        program: String,
        #[source]
        errno: Errno,
    },
}

impl JobError {
    pub(crate) fn sys(call: &'static str) -> impl FnOnce(Errno) -> JobError {
        move |errno| JobError::Sys { call, errno }
    }
}
