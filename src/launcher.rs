//! Turning a tokenized command line into a running program.
//!
//! Parsing ([`CommandLine::parse`]) and argument preparation happen in the
//! shell before fork. [`exec`] runs in the forked child and only returns on
//! failure.

use crate::error::JobError;
use crate::lexer::Tokens;
use crate::signals;
use nix::libc::{STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::{Pid, dup2, execvp, setpgid};
use std::convert::Infallible;
use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

/// Trailing token that requests a background launch.
pub const BACKGROUND_MARKER: &str = "&";

/// How an output redirection opens its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// `>`: create or truncate.
    Truncate,
    /// `>>`: create or append.
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRedirect {
    pub path: PathBuf,
    pub mode: OutputMode,
}

/// A single external command with shell-level markers stripped out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    argv: Vec<String>,
    input: Option<PathBuf>,
    output: Option<OutputRedirect>,
    background: bool,
}

impl CommandLine {
    /// Strips the background marker and redirections from `tokens`.
    ///
    /// At most one `<` and one of `>`/`>>` are accepted, each followed by a
    /// filename. Both the operator and the filename are removed from the
    /// argument vector.
    pub fn parse(mut tokens: Tokens) -> Result<Self, JobError> {
        let background = tokens.last() == Some(BACKGROUND_MARKER);
        if background {
            tokens.truncate(tokens.len() - 1);
        }

        let input = take_redirect(&mut tokens, &["<"], "input")?.map(|(_, path)| path);
        let output = take_redirect(&mut tokens, &[">", ">>"], "output")?.map(|(op, path)| {
            OutputRedirect {
                path,
                mode: if op == ">>" {
                    OutputMode::Append
                } else {
                    OutputMode::Truncate
                },
            }
        });

        if tokens.is_empty() {
            return Err(JobError::EmptyCommand);
        }

        Ok(Self {
            argv: tokens.into_vec(),
            input,
            output,
            background,
        })
    }

    /// Program name, used as the job's display name.
    pub fn name(&self) -> &str {
        &self.argv[0]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn input(&self) -> Option<&PathBuf> {
        self.input.as_ref()
    }

    pub fn output(&self) -> Option<&OutputRedirect> {
        self.output.as_ref()
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    /// Builds the exec-ready form of this command.
    ///
    /// With a non-zero `max_args`, arguments past the cap are dropped without
    /// an error.
    pub fn prepare(&self, max_args: usize) -> Result<PreparedCommand, JobError> {
        let keep = if max_args == 0 {
            self.argv.len()
        } else {
            self.argv.len().min(max_args)
        };
        if keep < self.argv.len() {
            tracing::warn!(
                program = %self.name(),
                dropped = self.argv.len() - keep,
                "argument vector truncated to {max_args} entries"
            );
        }

        let argv = self.argv[..keep]
            .iter()
            .map(|arg| CString::new(arg.as_bytes()).map_err(|_| JobError::InvalidArgument(arg.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PreparedCommand {
            argv,
            input: self.input.clone(),
            output: self.output.clone(),
        })
    }
}

fn take_redirect(
    tokens: &mut Tokens,
    operators: &[&'static str],
    direction: &'static str,
) -> Result<Option<(&'static str, PathBuf)>, JobError> {
    let found = operators
        .iter()
        .filter_map(|op| tokens.find(op).map(|index| (index, *op)))
        .min_by_key(|(index, _)| *index);
    let Some((index, op)) = found else {
        return Ok(None);
    };

    if index + 1 >= tokens.len() {
        return Err(JobError::MissingRedirectTarget(op));
    }
    let path = tokens.take(index + 1).map(PathBuf::from);
    tokens.take(index);

    if operators.iter().any(|op| tokens.find(op).is_some()) {
        return Err(JobError::DuplicateRedirect(direction));
    }
    Ok(path.map(|path| (op, path)))
}

/// Arguments converted to C strings ahead of fork.
#[derive(Debug)]
pub struct PreparedCommand {
    argv: Vec<CString>,
    input: Option<PathBuf>,
    output: Option<OutputRedirect>,
}

impl PreparedCommand {
    pub fn argv(&self) -> &[CString] {
        &self.argv
    }
}

/// Child-side launch: new process group, default terminal signals,
/// redirections, then exec.
///
/// Never returns on success.
pub fn exec(command: &PreparedCommand) -> Result<Infallible, JobError> {
    let own = Pid::from_raw(0);
    setpgid(own, own).map_err(JobError::sys("setpgid"))?;
    signals::restore_terminal_io()?;

    if let Some(path) = &command.input {
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|source| JobError::Open {
                path: path.clone(),
                source,
            })?;
        redirect(&file, STDIN_FILENO, "dup2 (input)")?;
    }

    if let Some(target) = &command.output {
        let mut options = OpenOptions::new();
        options.write(true).create(true).mode(0o600);
        match target.mode {
            OutputMode::Truncate => options.truncate(true),
            OutputMode::Append => options.append(true),
        };
        let file = options.open(&target.path).map_err(|source| JobError::Open {
            path: target.path.clone(),
            source,
        })?;
        redirect(&file, STDOUT_FILENO, "dup2 (output)")?;
    }

    let program = &command.argv[0];
    execvp(program, &command.argv).map_err(|errno| JobError::Exec {
        program: program.to_string_lossy().into_owned(),
        errno,
    })
}

fn redirect(file: &File, target: i32, call: &'static str) -> Result<(), JobError> {
    dup2(file.as_raw_fd(), target).map_err(JobError::sys(call))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(line: &str) -> Result<CommandLine, JobError> {
        CommandLine::parse(tokenize(line).unwrap())
    }

    #[test]
    fn test_background_marker_is_stripped() {
        let cmd = parse("sleep 5 &").unwrap();
        assert!(cmd.is_background());
        assert_eq!(cmd.argv(), ["sleep", "5"]);
        assert_eq!(cmd.name(), "sleep");
    }

    #[test]
    fn test_ampersand_only_counts_at_the_end() {
        let cmd = parse("echo & done").unwrap();
        assert!(!cmd.is_background());
        assert_eq!(cmd.argv(), ["echo", "&", "done"]);
    }

    #[test]
    fn test_redirections_are_removed_from_argv() {
        let cmd = parse("sort < in.txt -r >> out.txt &").unwrap();
        assert_eq!(cmd.argv(), ["sort", "-r"]);
        assert_eq!(cmd.input(), Some(&PathBuf::from("in.txt")));
        assert_eq!(
            cmd.output(),
            Some(&OutputRedirect {
                path: PathBuf::from("out.txt"),
                mode: OutputMode::Append,
            })
        );
        assert!(cmd.is_background());
    }

    #[test]
    fn test_truncate_redirect() {
        let cmd = parse("echo hi > out.txt").unwrap();
        assert_eq!(cmd.argv(), ["echo", "hi"]);
        assert_eq!(cmd.output().unwrap().mode, OutputMode::Truncate);
    }

    #[test]
    fn test_redirect_without_target_is_rejected() {
        assert!(matches!(
            parse("cat <"),
            Err(JobError::MissingRedirectTarget("<"))
        ));
        assert!(matches!(
            parse("echo hi >>"),
            Err(JobError::MissingRedirectTarget(">>"))
        ));
    }

    #[test]
    fn test_second_redirect_in_same_direction_is_rejected() {
        assert!(matches!(
            parse("echo a > x >> y"),
            Err(JobError::DuplicateRedirect("output"))
        ));
        assert!(matches!(
            parse("cat < a < b"),
            Err(JobError::DuplicateRedirect("input"))
        ));
    }

    #[test]
    fn test_nothing_left_to_run() {
        assert!(matches!(parse("&"), Err(JobError::EmptyCommand)));
        assert!(matches!(parse("> out.txt"), Err(JobError::EmptyCommand)));
    }

    #[test]
    fn test_prepare_caps_arguments() {
        let cmd = parse("echo 1 2 3 4 5").unwrap();

        let capped = cmd.prepare(3).unwrap();
        let args: Vec<_> = capped.argv().iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(args, ["echo", "1", "2"]);

        let uncapped = cmd.prepare(0).unwrap();
        assert_eq!(uncapped.argv().len(), 6);
    }
}
