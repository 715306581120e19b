//! A small interactive shell with job control.
//!
//! Every external command runs in its own process group. Foreground commands
//! are given the controlling terminal while the shell blocks on them; commands
//! ending in `&` run in the background. Stopped and background commands are
//! tracked as jobs and can be managed with `jobs`, `fg`, `bg`, `wait-for` and
//! `wait-all`. A command may carry one input (`<`) and one output (`>` or `>>`)
//! redirection.
//!
//! The main entry point is [`Interpreter`]. The job-control core lives in
//! [`control`], with the registry in [`job`] and the operating-system seams in
//! [`terminal`] and [`process`].

mod builtin;
pub mod command;
pub mod config;
pub mod control;
pub mod env;
pub mod error;
mod external;
mod interpreter;
pub mod job;
pub mod launcher;
pub mod lexer;
pub mod process;
pub mod signals;
pub mod terminal;

pub use config::Config;
pub use error::JobError;
pub use interpreter::Interpreter;
