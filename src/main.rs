use argh::FromArgs;
use swish::config::{DEFAULT_MAX_ARGS, DEFAULT_PROMPT, LOG_ENV};
use swish::{Config, Interpreter};
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Interactive shell with job control.
struct Args {
    #[argh(option, default = "DEFAULT_PROMPT.to_owned()")]
    /// prompt printed before each line.
    prompt: String,

    #[argh(option, default = "DEFAULT_MAX_ARGS")]
    /// maximum number of arguments passed to a program, including its name; 0 disables the cap.
    max_args: usize,

    #[argh(switch, short = 'v')]
    /// log job-control activity to stderr.
    verbose: bool,
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default = if verbose { "swish=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).or_else(|_| EnvFilter::try_new(default))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    init_logging(args.verbose)?;

    let config = Config {
        prompt: args.prompt,
        max_args: args.max_args,
    };
    Interpreter::interactive(config)?.repl()
}
