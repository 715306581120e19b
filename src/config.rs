/// Prompt printed before every line.
pub const DEFAULT_PROMPT: &str = "@> ";

/// Largest argument vector handed to a program, program name included.
pub const DEFAULT_MAX_ARGS: usize = 10;

/// Environment variable holding the log filter (`tracing_subscriber::EnvFilter` syntax).
pub const LOG_ENV: &str = "SWISH_LOG";

/// Interactive session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prompt: String,
    /// Arguments past this count are dropped; 0 means no cap.
    pub max_args: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_owned(),
            max_args: DEFAULT_MAX_ARGS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.prompt, "@> ");
        assert_eq!(config.max_args, 10);
    }
}
