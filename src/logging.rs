// src/logging.rs

//! Logging setup for the `repkg` binary
//!
//! The library only emits `tracing` events. The binary installs a
//! subscriber once, writing to stderr so stdout stays usable for scripts.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// How much to log, resolved from the config file and the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Base filter directive from the configuration file
    pub level: String,
    /// Number of `-v` flags
    pub verbose: u8,
    /// `-q` given
    pub quiet: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            verbose: 0,
            quiet: false,
        }
    }
}

impl LogSettings {
    /// Filter directive derived from these settings
    ///
    /// `-q` wins over `-v`; each `-v` raises the level one step above
    /// the configured one. A configured directive that is not a plain
    /// level (`repkg=debug`) is kept and a raised `warn` default is put in
    /// front of it.
    pub fn directive(&self) -> String {
        if self.quiet {
            return "error".to_string();
        }
        if self.verbose == 0 {
            return self.level.clone();
        }

        match self.level.trim().parse::<LevelFilter>() {
            Ok(base) => raise(base, self.verbose).to_string(),
            Err(_) => format!("{},{}", raise(LevelFilter::WARN, self.verbose), self.level),
        }
    }
}

const LEVELS: [(LevelFilter, &str); 6] = [
    (LevelFilter::OFF, "off"),
    (LevelFilter::ERROR, "error"),
    (LevelFilter::WARN, "warn"),
    (LevelFilter::INFO, "info"),
    (LevelFilter::DEBUG, "debug"),
    (LevelFilter::TRACE, "trace"),
];

/// Name of the level `steps` above `base`, capped at `trace`
fn raise(base: LevelFilter, steps: u8) -> &'static str {
    let pos = LEVELS.iter().position(|(level, _)| *level == base).unwrap_or(2);
    LEVELS[(pos + steps as usize).min(LEVELS.len() - 1)].1
}

/// Install the global subscriber; `RUST_LOG` overrides `settings`
pub fn init(settings: &LogSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.directive()));

    // a second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
