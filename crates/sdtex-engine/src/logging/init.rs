use std::sync::Once;

use log::LevelFilter;

/// Logger configuration.
///
/// Filter priority: `env_filter`, then `RUST_LOG`, then `level`.
/// `env_filter` follows the `env_logger` syntax (e.g. "warn",
/// "sdtex_layout=debug").
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub level: LevelFilter,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            level: LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// Maps a `-v` count onto a level: 0 = info, 1 = debug, 2+ = trace.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.level = match verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// The filter string that will be handed to `env_logger`, if any.
    fn effective_filter(&self) -> Option<String> {
        self.env_filter.clone().or_else(|| std::env::var("RUST_LOG").ok())
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.effective_filter() {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(config.level);
            }
        }

        builder.write_style(config.write_style).format_timestamp(None);

        // Another logger may already be installed (tests, embedding hosts).
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(LoggingConfig::default().level, LevelFilter::Info);
        assert_eq!(LoggingConfig::default().with_verbosity(1).level, LevelFilter::Debug);
        assert_eq!(LoggingConfig::default().with_verbosity(5).level, LevelFilter::Trace);
    }

    #[test]
    fn explicit_filter_wins() {
        let config = LoggingConfig::default().with_filter("sdtex_layout=debug");
        assert_eq!(config.effective_filter().as_deref(), Some("sdtex_layout=debug"));
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(LoggingConfig::default());
        init_logging(LoggingConfig::default().with_verbosity(2));
    }
}
