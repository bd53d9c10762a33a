use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` uses `env_logger` filter syntax, e.g. `"kiln_engine=debug,wgpu=warn"`.
/// When unset, `RUST_LOG` is consulted, then `default_level`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_level: log::LevelFilter,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

/// Filter directives the logger will be built with.
pub(crate) fn resolve_filter(config: &LoggingConfig, rust_log: Option<String>) -> String {
    config
        .env_filter
        .clone()
        .or(rust_log)
        .filter(|f| !f.trim().is_empty())
        // wgpu internals are chatty at info.
        .unwrap_or_else(|| format!("{},wgpu_core=warn,wgpu_hal=warn,naga=warn", config.default_level))
}

static INIT: Once = Once::new();

/// Installs the global logger. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = resolve_filter(&config, std::env::var("RUST_LOG").ok());

        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&filter);
        builder.write_style(config.write_style);

        // Another logger may already be installed (tests, embedding hosts).
        if builder.try_init().is_err() {
            return;
        }
        log::debug!("logging initialized ({filter})");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins_over_env() {
        let config = LoggingConfig {
            env_filter: Some("kiln_engine=trace".into()),
            ..LoggingConfig::default()
        };
        assert_eq!(
            resolve_filter(&config, Some("warn".into())),
            "kiln_engine=trace"
        );
    }

    #[test]
    fn env_is_used_when_no_explicit_filter() {
        let config = LoggingConfig::default();
        assert_eq!(resolve_filter(&config, Some("debug".into())), "debug");
    }

    #[test]
    fn default_level_quiets_wgpu() {
        let config = LoggingConfig {
            default_level: log::LevelFilter::Debug,
            ..LoggingConfig::default()
        };
        let filter = resolve_filter(&config, Some("  ".into()));
        assert!(filter.starts_with("DEBUG,"));
        assert!(filter.contains("wgpu_core=warn"));
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(LoggingConfig::default());
        init_logging(LoggingConfig::default());
    }
}
