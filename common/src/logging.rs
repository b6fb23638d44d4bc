//! Logger setup shared by the probe binaries.

use std::sync::Once;

use crate::util::DebugStringWriter;

/// `env_filter` follows the `env_logger` filter syntax, e.g. "debug" or
/// "common=trace,probe_device=info".
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
}

static INIT: Once = Once::new();

/// Initializes the global logger once. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        builder
            .write_style(env_logger::WriteStyle::Never)
            .target(env_logger::Target::Pipe(Box::new(
                DebugStringWriter::default(),
            )));

        if builder.try_init().is_err() {
            print_fallback("a logger was already installed");
        }

        log::debug!("logging initialized");
    });
}

fn print_fallback(reason: &str) {
    crate::util::print_debug_string(&format!("logging: {reason}\n"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_logging(LoggingConfig {
            env_filter: Some("debug".into()),
        });
        init_logging(LoggingConfig {
            env_filter: Some("error".into()),
        });
        assert_eq!(log::max_level(), log::LevelFilter::Debug);
        log::info!("still logging");
    }
}
