use giveaway_types::LogConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, LevelFilter};

/// Install the global subscriber.
///
/// With a configured directory, logs go to a daily rolling file and the
/// returned guard must be held until exit so buffered lines are flushed.
/// Otherwise they go to stderr.
pub fn init_logging(config: &LogConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::builder()
        .with_default_directive(default_directive(&config.level))
        .from_env_lossy();

    if let Some(directory) = &config.directory {
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("giveaway")
            .filename_suffix("log")
            .build(directory);
        match appender {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(writer)
                    .init();
                return Some(guard);
            }
            Err(e) => {
                eprintln!(
                    "Warning: cannot log to {}: {e}; using stderr",
                    directory.display()
                );
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
    None
}

/// Parse the configured level, falling back to `info`.
fn default_directive(level: &str) -> Directive {
    level
        .parse()
        .unwrap_or_else(|_| LevelFilter::INFO.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_becomes_directive() {
        assert_eq!(default_directive("debug").to_string(), "debug");
        assert_eq!(
            default_directive("giveaway_core=trace").to_string(),
            "giveaway_core=trace"
        );
    }

    #[test]
    fn garbage_level_falls_back_to_info() {
        assert_eq!(default_directive("giveaway_core=loud").to_string(), "info");
    }
}
