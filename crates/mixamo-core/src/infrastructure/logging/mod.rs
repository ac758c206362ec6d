//! Logging infrastructure with file output support for release builds.

use crate::infrastructure::config::paths;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn default_filter(is_production: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if is_production {
            EnvFilter::new("info")
        } else {
            EnvFilter::new(
                "debug,chromiumoxide=info,tungstenite=info,html5ever=info,selectors=info,hyper_util=info,reqwest=info",
            )
        }
    })
}

/// Initialize logging with console and optional file output.
///
/// In release mode, logs are also written to a daily rolling file in the
/// config directory's `logs/` folder. `RUST_LOG` overrides the default filter.
pub fn setup(is_production: bool) {
    // Console layer (always enabled)
    let console_layer = fmt::layer()
        .with_target(true)
        .with_filter(default_filter(is_production));

    // File layer (for release builds)
    let file_layer = if is_production {
        let log_dir = paths::log_dir();

        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
            None
        } else {
            let file_appender =
                RollingFileAppender::new(Rotation::DAILY, &log_dir, "mixamo-downloader.log");

            Some(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(file_appender)
                    // Per-task retries and skips are worth keeping on disk
                    .with_filter(EnvFilter::new("info,mixamo_core=debug")),
            )
        }
    } else {
        None
    };

    let registry = tracing_subscriber::registry().with(console_layer);
    let result = match file_layer {
        Some(file_layer) => registry.with(file_layer).try_init(),
        None => registry.try_init(),
    };

    if let Err(e) = result {
        eprintln!("Warning: logging already initialized: {}", e);
        return;
    }

    if is_production {
        tracing::info!("File logging enabled: {:?}", paths::log_dir());
    }
    tracing::info!("Logging initialized (production={})", is_production);
}
