//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set. Otherwise `--verbose` forces `debug`, then the
//! `[logging]` level applies. Unknown levels and formats fall back to
//! `info` and `json`. Logs go to stderr so chat output stays clean.

use assist_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

pub fn init(settings: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { settings.level_or_default() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},hyper=warn,reqwest=warn")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if settings.format_or_default() == "text" {
        builder.init();
    } else {
        builder.json().init();
    }
}
