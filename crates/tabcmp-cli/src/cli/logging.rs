//! stderr logging for the `tabcmp` binary.
//!
//! `RUST_LOG` wins when set. Otherwise the level follows the verbosity flags:
//! `-q` keeps warnings only, no flag is `info`, `-v` is `debug` and `-vv` or
//! more is `trace`. Third-party crates stay at `warn`.

use std::io;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub(super) fn level_for(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::WARN;
    }
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs the global subscriber. A second call is a no-op.
pub(super) fn init_logging(level: Level) {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .without_time();

    // Already installed when `run` is called more than once in a process.
    let _ = tracing_subscriber::registry()
        .with(build_env_filter(level))
        .with(layer)
        .try_init();
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_str().to_lowercase();
        EnvFilter::new(format!(
            "warn,tabcmp={level},tabcmp_core={level},tabcmp_cli={level}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::level_for;
    use tracing::Level;

    #[test]
    fn verbosity_flags_pick_level() {
        assert_eq!(level_for(0, false), Level::INFO);
        assert_eq!(level_for(1, false), Level::DEBUG);
        assert_eq!(level_for(3, false), Level::TRACE);
        assert_eq!(level_for(2, true), Level::WARN);
    }
}
