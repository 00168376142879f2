use lemonstudys_core::Config;
use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber.
///
/// Precedence: `--verbose`, then `RUST_LOG`, then `log.level` from the
/// config file, then `warn`.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = Config::load()
                .map(|cfg| cfg.log.level)
                .unwrap_or_else(|_| "warn".into());
            EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("warn"))
        })
    };

    // A second init (tests, embedding) is not an error worth reporting.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
