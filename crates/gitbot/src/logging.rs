use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "GITBOT_LOG";

/// Install the stderr subscriber.
///
/// `GITBOT_LOG` wins over the configured level; both fall back to `warn`.
pub(crate) fn init_tracing(configured: Option<&str>) {
    let builder = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(LOG_ENV);

    let env_filter = match configured {
        Some(level) if std::env::var_os(LOG_ENV).is_none() => builder.parse_lossy(level),
        _ => builder.from_env_lossy(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
