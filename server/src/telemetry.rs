use color_eyre::eyre::WrapErr;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};
use tracing_tree::HierarchicalLayer;

const DEFAULT_FILTER: &str = "info,newsletter_navigator=debug,tower_http=debug";

/// Install the global subscriber: `RUST_LOG` style filtering over an indented tree
pub fn setup_tracing() -> color_eyre::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .wrap_err("Invalid log filter")?;

    let hierarchical = HierarchicalLayer::default()
        .with_writer(std::io::stdout)
        .with_indent_lines(true)
        .with_indent_amount(2)
        .with_thread_names(true)
        .with_thread_ids(true)
        .with_verbose_exit(true)
        .with_verbose_entry(true)
        .with_targets(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(hierarchical)
        .with(sentry::integrations::tracing::layer())
        .try_init()
        .wrap_err("Failed to install tracing subscriber")?;

    Ok(())
}

/// Start Sentry when `SENTRY_DSN` is set. Keep the guard alive for the life of the process.
pub fn setup_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok()?;
    let dsn = match dsn.parse::<sentry::types::Dsn>() {
        Ok(dsn) => dsn,
        Err(e) => {
            eprintln!("Ignoring invalid SENTRY_DSN: {e}");
            return None;
        }
    };

    Some(sentry::init(sentry::ClientOptions {
        dsn: Some(dsn),
        release: sentry::release_name!(),
        traces_sample_rate: 1.0,
        ..Default::default()
    }))
}
