use std::sync::Arc;

use anyhow::Result;
use helpdesk_common::{HelpdeskConfig, LogFormat};
use time::macros::format_description;
use time::UtcOffset;
use tracing_subscriber::filter::dynamic_filter_fn;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub fn init_logging(config: Option<&HelpdeskConfig>) -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "helpdesk=info")
    }

    tracing_log::LogTracer::init()?;

    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let env_filter = Arc::new(EnvFilter::from_default_env());
    let enable_colors = console::user_attended();
    let format = config.map(|c| c.store.log.format).unwrap_or_default();

    let json_layer = (format == LogFormat::Json).then(|| {
        let env_filter = env_filter.clone();
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_filter(dynamic_filter_fn(move |m, c| {
                env_filter.enabled(m, c.clone())
            }))
    });

    let full_fmt_layer = (format == LogFormat::Text && !enable_colors).then(|| {
        let env_filter = env_filter.clone();
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_timer(OffsetTime::new(
                offset,
                format_description!("[day].[month].[year] [hour]:[minute]:[second]"),
            ))
            .with_filter(dynamic_filter_fn(move |m, c| {
                env_filter.enabled(m, c.clone())
            }))
    });

    let compact_fmt_layer = (format == LogFormat::Text && enable_colors).then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(true)
            .with_target(false)
            .with_timer(OffsetTime::new(
                offset,
                format_description!("[hour]:[minute]:[second]"),
            ))
            .with_filter(dynamic_filter_fn(move |m, c| {
                env_filter.enabled(m, c.clone())
            }))
    });

    tracing_subscriber::registry()
        .with(json_layer)
        .with(full_fmt_layer)
        .with(compact_fmt_layer)
        .try_init()?;

    Ok(())
}
