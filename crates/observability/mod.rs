mod alert_layer;
mod alert_sink;
mod config;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use alert_layer::AlertLayer;
use alert_sink::AlertSink;
use config::ObservabilityConfig;

/// Install the global subscriber for `component` (`backend`, `worker`).
///
/// Must run inside a tokio runtime when alerts are configured, since the alert sink
/// spawns its delivery task.
pub fn init_observability(component: &str) -> Result<()> {
    let mut config = ObservabilityConfig::from_env(component);

    let alert_layer = match config.alerts.as_ref() {
        Some(alerts) => match AlertSink::spawn(alerts.webhook_url.clone(), config.service_context.clone()) {
            Ok(sink) => Some(
                AlertLayer::new(sink, alerts.min_level)
                    .with_filter(LevelFilter::from_level(alerts.min_level)),
            ),
            Err(err) => {
                config.warnings.push(format!("alert sink unavailable: {err:#}"));
                None
            }
        },
        None => None,
    };
    let alerts_enabled = alert_layer.is_some();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Local offset so operators read the same clock as the host.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(alert_layer)
        .with(env_filter)
        .try_init()?;

    let context = &config.service_context;
    for warning in &config.warnings {
        warn!(
            service = %context.service_name,
            environment = %context.environment,
            component = %context.component,
            %warning,
            "observability: config warning"
        );
    }

    info!(
        service = %context.service_name,
        environment = %context.environment,
        component = %context.component,
        alerts_enabled,
        "observability: tracing initialised"
    );

    Ok(())
}
