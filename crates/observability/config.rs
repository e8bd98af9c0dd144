use std::env;
use tracing::Level;
use url::Url;

#[derive(Debug, Clone)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Debug, Clone)]
pub(crate) struct AlertConfig {
    pub(crate) webhook_url: Url,
    pub(crate) min_level: Level,
}

#[derive(Debug, Clone)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    pub(crate) alerts: Option<AlertConfig>,
    /// Logged once the subscriber is installed.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        Self::from_lookup(component, |key| env::var(key).ok())
    }

    fn from_lookup(component: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let component = component.trim().to_string();
        let non_blank = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let service_context = ServiceContext {
            service_name: non_blank("SERVICE_NAME").unwrap_or_else(|| format!("postcard-{}", component)),
            environment: non_blank("STAGE").unwrap_or_else(|| "unknown".to_string()),
            component,
        };

        let mut warnings = Vec::new();
        let enabled = match non_blank("ALERT_NOTIFY_ENABLED") {
            None => true,
            Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
                warnings.push(format!("ALERT_NOTIFY_ENABLED is not a boolean (value: {raw}); treating as enabled"));
                true
            }),
        };

        let webhook_url = match non_blank("ALERT_WEBHOOK_URL") {
            Some(raw) if enabled => match Url::parse(&raw) {
                Ok(url) => Some(url),
                Err(err) => {
                    // The URL itself carries a secret; only the parse error is reported.
                    warnings.push(format!(
                        "ALERT_WEBHOOK_URL is set but invalid; alerts disabled (parse error: {err})"
                    ));
                    None
                }
            },
            _ => None,
        };

        let alerts = webhook_url.map(|webhook_url| {
            let min_level = match non_blank("ALERT_MIN_LEVEL") {
                None => Level::ERROR,
                Some(raw) => parse_level(&raw).unwrap_or_else(|| {
                    warnings.push(format!("ALERT_MIN_LEVEL is invalid (value: {raw}); defaulting to ERROR"));
                    Level::ERROR
                }),
            };
            AlertConfig {
                webhook_url,
                min_level,
            }
        });

        Self {
            service_context,
            alerts,
            warnings,
        }
    }
}

fn parse_level(input: &str) -> Option<Level> {
    match input.trim().to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
