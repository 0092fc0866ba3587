use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Dashboard token introspection endpoint
    pub auth_introspect_url: String,
    /// Remote triage endpoint; keyword triage is used when unset
    pub triage_url: Option<String>,
    pub pager_url: Option<String>,
    pub reply_url: Option<String>,
    /// Shared secret platform bridges send in `x-ingest-token`
    pub ingest_token: Option<String>,
    /// Comma-separated `ALLOWED_SOURCES`; empty accepts every chat
    pub allowed_sources: Vec<String>,
    pub escalation_max_retries: u32,
    pub escalation_retry_delay: Duration,
    pub thread_window: Duration,
    pub hub_baseline_limit: usize,
    pub hub_session_timeout: Duration,
    pub hub_sweep_interval: Duration,
    pub otel_exporter_endpoint: Option<String>,
    pub service_name: String,
    /// `None` disables the Prometheus listener (METRICS_PORT=0)
    pub metrics_port: Option<u16>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = optional("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://triagedesk.db?mode=rwc".to_string());

        let server_host = optional("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let server_port = optional("SERVER_PORT")
            .unwrap_or_else(|| "3001".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let auth_introspect_url =
            optional("AUTH_INTROSPECT_URL").ok_or(ConfigError::MissingIntrospectUrl)?;

        let metrics_port: u16 = parse_or(&optional, "METRICS_PORT", 9000)?;

        Ok(Config {
            database_url,
            server_host,
            server_port,
            auth_introspect_url,
            triage_url: optional("TRIAGE_URL"),
            pager_url: optional("PAGER_URL"),
            reply_url: optional("REPLY_URL"),
            ingest_token: optional("INGEST_TOKEN"),
            allowed_sources: optional("ALLOWED_SOURCES")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            escalation_max_retries: parse_nonzero(&optional, "ESCALATION_MAX_RETRIES", 2)?,
            escalation_retry_delay: Duration::from_secs(parse_or(
                &optional,
                "ESCALATION_RETRY_DELAY_SECS",
                30,
            )?),
            thread_window: Duration::from_secs(parse_or(&optional, "THREAD_WINDOW_SECS", 600)?),
            hub_baseline_limit: parse_or(&optional, "HUB_BASELINE_LIMIT", 20)?,
            hub_session_timeout: Duration::from_secs(parse_nonzero(
                &optional,
                "HUB_SESSION_TIMEOUT_SECS",
                30,
            )?),
            hub_sweep_interval: Duration::from_secs(parse_nonzero(
                &optional,
                "HUB_SWEEP_INTERVAL_SECS",
                15,
            )?),
            otel_exporter_endpoint: optional("OTEL_EXPORTER_OTLP_ENDPOINT"),
            service_name: optional("SERVICE_NAME").unwrap_or_else(|| "triagedesk".to_string()),
            metrics_port: (metrics_port != 0).then_some(metrics_port),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}

/// Like `parse_or`, but zero is rejected
fn parse_nonzero<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, key, default)?;
    if value == T::default() {
        return Err(ConfigError::InvalidValue {
            key,
            value: lookup(key).unwrap_or_default(),
        });
    }
    Ok(value)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("AUTH_INTROSPECT_URL environment variable not set")]
    MissingIntrospectUrl,

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("AUTH_INTROSPECT_URL", "http://auth/introspect")]).unwrap();

        assert_eq!(config.server_port, 3001);
        assert_eq!(config.escalation_max_retries, 2);
        assert_eq!(config.escalation_retry_delay, Duration::from_secs(30));
        assert_eq!(config.thread_window, Duration::from_secs(600));
        assert_eq!(config.hub_baseline_limit, 20);
        assert_eq!(config.hub_session_timeout, Duration::from_secs(30));
        assert_eq!(config.hub_sweep_interval, Duration::from_secs(15));
        assert_eq!(config.metrics_port, Some(9000));
        assert!(config.triage_url.is_none());
        assert!(config.allowed_sources.is_empty());
    }

    #[test]
    fn test_allowed_sources_are_split_and_trimmed() {
        let config = config_from(&[
            ("AUTH_INTROSPECT_URL", "http://auth/introspect"),
            ("ALLOWED_SOURCES", "telegram:-100777, C024BE91L,,"),
        ])
        .unwrap();
        assert_eq!(config.allowed_sources, vec!["telegram:-100777", "C024BE91L"]);
    }

    #[test]
    fn test_introspect_url_required() {
        assert!(matches!(
            config_from(&[]),
            Err(ConfigError::MissingIntrospectUrl)
        ));
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let err = config_from(&[
            ("AUTH_INTROSPECT_URL", "http://auth/introspect"),
            ("ESCALATION_MAX_RETRIES", "many"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("ESCALATION_MAX_RETRIES"));
    }

    #[test]
    fn test_zero_is_rejected_where_it_would_disable_a_loop() {
        for key in [
            "ESCALATION_MAX_RETRIES",
            "HUB_SESSION_TIMEOUT_SECS",
            "HUB_SWEEP_INTERVAL_SECS",
        ] {
            let err = config_from(&[
                ("AUTH_INTROSPECT_URL", "http://auth/introspect"),
                (key, "0"),
            ])
            .unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { key: k, .. } if k == key),
                "{} accepted zero",
                key
            );
        }
    }

    #[test]
    fn test_metrics_port_zero_disables_exporter() {
        let config = config_from(&[
            ("AUTH_INTROSPECT_URL", "http://auth/introspect"),
            ("METRICS_PORT", "0"),
        ])
        .unwrap();
        assert_eq!(config.metrics_port, None);
    }
}
