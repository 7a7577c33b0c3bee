//! Command configuration and the flag table that fills it.
//!
//! Every setting a user can pass is listed once in [`FLAG_TABLE`], together
//! with its environment variable and the function that applies it. Values
//! from the command line win over values from the environment.

use std::time::Duration;

use certcascade_engine::{EngineConfig, RetryPolicy};
use certcascade_store::HttpStoreConfig;
use thiserror::Error;

/// Errors in user-supplied configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(String),

    #[error("invalid value {value:?} for {flag}: {reason}")]
    InvalidValue {
        flag: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// How the report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything one `bulk-regenerate` invocation needs.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// CA to rotate.
    pub root: String,
    pub store: HttpStoreConfig,
    pub engine: EngineConfig,
    /// Cancel remaining work after this long.
    pub command_timeout: Option<Duration>,
    /// Discover and print the plan without regenerating.
    pub dry_run: bool,
    pub output: OutputFormat,
    pub verbose: bool,
}

/// One user-facing setting.
pub struct FlagBinding {
    pub flag: &'static str,
    pub env: Option<&'static str>,
    pub apply: fn(&mut CliConfig, &str) -> Result<()>,
}

/// Every setting, in the order it is applied.
pub const FLAG_TABLE: &[FlagBinding] = &[
    FlagBinding {
        flag: "--signed-by",
        env: None,
        apply: apply_signed_by,
    },
    FlagBinding {
        flag: "--api",
        env: Some("CERTCASCADE_API"),
        apply: apply_api,
    },
    FlagBinding {
        flag: "--token",
        env: Some("CERTCASCADE_TOKEN"),
        apply: apply_token,
    },
    FlagBinding {
        flag: "--http-timeout",
        env: Some("CERTCASCADE_HTTP_TIMEOUT"),
        apply: apply_http_timeout,
    },
    FlagBinding {
        flag: "--timeout",
        env: None,
        apply: apply_command_timeout,
    },
    FlagBinding {
        flag: "--workers",
        env: Some("CERTCASCADE_WORKERS"),
        apply: apply_workers,
    },
    FlagBinding {
        flag: "--max-depth",
        env: None,
        apply: apply_max_depth,
    },
    FlagBinding {
        flag: "--retries",
        env: None,
        apply: apply_retries,
    },
    FlagBinding {
        flag: "--skip-tls-validation",
        env: Some("CERTCASCADE_SKIP_TLS_VALIDATION"),
        apply: apply_skip_tls_validation,
    },
    FlagBinding {
        flag: "--dry-run",
        env: None,
        apply: apply_dry_run,
    },
    FlagBinding {
        flag: "--output-json",
        env: None,
        apply: apply_output_json,
    },
    FlagBinding {
        flag: "--verbose",
        env: None,
        apply: apply_verbose,
    },
];

impl CliConfig {
    /// Build a configuration from flags given on the command line and an
    /// environment lookup.
    ///
    /// `supplied` holds `(flag, value)` pairs; boolean flags carry `"true"`.
    pub fn resolve<E>(supplied: &[(&str, String)], env: E) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        for binding in FLAG_TABLE {
            let value = supplied
                .iter()
                .find(|(flag, _)| *flag == binding.flag)
                .map(|(_, value)| value.clone())
                .or_else(|| binding.env.and_then(|name| env(name)));

            if let Some(value) = value {
                (binding.apply)(&mut config, &value)?;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.root.trim().is_empty() {
            return Err(ConfigError::Missing("--signed-by <NAME>".into()));
        }
        if self.store.api_url.trim().is_empty() {
            return Err(ConfigError::Missing("--api <URL> (or CERTCASCADE_API)".into()));
        }
        self.engine
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Parse a duration with a mandatory unit: `ms`, `s`, `m` or `h`.
pub fn parse_duration(text: &str) -> std::result::Result<Duration, String> {
    let text = text.trim();
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| "missing unit (use ms, s, m or h)".to_string())?;
    let (digits, unit) = text.split_at(split);

    let amount: u64 = digits
        .parse()
        .map_err(|_| "expected a whole number followed by a unit".to_string())?;

    let duration = match unit {
        "ms" => Duration::from_millis(amount),
        "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount.saturating_mul(60)),
        "h" => Duration::from_secs(amount.saturating_mul(3600)),
        other => return Err(format!("unknown unit {:?} (use ms, s, m or h)", other)),
    };

    if duration.is_zero() {
        return Err("must be greater than zero".into());
    }
    Ok(duration)
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" | "" => Some(false),
        _ => None,
    }
}

fn invalid(flag: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        flag,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn bool_value(flag: &'static str, value: &str) -> Result<bool> {
    parse_bool(value).ok_or_else(|| invalid(flag, value, "expected true or false"))
}

fn number<T: std::str::FromStr>(flag: &'static str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(flag, value, "expected a non-negative integer"))
}

fn apply_signed_by(config: &mut CliConfig, value: &str) -> Result<()> {
    config.root = value.trim().to_string();
    Ok(())
}

fn apply_api(config: &mut CliConfig, value: &str) -> Result<()> {
    config.store.api_url = value.trim().to_string();
    Ok(())
}

fn apply_token(config: &mut CliConfig, value: &str) -> Result<()> {
    config.store.token = Some(value.to_string()).filter(|t| !t.is_empty());
    Ok(())
}

fn apply_http_timeout(config: &mut CliConfig, value: &str) -> Result<()> {
    let timeout = parse_duration(value).map_err(|reason| invalid("--http-timeout", value, reason))?;
    config.store.timeout = timeout;
    config.engine.request_timeout = timeout;
    Ok(())
}

fn apply_command_timeout(config: &mut CliConfig, value: &str) -> Result<()> {
    let timeout = parse_duration(value).map_err(|reason| invalid("--timeout", value, reason))?;
    config.command_timeout = Some(timeout);
    Ok(())
}

fn apply_workers(config: &mut CliConfig, value: &str) -> Result<()> {
    config.engine.worker_limit = number("--workers", value)?;
    Ok(())
}

fn apply_max_depth(config: &mut CliConfig, value: &str) -> Result<()> {
    config.engine.max_depth = number("--max-depth", value)?;
    Ok(())
}

fn apply_retries(config: &mut CliConfig, value: &str) -> Result<()> {
    let max_attempts = number("--retries", value)?;
    config.engine.retry = RetryPolicy {
        max_attempts,
        ..config.engine.retry.clone()
    };
    Ok(())
}

fn apply_skip_tls_validation(config: &mut CliConfig, value: &str) -> Result<()> {
    config.store.skip_tls_validation = bool_value("--skip-tls-validation", value)?;
    Ok(())
}

fn apply_dry_run(config: &mut CliConfig, value: &str) -> Result<()> {
    config.dry_run = bool_value("--dry-run", value)?;
    Ok(())
}

fn apply_output_json(config: &mut CliConfig, value: &str) -> Result<()> {
    if bool_value("--output-json", value)? {
        config.output = OutputFormat::Json;
    }
    Ok(())
}

fn apply_verbose(config: &mut CliConfig, value: &str) -> Result<()> {
    config.verbose = bool_value("--verbose", value)?;
    Ok(())
}
