use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

/// reCAPTCHA Enterprise settings used for the assessment call.
#[derive(Clone, Debug)]
pub struct RecaptchaConfig {
    pub project_id: String,
    pub site_key: String,
    pub api_key: String,
}

/// Resend settings plus the two addresses the contact flow writes from and to.
#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub api_key: String,
    pub from_address: String,
    pub agency_inbox: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub frontend_url: String,
    pub static_dir: Option<PathBuf>,
    pub sentry_dsn: Option<String>,
}

// Empty values count as unset, same as a missing variable.
fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn optional<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn env_lookup(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

impl RecaptchaConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            project_id: required(&lookup, "RECAPTCHA_PROJECT_ID")?,
            site_key: required(&lookup, "RECAPTCHA_SITE_KEY")?,
            api_key: required(&lookup, "RECAPTCHA_API_KEY")?,
        })
    }
}

impl EmailConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_key: required(&lookup, "RESEND_API_KEY")?,
            from_address: required(&lookup, "CONTACT_FROM_EMAIL")?,
            agency_inbox: required(&lookup, "CONTACT_TO_EMAIL")?,
        })
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match optional(&lookup, "PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let frontend_url =
            optional(&lookup, "FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string());
        if !(frontend_url.starts_with("http://") || frontend_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "FRONTEND_URL",
                reason: format!("expected an http(s) origin, got {}", frontend_url),
            });
        }

        Ok(Self {
            port,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
            static_dir: optional(&lookup, "STATIC_DIR").map(PathBuf::from),
            sentry_dsn: optional(&lookup, "SENTRY_DSN"),
        })
    }
}
