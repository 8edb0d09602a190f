use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

/// Global configuration, loaded once at startup from `configuration/*.yaml`
/// and the environment. See `get_configuration`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub mailchimp: MailchimpSettings,
    pub smtp: SmtpSettings,
    pub contact: ContactSettings,
}

/// Server configuration
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

/// Mailing-list API settings, as loaded. Every credential is optional here;
/// completeness is only checked when a request needs them (`resolve`), so a
/// misconfigured list API does not prevent the contact form from working.
#[derive(Deserialize, Clone)]
pub struct MailchimpSettings {
    #[serde(default)]
    pub api_key: Option<Secret<String>>,
    #[serde(default)]
    pub audience_id: Option<String>,

    /// Data centre, e.g. `us21`. Falls back to the suffix of the API key.
    #[serde(default)]
    pub dc: Option<String>,

    /// Replaces `https://{dc}.api.mailchimp.com` entirely; only set in tests.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

/// Mail transport settings, as loaded. See `MailchimpSettings`.
#[derive(Deserialize, Clone)]
pub struct SmtpSettings {
    #[serde(default)]
    pub host: Option<String>,

    /// Kept as a string so that a bad value is reported per request, like a
    /// missing one, instead of aborting startup
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Secret<String>>,

    /// `ssl` for implicit TLS; anything else (including nothing) is STARTTLS
    #[serde(default)]
    pub security: Option<String>,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

/// Fixed copy used in contact form emails
#[derive(Deserialize, Clone)]
pub struct ContactSettings {
    /// Used in the acknowledgement sent back to the submitter
    pub site_name: String,
    /// Display name on the notification sent to the site owner
    pub notification_sender_name: String,
    /// Where notifications go; defaults to the SMTP username
    #[serde(default)]
    pub owner_address: Option<String>,
}

/// A required upstream value is absent or unusable. The offending key is only
/// ever logged, never returned to the client.
#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("missing configuration value {0}")]
    Missing(&'static str),
    #[error("invalid configuration value {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Fully resolved list API credentials
#[derive(Debug)]
pub struct MailchimpConfig {
    pub api_key: Secret<String>,
    pub audience_id: String,
    /// No trailing slash
    pub base_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportSecurity {
    /// TLS from the first byte (SMTPS, usually port 465)
    ImplicitTls,
    /// Plaintext connect, then upgrade (usually port 587)
    StartTls,
}

impl TransportSecurity {
    pub fn parse(mode: &str) -> Self {
        match mode.trim().eq_ignore_ascii_case("ssl") {
            true => Self::ImplicitTls,
            false => Self::StartTls,
        }
    }
}

impl Display for TransportSecurity {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::ImplicitTls => write!(f, "ssl"),
            Self::StartTls => write!(f, "starttls"),
        }
    }
}

/// Fully resolved mail transport settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub security: TransportSecurity,
    /// Bounds connecting and each SMTP command, as well as each send as a whole
    pub timeout: Duration,
}

/// `None` for absent and blank values alike
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(
    value: Option<&'a str>,
    key: &'static str,
) -> Result<&'a str, ConfigurationError> {
    present(value).ok_or(ConfigurationError::Missing(key))
}

/// Mailchimp API keys end with the data centre they belong to, e.g.
/// `0123456789abcdef-us21`
fn data_center_from_key(api_key: &str) -> Option<&str> {
    api_key
        .split_once('-')
        .map(|(_, dc)| dc)
        .filter(|dc| !dc.is_empty())
}

impl MailchimpSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn resolve(&self) -> Result<MailchimpConfig, ConfigurationError> {
        let api_key = required(
            self.api_key.as_ref().map(|k| k.expose_secret().as_str()),
            "MAILCHIMP_API_KEY",
        )?;
        let audience_id = required(self.audience_id.as_deref(), "MAILCHIMP_AUDIENCE_ID")?;

        let base_url = match present(self.base_url.as_deref()) {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let dc = present(self.dc.as_deref())
                    .or_else(|| data_center_from_key(api_key))
                    .ok_or(ConfigurationError::Missing("MAILCHIMP_DC"))?;
                format!("https://{dc}.api.mailchimp.com")
            }
        };

        Ok(MailchimpConfig {
            api_key: Secret::new(api_key.to_string()),
            audience_id: audience_id.to_string(),
            base_url,
        })
    }
}

impl SmtpSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn resolve(&self) -> Result<SmtpConfig, ConfigurationError> {
        let host = required(self.host.as_deref(), "SMTP_HOST")?;
        let port = required(self.port.as_deref(), "SMTP_PORT")?
            .parse::<u16>()
            .map_err(|e| ConfigurationError::Invalid {
                key: "SMTP_PORT",
                reason: e.to_string(),
            })?;
        let username = required(self.username.as_deref(), "SMTP_USER")?;
        let password = required(
            self.password.as_ref().map(|p| p.expose_secret().as_str()),
            "SMTP_PASS",
        )?;
        let security = TransportSecurity::parse(present(self.security.as_deref()).unwrap_or("tls"));

        Ok(SmtpConfig {
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: Secret::new(password.to_string()),
            security,
            timeout: self.timeout(),
        })
    }
}

impl ContactSettings {
    pub fn owner_address<'a>(
        &'a self,
        smtp: &'a SmtpConfig,
    ) -> &'a str {
        present(self.owner_address.as_deref()).unwrap_or(&smtp.username)
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )?;
        Ok(())
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!("Invalid environment: {e}")),
        }
    }
}

/// Upstream credentials keep the unprefixed names the hosting platform already
/// exports, so they are mapped onto their settings keys explicitly
const UPSTREAM_ENV_VARS: [(&str, &str); 8] = [
    ("MAILCHIMP_API_KEY", "mailchimp.api_key"),
    ("MAILCHIMP_AUDIENCE_ID", "mailchimp.audience_id"),
    ("MAILCHIMP_DC", "mailchimp.dc"),
    ("SMTP_HOST", "smtp.host"),
    ("SMTP_PORT", "smtp.port"),
    ("SMTP_USER", "smtp.username"),
    ("SMTP_PASS", "smtp.password"),
    ("SMTP_SECURE", "smtp.security"),
];

/// Load yaml configuration files at `<project_root>/configuration`, then
/// `APP_`-prefixed env vars, then the upstream env vars in
/// `UPSTREAM_ENV_VARS`.
///
/// Application settings must be present, otherwise initialisation fails and
/// the server does not start. Upstream settings may be missing; handlers
/// report that per request.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Foreign(Box::new(e)))?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or("local".to_string())
        .try_into()
        .map_err(ConfigError::Message)?;

    tracing::info!("loading config for {env} env");

    let mut builder = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            // env vars are -always- parsed as String, `serde-aux` is required to parse other
            // types.
            //
            // `APP_APPLICATION__PORT=5001` -> `Settings.application.port`
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        );

    for (var, key) in UPSTREAM_ENV_VARS {
        builder = builder.set_override_option(key, env::var(var).ok())?;
    }

    builder.build()?.try_deserialize::<Settings>()
}
