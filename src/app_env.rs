use anyhow::{Context, anyhow};
use std::path::PathBuf;

/// Port the HTTP server listens on
pub const PORT: &str = "PORT";
/// Set to "development" to get human-readable logs instead of JSON
pub const APP_ENV: &str = "APP_ENV";
/// Older name for [APP_ENV], read when [APP_ENV] is unset
pub const FLASK_ENV: &str = "FLASK_ENV";
/// Log level configuration for the application. For formatting info, see [EnvFilter's documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// Host of the SMTP relay verification codes get mailed through
pub const EMAIL_SMTP_SERVER: &str = "EMAIL_SMTP_SERVER";
pub const EMAIL_SMTP_PORT: &str = "EMAIL_SMTP_PORT";
/// Sender address, also used as the SMTP login. Mail is disabled without it.
pub const EMAIL_SENDER: &str = "EMAIL_SENDER";
/// SMTP password. Mail is disabled without it.
pub const EMAIL_PASSWORD: &str = "EMAIL_PASSWORD";
/// Whether a verification code is handed back in the response when mailing it fails
pub const VERIFICATION_DEMO_FALLBACK: &str = "VERIFICATION_DEMO_FALLBACK";

/// Explicit location of the yt-dlp binary. Looked up on the `PATH` when unset.
pub const YTDLP_PATH: &str = "YTDLP_PATH";

/// OpenTelemetry span export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_SPAN_EXPORT_URL: &str = "OTEL_SPAN_EXPORT_URL";
/// OpenTelemetry metrics export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_METRIC_EXPORT_URL: &str = "OTEL_METRIC_EXPORT_URL";

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtelEndpoints {
    pub spans: String,
    pub metrics: String,
}

/// Application settings, read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub listen_port: u16,
    pub debug: bool,
    pub mail: Option<MailSettings>,
    pub demo_code_fallback: bool,
    pub ytdlp_path: Option<PathBuf>,
    pub otel: Option<OtelEndpoints>,
}

impl AppConfig {
    pub fn from_env() -> Result<AppConfig, anyhow::Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through [lookup], which returns the value of a variable if it's set.
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<AppConfig, anyhow::Error> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let listen_port = match get(PORT) {
            Some(port) => parse_port(PORT, &port)?,
            None => DEFAULT_PORT,
        };

        let mail = match (get(EMAIL_SENDER), get(EMAIL_PASSWORD)) {
            (Some(sender), Some(password)) => Some(MailSettings {
                smtp_server: get(EMAIL_SMTP_SERVER).unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_owned()),
                smtp_port: match get(EMAIL_SMTP_PORT) {
                    Some(port) => parse_port(EMAIL_SMTP_PORT, &port)?,
                    None => DEFAULT_SMTP_PORT,
                },
                sender,
                password,
            }),
            _ => None,
        };

        let demo_code_fallback = match get(VERIFICATION_DEMO_FALLBACK) {
            Some(flag) => parse_flag(VERIFICATION_DEMO_FALLBACK, &flag)?,
            None => true,
        };

        let otel = match (get(OTEL_SPAN_EXPORT_URL), get(OTEL_METRIC_EXPORT_URL)) {
            (Some(spans), Some(metrics)) => Some(OtelEndpoints { spans, metrics }),
            _ => None,
        };

        Ok(AppConfig {
            listen_port,
            debug: get(APP_ENV)
                .or_else(|| get(FLASK_ENV))
                .is_some_and(|env| env.eq_ignore_ascii_case("development")),
            mail,
            demo_code_fallback,
            ytdlp_path: get(YTDLP_PATH).map(PathBuf::from),
            otel,
        })
    }
}

fn parse_port(name: &str, value: &str) -> Result<u16, anyhow::Error> {
    value
        .trim()
        .parse()
        .with_context(|| format!("{name} must be a port number, got \"{value}\""))
}

fn parse_flag(name: &str, value: &str) -> Result<bool, anyhow::Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("{name} must be true or false, got \"{value}\"")),
    }
}
