use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_LOG_DIR: &str = "./logs";
const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost",
    "http://localhost:3000",
    "http://localhost:5173",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    /// Directory for the rolling log file; `None` keeps logging on stdout only.
    pub file_log_dir: Option<PathBuf>,
    pub cors_origins: Vec<String>,
    pub llm: LlmSettings,
}

/// Provider selection and credentials for the LLM gateway.
///
/// Values are carried as raw strings; validation happens when the gateway is
/// built so that a bad value surfaces as a configuration error, not a panic.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: String,
    pub model: Option<String>,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_base_url: String,
    pub gemini_base_url: String,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env_string("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let host = env_string("HOST")
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let file_log_dir = file_log_dir(
            env_string("ENABLE_FILE_LOGS").as_deref(),
            env_string("LOG_DIR"),
        );

        let cors_origins = env_string("CORS_ALLOWED_ORIGINS")
            .map(|raw| parse_origin_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect());

        Self {
            host,
            port,
            log_level,
            file_log_dir,
            cors_origins,
            llm: LlmSettings::from_env(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl LlmSettings {
    pub fn from_env() -> Self {
        Self {
            provider: env_string("LLM_PROVIDER").unwrap_or_else(|| "openai".to_string()),
            model: env_string("LLM_MODEL"),
            openai_api_key: env_string("OPENAI_API_KEY"),
            gemini_api_key: env_string("GEMINI_API_KEY"),
            openai_base_url: env_string("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            gemini_base_url: env_string("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            timeout: Duration::from_millis(env_u64("LLM_TIMEOUT").unwrap_or(DEFAULT_TIMEOUT_MS)),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            openai_api_key: None,
            gemini_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().trim_end_matches('/'))
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn file_log_dir(enabled: Option<&str>, dir: Option<String>) -> Option<PathBuf> {
    match enabled.map(str::trim) {
        Some("true") | Some("1") => {
            Some(PathBuf::from(dir.unwrap_or_else(|| DEFAULT_LOG_DIR.to_string())))
        }
        _ => None,
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.trim().parse().ok()
}
