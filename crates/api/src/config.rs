use std::env;
use std::time::Duration;

const DEFAULT_PORT: &str = "8000";
const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_RATE_LIMIT_WINDOW_SECONDS: u64 = 60;
const DEFAULT_RATE_LIMIT_MAX: usize = 30;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: String,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bind = lookup("PAGESPLIT_BIND")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| {
                let port = lookup("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
                format!("0.0.0.0:{}", port.trim())
            });

        let allowed_origins = lookup("PAGESPLIT_ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().trim_end_matches('/').to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_else(|| {
                DEFAULT_ALLOWED_ORIGINS
                    .iter()
                    .map(|origin| origin.to_string())
                    .collect()
            });

        let max_upload_bytes = lookup("PAGESPLIT_MAX_UPLOAD_BYTES")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let rate_limit_window = Duration::from_secs(
            lookup("PAGESPLIT_RATE_LIMIT_WINDOW_SECONDS")
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECONDS),
        );

        let rate_limit_max = lookup("PAGESPLIT_RATE_LIMIT_MAX")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_RATE_LIMIT_MAX);

        Self {
            bind,
            allowed_origins,
            max_upload_bytes,
            rate_limit_window,
            rate_limit_max,
        }
    }
}
