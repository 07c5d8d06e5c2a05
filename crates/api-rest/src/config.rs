//! HTTP server configuration.

use anyhow::Context;
use axum::http::HeaderValue;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_RATE_LIMIT_MAX: u32 = 100;
const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Listener, CORS and rate-limit settings, resolved once at startup.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    addr: String,
    cors_origin: HeaderValue,
    rate_limit_max: u32,
    rate_limit_window: Duration,
}

impl ServerConfig {
    /// Read `WALLPAPER_REST_ADDR`, `PORT`, `CORS_ORIGIN`, `RATE_LIMIT_MAX` and
    /// `RATE_LIMIT_WINDOW_SECS` from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is not a valid port number, `CORS_ORIGIN`
    /// is not a valid header value, or a rate-limit value is not a positive
    /// integer.
    pub fn from_env() -> anyhow::Result<Self> {
        let cfg = Self::from_env_values(
            std::env::var("WALLPAPER_REST_ADDR").ok(),
            std::env::var("PORT").ok(),
            std::env::var("CORS_ORIGIN").ok(),
        )?;
        cfg.with_rate_limit_values(
            std::env::var("RATE_LIMIT_MAX").ok(),
            std::env::var("RATE_LIMIT_WINDOW_SECS").ok(),
        )
    }

    /// Resolve configuration from optional raw values.
    ///
    /// An explicit address wins over `port`. Blank values count as unset.
    pub fn from_env_values(
        addr: Option<String>,
        port: Option<String>,
        cors_origin: Option<String>,
    ) -> anyhow::Result<Self> {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let addr = match non_blank(addr) {
            Some(addr) => addr.trim().to_string(),
            None => {
                let port = match non_blank(port) {
                    Some(p) => p
                        .trim()
                        .parse::<u16>()
                        .with_context(|| format!("invalid PORT value: {p}"))?,
                    None => DEFAULT_PORT,
                };
                format!("0.0.0.0:{port}")
            }
        };

        let origin = non_blank(cors_origin).unwrap_or_else(|| DEFAULT_CORS_ORIGIN.into());
        let cors_origin = HeaderValue::from_str(origin.trim())
            .with_context(|| format!("invalid CORS_ORIGIN value: {origin}"))?;

        Ok(Self {
            addr,
            cors_origin,
            rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
            rate_limit_window: DEFAULT_RATE_LIMIT_WINDOW,
        })
    }

    /// Override the per-client rate limit from optional raw values.
    ///
    /// Blank values keep the defaults of 100 requests per 15 minutes.
    pub fn with_rate_limit_values(
        self,
        max_requests: Option<String>,
        window_secs: Option<String>,
    ) -> anyhow::Result<Self> {
        let positive = |name: &str, v: Option<String>| -> anyhow::Result<Option<u64>> {
            match v.filter(|s| !s.trim().is_empty()) {
                None => Ok(None),
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(n) if n > 0 => Ok(Some(n)),
                    _ => anyhow::bail!("invalid {name} value: {raw}"),
                },
            }
        };

        let max = match positive("RATE_LIMIT_MAX", max_requests)? {
            Some(n) => u32::try_from(n).context("RATE_LIMIT_MAX is too large")?,
            None => self.rate_limit_max,
        };
        let window = positive("RATE_LIMIT_WINDOW_SECS", window_secs)?
            .map(Duration::from_secs)
            .unwrap_or(self.rate_limit_window);

        Ok(self.with_rate_limit(max, window))
    }

    pub fn with_rate_limit(mut self, max_requests: u32, window: Duration) -> Self {
        self.rate_limit_max = max_requests;
        self.rate_limit_window = window;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn cors_origin(&self) -> &HeaderValue {
        &self.cors_origin
    }

    pub fn rate_limit_max(&self) -> u32 {
        self.rate_limit_max
    }

    pub fn rate_limit_window(&self) -> Duration {
        self.rate_limit_window
    }
}
