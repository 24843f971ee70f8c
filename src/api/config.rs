use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const DEFAULT_TRENDING_DAYS: u32 = 7;
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub page_size: usize,
    pub trending_days: u32,
    pub debounce: Duration,
    /// No client-side timeout unless explicitly configured.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            page_size: DEFAULT_PAGE_SIZE,
            trending_days: DEFAULT_TRENDING_DAYS,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(base) = std::env::var("NEWSFEED_API_URL") {
            cfg.base_url = base;
        }
        cfg.token = std::env::var("NEWSFEED_TOKEN").ok().filter(|t| !t.trim().is_empty());
        if let Ok(size) = std::env::var("NEWSFEED_PAGE_SIZE") {
            if let Ok(parsed) = size.parse::<usize>() {
                if parsed > 0 {
                    cfg.page_size = parsed;
                }
            }
        }
        if let Ok(days) = std::env::var("NEWSFEED_TRENDING_DAYS") {
            if let Ok(parsed) = days.parse::<u32>() {
                cfg.trending_days = parsed;
            }
        }
        if let Ok(ms) = std::env::var("NEWSFEED_DEBOUNCE_MS") {
            if let Ok(parsed) = ms.parse::<u64>() {
                cfg.debounce = Duration::from_millis(parsed);
            }
        }
        if let Ok(timeout) = std::env::var("NEWSFEED_TIMEOUT_SECS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                cfg.timeout = Some(Duration::from_secs(parsed));
            }
        }
        cfg
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let cfg = ClientConfig { base_url: "http://api.local/".into(), ..Default::default() };
        assert_eq!(cfg.endpoint("/likes"), "http://api.local/likes");
        assert_eq!(cfg.endpoint("auth/me"), "http://api.local/auth/me");
    }

    #[test]
    fn defaults_have_no_timeout() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.page_size, 12);
        assert_eq!(cfg.debounce, Duration::from_millis(300));
        assert!(cfg.timeout.is_none());
    }
}
