use serde::Deserialize;

const DEFAULT_POST_URL: &str = "https://beach.volleynet.at";
const DEFAULT_GET_URL: &str = "http://www.volleynet.at";
const DEFAULT_USER_AGENT: &str = concat!("volleynet-sync/", env!("CARGO_PKG_VERSION"));

/// Where and how the client talks to volleynet.
///
/// Read pages (lists, details, ladders) are served from `get_url`, while
/// everything that posts a form or needs a session goes to `post_url`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub post_url: String,
    pub get_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            post_url: DEFAULT_POST_URL.to_string(),
            get_url: DEFAULT_GET_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Tuning for synchronization runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Upper bound of tournament detail pages downloaded at the same time.
    pub detail_workers: usize,
}

impl SyncConfig {
    pub(crate) fn workers(&self) -> usize {
        self.detail_workers.max(1)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { detail_workers: 4 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.post_url, "https://beach.volleynet.at");
        assert_eq!(config.get_url, "http://www.volleynet.at");
        assert_eq!(config.timeout_secs, 30);

        assert_eq!(SyncConfig::default().workers(), 4);
        assert_eq!(SyncConfig { detail_workers: 0 }.workers(), 1);
    }
}
