//! Explicit run configuration.
//!
//! One `AgentConfig` value is built at startup and passed into every
//! constructor that needs it; there is no process-wide mutable config.

use std::time::Duration;

/// Tunables for agent runs.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Maximum attempts for a retryable tool call (including the first).
    pub max_tool_retries: u32,
    /// Search retries beyond the initial attempt in the clothing pipeline.
    pub max_search_retries: u32,
    /// Cap on web-search hits kept per attempt.
    pub max_search_results: usize,
    /// Streaming channel buffer capacity.
    pub channel_capacity: usize,
    /// Consumer poll timeout; bounds stop-flag staleness.
    pub poll_interval: Duration,
    /// Per-link content fetch deadline.
    pub fetch_timeout: Duration,
    /// Maximum characters per extraction chunk.
    pub chunk_size: usize,
    /// Concurrent fan-out bound for parse/grade work.
    pub parse_batch_size: usize,
    /// Hard ceiling on engine steps per run; backstop for runaway cycles.
    pub max_steps: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_retries: 3,
            max_search_retries: 2,
            max_search_results: 5,
            channel_capacity: 512,
            poll_interval: Duration::from_millis(100),
            fetch_timeout: Duration::from_secs(10),
            chunk_size: 2000,
            parse_batch_size: 4,
            max_steps: 64,
        }
    }
}

impl AgentConfig {
    /// Defaults overridden by `MODISTE_*` environment variables (a `.env`
    /// file is honored when present).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            max_tool_retries: env_parse("MODISTE_MAX_TOOL_RETRIES", defaults.max_tool_retries),
            max_search_retries: env_parse(
                "MODISTE_MAX_SEARCH_RETRIES",
                defaults.max_search_retries,
            ),
            max_search_results: env_parse(
                "MODISTE_MAX_SEARCH_RESULTS",
                defaults.max_search_results,
            ),
            channel_capacity: env_parse("MODISTE_CHANNEL_CAPACITY", defaults.channel_capacity),
            poll_interval: Duration::from_millis(env_parse(
                "MODISTE_POLL_INTERVAL_MS",
                defaults.poll_interval.as_millis() as u64,
            )),
            fetch_timeout: Duration::from_millis(env_parse(
                "MODISTE_FETCH_TIMEOUT_MS",
                defaults.fetch_timeout.as_millis() as u64,
            )),
            chunk_size: env_parse("MODISTE_CHUNK_SIZE", defaults.chunk_size),
            parse_batch_size: env_parse("MODISTE_PARSE_BATCH_SIZE", defaults.parse_batch_size),
            max_steps: env_parse("MODISTE_MAX_STEPS", defaults.max_steps),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
