use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the like API; the API_URL env var wins when set.
    pub api_base_url: Option<String>,
    /// Path of the JSON snapshot file.
    pub state_file: Option<String>,
    pub sweep_interval_seconds: Option<u64>,
    pub cooldown_seconds: Option<u64>,
    /// Delay between remote calls inside a sweep.
    pub pace_ms: Option<u64>,
    pub request_timeout_seconds: Option<u64>,
    /// Ask /check_like before spending a /like call.
    pub probe_before_like: Option<bool>,
    /// Seed new entries with last_liked_at = now instead of leaving them
    /// immediately eligible.
    pub new_entries_start_on_cooldown: Option<bool>,
    /// Bind address for the admin API; unset disables it.
    pub http_listen: Option<String>,
    pub api_token: Option<String>,
}

impl Config {
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let raw = expand_env(&raw);
        let cfg: Config = serde_yaml::from_str(&raw)?;
        Ok(cfg)
    }

    pub fn state_file(&self) -> &str {
        self.state_file.as_deref().unwrap_or("like_state.json")
    }

    pub fn sweep_interval_seconds(&self) -> u64 {
        self.sweep_interval_seconds.unwrap_or(3600)
    }

    pub fn cooldown_seconds(&self) -> u64 {
        self.cooldown_seconds.unwrap_or(24 * 60 * 60)
    }

    pub fn pace_ms(&self) -> u64 {
        self.pace_ms.unwrap_or(1500)
    }

    pub fn request_timeout_seconds(&self) -> u64 {
        self.request_timeout_seconds.unwrap_or(10)
    }

    pub fn probe_before_like(&self) -> bool {
        self.probe_before_like.unwrap_or(false)
    }

    pub fn new_entries_start_on_cooldown(&self) -> bool {
        self.new_entries_start_on_cooldown.unwrap_or(false)
    }
}

/// very small ${VAR} expansion to keep config simple
fn expand_env(s: &str) -> String {
    let mut out = s.to_string();
    for (k, v) in std::env::vars() {
        out = out.replace(&format!("${{{}}}", k), &v);
    }
    out
}
