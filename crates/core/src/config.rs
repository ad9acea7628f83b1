use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Process-level settings read from the environment.
///
/// Profile is read from `PRESCHED_PROFILE`. When set (e.g. `FAST`), every
/// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Time slice granted to the head task while arrivals are pending.
    pub time_slice_ms: u64,
    /// External delay after each work unit, taken with the guard released.
    pub work_unit_ms: u64,
    /// Seed for the random arrival order. `None` = seeded from entropy.
    pub arrival_seed: Option<u64>,
    /// Default tracing filter directive.
    pub log_filter: String,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        let profile = env_or("PRESCHED_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            time_slice_ms: profiled_env_u64(p, "PRESCHED_TIME_SLICE_MS", 3000),
            work_unit_ms: profiled_env_u64(p, "PRESCHED_WORK_UNIT_MS", 1000),
            arrival_seed: profiled_env_opt(p, "PRESCHED_ARRIVAL_SEED").and_then(|v| v.parse().ok()),
            log_filter: profiled_env_or(p, "PRESCHED_LOG", "info"),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  time_slice:  {}ms", self.time_slice_ms);
        tracing::info!("  work_unit:   {}ms", self.work_unit_ms);
        match self.arrival_seed {
            Some(seed) => tracing::info!("  arrivals:    seeded ({})", seed),
            None => tracing::info!("  arrivals:    random"),
        }
    }

    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "time_slice_ms": self.time_slice_ms,
            "work_unit_ms": self.work_unit_ms,
            "arrival_seed": self.arrival_seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_prefixed_key_wins() {
        env::set_var("CFGTESTA_PRESCHED_TIME_SLICE_MS", "42");
        let config = Config::for_profile("cfgtesta");
        assert_eq!(config.profile, "CFGTESTA");
        assert_eq!(config.time_slice_ms, 42);
        env::remove_var("CFGTESTA_PRESCHED_TIME_SLICE_MS");
    }

    #[test]
    fn unparsable_values_fall_back() {
        env::set_var("CFGTESTB_PRESCHED_WORK_UNIT_MS", "soon");
        env::set_var("CFGTESTB_PRESCHED_ARRIVAL_SEED", "7");
        let config = Config::for_profile("CFGTESTB");
        assert_eq!(config.arrival_seed, Some(7));
        assert!(config.work_unit_ms > 0);
        env::remove_var("CFGTESTB_PRESCHED_WORK_UNIT_MS");
        env::remove_var("CFGTESTB_PRESCHED_ARRIVAL_SEED");
    }

    #[test]
    fn default_profile_label() {
        let config = Config::for_profile("");
        assert_eq!(config.profile_label(), "default");
        assert_eq!(config.summary()["profile"], "default");
    }
}
