use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable prefix for every bot parameter.
pub const ENV_PREFIX: &str = "PEDANT_";

/// All bot parameters. Read from `PEDANT_*` environment variables at startup;
/// missing or unparseable values fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotCfg {
    // cadence
    pub cycle_interval_secs: u64,
    pub min_delay_ms: u64,

    // platform paging
    pub search_count: u32,
    pub mention_count: u32,
    pub search_lang: String,
    pub request_timeout_secs: u64,

    // correction policy
    pub confirm_probability: f64,
    pub rng_seed: Option<u64>,

    // storage
    pub state_path: PathBuf,
    pub blacklist_path: Option<PathBuf>,
}

impl Default for BotCfg {
    fn default() -> Self {
        Self {
            cycle_interval_secs: 30 * 60,
            min_delay_ms: 100,
            search_count: 5,
            mention_count: 10,
            search_lang: "en".into(),
            request_timeout_secs: 30,
            confirm_probability: 0.8,
            rng_seed: None,
            state_path: PathBuf::from("data.json"),
            blacklist_path: None,
        }
    }
}

impl BotCfg {
    /// Load config from the process environment.
    pub fn from_env() -> Self {
        let map: HashMap<String, String> = std::env::vars()
            .filter_map(|(k, v)| {
                k.strip_prefix(ENV_PREFIX)
                    .map(|key| (key.to_ascii_lowercase(), v))
            })
            .collect();
        Self::from_map(&map)
    }

    /// Build from lower-case keys without the prefix, e.g. `search_count`.
    pub fn from_map(m: &HashMap<String, String>) -> Self {
        let d = Self::default();
        Self {
            cycle_interval_secs: get_or(m, "cycle_interval_secs", d.cycle_interval_secs),
            min_delay_ms: get_or(m, "min_delay_ms", d.min_delay_ms).max(1),
            search_count: get_or(m, "search_count", d.search_count),
            mention_count: get_or(m, "mention_count", d.mention_count),
            search_lang: get_or(m, "search_lang", d.search_lang),
            request_timeout_secs: get_or(m, "request_timeout_secs", d.request_timeout_secs),
            confirm_probability: get_or(m, "confirm_probability", d.confirm_probability)
                .clamp(0.0, 1.0),
            rng_seed: m.get("rng_seed").and_then(|v| v.parse().ok()),
            state_path: get_or(m, "state_path", d.state_path),
            blacklist_path: m
                .get("blacklist_path")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn get_or<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str, default: T) -> T {
    map.get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_map_yields_defaults() {
        let cfg = BotCfg::from_map(&HashMap::new());
        assert_eq!(cfg.cycle_interval(), Duration::from_secs(1800));
        assert_eq!(cfg.min_delay(), Duration::from_millis(100));
        assert_eq!(cfg.search_count, 5);
        assert_eq!(cfg.mention_count, 10);
        assert_eq!(cfg.search_lang, "en");
        assert_eq!(cfg.state_path, PathBuf::from("data.json"));
        assert!(cfg.rng_seed.is_none());
        assert!(cfg.blacklist_path.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = BotCfg::from_map(&map(&[
            ("search_count", "20"),
            ("rng_seed", "42"),
            ("state_path", "/var/lib/pedant/state.json"),
            ("blacklist_path", "/etc/pedant/blacklist.txt"),
        ]));
        assert_eq!(cfg.search_count, 20);
        assert_eq!(cfg.rng_seed, Some(42));
        assert_eq!(cfg.state_path, PathBuf::from("/var/lib/pedant/state.json"));
        assert_eq!(
            cfg.blacklist_path,
            Some(PathBuf::from("/etc/pedant/blacklist.txt"))
        );
    }

    #[test]
    fn garbage_falls_back() {
        let cfg = BotCfg::from_map(&map(&[("mention_count", "lots"), ("rng_seed", "x")]));
        assert_eq!(cfg.mention_count, 10);
        assert!(cfg.rng_seed.is_none());
    }

    #[test]
    fn probability_is_clamped() {
        let cfg = BotCfg::from_map(&map(&[("confirm_probability", "1.7")]));
        assert_eq!(cfg.confirm_probability, 1.0);
    }

    #[test]
    fn zero_min_delay_is_raised_to_one_ms() {
        let cfg = BotCfg::from_map(&map(&[("min_delay_ms", "0")]));
        assert_eq!(cfg.min_delay(), Duration::from_millis(1));
    }
}
