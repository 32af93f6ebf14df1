use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// RedisConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_host")]
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    #[serde(default)]
    pub db: u32,
    #[serde(default = "default_redis_key")]
    pub key: String,
}

fn default_redis_host() -> String {
    "localhost".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_redis_key() -> String {
    "carrier:applied".to_string()
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_redis_host(),
            port: default_redis_port(),
            db: 0,
            key: default_redis_key(),
        }
    }
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

// ---------------------------------------------------------------------------
// LoadConfig
// ---------------------------------------------------------------------------

/// Configuration for a `carrier load` run.
///
/// A bad Redis host surfaces at store-open time, not parse time; parsing
/// only enforces shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// SPARQL update endpoint URL.
    pub endpoint: String,
    /// Directory holding one `.sparql` file per update unit.
    pub units_dir: PathBuf,
    #[serde(default = "default_failed_log")]
    pub failed_log: PathBuf,
    #[serde(default = "default_stop_file")]
    pub stop_file: PathBuf,
    #[serde(default)]
    pub redis: RedisConfig,
    /// Per-call endpoint timeout. There is no run-level timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

fn default_failed_log() -> PathBuf {
    PathBuf::from("failed_queries.txt")
}

fn default_stop_file() -> PathBuf {
    PathBuf::from(".stop_upload")
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_show_progress() -> bool {
    true
}

impl LoadConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: LoadConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let yaml = "endpoint: http://localhost:8890/sparql\nunits_dir: ./sparql\n";
        let cfg: LoadConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.failed_log, PathBuf::from("failed_queries.txt"));
        assert_eq!(cfg.stop_file, PathBuf::from(".stop_upload"));
        assert_eq!(cfg.redis.host, "localhost");
        assert_eq!(cfg.redis.port, 6379);
        assert_eq!(cfg.redis.key, "carrier:applied");
        assert_eq!(cfg.timeout_secs, 60);
        assert!(cfg.show_progress);
    }

    #[test]
    fn redis_url_includes_db_index() {
        let cfg = RedisConfig {
            host: "cache.internal".to_string(),
            port: 6380,
            db: 4,
            key: "k".to_string(),
        };
        assert_eq!(cfg.url(), "redis://cache.internal:6380/4");
    }

    #[test]
    fn full_config_roundtrip() {
        let yaml = r#"
endpoint: http://localhost:28890/sparql
units_dir: /data/sparql_files
failed_log: /data/failed.txt
stop_file: /data/.stop
redis:
  host: redis.internal
  port: 6380
  db: 2
  key: loader:done
timeout_secs: 30
show_progress: false
"#;
        let cfg: LoadConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.redis.db, 2);
        assert_eq!(cfg.redis.key, "loader:done");
        assert_eq!(cfg.timeout_secs, 30);
        assert!(!cfg.show_progress);

        let out = serde_yaml::to_string(&cfg).unwrap();
        let parsed: LoadConfig = serde_yaml::from_str(&out).unwrap();
        assert_eq!(parsed.endpoint, cfg.endpoint);
        assert_eq!(parsed.redis.url(), cfg.redis.url());
    }

    #[test]
    fn missing_endpoint_is_a_parse_error() {
        let yaml = "units_dir: ./sparql\n";
        assert!(serde_yaml::from_str::<LoadConfig>(yaml).is_err());
    }
}
