use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::generator::reference_pool::DEFAULT_POOL;

pub const MAX_QUICK_TEST_SIZE: usize = 100;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_quick_test_size")]
    pub quick_test_size: usize,
    #[serde(default = "default_reference_pool")]
    pub reference_pool: String,
    #[serde(default = "default_difficult_threshold")]
    pub difficult_threshold: u32,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_pool_dir")]
    pub pool_dir: String,
}

fn default_quick_test_size() -> usize {
    10
}
fn default_reference_pool() -> String {
    DEFAULT_POOL.to_string()
}
fn default_difficult_threshold() -> u32 {
    3
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wordup")
        .to_string_lossy()
        .to_string()
}
fn default_pool_dir() -> String {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wordup")
        .join("pools")
        .to_string_lossy()
        .to_string()
}

/// Bring a quick-test size into `1..=MAX_QUICK_TEST_SIZE`.
pub fn clamp_quick_test_size(size: usize) -> usize {
    size.clamp(1, MAX_QUICK_TEST_SIZE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quick_test_size: default_quick_test_size(),
            reference_pool: default_reference_pool(),
            difficult_threshold: default_difficult_threshold(),
            data_dir: default_data_dir(),
            pool_dir: default_pool_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wordup")
            .join("config.toml")
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Directory searched for user reference pools.
    pub fn pool_path(&self) -> PathBuf {
        PathBuf::from(&self.pool_dir)
    }

    /// Clamp out-of-range values and reset an unknown pool name.
    /// Call after deserialization and after applying CLI overrides.
    pub fn validate(&mut self, known_pools: &[String]) {
        self.quick_test_size = clamp_quick_test_size(self.quick_test_size);
        self.difficult_threshold = self.difficult_threshold.max(1);
        if !known_pools.contains(&self.reference_pool) {
            log::warn!(
                "unknown reference pool {:?}, using {DEFAULT_POOL:?}",
                self.reference_pool
            );
            self.reference_pool = default_reference_pool();
        }
        if self.data_dir.is_empty() {
            self.data_dir = default_data_dir();
        }
        if self.pool_dir.is_empty() {
            self.pool_dir = default_pool_dir();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pools() -> Vec<String> {
        vec!["cet4".to_string(), "cet6".to_string()]
    }

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.quick_test_size, 10);
        assert_eq!(config.reference_pool, "cet4");
        assert_eq!(config.difficult_threshold, 3);
        assert!(config.data_dir.contains("wordup"));
        assert!(config.pool_dir.ends_with("pools"));
    }

    #[test]
    fn test_config_partial_file_keeps_defaults() {
        let toml_str = r#"
quick_test_size = 5
reference_pool = "cet6"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.quick_test_size, 5);
        assert_eq!(config.reference_pool, "cet6");
        assert_eq!(config.difficult_threshold, 3);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.quick_test_size, deserialized.quick_test_size);
        assert_eq!(config.data_dir, deserialized.data_dir);
    }

    #[test]
    fn test_validate_clamps_values() {
        let mut config = Config::default();
        config.quick_test_size = 0;
        config.difficult_threshold = 0;
        config.validate(&pools());
        assert_eq!(config.quick_test_size, 1);
        assert_eq!(config.difficult_threshold, 1);

        config.quick_test_size = 999;
        config.validate(&pools());
        assert_eq!(config.quick_test_size, 100);
    }

    #[test]
    fn test_clamp_quick_test_size_bounds() {
        assert_eq!(clamp_quick_test_size(0), 1);
        assert_eq!(clamp_quick_test_size(1), 1);
        assert_eq!(clamp_quick_test_size(100), 100);
        assert_eq!(clamp_quick_test_size(101), 100);
    }

    #[test]
    fn test_validate_unknown_pool_resets() {
        let mut config = Config::default();
        config.reference_pool = "toefl".to_string();
        config.validate(&pools());
        assert_eq!(config.reference_pool, "cet4");

        config.reference_pool = "cet6".to_string();
        config.validate(&pools());
        assert_eq!(config.reference_pool, "cet6");

        let mut with_user_pool = pools();
        with_user_pool.push("toefl".to_string());
        config.reference_pool = "toefl".to_string();
        config.validate(&with_user_pool);
        assert_eq!(config.reference_pool, "toefl");
    }
}
