//! Runtime configuration for the radar core.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{RadarError, RadarResult};

/// Configuration shared by the manager, views and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    /// Site used when none is given on the command line.
    pub default_site: String,

    /// Optional JSON file replacing the embedded site table.
    pub site_table: Option<PathBuf>,

    /// Maximum number of volume scans cached per site before the oldest is
    /// evicted.
    pub max_cached_volumes: usize,

    /// Directory containing palette files.
    pub color_table_dir: PathBuf,

    /// Palette file per product/moment name, relative to `color_table_dir`.
    pub color_tables: HashMap<String, PathBuf>,

    /// Blocking worker threads used for decode and compute.
    pub worker_threads: usize,

    /// Log level for the tracing subscriber.
    pub log_level: String,

    /// Emit logs as JSON.
    pub log_json: bool,
}

impl Default for RadarConfig {
    fn default() -> Self {
        let mut color_tables = HashMap::new();
        color_tables.insert("REF".to_string(), PathBuf::from("reflectivity.json"));
        color_tables.insert("VEL".to_string(), PathBuf::from("velocity.json"));

        Self {
            default_site: "KLSX".to_string(),
            site_table: None,
            max_cached_volumes: 12,
            color_table_dir: PathBuf::from("palettes"),
            color_tables,
            worker_threads: 4,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl RadarConfig {
    /// Load configuration from environment variables on top of defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load configuration from a YAML file, then apply environment overrides.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> RadarResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: RadarConfig = serde_yaml::from_str(&content)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("RADAR_DEFAULT_SITE") {
            self.default_site = val.to_ascii_uppercase();
        }

        if let Ok(val) = std::env::var("RADAR_SITE_TABLE") {
            self.site_table = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("RADAR_MAX_CACHED_VOLUMES") {
            if let Ok(n) = val.parse() {
                self.max_cached_volumes = n;
            }
        }

        if let Ok(val) = std::env::var("RADAR_COLOR_TABLE_DIR") {
            self.color_table_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("RADAR_WORKER_THREADS") {
            if let Ok(n) = val.parse() {
                self.worker_threads = n;
            }
        }

        if let Ok(val) = std::env::var("RADAR_LOG_LEVEL") {
            self.log_level = val;
        }

        if let Ok(val) = std::env::var("RADAR_LOG_JSON") {
            self.log_json = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> RadarResult<()> {
        if self.max_cached_volumes == 0 {
            return Err(RadarError::Config("max_cached_volumes must be > 0".to_string()));
        }

        if self.worker_threads == 0 {
            return Err(RadarError::Config("worker_threads must be > 0".to_string()));
        }

        if self.default_site.len() != 4 {
            return Err(RadarError::Config(format!(
                "default_site must be a 4-letter ICAO id, got '{}'",
                self.default_site
            )));
        }

        Ok(())
    }

    /// Resolved palette path for a product/moment name, if configured.
    pub fn color_table_path(&self, product: &str) -> Option<PathBuf> {
        self.color_tables
            .get(product)
            .map(|file| self.color_table_dir.join(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        assert!(RadarConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = RadarConfig {
            max_cached_volumes: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RadarError::Config(_))));
    }

    #[test]
    fn test_color_table_path() {
        let config = RadarConfig::default();
        assert_eq!(
            config.color_table_path("REF"),
            Some(PathBuf::from("palettes/reflectivity.json"))
        );
        assert_eq!(config.color_table_path("ZDR"), None);
    }

    #[test]
    fn test_from_yaml_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_site: KTLX\nmax_cached_volumes: 3").unwrap();

        let config = RadarConfig::from_yaml(file.path()).unwrap();
        assert_eq!(config.max_cached_volumes, 3);
        // Unspecified fields keep their defaults
        assert_eq!(config.worker_threads, 4);
    }

    #[test]
    fn test_from_yaml_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_site: TOOLONG").unwrap();
        assert!(RadarConfig::from_yaml(file.path()).is_err());
    }
}
