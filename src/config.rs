use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::graph::EntityType;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "HETGRAPH_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub tables: TablesConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub render: RenderConfig,
    /// File the configuration was read from; `None` for built-in defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Input and output locations
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the extracted `<table>.csv` files.
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,
    /// Where the assembled graph artifact is published.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: default_raw_dir(),
            output_path: default_output_path(),
            log_level: default_log_level(),
        }
    }
}

/// Source table reading
#[derive(Debug, Clone, Deserialize)]
pub struct TablesConfig {
    /// Cell texts treated as missing, in addition to the empty string.
    #[serde(default = "default_null_markers")]
    pub null_markers: Vec<String>,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            null_markers: default_null_markers(),
        }
    }
}

/// Graph assembly options
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphConfig {
    /// Collapse repeated (src, dst) pairs within a relation. Off keeps the multigraph.
    #[serde(default)]
    pub dedup_edges: bool,
}

/// Schema diagram options
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_render_title")]
    pub title: String,
    #[serde(default = "default_render_center")]
    pub center: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: default_render_title(),
            center: default_render_center(),
        }
    }
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("data/raw")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("data/processed/hetero_graph.sqlite")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_null_markers() -> Vec<String> {
    ["NA", "N/A", "NaN", "nan", "NULL", "null", "None"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_render_title() -> String {
    "Lung-CABO / LUCIA Knowledge Graph Schema".to_string()
}

fn default_render_center() -> String {
    EntityType::Disease.as_str().to_string()
}

impl Config {
    /// Load configuration
    ///
    /// Loads environment variables from .env file (if present) first.
    /// Looks for the config file in this order:
    /// 1. Path specified in HETGRAPH_CONFIG (must exist when set)
    /// 2. ./config.toml in current directory
    ///
    /// Falls back to built-in defaults when neither is present.
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            return Self::load_from(Path::new(&explicit));
        }

        let local = PathBuf::from("config.toml");
        if local.exists() {
            return Self::load_from(&local);
        }

        log::debug!("No config file found, using defaults");
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a specific config file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        config.source = Some(config_path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // A missing raw_dir only means every table is absent.
        if self.paths.raw_dir.exists() && !self.paths.raw_dir.is_dir() {
            anyhow::bail!(
                "raw_dir must be a directory, not a file: {}",
                self.paths.raw_dir.display()
            );
        }

        if self.paths.output_path.as_os_str().is_empty() {
            anyhow::bail!("paths.output_path must not be empty");
        }

        if self.paths.output_path.is_dir() {
            anyhow::bail!(
                "paths.output_path points at a directory: {}",
                self.paths.output_path.display()
            );
        }

        self.render_center()?;

        Ok(())
    }

    /// Where this configuration came from, for startup logging
    pub fn describe_source(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => "built-in defaults".to_string(),
        }
    }

    /// Get the raw tables directory
    pub fn raw_dir(&self) -> &Path {
        &self.paths.raw_dir
    }

    /// Get the artifact path
    pub fn output_path(&self) -> &Path {
        &self.paths.output_path
    }

    /// Entity type placed at the centre of the schema diagram
    pub fn render_center(&self) -> Result<EntityType> {
        self.render
            .center
            .parse::<EntityType>()
            .map_err(|e| anyhow::anyhow!("render.center: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn write_config(temp_dir: &TempDir, body: &str) -> PathBuf {
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_default_paths_and_markers() {
        let config = Config::default();
        assert_eq!(config.raw_dir(), Path::new("data/raw"));
        assert!(!config.graph.dedup_edges);
        assert!(config.tables.null_markers.contains(&"NaN".to_string()));
        assert_eq!(config.render_center().unwrap(), EntityType::Disease);
        assert_eq!(config.describe_source(), "built-in defaults");
    }

    #[test]
    fn test_load_from_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let raw = temp_dir.path().join("raw");
        fs::create_dir(&raw).unwrap();
        let body = format!(
            r#"
[paths]
raw_dir = "{}"
output_path = "{}"

[graph]
dedup_edges = true
"#,
            raw.display().to_string().replace('\\', "\\\\"),
            temp_dir.path().join("out.sqlite").display().to_string().replace('\\', "\\\\"),
        );
        let path = write_config(&temp_dir, &body);

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.raw_dir(), raw.as_path());
        assert!(config.graph.dedup_edges);
        assert_eq!(config.paths.log_level, "info");
        assert_eq!(config.render.title, default_render_title());
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
        assert_eq!(config.describe_source(), path.display().to_string());
    }

    #[test]
    fn test_raw_dir_must_be_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not_a_dir.csv");
        fs::write(&file, "a,b\n").unwrap();
        let body = format!(
            "[paths]\nraw_dir = \"{}\"\n",
            file.display().to_string().replace('\\', "\\\\")
        );
        let path = write_config(&temp_dir, &body);

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("raw_dir must be a directory"));
    }

    #[test]
    fn test_unknown_render_center_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "[render]\ncenter = \"protein\"\n");

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("protein"));
    }

    #[test]
    fn test_explicit_config_env_must_exist() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let previous = std::env::var(CONFIG_ENV).ok();
        std::env::set_var(CONFIG_ENV, "nonexistent-hetgraph.toml");
        let config = Config::load();
        assert!(config.is_err());
        std::env::remove_var(CONFIG_ENV);
        if let Some(v) = previous {
            std::env::set_var(CONFIG_ENV, v);
        }
    }
}
