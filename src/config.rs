//! TOML configuration parsing and validation.
//!
//! Every setting except the three root paths has a default that matches
//! the behaviour of a freshly installed service: a 5 s quiet window, a 2 s
//! minimum file age, a 60 s sweep and exiftool enabled when it is on `PATH`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub inbox: InboxConfig,
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub stability: StabilityConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// SQLite file holding the catalog.
    pub path: PathBuf,
    /// Directory for pending catalog writes. Defaults to `pending/` next
    /// to the catalog file.
    #[serde(default)]
    pub pending_dir: Option<PathBuf>,
}

impl CatalogConfig {
    pub fn pending_dir(&self) -> PathBuf {
        match &self.pending_dir {
            Some(dir) => dir.clone(),
            None => self
                .path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("pending"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InboxConfig {
    pub root: PathBuf,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArchiveConfig {
    pub root: PathBuf,
    #[serde(default = "default_unknown_date_dir")]
    pub unknown_date_dir: String,
    #[serde(default = "default_max_collision_suffix")]
    pub max_collision_suffix: u32,
    #[serde(default = "default_pause_on_full_secs")]
    pub pause_on_full_secs: u64,
}

fn default_unknown_date_dir() -> String {
    "unknown-date".to_string()
}
fn default_max_collision_suffix() -> u32 {
    10_000
}
fn default_pause_on_full_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct StabilityConfig {
    #[serde(default = "default_quiet_window_secs")]
    pub quiet_window_secs: f64,
    #[serde(default = "default_min_file_age_secs")]
    pub min_file_age_secs: f64,
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    #[serde(default = "default_max_checks")]
    pub max_checks: u32,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            quiet_window_secs: default_quiet_window_secs(),
            min_file_age_secs: default_min_file_age_secs(),
            check_interval_ms: default_check_interval_ms(),
            max_checks: default_max_checks(),
        }
    }
}

fn default_quiet_window_secs() -> f64 {
    5.0
}
fn default_min_file_age_secs() -> f64 {
    2.0
}
fn default_check_interval_ms() -> u64 {
    1000
}
fn default_max_checks() -> u32 {
    30
}

impl StabilityConfig {
    pub fn quiet_window(&self) -> Duration {
        Duration::from_secs_f64(self.quiet_window_secs)
    }

    pub fn min_file_age(&self) -> Duration {
        Duration::from_secs_f64(self.min_file_age_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SweepConfig {
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sweep_interval_secs(),
            workers: default_workers(),
        }
    }
}

fn default_sweep_interval_secs() -> u64 {
    60
}
fn default_workers() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetadataConfig {
    /// Use the external exiftool as the first metadata source.
    #[serde(default = "default_true")]
    pub exiftool: bool,
    #[serde(default = "default_exiftool_path")]
    pub exiftool_path: PathBuf,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            exiftool: true,
            exiftool_path: default_exiftool_path(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_exiftool_path() -> PathBuf {
    PathBuf::from("exiftool")
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatusConfig {
    /// JSON snapshot consumed by the external monitor. Logging only when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_status_interval_secs")]
    pub interval_secs: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            path: None,
            interval_secs: default_status_interval_secs(),
        }
    }
}

fn default_status_interval_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.inbox.root.as_os_str().is_empty() {
            bail!("inbox.root must not be empty");
        }
        if self.archive.root.as_os_str().is_empty() {
            bail!("archive.root must not be empty");
        }
        if self.inbox.root == self.archive.root {
            bail!("inbox.root and archive.root must be different directories");
        }
        // Archived files would be picked up again by the sweep.
        if self.archive.root.starts_with(&self.inbox.root) {
            bail!("archive.root must not be inside inbox.root");
        }
        if self.inbox.root.starts_with(&self.archive.root) {
            bail!("inbox.root must not be inside archive.root");
        }

        let unknown = &self.archive.unknown_date_dir;
        if unknown.is_empty() || unknown.contains(['/', '\\']) || unknown == "." || unknown == ".." {
            bail!("archive.unknown_date_dir must be a single directory name");
        }
        if self.archive.max_collision_suffix == 0 {
            bail!("archive.max_collision_suffix must be >= 1");
        }

        for (name, value) in [
            ("stability.quiet_window_secs", self.stability.quiet_window_secs),
            ("stability.min_file_age_secs", self.stability.min_file_age_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("{} must be a non-negative number of seconds", name);
            }
        }
        if self.stability.max_checks == 0 {
            bail!("stability.max_checks must be >= 1");
        }

        if self.sweep.workers == 0 {
            bail!("sweep.workers must be >= 1");
        }
        if self.sweep.interval_secs == 0 {
            bail!("sweep.interval_secs must be >= 1");
        }
        if self.status.interval_secs == 0 {
            bail!("status.interval_secs must be >= 1");
        }

        match self.logging.format.as_str() {
            "text" | "json" => {}
            other => bail!("Unknown logging.format: '{}'. Must be text or json.", other),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        config.validate()?;
        Ok(config)
    }

    const MINIMAL: &str = r#"
[catalog]
path = "/var/lib/librarian/catalog.sqlite"

[inbox]
root = "/photos/inbox"

[archive]
root = "/photos/originals"
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = parse(MINIMAL).unwrap();
        assert_eq!(config.stability.quiet_window(), Duration::from_secs(5));
        assert_eq!(config.stability.min_file_age(), Duration::from_secs(2));
        assert_eq!(config.sweep.interval_secs, 60);
        assert_eq!(config.archive.unknown_date_dir, "unknown-date");
        assert_eq!(config.archive.max_collision_suffix, 10_000);
        assert!(config.metadata.exiftool);
        assert_eq!(
            config.catalog.pending_dir(),
            PathBuf::from("/var/lib/librarian/pending")
        );
    }

    #[test]
    fn archive_inside_inbox_is_rejected() {
        let src = MINIMAL.replace("/photos/originals", "/photos/inbox/archive");
        let err = parse(&src).unwrap_err();
        assert!(err.to_string().contains("inside inbox.root"));
    }

    #[test]
    fn inbox_inside_archive_is_rejected() {
        let src = MINIMAL.replace("/photos/inbox", "/photos/originals/inbox");
        let err = parse(&src).unwrap_err();
        assert!(err.to_string().contains("inside archive.root"));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let src = format!("{}\n[logging]\nformat = \"xml\"\n", MINIMAL);
        assert!(parse(&src).is_err());
    }

    #[test]
    fn nested_unknown_date_dir_is_rejected() {
        let src = MINIMAL.replace(
            "root = \"/photos/originals\"",
            "root = \"/photos/originals\"\nunknown_date_dir = \"a/b\"",
        );
        assert!(parse(&src).is_err());
    }

    #[test]
    fn negative_quiet_window_is_rejected() {
        let src = format!("{}\n[stability]\nquiet_window_secs = -1.0\n", MINIMAL);
        assert!(parse(&src).is_err());
    }
}
