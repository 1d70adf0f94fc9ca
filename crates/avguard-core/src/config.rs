use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// The identifier of this application's own package. Install events carrying
/// any other package id are ignored by the scan-job listener.
pub const AVGUARD_PACKAGE_ID: &str = "com.avguard:avguard-api";

/// Top-level config (avguard.toml + AVGUARD_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvguardConfig {
    #[serde(default)]
    pub antivirus: AntivirusConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scan_job: ScanJobConfig,
}

/// Antivirus scanning surface.
///
/// These values gate scanning behaviour only — the scheduling reconciliation
/// logic never consults them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntivirusConfig {
    /// Master switch for attachment-upload, page-save and scheduled scans.
    #[serde(default = "bool_true")]
    pub enabled: bool,
    /// Name of the scan engine used when no engine is named explicitly.
    #[serde(default = "default_engine")]
    pub default_engine: String,
    /// When true the scheduled-scan report is sent to admins even when no
    /// infection was found.
    #[serde(default)]
    pub always_send_report: bool,
    /// Maximum file size in MB scanned at upload time.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u32,
}

impl Default for AntivirusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_engine: default_engine(),
            always_send_report: false,
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

impl AntivirusConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn default_engine_name(&self) -> &str {
        &self.default_engine
    }

    pub fn always_send_report(&self) -> bool {
        self.always_send_report
    }

    pub fn max_file_size_mb(&self) -> u32 {
        self.max_file_size_mb
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Schedule settings for the seeded scan job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanJobConfig {
    /// Hour (UTC) of the daily full scan.
    #[serde(default = "default_scan_hour")]
    pub hour: u8,
    /// Minute of the daily full scan.
    #[serde(default)]
    pub minute: u8,
}

impl Default for ScanJobConfig {
    fn default() -> Self {
        Self {
            hour: default_scan_hour(),
            minute: 0,
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_engine() -> String {
    "clamav".to_string()
}
fn default_max_file_size_mb() -> u32 {
    32
}
fn default_scan_hour() -> u8 {
    3
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.avguard/avguard.db", home)
}

impl AvguardConfig {
    /// Load config from a TOML file with AVGUARD_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.avguard/avguard.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: AvguardConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("AVGUARD_").split("_"))
            .extract()
            .map_err(|e| crate::error::AvguardError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.avguard/avguard.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AvguardConfig::default();
        assert!(cfg.antivirus.is_enabled());
        assert_eq!(cfg.antivirus.default_engine_name(), "clamav");
        assert!(!cfg.antivirus.always_send_report());
        assert_eq!(cfg.antivirus.max_file_size_mb(), 32);
        assert_eq!(cfg.scan_job.hour, 3);
        assert_eq!(cfg.scan_job.minute, 0);
    }

    #[test]
    fn toml_overrides_defaults() {
        let cfg: AvguardConfig = Figment::new()
            .merge(Toml::string(
                r#"
                [antivirus]
                enabled = false
                default_engine = "sophos"
                max_file_size_mb = 64

                [scan_job]
                hour = 22
                minute = 30
                "#,
            ))
            .extract()
            .unwrap();

        assert!(!cfg.antivirus.is_enabled());
        assert_eq!(cfg.antivirus.default_engine_name(), "sophos");
        assert_eq!(cfg.antivirus.max_file_size_mb(), 64);
        // Unset keys fall back to defaults.
        assert!(!cfg.antivirus.always_send_report());
        assert_eq!(cfg.scan_job.hour, 22);
        assert_eq!(cfg.scan_job.minute, 30);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: AvguardConfig = Figment::new().merge(Toml::string("")).extract().unwrap();
        assert_eq!(cfg.database.path, default_db_path());
    }
}
