//! Configuration types.
//!
//! Everything a run needs is an explicit value handed to the pipeline or
//! its collaborators; nothing is read from globals after startup.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::ConfigError;
use crate::mailbox::ImapConfig;
use crate::orders::BundleCatalog;

/// Extraction settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Products that replace their component lines.
    pub bundle_catalog: BundleCatalog,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bundle_catalog: BundleCatalog::builtin(),
        }
    }
}

impl PipelineConfig {
    /// Use `PAYFAST_BUNDLE_FILE` (a JSON array of product names) in place
    /// of the built-in catalog when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("PAYFAST_BUNDLE_FILE") {
            config.bundle_catalog = load_bundle_catalog(Path::new(&path))?;
        }
        Ok(config)
    }
}

/// Read a bundle catalog from a JSON array of exact product names.
pub fn load_bundle_catalog(path: &Path) -> Result<BundleCatalog, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    let catalog: BundleCatalog = serde_json::from_str(&raw)?;
    if catalog.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "PAYFAST_BUNDLE_FILE".into(),
            message: format!("{} lists no bundle products", path.display()),
        });
    }
    Ok(catalog)
}

/// File format of the export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// Excel workbook with typed date and ratio cells.
    #[default]
    Xlsx,
    /// Plain text, values pre-formatted.
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            other => Err(ConfigError::InvalidValue {
                key: "PAYFAST_EXPORT_FORMAT".into(),
                message: format!("unknown format '{other}', expected xlsx or csv"),
            }),
        }
    }
}

/// Where and how the sheet is written.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub dir: PathBuf,
    pub file_prefix: String,
    /// `chrono` format for the run timestamp in the file name.
    pub timestamp_format: String,
    pub format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("exports"),
            file_prefix: "PayfastOrders".to_string(),
            timestamp_format: "%Y-%m-%d_%H-%M-%S".to_string(),
            format: ExportFormat::default(),
        }
    }
}

impl ExportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("PAYFAST_EXPORT_DIR") {
            config.dir = PathBuf::from(dir);
        }
        if let Ok(format) = std::env::var("PAYFAST_EXPORT_FORMAT") {
            config.format = format.parse()?;
        }
        Ok(config)
    }

    /// `<dir>/<prefix>_<timestamp>.<ext>` for a run started at `run_started`.
    pub fn file_path(&self, run_started: NaiveDateTime) -> PathBuf {
        self.dir.join(format!(
            "{}_{}.{}",
            self.file_prefix,
            run_started.format(&self.timestamp_format),
            self.format.extension()
        ))
    }
}

/// Which mailbox the run reads from.
#[derive(Debug, Clone)]
pub enum SourceConfig {
    Imap(ImapConfig),
    /// Directory of saved `.eml` files.
    Directory(PathBuf),
}

impl SourceConfig {
    /// `PAYFAST_EML_DIR` wins over IMAP settings; one of the two is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(dir) = std::env::var("PAYFAST_EML_DIR") {
            return Ok(Self::Directory(PathBuf::from(dir)));
        }
        ImapConfig::from_env()?
            .map(Self::Imap)
            .ok_or_else(|| ConfigError::MissingEnvVar("PAYFAST_IMAP_HOST".into()))
    }
}

/// Full run configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub pipeline: PipelineConfig,
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            source: SourceConfig::from_env()?,
            pipeline: PipelineConfig::from_env()?,
            export: ExportConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_defaults_to_builtin_catalog() {
        let config = PipelineConfig::default();
        assert_eq!(config.bundle_catalog, BundleCatalog::builtin());
    }

    #[test]
    fn export_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.dir, PathBuf::from("exports"));
        assert_eq!(config.file_prefix, "PayfastOrders");
        assert_eq!(config.format, ExportFormat::Xlsx);
    }

    #[test]
    fn export_file_name_follows_format() {
        let started = chrono::NaiveDate::from_ymd_opt(2025, 6, 3)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        let mut config = ExportConfig::default();
        assert_eq!(
            config.file_path(started),
            PathBuf::from("exports/PayfastOrders_2025-06-03_07-08-09.xlsx")
        );
        config.format = ExportFormat::Csv;
        assert_eq!(
            config.file_path(started),
            PathBuf::from("exports/PayfastOrders_2025-06-03_07-08-09.csv")
        );
    }

    #[test]
    fn export_format_parses_case_insensitively() {
        assert_eq!("XLSX".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!(" csv ".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!(matches!(
            "ods".parse::<ExportFormat>(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn bundle_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundles.json");
        std::fs::write(&path, r#"["Gr.10 Bundle", "Gr.11 Bundle"]"#).unwrap();

        let catalog = load_bundle_catalog(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("Gr.11 Bundle"));
    }

    #[test]
    fn empty_bundle_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundles.json");
        std::fs::write(&path, "[]").unwrap();

        assert!(matches!(
            load_bundle_catalog(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn malformed_bundle_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundles.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            load_bundle_catalog(&path),
            Err(ConfigError::BundleCatalog(_))
        ));
    }

    #[test]
    fn missing_bundle_file_is_io_error() {
        assert!(matches!(
            load_bundle_catalog(Path::new("/no/such/bundles.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
