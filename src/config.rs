use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::WGS_FASTA_LABEL;
use crate::error::EnaError;

pub const DEFAULT_SUMMARY_FILE: &str = "summary.xlsx";

/// Settings file as written by the operator; every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub organism_prefix: Option<String>,
    #[serde(default)]
    pub fasta_label: Option<String>,
    #[serde(default)]
    pub summary_file: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Keep only records whose taxon starts with this prefix.
    pub organism_prefix: Option<String>,
    pub fasta_label: String,
    pub summary_file: String,
    pub timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            organism_prefix: None,
            fasta_label: WGS_FASTA_LABEL.to_string(),
            summary_file: DEFAULT_SUMMARY_FILE.to_string(),
            timeout: None,
        }
    }
}

impl Settings {
    pub fn with_organism_prefix(mut self, prefix: Option<String>) -> Self {
        if let Some(prefix) = prefix {
            self.organism_prefix = Some(prefix);
        }
        self
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads settings from `path`, or returns the defaults when no file is given.
    pub fn resolve(path: Option<&str>) -> Result<Settings, EnaError> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };
        let config_path = PathBuf::from(path);
        let content = fs::read_to_string(&config_path)
            .map_err(|_| EnaError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| EnaError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<Settings, EnaError> {
        let defaults = Settings::default();

        let summary_file = config.summary_file.unwrap_or(defaults.summary_file);
        if summary_file.trim().is_empty() || summary_file.contains(['/', '\\']) {
            return Err(EnaError::ConfigParse(format!(
                "summary_file must be a plain file name, got {summary_file:?}"
            )));
        }

        let fasta_label = config.fasta_label.unwrap_or(defaults.fasta_label);
        if fasta_label.trim().is_empty() {
            return Err(EnaError::ConfigParse(
                "fasta_label must not be empty".to_string(),
            ));
        }

        Ok(Settings {
            organism_prefix: config.organism_prefix.filter(|prefix| !prefix.is_empty()),
            fasta_label,
            summary_file,
            timeout: config.timeout_secs.map(Duration::from_secs),
        })
    }
}
