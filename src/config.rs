//! # Application Configuration
//!
//! JSON settings file. Every field is optional; missing fields take the
//! defaults below, so a file containing `{"cache_capacity": 20}` is valid.
//!
//! | Field | Default |
//! |-------|---------|
//! | `label.width` x `label.height` | 600 x 300 |
//! | `label.preview_width` x `label.preview_height` | 400 x 200 |
//! | `label.human_readable` | `true` |
//! | `cache_capacity` | 100 |
//! | `history_limit` | 100 |
//! | `history_file` | `etiqueta-history.json` |
//! | `spool_dir` | `spool` |
//! | `default_printer` | first entry of `printers` |
//! | `printers` | built-in handles |
//! | `listen_addr` | `127.0.0.1:8080` |

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CAPACITY;
use crate::error::EtiquetaError;
use crate::history::store::DEFAULT_LIMIT;
use crate::printer::PrinterHandle;
use crate::render::{MIN_HEIGHT, MIN_WIDTH};
use crate::transport::spool;

/// Canonical label canvas and preview size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSettings {
    pub width: u32,
    pub height: u32,
    pub preview_width: u32,
    pub preview_height: u32,
    /// Print the value under the bars
    pub human_readable: bool,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            width: 600,
            height: 300,
            preview_width: 400,
            preview_height: 200,
            human_readable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub label: LabelSettings,
    pub cache_capacity: usize,
    pub history_limit: usize,
    pub history_file: PathBuf,
    pub spool_dir: PathBuf,
    pub default_printer: Option<String>,
    pub printers: Vec<PrinterHandle>,
    pub listen_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            label: LabelSettings::default(),
            cache_capacity: DEFAULT_CAPACITY,
            history_limit: DEFAULT_LIMIT,
            history_file: PathBuf::from("etiqueta-history.json"),
            spool_dir: PathBuf::from("spool"),
            default_printer: None,
            printers: PrinterHandle::built_in(),
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EtiquetaError> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Self = serde_json::from_str(&text)
            .map_err(|e| EtiquetaError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EtiquetaError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| EtiquetaError::Config(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), EtiquetaError> {
        let label = &self.label;
        if label.width < MIN_WIDTH || label.height < MIN_HEIGHT {
            return Err(EtiquetaError::Config(format!(
                "label size {}x{} is below the {}x{} minimum",
                label.width, label.height, MIN_WIDTH, MIN_HEIGHT
            )));
        }
        if label.preview_width == 0 || label.preview_height == 0 {
            return Err(EtiquetaError::Config("preview size must be non-zero".into()));
        }
        if self.cache_capacity == 0 {
            return Err(EtiquetaError::Config("cache_capacity must be at least 1".into()));
        }
        if self.printers.is_empty() {
            return Err(EtiquetaError::Config("no printers configured".into()));
        }
        for (i, printer) in self.printers.iter().enumerate() {
            let g = &printer.geometry;
            if g.is_empty() {
                return Err(EtiquetaError::Config(format!(
                    "printer '{}' has an empty printable area",
                    printer.name
                )));
            }
            if self.printers[..i].iter().any(|p| p.name == printer.name) {
                return Err(EtiquetaError::Config(format!(
                    "printer '{}' is listed twice",
                    printer.name
                )));
            }
            // Spool directories compared case-insensitively for macOS and Windows
            let dir = spool::dir_name(&printer.name).to_lowercase();
            if let Some(other) = self.printers[..i]
                .iter()
                .find(|p| spool::dir_name(&p.name).to_lowercase() == dir)
            {
                return Err(EtiquetaError::Config(format!(
                    "printers '{}' and '{}' would share spool directory '{}'",
                    other.name,
                    printer.name,
                    spool::dir_name(&printer.name)
                )));
            }
        }
        if let Some(name) = &self.default_printer {
            if self.printer(name).is_none() {
                return Err(EtiquetaError::Config(format!(
                    "default printer '{}' is not configured",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn printer(&self, name: &str) -> Option<&PrinterHandle> {
        self.printers.iter().find(|p| p.name == name)
    }

    /// The configured default, or the first printer.
    pub fn default_printer_name(&self) -> Option<&str> {
        self.default_printer
            .as_deref()
            .or_else(|| self.printers.first().map(|p| p.name.as_str()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
