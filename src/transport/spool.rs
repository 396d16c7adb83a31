//! # Spool Directory Sink
//!
//! Writes each page as a PNG into a per-printer directory:
//!
//! ```text
//! spool/
//! ├── Label_4x6/
//! │   ├── page-000001.png
//! │   └── page-000002.png
//! └── Letter/
//!     └── page-000001.png
//! ```
//!
//! Numbering continues from the highest page already present, so restarting
//! the process never overwrites spooled pages.

use std::fs;
use std::path::{Path, PathBuf};

use image::GrayImage;

use super::PageSink;
use crate::error::EtiquetaError;
use crate::printer::PageGeometry;
use crate::render::encode_png;

/// File sink for one printer.
#[derive(Debug)]
pub struct SpoolSink {
    dir: PathBuf,
    last_page: u64,
}

impl SpoolSink {
    /// Open (creating if needed) the spool directory for `printer` under
    /// `root`.
    pub fn open(root: impl AsRef<Path>, printer: &str) -> Result<Self, EtiquetaError> {
        let dir = root.as_ref().join(dir_name(printer));
        fs::create_dir_all(&dir)?;

        let mut last_page = 0;
        for entry in fs::read_dir(&dir)? {
            let name = entry?.file_name();
            if let Some(n) = page_number(&name.to_string_lossy()) {
                last_page = last_page.max(n);
            }
        }

        log::debug!("spool {} opened at page {}", dir.display(), last_page);
        Ok(Self { dir, last_page })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of the most recently written page (0 when none).
    pub fn last_page(&self) -> u64 {
        self.last_page
    }
}

impl PageSink for SpoolSink {
    fn print_page(&mut self, page: &GrayImage, _geometry: &PageGeometry) -> Result<(), EtiquetaError> {
        let n = self.last_page + 1;
        let path = self.dir.join(format!("page-{:06}.png", n));
        let png = encode_png(page)?;
        fs::write(&path, png)
            .map_err(|e| EtiquetaError::Printer(format!("{}: {}", path.display(), e)))?;
        self.last_page = n;
        Ok(())
    }
}

/// Printer names become directory names: anything outside `[A-Za-z0-9._-]`
/// turns into `_`. Distinct printer names can share a directory, so
/// configurations are checked for that up front.
pub fn dir_name(printer: &str) -> String {
    let name: String = printer
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match name.trim_matches('.') {
        "" => "_".to_string(),
        _ => name,
    }
}

fn page_number(file_name: &str) -> Option<u64> {
    file_name
        .strip_prefix("page-")?
        .strip_suffix(".png")?
        .parse()
        .ok()
}
