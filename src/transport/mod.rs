//! # Page Sinks
//!
//! Where composed pages go once the scaler has laid them out.
//!
//! ## Available Sinks
//!
//! - [`spool`]: PNG files in a per-printer spool directory
//! - [`MemorySink`]: Keeps pages in memory (tests, previews of a full job)

pub mod spool;

pub use spool::SpoolSink;

use image::GrayImage;

use crate::error::EtiquetaError;
use crate::printer::PageGeometry;

/// Abstraction over the device (or stand-in) that receives printed pages.
///
/// One call per physical copy. A sink is driven by one job at a time; the
/// pipeline serializes access per printer.
pub trait PageSink: Send {
    /// Emit one page covering the printable area of `geometry`.
    fn print_page(&mut self, page: &GrayImage, geometry: &PageGeometry) -> Result<(), EtiquetaError>;
}

/// Sink that stores every page it receives.
#[derive(Debug, Default)]
pub struct MemorySink {
    pages: Vec<GrayImage>,
}

impl MemorySink {
    pub fn pages(&self) -> &[GrayImage] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<GrayImage> {
        self.pages
    }
}

impl PageSink for MemorySink {
    fn print_page(&mut self, page: &GrayImage, geometry: &PageGeometry) -> Result<(), EtiquetaError> {
        if page.dimensions() != (geometry.printable_width, geometry.printable_height) {
            return Err(EtiquetaError::Printer(format!(
                "page is {}x{}, printable area is {}x{}",
                page.width(),
                page.height(),
                geometry.printable_width,
                geometry.printable_height
            )));
        }
        self.pages.push(page.clone());
        Ok(())
    }
}
