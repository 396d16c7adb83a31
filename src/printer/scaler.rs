//! # Print Scaling
//!
//! Maps a rendered label onto a printer's printable area and submits it.
//!
//! ## Placement
//!
//! ```text
//! scale = min(printable_width / label_width, printable_height / label_height)
//!
//! ┌──────────── printable area ─────────────┐
//! │                                         │
//! │   ┌─────── label × scale ───────────┐   │  x = (printable_width - width) / 2
//! │   │ ▌▌ ▌ ▌▌▌ ▌  ▌▌ ▌▌ ▌ ▌▌▌  ▌ ▌▌ ▌ │   │  y = (printable_height - height) / 2
//! │   └─────────────────────────────────┘   │
//! │                                         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The aspect ratio is always preserved; the label is never stretched along
//! one axis only.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};

use super::config::{PageGeometry, PrinterHandle};
use crate::error::EtiquetaError;
use crate::render::{RenderedImage, WHITE};
use crate::transport::PageSink;

/// Where the scaled label lands inside the printable area, in dots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Uniform scale factor from label pixels to printer dots
    pub scale: f64,
}

/// Fit a `width` x `height` label into `geometry`, centred.
pub fn fit(width: u32, height: u32, geometry: &PageGeometry) -> Placement {
    let (pw, ph) = (geometry.printable_width, geometry.printable_height);
    let scale = f64::min(pw as f64 / width as f64, ph as f64 / height as f64);

    // At least one dot, never more than the page; an empty page yields zero
    let scaled_w = ((width as f64 * scale).round() as u32).max(1).min(pw);
    let scaled_h = ((height as f64 * scale).round() as u32).max(1).min(ph);

    Placement {
        x: (pw - scaled_w) / 2,
        y: (ph - scaled_h) / 2,
        width: scaled_w,
        height: scaled_h,
        scale,
    }
}

/// One print action: a label, how many copies, and where it goes.
#[derive(Debug, Clone)]
pub struct PrintJob {
    image: RenderedImage,
    copies: u32,
    printer: PrinterHandle,
    placement: Placement,
}

impl PrintJob {
    pub fn image(&self) -> &RenderedImage {
        &self.image
    }

    pub fn copies(&self) -> u32 {
        self.copies
    }

    pub fn printer(&self) -> &PrinterHandle {
        &self.printer
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.printer.geometry
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }
}

/// Outcome of [`PrintScaler::submit`].
///
/// A failed page stops the job; `pages_completed` counts the pages the sink
/// accepted before that.
#[derive(Debug)]
pub struct PrintResult {
    pub pages_completed: u32,
    pub total_requested: u32,
    pub error: Option<EtiquetaError>,
}

impl PrintResult {
    /// Every requested page was accepted.
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.pages_completed == self.total_requested
    }

    /// Pages the caller may want to resubmit as a new job.
    pub fn remaining(&self) -> u32 {
        self.total_requested - self.pages_completed
    }
}

/// # Print Scaler
///
/// ## Example
///
/// ```
/// use etiqueta::barcode;
/// use etiqueta::printer::{PrintScaler, PrinterHandle};
/// use etiqueta::render;
/// use etiqueta::transport::MemorySink;
///
/// let label = render::render(&barcode::encode_str("ABC-123")?, 600, 300)?;
/// let scaler = PrintScaler::default();
/// let job = scaler.build_job(&label, 2, &PrinterHandle::label_4x6())?;
///
/// let mut sink = MemorySink::default();
/// let result = scaler.submit(&job, &mut sink);
/// assert!(result.is_complete());
/// assert_eq!(sink.pages().len(), 2);
/// # Ok::<(), etiqueta::EtiquetaError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PrintScaler {
    /// Resampling filter for label → printer dots
    pub filter: FilterType,
}

impl Default for PrintScaler {
    /// Nearest-neighbour keeps bar edges hard.
    fn default() -> Self {
        Self {
            filter: FilterType::Nearest,
        }
    }
}

impl PrintScaler {
    /// Validate the copy count and compute placement.
    ///
    /// ## Errors
    ///
    /// [`EtiquetaError::InvalidCopyCount`] when `copies` is zero.
    pub fn build_job(
        &self,
        image: &RenderedImage,
        copies: u32,
        printer: &PrinterHandle,
    ) -> Result<PrintJob, EtiquetaError> {
        if copies < 1 {
            return Err(EtiquetaError::InvalidCopyCount(copies));
        }
        if printer.geometry.is_empty() {
            return Err(EtiquetaError::Config(format!(
                "printer '{}' has an empty printable area",
                printer.name
            )));
        }

        let placement = fit(image.width(), image.height(), &printer.geometry);
        log::debug!(
            "job for {:?} on {}: {}x{} at ({}, {}), scale {:.3}",
            image.value().as_str(),
            printer.name,
            placement.width,
            placement.height,
            placement.x,
            placement.y,
            placement.scale
        );

        Ok(PrintJob {
            image: image.clone(),
            copies,
            printer: printer.clone(),
            placement,
        })
    }

    /// Paint the full printable area: white background, scaled label at the
    /// placement.
    pub fn compose_page(&self, job: &PrintJob) -> GrayImage {
        let geometry = job.geometry();
        let placement = job.placement;

        let scaled = imageops::resize(
            job.image.bitmap(),
            placement.width,
            placement.height,
            self.filter,
        );
        let mut page = GrayImage::from_pixel(
            geometry.printable_width,
            geometry.printable_height,
            Luma([WHITE]),
        );
        imageops::replace(&mut page, &scaled, placement.x as i64, placement.y as i64);
        page
    }

    /// Send `job.copies()` pages to `sink`, stopping at the first failure.
    ///
    /// Failed pages are not retried.
    pub fn submit(&self, job: &PrintJob, sink: &mut dyn PageSink) -> PrintResult {
        let page = self.compose_page(job);
        let total = job.copies;

        for n in 0..total {
            if let Err(e) = sink.print_page(&page, job.geometry()) {
                log::error!(
                    "{}: page {} of {} failed: {}",
                    job.printer.name,
                    n + 1,
                    total,
                    e
                );
                return PrintResult {
                    pages_completed: n,
                    total_requested: total,
                    error: Some(e),
                };
            }
            log::debug!("{}: page {} of {} sent", job.printer.name, n + 1, total);
        }

        PrintResult {
            pages_completed: total,
            total_requested: total,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode;
    use crate::render;
    use crate::transport::MemorySink;

    fn label() -> RenderedImage {
        render::render(&barcode::encode_str("SCALE-1").unwrap(), 600, 300).unwrap()
    }

    /// Accepts `ok_pages` pages, then fails every page after.
    struct FailAfter {
        ok_pages: u32,
        seen: u32,
    }

    impl PageSink for FailAfter {
        fn print_page(&mut self, _page: &GrayImage, _geometry: &PageGeometry) -> Result<(), EtiquetaError> {
            self.seen += 1;
            if self.seen > self.ok_pages {
                return Err(EtiquetaError::Printer("printer disconnected".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_fit_width_bound() {
        // 600x300 into 812x1218: width limits, scale 812/600
        let p = fit(600, 300, &PageGeometry::new(812, 1218, 203));
        assert_eq!((p.width, p.height), (812, 406));
        assert_eq!((p.x, p.y), (0, 406));
        assert!((p.scale - 812.0 / 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_height_bound() {
        // 600x300 into 696x271: height limits
        let p = fit(600, 300, &PageGeometry::new(696, 271, 300));
        assert_eq!(p.height, 271);
        assert_eq!(p.width, 542);
        assert_eq!((p.x, p.y), (77, 0));
    }

    #[test]
    fn test_fit_preserves_aspect_and_bounds() {
        for (pw, ph) in [(100, 100), (2400, 3150), (57, 1000), (1000, 57)] {
            let g = PageGeometry::new(pw, ph, 203);
            let p = fit(600, 300, &g);
            assert!(p.x + p.width <= pw && p.y + p.height <= ph);
            let ratio = p.width as f64 / p.height as f64;
            assert!((ratio - 2.0).abs() < 0.1, "ratio {} for {}x{}", ratio, pw, ph);
        }
    }

    #[test]
    fn test_zero_copies_rejected() {
        let err = PrintScaler::default()
            .build_job(&label(), 0, &PrinterHandle::label_4x6())
            .unwrap_err();
        assert!(matches!(err, EtiquetaError::InvalidCopyCount(0)));
    }

    #[test]
    fn test_empty_geometry_rejected() {
        for geometry in [
            PageGeometry::new(0, 300, 203),
            PageGeometry::new(600, 0, 203),
            PageGeometry::new(600, 300, 0),
        ] {
            let printer = PrinterHandle::new("Broken", geometry);
            let err = PrintScaler::default().build_job(&label(), 1, &printer).unwrap_err();
            assert!(matches!(err, EtiquetaError::Config(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_fit_empty_page_does_not_panic() {
        let p = fit(600, 300, &PageGeometry::new(0, 0, 203));
        assert_eq!((p.x, p.y, p.width, p.height), (0, 0, 0, 0));
    }

    #[test]
    fn test_three_copies_all_succeed() {
        let scaler = PrintScaler::default();
        let job = scaler.build_job(&label(), 3, &PrinterHandle::label_4x6()).unwrap();
        let mut sink = MemorySink::default();
        let result = scaler.submit(&job, &mut sink);

        assert_eq!(result.pages_completed, 3);
        assert_eq!(result.total_requested, 3);
        assert!(result.error.is_none());
        assert!(result.is_complete());
        assert_eq!(sink.pages().len(), 3);
    }

    #[test]
    fn test_failure_on_second_page() {
        let scaler = PrintScaler::default();
        let job = scaler.build_job(&label(), 3, &PrinterHandle::label_4x6()).unwrap();
        let mut sink = FailAfter { ok_pages: 1, seen: 0 };
        let result = scaler.submit(&job, &mut sink);

        assert_eq!(result.pages_completed, 1);
        assert_eq!(result.total_requested, 3);
        assert!(matches!(result.error, Some(EtiquetaError::Printer(_))));
        assert_eq!(result.remaining(), 2);
        // No retry: the sink saw exactly the failing page and stopped
        assert_eq!(sink.seen, 2);
    }

    #[test]
    fn test_page_is_printable_area_with_centred_label() {
        let scaler = PrintScaler::default();
        let printer = PrinterHandle::label_62x29mm();
        let job = scaler.build_job(&label(), 1, &printer).unwrap();
        let page = scaler.compose_page(&job);

        assert_eq!(page.dimensions(), (696, 271));
        // Left of the placement is untouched background
        for y in 0..271 {
            for x in 0..job.placement().x {
                assert_eq!(page.get_pixel(x, y).0[0], WHITE);
            }
        }
        assert!(page.pixels().any(|p| p.0[0] == 0));
    }

    #[test]
    fn test_cached_bitmap_untouched_by_scaling() {
        let image = label();
        let before = image.pixels().to_vec();
        let scaler = PrintScaler::default();
        let job = scaler.build_job(&image, 1, &PrinterHandle::letter()).unwrap();
        let _ = scaler.compose_page(&job);
        assert_eq!(image.pixels(), before.as_slice());
        assert!(job.image().shares_pixels_with(&image));
    }
}
