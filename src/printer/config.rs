//! # Printer Configuration
//!
//! Printable-area geometry and named printer handles.
//!
//! ## Built-in Printers
//!
//! | Name | Printable area (dots) | Resolution |
//! |------|-----------------------|------------|
//! | Label 4x6 | 812 × 1218 | 203 DPI |
//! | Label 62x29mm | 696 × 271 | 300 DPI |
//! | Letter | 2400 × 3150 | 300 DPI |
//!
//! ## Usage
//!
//! ```
//! use etiqueta::printer::{PageGeometry, PrinterHandle};
//!
//! let geometry = PageGeometry::parse("812x1218@203")?;
//! assert!((geometry.width_mm() - 101.6).abs() < 0.1);
//!
//! let handle = PrinterHandle::parse("Shipping=812x1218@203")?;
//! assert_eq!(handle.name, "Shipping");
//! # Ok::<(), etiqueta::EtiquetaError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::EtiquetaError;

/// # Page Geometry
///
/// The area a printer can actually mark, in device dots.
///
/// ## Calculations
///
/// ```text
/// dots_per_mm = dpi / 25.4
/// width_mm = printable_width / dots_per_mm
///
/// For a 4x6" label at 203 DPI:
///   dots_per_mm = 203 / 25.4 ≈ 8
///   width_mm = 812 / 8 ≈ 101.6mm
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Printable width in dots
    pub printable_width: u32,

    /// Printable height in dots
    pub printable_height: u32,

    /// Resolution in dots per inch
    pub dpi: u16,
}

impl PageGeometry {
    pub const fn new(printable_width: u32, printable_height: u32, dpi: u16) -> Self {
        Self {
            printable_width,
            printable_height,
            dpi,
        }
    }

    /// No printable dots (or no resolution), so nothing can be placed on it
    pub fn is_empty(&self) -> bool {
        self.printable_width == 0 || self.printable_height == 0 || self.dpi == 0
    }

    /// Calculate dots per millimeter
    #[inline]
    pub fn dots_per_mm(&self) -> f32 {
        self.dpi as f32 / 25.4
    }

    /// Printable width in millimeters
    #[inline]
    pub fn width_mm(&self) -> f32 {
        self.dots_to_mm(self.printable_width)
    }

    /// Printable height in millimeters
    #[inline]
    pub fn height_mm(&self) -> f32 {
        self.dots_to_mm(self.printable_height)
    }

    /// Convert millimeters to dots
    #[inline]
    pub fn mm_to_dots(&self, mm: f32) -> u32 {
        (mm * self.dots_per_mm()).round() as u32
    }

    /// Convert dots to millimeters
    #[inline]
    pub fn dots_to_mm(&self, dots: u32) -> f32 {
        dots as f32 / self.dots_per_mm()
    }

    /// Parse `WIDTHxHEIGHT@DPI`, e.g. `"812x1218@203"`.
    pub fn parse(s: &str) -> Result<Self, EtiquetaError> {
        let invalid = || {
            EtiquetaError::Config(format!(
                "Invalid page geometry '{}'. Use WIDTHxHEIGHT@DPI, e.g. 812x1218@203",
                s
            ))
        };

        let (dims, dpi) = s.trim().split_once('@').ok_or_else(invalid)?;
        let (w, h) = dims.split_once('x').ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        let dpi: u16 = dpi.trim().parse().map_err(|_| invalid())?;

        let geometry = Self::new(width, height, dpi);
        if geometry.is_empty() {
            return Err(invalid());
        }
        Ok(geometry)
    }
}

/// A named printer and the geometry of the media loaded in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterHandle {
    /// Printer name as shown to the user
    pub name: String,
    #[serde(flatten)]
    pub geometry: PageGeometry,
}

impl PrinterHandle {
    pub fn new(name: impl Into<String>, geometry: PageGeometry) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }

    /// 4x6" shipping label at 203 DPI.
    pub fn label_4x6() -> Self {
        Self::new("Label 4x6", PageGeometry::new(812, 1218, 203))
    }

    /// 62x29mm die-cut label at 300 DPI.
    pub fn label_62x29mm() -> Self {
        Self::new("Label 62x29mm", PageGeometry::new(696, 271, 300))
    }

    /// US Letter at 300 DPI with quarter-inch margins.
    pub fn letter() -> Self {
        Self::new("Letter", PageGeometry::new(2400, 3150, 300))
    }

    /// List all built-in printers.
    pub fn built_in() -> Vec<Self> {
        vec![Self::label_4x6(), Self::label_62x29mm(), Self::letter()]
    }

    /// Parse a printer string.
    ///
    /// Formats:
    /// - A built-in name, case-insensitive (e.g. `"letter"`, `"Label 4x6"`)
    /// - `"NAME=WIDTHxHEIGHT@DPI"` (e.g. `"Front Desk=696x271@300"`)
    pub fn parse(s: &str) -> Result<Self, EtiquetaError> {
        if let Some(handle) = Self::built_in()
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(s.trim()))
        {
            return Ok(handle);
        }

        match s.split_once('=') {
            Some((name, geometry)) if !name.trim().is_empty() => {
                Ok(Self::new(name.trim(), PageGeometry::parse(geometry)?))
            }
            _ => Err(EtiquetaError::Config(format!(
                "Unknown printer '{}'. Use a built-in name or NAME=WIDTHxHEIGHT@DPI",
                s
            ))),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dots_per_mm() {
        let geometry = PrinterHandle::label_4x6().geometry;
        // 203 DPI ≈ 8 dots/mm
        assert!((geometry.dots_per_mm() - 8.0).abs() < 0.1);
    }

    #[test]
    fn test_4x6_is_four_by_six_inches() {
        let geometry = PrinterHandle::label_4x6().geometry;
        assert!((geometry.width_mm() - 101.6).abs() < 0.5);
        assert!((geometry.height_mm() - 152.4).abs() < 0.5);
    }

    #[test]
    fn test_mm_round_trip() {
        let geometry = PrinterHandle::label_62x29mm().geometry;
        let dots = geometry.mm_to_dots(29.0);
        assert!((dots as i64 - 343).abs() <= 1);
        assert!((geometry.dots_to_mm(dots) - 29.0).abs() < 0.1);
    }

    #[test]
    fn test_parse_geometry() {
        assert_eq!(
            PageGeometry::parse("696x271@300").unwrap(),
            PageGeometry::new(696, 271, 300)
        );
        for bad in ["696x271", "696@300", "0x271@300", "axb@c", ""] {
            assert!(PageGeometry::parse(bad).is_err(), "{:?} should fail", bad);
        }
    }

    #[test]
    fn test_parse_handle() {
        assert_eq!(PrinterHandle::parse("letter").unwrap(), PrinterHandle::letter());
        assert_eq!(
            PrinterHandle::parse("Label 4X6").unwrap(),
            PrinterHandle::label_4x6()
        );

        let custom = PrinterHandle::parse("Front Desk=696x271@300").unwrap();
        assert_eq!(custom.name, "Front Desk");
        assert_eq!(custom.geometry.dpi, 300);

        assert!(PrinterHandle::parse("nonexistent").is_err());
        assert!(PrinterHandle::parse("=696x271@300").is_err());
    }

    #[test]
    fn test_handle_serializes_flat() {
        let json = serde_json::to_value(PrinterHandle::letter()).unwrap();
        assert_eq!(json["name"], "Letter");
        assert_eq!(json["printable_width"], 2400);
        assert_eq!(json["dpi"], 300);
    }
}
