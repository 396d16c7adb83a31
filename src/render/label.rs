//! # Label Renderer
//!
//! Rasterizes a [`SymbolStructure`] onto a fixed-size white canvas.
//!
//! ## Layout
//!
//! ```text
//! ├ quiet ┼──────────── usable width ────────────┼ quiet ┤   quiet = ceil(10% of width)
//! │       │ ▌▌ ▌ ▌▌▌ ▌  ▌▌ ▌▌ ▌ ▌▌▌  ▌ ▌▌ ▌▌▌ ▌ │       │   margin = height / 10
//! │       │ ▌▌ ▌ ▌▌▌ ▌  ▌▌ ▌▌ ▌ ▌▌▌  ▌ ▌▌ ▌▌▌ ▌ │       │
//! │       │             PJJ123C                  │       │   optional text line
//! ```
//!
//! When the symbol fits at one pixel per module or more, every module gets
//! the same integer width and the bar block is centred. Otherwise module
//! edges are placed proportionally across the usable width.
//!
//! Only integer arithmetic is used, so a given symbol and size always
//! produce the same bytes.

use image::{GrayImage, Luma};
use spleen_font::{FONT_12X24, PSF2Font};

use super::bitmap::{BLACK, RenderedImage, WHITE};
use crate::barcode::SymbolStructure;
use crate::error::EtiquetaError;

/// Smallest canvas width considered legible
pub const MIN_WIDTH: u32 = 50;
/// Smallest canvas height considered legible
pub const MIN_HEIGHT: u32 = 20;

/// Quiet zone on each side, as a percentage of canvas width
pub const QUIET_ZONE_PERCENT: u32 = 10;

const GLYPH_WIDTH: u32 = 12;
const GLYPH_HEIGHT: u32 = 24;
/// Gap between bars and the text line
const TEXT_GAP: u32 = 4;

/// Quiet zone width in pixels for a canvas `width` pixels wide.
pub fn quiet_zone(width: u32) -> u32 {
    (width * QUIET_ZONE_PERCENT).div_ceil(100)
}

/// How module edges map to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleScale {
    /// Every module is exactly this many pixels wide
    Fixed(u32),
    /// Fewer pixels than modules: edges placed proportionally
    Proportional,
}

/// Resolved pixel geometry for one symbol on one canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelLayout {
    /// First pixel column of the bar block
    pub bars_left: u32,
    /// Pixel width of the bar block
    pub bars_width: u32,
    pub scale: ModuleScale,
    /// First pixel row of the bars
    pub bar_top: u32,
    /// One past the last pixel row of the bars
    pub bar_bottom: u32,
    /// Top-left corner of the text line, when drawn
    pub text_origin: Option<(u32, u32)>,
}

/// # Label Renderer
///
/// ## Example
///
/// ```
/// use etiqueta::barcode;
/// use etiqueta::render::Renderer;
///
/// let symbol = barcode::encode_str("ABC-123")?;
/// let label = Renderer::default().render(&symbol, 600, 300)?;
/// assert_eq!((label.width(), label.height()), (600, 300));
/// # Ok::<(), etiqueta::EtiquetaError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderer {
    /// Draw the value as text under the bars
    pub human_readable: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            human_readable: true,
        }
    }
}

impl Renderer {
    pub fn new(human_readable: bool) -> Self {
        Self { human_readable }
    }

    /// Compute where bars and text go without drawing anything.
    pub fn layout(
        &self,
        symbol: &SymbolStructure,
        width: u32,
        height: u32,
    ) -> Result<LabelLayout, EtiquetaError> {
        check_size(width, height)?;

        let quiet = quiet_zone(width);
        let usable = width - 2 * quiet;
        let modules = symbol.module_count() as u32;
        let module_px = usable / modules;

        let (bars_left, bars_width, scale) = if module_px >= 1 {
            let bars_width = module_px * modules;
            (quiet + (usable - bars_width) / 2, bars_width, ModuleScale::Fixed(module_px))
        } else {
            (quiet, usable, ModuleScale::Proportional)
        };

        let margin = height / 10;
        let inner = height - 2 * margin;
        let text_block = GLYPH_HEIGHT + TEXT_GAP;
        let text_width = symbol.value().len() as u32 * GLYPH_WIDTH;

        let draw_text = self.human_readable && text_width <= usable && text_block * 2 <= inner;
        let (bar_bottom, text_origin) = if draw_text {
            let bar_bottom = margin + inner - text_block;
            let origin = ((width - text_width) / 2, bar_bottom + TEXT_GAP);
            (bar_bottom, Some(origin))
        } else {
            (margin + inner, None)
        };

        Ok(LabelLayout {
            bars_left,
            bars_width,
            scale,
            bar_top: margin,
            bar_bottom,
            text_origin,
        })
    }

    /// Render `symbol` onto a `width` x `height` canvas.
    ///
    /// ## Errors
    ///
    /// [`EtiquetaError::RenderSize`] when either dimension is below
    /// [`MIN_WIDTH`] x [`MIN_HEIGHT`] (which includes zero).
    pub fn render(
        &self,
        symbol: &SymbolStructure,
        width: u32,
        height: u32,
    ) -> Result<RenderedImage, EtiquetaError> {
        let layout = self.layout(symbol, width, height)?;
        let modules = symbol.module_count() as u32;

        let x_at = |module: u32| -> u32 {
            match layout.scale {
                ModuleScale::Fixed(px) => layout.bars_left + module * px,
                ModuleScale::Proportional => {
                    let offset = module as u64 * layout.bars_width as u64 / modules as u64;
                    layout.bars_left + offset as u32
                }
            }
        };

        let mut img = GrayImage::from_pixel(width, height, Luma([WHITE]));

        let mut module = 0u32;
        for segment in symbol.segments() {
            let next = module + segment.width as u32;
            if segment.is_bar {
                for x in x_at(module)..x_at(next) {
                    for y in layout.bar_top..layout.bar_bottom {
                        img.put_pixel(x, y, Luma([BLACK]));
                    }
                }
            }
            module = next;
        }

        if let Some((x, y)) = layout.text_origin {
            draw_text(&mut img, symbol.value().as_str(), x, y)?;
        }

        Ok(RenderedImage::new(symbol.value().clone(), img))
    }
}

/// Render with the default renderer (text line enabled).
pub fn render(
    symbol: &SymbolStructure,
    width: u32,
    height: u32,
) -> Result<RenderedImage, EtiquetaError> {
    Renderer::default().render(symbol, width, height)
}

fn check_size(width: u32, height: u32) -> Result<(), EtiquetaError> {
    if width < MIN_WIDTH || height < MIN_HEIGHT {
        return Err(EtiquetaError::RenderSize {
            width,
            height,
            min_width: MIN_WIDTH,
            min_height: MIN_HEIGHT,
        });
    }
    Ok(())
}

/// Draw ASCII text with the Spleen 12x24 bitmap font.
fn draw_text(img: &mut GrayImage, text: &str, x: u32, y: u32) -> Result<(), EtiquetaError> {
    let mut font = PSF2Font::new(FONT_12X24)
        .map_err(|_| EtiquetaError::Image("Spleen 12x24 font failed to load".into()))?;

    for (i, ch) in text.chars().enumerate() {
        let utf8_bytes = ch.to_string();
        let Some(glyph) = font.glyph_for_utf8(utf8_bytes.as_bytes()) else {
            continue;
        };
        let origin_x = x + i as u32 * GLYPH_WIDTH;
        for (row_y, row) in glyph.enumerate() {
            for (col_x, on) in row.enumerate() {
                let (px, py) = (origin_x + col_x as u32, y + row_y as u32);
                if on && px < img.width() && py < img.height() {
                    img.put_pixel(px, py, Luma([BLACK]));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode;

    fn symbol(text: &str) -> SymbolStructure {
        barcode::encode_str(text).unwrap()
    }

    #[test]
    fn test_rejects_small_and_zero_sizes() {
        let s = symbol("A");
        for (w, h) in [(0, 300), (600, 0), (49, 300), (600, 19)] {
            assert!(matches!(
                render(&s, w, h),
                Err(EtiquetaError::RenderSize { .. })
            ));
        }
        assert!(render(&s, MIN_WIDTH, MIN_HEIGHT).is_ok());
    }

    #[test]
    fn test_deterministic_bytes() {
        let s = symbol("PJJ123C");
        let a = render(&s, 600, 300).unwrap();
        let b = render(&s, 600, 300).unwrap();
        assert_eq!(a.pixels(), b.pixels());
        assert!(!a.shares_pixels_with(&b));
    }

    #[test]
    fn test_quiet_zones_are_white() {
        let s = symbol("Hello");
        let img = render(&s, 600, 300).unwrap();
        let quiet = quiet_zone(600);
        assert_eq!(quiet, 60);
        for y in 0..300 {
            for x in (0..quiet).chain(600 - quiet..600) {
                assert!(!img.is_black(x, y), "pixel ({}, {}) in quiet zone", x, y);
            }
        }
    }

    #[test]
    fn test_fixed_module_width_is_centred() {
        let s = symbol("Hello");
        // 7 symbols * 11 + 13 = 90 modules, 480 usable -> 5 px per module
        let layout = Renderer::default().layout(&s, 600, 300).unwrap();
        assert_eq!(layout.scale, ModuleScale::Fixed(5));
        assert_eq!(layout.bars_width, 450);
        assert_eq!(layout.bars_left, 60 + 15);
    }

    #[test]
    fn test_bars_match_modules() {
        let s = symbol("Hello");
        let img = render(&s, 600, 300).unwrap();
        let layout = Renderer::default().layout(&s, 600, 300).unwrap();
        let row = layout.bar_top;
        for (m, is_bar) in s.modules().enumerate() {
            let x = layout.bars_left + m as u32 * 5;
            for dx in 0..5 {
                assert_eq!(img.is_black(x + dx, row), is_bar, "module {}", m);
            }
        }
    }

    #[test]
    fn test_proportional_when_canvas_is_narrow() {
        let s = symbol("ABCDEFGH");
        let layout = Renderer::default().layout(&s, 100, 50).unwrap();
        assert_eq!(layout.scale, ModuleScale::Proportional);
        assert_eq!(layout.bars_left, 10);
        assert_eq!(layout.bars_width, 80);
    }

    #[test]
    fn test_text_line_placement() {
        let s = symbol("PJJ123C");
        let layout = Renderer::default().layout(&s, 600, 300).unwrap();
        // margin 30, inner 240, text block 28
        assert_eq!(layout.bar_top, 30);
        assert_eq!(layout.bar_bottom, 242);
        assert_eq!(layout.text_origin, Some(((600 - 7 * 12) / 2, 246)));

        let plain = Renderer::new(false).layout(&s, 600, 300).unwrap();
        assert_eq!(plain.bar_bottom, 270);
        assert_eq!(plain.text_origin, None);
    }

    #[test]
    fn test_text_skipped_when_it_does_not_fit() {
        let s = symbol("A-VERY-LONG-VALUE-THAT-DOES-NOT-FIT");
        let layout = Renderer::default().layout(&s, 200, 100).unwrap();
        assert_eq!(layout.text_origin, None);
    }

    #[test]
    fn test_text_line_draws_pixels() {
        let s = symbol("88");
        let img = render(&s, 600, 300).unwrap();
        let black_in = |rows: std::ops::Range<u32>| {
            rows.flat_map(|y| (0..600).map(move |x| (x, y)))
                .filter(|&(x, y)| img.is_black(x, y))
                .count()
        };
        // Gap between bars and text stays white, glyph rows carry ink
        assert_eq!(black_in(242..246), 0);
        assert!(black_in(246..270) > 0);
    }

    #[test]
    fn test_draw_text_clips_at_edges() {
        let mut img = GrayImage::from_pixel(30, 30, Luma([WHITE]));
        draw_text(&mut img, "WW", 20, 10).unwrap();

        let inked = img.pixels().filter(|p| p.0[0] == BLACK).count();
        assert!(inked > 0);
        // Nothing left of the origin
        assert!((0..30).all(|y| (0..20).all(|x| img.get_pixel(x, y).0[0] == WHITE)));
    }
}
