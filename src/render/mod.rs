//! # Rendering Module
//!
//! Turns an encoded symbol into a fixed-size grayscale label.
//!
//! ## Modules
//!
//! - [`label`]: Quiet zones, module scaling and the human-readable line
//! - [`bitmap`]: The shared, read-only [`RenderedImage`] and PNG encoding
//!
//! ## Usage Example
//!
//! ```
//! use etiqueta::barcode;
//! use etiqueta::render::{self, Renderer};
//!
//! let symbol = barcode::encode_str("PJJ123C")?;
//!
//! // Default renderer: bars plus the value printed underneath
//! let label = render::render(&symbol, 600, 300)?;
//! assert_eq!((label.width(), label.height()), (600, 300));
//!
//! // Bars only
//! let bare = Renderer::new(false).render(&symbol, 600, 300)?;
//! assert_ne!(label, bare);
//! # Ok::<(), etiqueta::EtiquetaError>(())
//! ```

pub mod bitmap;
pub mod label;

pub use bitmap::{BLACK, RenderedImage, WHITE, encode_png};
pub use label::{LabelLayout, MIN_HEIGHT, MIN_WIDTH, ModuleScale, Renderer, render};
