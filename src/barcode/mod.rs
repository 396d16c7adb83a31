//! # Code128 Barcode Encoding
//!
//! Turns text into a validated Code128 symbol.
//!
//! ## Pipeline
//!
//! ```text
//! &str ──BarcodeValue::new──► BarcodeValue ──encode──► SymbolStructure
//!            │                                              │
//!     EmptyValue / InvalidCharacter             start, data, checksum, stop
//!                                               as (width, is_bar) segments
//! ```
//!
//! ## Example
//!
//! ```
//! use etiqueta::barcode::{self, BarcodeValue};
//!
//! let value = BarcodeValue::new("PJJ123C")?;
//! let symbol = barcode::encode(&value);
//! assert_eq!(symbol.checksum(), 55);
//! # Ok::<(), etiqueta::EtiquetaError>(())
//! ```

pub mod code128;
mod value;

pub use code128::{SymbolStructure, encode};
pub use value::BarcodeValue;

use crate::error::EtiquetaError;

/// Validate and encode a string in one step.
pub fn encode_str(text: &str) -> Result<SymbolStructure, EtiquetaError> {
    let value = BarcodeValue::new(text)?;
    Ok(encode(&value))
}

/// One run of identical modules: a bar or a space `width` modules wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Width in modules (1-4)
    pub width: u8,
    /// `true` for a bar (black), `false` for a space (white)
    pub is_bar: bool,
}
