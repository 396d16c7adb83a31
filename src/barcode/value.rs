//! Validated barcode text.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EtiquetaError;

/// An immutable string that Code128 sets B and C can encode.
///
/// Accepted characters are printable ASCII plus DEL (`0x20..=0x7F`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BarcodeValue(String);

impl BarcodeValue {
    /// Validate `text` and wrap it.
    ///
    /// ## Errors
    ///
    /// - [`EtiquetaError::EmptyValue`] for an empty string
    /// - [`EtiquetaError::InvalidCharacter`] for the first character outside
    ///   `0x20..=0x7F`, with its character position
    pub fn new(text: impl Into<String>) -> Result<Self, EtiquetaError> {
        let text = text.into();
        if text.is_empty() {
            return Err(EtiquetaError::EmptyValue);
        }
        if let Some((position, ch)) = text
            .chars()
            .enumerate()
            .find(|(_, ch)| !is_encodable(*ch))
        {
            return Err(EtiquetaError::InvalidCharacter { ch, position });
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw bytes. Always ASCII, so byte index == character index.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: empty values are rejected on construction.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_encodable(ch: char) -> bool {
    matches!(ch, ' '..='\u{7f}')
}

impl fmt::Display for BarcodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BarcodeValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BarcodeValue {
    type Error = EtiquetaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for BarcodeValue {
    type Error = EtiquetaError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BarcodeValue> for String {
    fn from(value: BarcodeValue) -> Self {
        value.0
    }
}
