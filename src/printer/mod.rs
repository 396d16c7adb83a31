//! # Printer Module
//!
//! Printer geometry and the print-scaling stage.
//!
//! ## Modules
//!
//! - [`config`]: Printable-area geometry and named printer handles
//! - [`scaler`]: Label placement, page composition and copy submission

pub mod config;
pub mod scaler;

pub use config::{PageGeometry, PrinterHandle};
pub use scaler::{Placement, PrintJob, PrintResult, PrintScaler, fit};
