//! # Etiqueta - Code128 Label Printing Library
//!
//! Etiqueta renders Code128 barcodes on demand, keeps rendered labels in a
//! bounded cache, scales them onto printer media and records every print so
//! it can be repeated later. It provides:
//!
//! - **Encoding**: Code128 (sets B and C) with automatic set selection
//! - **Rendering**: Fixed-size grayscale labels with quiet zones and text
//! - **Caching**: Strict LRU with in-flight deduplication
//! - **Printing**: Aspect-preserving scaling, centred placement, copy counts
//! - **History**: Append-only ledger with reprint-by-id
//!
//! ## Quick Start
//!
//! ```
//! use etiqueta::{
//!     barcode::BarcodeValue,
//!     config::AppConfig,
//!     history::ListOrder,
//!     pipeline::LabelPipeline,
//!     printer::PrinterHandle,
//!     transport::MemorySink,
//! };
//!
//! let pipeline = LabelPipeline::new(&AppConfig::default());
//! pipeline.register_printer(PrinterHandle::label_4x6(), Box::new(MemorySink::default()));
//!
//! // Preview (renders once, then served from cache)
//! let label = pipeline.preview("PJJ123C")?;
//! assert_eq!((label.width(), label.height()), (600, 300));
//!
//! // Print two copies and reprint them from history
//! let outcome = pipeline.print(&BarcodeValue::new("PJJ123C")?, 2, None)?;
//! let id = outcome.record.map(|r| r.id).unwrap_or_default();
//! pipeline.reprint(id, None)?;
//! assert_eq!(pipeline.history(ListOrder::NewestFirst).len(), 2);
//!
//! # Ok::<(), etiqueta::EtiquetaError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`barcode`] | Value validation and Code128 encoding |
//! | [`render`] | Label rasterization |
//! | [`cache`] | Rendered label cache |
//! | [`printer`] | Printer geometry and print scaling |
//! | [`transport`] | Page sinks |
//! | [`history`] | Print ledger and its JSON store |
//! | [`pipeline`] | Orchestration of all of the above |
//! | [`config`] | Settings file |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod barcode;
pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod printer;
pub mod render;
pub mod server;
pub mod transport;

// Re-exports for convenience
pub use barcode::BarcodeValue;
pub use error::EtiquetaError;
pub use pipeline::LabelPipeline;
pub use printer::PrinterHandle;
