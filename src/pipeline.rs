//! # Label Pipeline
//!
//! Owns the renderer, cache, ledger and printers, and wires them together.
//!
//! ## Data Flow
//!
//! ```text
//!                 ┌──────────── hit ────────────┐
//! text ─► encode ─┤                             ├─► preview / thumbnail
//!                 └─ miss ─► render ─► cache ───┘
//!                                        │
//!                        print ──────────┴─► scaler ─► page sink (per printer)
//!                                                         │
//!                                      all copies out ────┴─► history append
//!
//! reprint(id) ─► history lookup ─► print(stored value)   (re-rendered if evicted)
//! ```
//!
//! ## Concurrency
//!
//! The pipeline is shared behind an `Arc`. Each printer's sink has its own
//! lock, so jobs for one printer run one at a time while different printers
//! print in parallel. Preview requests carry a [`PreviewTicket`] for a named
//! input field; a result whose ticket has been superseded by a newer request
//! for the same field is dropped instead of returned. Other fields are
//! unaffected.

use std::collections::HashMap;
use std::sync::Arc;

use image::GrayImage;
use parking_lot::{Mutex, RwLock};

use crate::barcode::{self, BarcodeValue, SymbolStructure};
use crate::cache::{CacheStats, ImageCache, RenderKey};
use crate::config::{AppConfig, LabelSettings};
use crate::error::EtiquetaError;
use crate::history::{BarcodeTally, HistoryLedger, HistoryRecord, HistoryStore, ListOrder, NewRecord};
use crate::printer::{PrintResult, PrintScaler, PrinterHandle};
use crate::render::{RenderedImage, Renderer};
use crate::transport::{PageSink, SpoolSink};

/// Identifies one preview request for one input field; only the newest
/// request per field gets a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTicket {
    field: String,
    generation: u64,
}

impl PreviewTicket {
    pub fn field(&self) -> &str {
        &self.field
    }
}

/// Result of a print or reprint.
#[derive(Debug)]
pub struct PrintOutcome {
    pub printer: String,
    pub result: PrintResult,
    /// The history entry, present only when every copy went out
    pub record: Option<HistoryRecord>,
}

struct PrinterSlot {
    handle: PrinterHandle,
    sink: Mutex<Box<dyn PageSink>>,
}

pub struct LabelPipeline {
    label: LabelSettings,
    renderer: Renderer,
    scaler: PrintScaler,
    cache: ImageCache,
    history: Mutex<HistoryLedger>,
    store: Option<HistoryStore>,
    printers: RwLock<Vec<Arc<PrinterSlot>>>,
    default_printer: Option<String>,
    preview_generations: Mutex<HashMap<String, u64>>,
}

impl LabelPipeline {
    /// In-memory pipeline: empty history, no printers registered.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            label: config.label.clone(),
            renderer: Renderer::new(config.label.human_readable),
            scaler: PrintScaler::default(),
            cache: ImageCache::new(config.cache_capacity),
            history: Mutex::new(HistoryLedger::new()),
            store: None,
            printers: RwLock::new(Vec::new()),
            default_printer: config.default_printer.clone(),
            preview_generations: Mutex::new(HashMap::new()),
        }
    }

    /// Pipeline backed by the config's history file, with a spool-directory
    /// sink for every configured printer.
    pub fn open(config: &AppConfig) -> Result<Self, EtiquetaError> {
        config.validate()?;
        let store = HistoryStore::new(&config.history_file, config.history_limit);
        let pipeline = Self::new(config).with_store(store)?;

        for handle in &config.printers {
            let sink = SpoolSink::open(&config.spool_dir, &handle.name)?;
            pipeline.register_printer(handle.clone(), Box::new(sink));
        }
        Ok(pipeline)
    }

    /// Load history from `store` and persist to it after every append.
    ///
    /// The store decides how much history reaches disk; records from this
    /// session stay available until the pipeline is dropped.
    pub fn with_store(mut self, store: HistoryStore) -> Result<Self, EtiquetaError> {
        self.history = Mutex::new(store.load()?);
        self.store = Some(store);
        Ok(self)
    }

    pub fn with_history(self, ledger: HistoryLedger) -> Self {
        Self {
            history: Mutex::new(ledger),
            ..self
        }
    }

    /// Add a printer, replacing any printer with the same name.
    pub fn register_printer(&self, handle: PrinterHandle, sink: Box<dyn PageSink>) {
        let slot = Arc::new(PrinterSlot {
            handle,
            sink: Mutex::new(sink),
        });
        let mut printers = self.printers.write();
        match printers.iter().position(|s| s.handle.name == slot.handle.name) {
            Some(i) => printers[i] = slot,
            None => printers.push(slot),
        }
    }

    pub fn printers(&self) -> Vec<PrinterHandle> {
        self.printers.read().iter().map(|s| s.handle.clone()).collect()
    }

    pub fn label_settings(&self) -> &LabelSettings {
        &self.label
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Encode without rendering.
    pub fn symbol(&self, value: &BarcodeValue) -> SymbolStructure {
        barcode::encode(value)
    }

    /// The canonical label for `value`, from cache when possible.
    pub fn label(&self, value: &BarcodeValue) -> Result<RenderedImage, EtiquetaError> {
        let (width, height) = (self.label.width, self.label.height);
        let key = RenderKey::new(value.clone(), width, height);
        self.cache.get_or_render(&key, || {
            self.renderer.render(&barcode::encode(value), width, height)
        })
    }

    /// Validate `text` and return its label.
    pub fn preview(&self, text: &str) -> Result<RenderedImage, EtiquetaError> {
        self.label(&BarcodeValue::new(text)?)
    }

    /// Start a preview request for `field`, superseding earlier requests
    /// for that field only.
    pub fn begin_preview(&self, field: &str) -> PreviewTicket {
        let mut generations = self.preview_generations.lock();
        let generation = generations.entry(field.to_string()).or_insert(0);
        *generation += 1;
        PreviewTicket {
            field: field.to_string(),
            generation: *generation,
        }
    }

    /// Whether `ticket` is still the newest request for its field.
    pub fn is_current(&self, ticket: &PreviewTicket) -> bool {
        self.preview_generations.lock().get(&ticket.field) == Some(&ticket.generation)
    }

    /// Preview for `ticket`, or `None` if a newer request started meanwhile.
    ///
    /// Validation errors are returned even for superseded tickets. A label
    /// rendered for a superseded ticket still lands in the cache.
    pub fn preview_for(
        &self,
        ticket: &PreviewTicket,
        text: &str,
    ) -> Result<Option<RenderedImage>, EtiquetaError> {
        let value = BarcodeValue::new(text)?;
        if !self.is_current(ticket) {
            log::warn!("preview {:?} for {} superseded before render", value.as_str(), ticket.field);
            return Ok(None);
        }

        let image = self.label(&value)?;
        if !self.is_current(ticket) {
            log::warn!("preview {:?} for {} superseded, result dropped", value.as_str(), ticket.field);
            return Ok(None);
        }
        Ok(Some(image))
    }

    /// Downscaled copy at the configured preview size.
    pub fn thumbnail(&self, image: &RenderedImage) -> GrayImage {
        image.thumbnail(self.label.preview_width, self.label.preview_height)
    }

    /// Print `copies` of `value` on `printer` (or the default printer).
    ///
    /// ## Errors
    ///
    /// Validation problems (`InvalidCopyCount`, `UnknownPrinter`, render
    /// errors) come back as `Err`. Sink failures come back inside the
    /// outcome's [`PrintResult`].
    pub fn print(
        &self,
        value: &BarcodeValue,
        copies: u32,
        printer: Option<&str>,
    ) -> Result<PrintOutcome, EtiquetaError> {
        let slot = self.resolve_printer(printer)?;
        let image = self.label(value)?;
        let job = self.scaler.build_job(&image, copies, &slot.handle)?;

        log::info!(
            "printing {:?} x{} on {}",
            value.as_str(),
            copies,
            slot.handle.name
        );
        let result = {
            let mut sink = slot.sink.lock();
            self.scaler.submit(&job, sink.as_mut())
        };

        let record = if result.is_complete() {
            Some(self.record(NewRecord {
                value: value.clone(),
                copies,
                printer: slot.handle.name.clone(),
            }))
        } else {
            log::warn!(
                "{}: {} of {} pages printed, not recorded in history",
                slot.handle.name,
                result.pages_completed,
                result.total_requested
            );
            None
        };

        Ok(PrintOutcome {
            printer: slot.handle.name.clone(),
            result,
            record,
        })
    }

    /// Print a history entry again, with its stored value and copy count.
    ///
    /// Uses the record's printer unless `printer` overrides it. A successful
    /// reprint is appended as a new record.
    pub fn reprint(&self, id: u64, printer: Option<&str>) -> Result<PrintOutcome, EtiquetaError> {
        let record = self.history.lock().get(id)?;
        log::info!("reprint of #{} ({:?})", id, record.value.as_str());
        self.print(
            &record.value,
            record.copies,
            Some(printer.unwrap_or(&record.printer)),
        )
    }

    pub fn history(&self, order: ListOrder) -> Vec<HistoryRecord> {
        self.history.lock().list(order)
    }

    pub fn history_record(&self, id: u64) -> Result<HistoryRecord, EtiquetaError> {
        self.history.lock().get(id)
    }

    pub fn summary(&self) -> Vec<BarcodeTally> {
        self.history.lock().summary()
    }

    fn record(&self, new: NewRecord) -> HistoryRecord {
        let mut ledger = self.history.lock();
        let record = ledger.append(new);

        if let Some(store) = &self.store {
            if let Err(e) = store.save(&ledger) {
                log::error!("failed to save history to {}: {}", store.path().display(), e);
            }
        }
        record
    }

    fn resolve_printer(&self, name: Option<&str>) -> Result<Arc<PrinterSlot>, EtiquetaError> {
        let printers = self.printers.read();
        let wanted = name.or(self.default_printer.as_deref());

        let slot = match wanted {
            Some(name) => printers.iter().find(|s| s.handle.name == name),
            None => printers.first(),
        };
        slot.cloned().ok_or_else(|| {
            EtiquetaError::UnknownPrinter(wanted.unwrap_or("(none registered)").to_string())
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
