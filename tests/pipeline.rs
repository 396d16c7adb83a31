//! # Pipeline Tests
//!
//! End-to-end behaviour across encoder, renderer, cache, scaler and history.

use etiqueta::barcode::{self, BarcodeValue};
use etiqueta::config::AppConfig;
use etiqueta::history::ListOrder;
use etiqueta::pipeline::LabelPipeline;
use etiqueta::printer::{PrinterHandle, PageGeometry};
use etiqueta::render;
use etiqueta::transport::{MemorySink, PageSink};
use etiqueta::EtiquetaError;
use image::GrayImage;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn pipeline_with_capacity(capacity: usize) -> LabelPipeline {
    let config = AppConfig {
        cache_capacity: capacity,
        ..AppConfig::default()
    };
    let pipeline = LabelPipeline::new(&config);
    pipeline.register_printer(PrinterHandle::label_4x6(), Box::new(MemorySink::default()));
    pipeline
}

fn value(text: &str) -> BarcodeValue {
    BarcodeValue::new(text).unwrap()
}

/// Sink that rejects every page.
struct Jammed;

impl PageSink for Jammed {
    fn print_page(&mut self, _page: &GrayImage, _geometry: &PageGeometry) -> Result<(), EtiquetaError> {
        Err(EtiquetaError::Printer("paper jam".into()))
    }
}

// ============================================================================
// REPRINT
// ============================================================================

#[test]
fn test_reprint_reencodes_to_same_symbol() {
    let pipeline = pipeline_with_capacity(10);
    let original = value("PJJ123C");
    let encoded = barcode::encode(&original);

    let record = pipeline.print(&original, 1, None).unwrap().record.unwrap();
    let stored = pipeline.history_record(record.id).unwrap();

    assert_eq!(barcode::encode(&stored.value), encoded);
    assert_eq!(pipeline.symbol(&stored.value).checksum(), 55);
}

#[test]
fn test_reprint_after_eviction_rerenders() {
    let pipeline = pipeline_with_capacity(1);
    let first = pipeline.print(&value("FIRST-1"), 1, None).unwrap().record.unwrap();
    let before = pipeline.preview("FIRST-1").unwrap();

    // Evict FIRST-1
    pipeline.preview("SECOND-2").unwrap();
    assert_eq!(pipeline.cache().len(), 1);
    let renders = pipeline.cache_stats().renders;

    let outcome = pipeline.reprint(first.id, None).unwrap();
    assert!(outcome.result.is_complete());
    assert_eq!(pipeline.cache_stats().renders, renders + 1);

    let after = pipeline.preview("FIRST-1").unwrap();
    assert_eq!(after, before);
    assert!(!after.shares_pixels_with(&before));
}

#[test]
fn test_failed_print_leaves_history_untouched() {
    let pipeline = pipeline_with_capacity(10);
    pipeline.register_printer(PrinterHandle::letter(), Box::new(Jammed));

    let outcome = pipeline.print(&value("JAM"), 2, Some("Letter")).unwrap();
    assert_eq!(outcome.result.pages_completed, 0);
    assert!(outcome.result.error.is_some());
    assert!(pipeline.history(ListOrder::NewestFirst).is_empty());

    // The label itself is still cached for a retry
    assert_eq!(pipeline.cache().len(), 1);
}

// ============================================================================
// CACHE
// ============================================================================

#[test]
fn test_lru_scripted_access() {
    let pipeline = pipeline_with_capacity(2);
    pipeline.preview("A").unwrap();
    pipeline.preview("B").unwrap();
    pipeline.preview("A").unwrap();
    pipeline.preview("C").unwrap();

    let present: HashSet<String> = ["A", "B", "C"]
        .into_iter()
        .filter(|v| {
            let key = etiqueta::cache::RenderKey::new(value(v), 600, 300);
            pipeline.cache().contains(&key)
        })
        .map(String::from)
        .collect();
    assert_eq!(present, HashSet::from(["A".to_string(), "C".to_string()]));
    assert_eq!(pipeline.cache_stats().evictions, 1);
}

#[test]
fn test_concurrent_previews_render_once() {
    let pipeline = Arc::new(pipeline_with_capacity(10));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                pipeline.preview("CONCURRENT-42").unwrap()
            })
        })
        .collect();

    let images: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(pipeline.cache_stats().renders, 1);
    assert!(images.iter().all(|img| img.shares_pixels_with(&images[0])));
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[test]
fn test_history_and_spool_survive_restart() {
    let tmp = TempDir::new().unwrap();
    let config = AppConfig {
        history_file: tmp.path().join("history.json"),
        spool_dir: tmp.path().join("spool"),
        ..AppConfig::default()
    };

    {
        let pipeline = LabelPipeline::open(&config).unwrap();
        pipeline.print(&value("KEEP-1"), 2, None).unwrap();
        pipeline.print(&value("KEEP-2"), 1, Some("Letter")).unwrap();
    }

    let pipeline = LabelPipeline::open(&config).unwrap();
    let values: Vec<String> = pipeline
        .history(ListOrder::NewestFirst)
        .into_iter()
        .map(|r| r.value.into())
        .collect();
    assert_eq!(values, vec!["KEEP-2".to_string(), "KEEP-1".to_string()]);

    let next = pipeline.print(&value("KEEP-3"), 1, None).unwrap().record.unwrap();
    assert_eq!(next.id, 3);

    let spool = tmp.path().join("spool");
    assert!(spool.join("Label_4x6/page-000003.png").is_file());
    assert!(spool.join("Letter/page-000001.png").is_file());
}

#[test]
fn test_history_limit_trims_file_only() {
    let tmp = TempDir::new().unwrap();
    let config = AppConfig {
        history_file: tmp.path().join("history.json"),
        spool_dir: tmp.path().join("spool"),
        history_limit: 2,
        ..AppConfig::default()
    };

    let pipeline = LabelPipeline::open(&config).unwrap();
    for v in ["H1", "H2", "H3"] {
        pipeline.print(&value(v), 1, None).unwrap();
    }

    // Everything printed this session is still reprintable
    assert_eq!(pipeline.history(ListOrder::OldestFirst).len(), 3);
    let again = pipeline.reprint(1, None).unwrap().record.unwrap();
    assert_eq!(again.value.as_str(), "H1");
    assert_eq!(again.id, 4);
    assert_eq!(pipeline.history(ListOrder::OldestFirst).len(), 4);

    // Only the newest two reached disk
    let reopened = LabelPipeline::open(&config).unwrap();
    let ids: Vec<u64> = reopened
        .history(ListOrder::OldestFirst)
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![3, 4]);
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_render_is_deterministic(text in "[ -~]{1,24}") {
        let symbol = barcode::encode_str(&text).unwrap();
        let a = render::render(&symbol, 600, 300).unwrap();
        let b = render::render(&barcode::encode_str(&text).unwrap(), 600, 300).unwrap();
        prop_assert_eq!(a.pixels(), b.pixels());
    }

    #[test]
    fn prop_renders_equal_distinct_keys(picks in prop::collection::vec(0usize..6, 1..40)) {
        let pool = ["A1", "B22", "C333", "12345678", "hello world", "~}|"];
        let pipeline = pipeline_with_capacity(pool.len());

        for &i in &picks {
            pipeline.preview(pool[i]).unwrap();
        }

        let distinct: HashSet<usize> = picks.iter().copied().collect();
        let stats = pipeline.cache_stats();
        prop_assert_eq!(stats.renders as usize, distinct.len());
        prop_assert_eq!(stats.misses as usize, distinct.len());
        prop_assert_eq!(stats.hits as usize, picks.len() - distinct.len());
    }
}
