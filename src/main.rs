//! # Etiqueta CLI
//!
//! Command-line interface for Code128 label printing.
//!
//! ## Usage
//!
//! ```bash
//! # Render a label to PNG
//! etiqueta preview PJJ123C --png label.png
//!
//! # Print three copies on the default printer
//! etiqueta print PJJ123C --copies 3
//!
//! # Show what was printed, then print entry 12 again
//! etiqueta history
//! etiqueta reprint 12
//!
//! # Start the HTTP API
//! etiqueta serve --listen 0.0.0.0:8080
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use etiqueta::{
    EtiquetaError,
    barcode::BarcodeValue,
    config::AppConfig,
    history::ListOrder,
    pipeline::{LabelPipeline, PrintOutcome},
    render::encode_png,
    server,
};

/// Etiqueta - Code128 label printer utility
#[derive(Parser, Debug)]
#[command(name = "etiqueta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (JSON); defaults apply when it does not exist
    #[arg(long, global = true, default_value = "etiqueta.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a label and save it as PNG
    Preview {
        /// Text to encode
        value: String,

        /// Output file
        #[arg(long, value_name = "FILE", default_value = "label.png")]
        png: PathBuf,

        /// Save the downscaled preview instead of the full label
        #[arg(long)]
        thumbnail: bool,
    },

    /// Print a label and record it in history
    Print {
        /// Text to encode
        value: String,

        /// Number of copies
        #[arg(long, default_value = "1")]
        copies: u32,

        /// Printer name (defaults to the configured default)
        #[arg(long)]
        printer: Option<String>,
    },

    /// List print history, newest first
    History {
        /// Show per-value totals instead of individual prints
        #[arg(long)]
        summary: bool,

        /// Show at most this many rows
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print a history entry again
    Reprint {
        /// History id
        id: u64,

        /// Print on this printer instead of the original one
        #[arg(long)]
        printer: Option<String>,
    },

    /// List configured printers
    Printers,

    /// Start the HTTP server
    Serve {
        /// Address to listen on (overrides the config file)
        #[arg(long)]
        listen: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), EtiquetaError> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Preview {
            value,
            png,
            thumbnail,
        } => {
            let pipeline = LabelPipeline::new(&config);
            let label = pipeline.preview(&value)?;
            let bytes = if thumbnail {
                encode_png(&pipeline.thumbnail(&label))?
            } else {
                label.to_png()?
            };
            std::fs::write(&png, bytes)?;
            println!("Saved {} to {}", value, png.display());
        }

        Commands::Print {
            value,
            copies,
            printer,
        } => {
            let pipeline = LabelPipeline::open(&config)?;
            let value = BarcodeValue::new(value)?;
            let outcome = pipeline.print(&value, copies, printer.as_deref())?;
            report(&outcome)?;
        }

        Commands::History { summary, limit } => {
            let pipeline = LabelPipeline::open(&config)?;
            let limit = limit.unwrap_or(usize::MAX);
            if summary {
                println!("{:<24} {:>7} {:>7}  {:<20} {:>6}", "VALUE", "COPIES", "PRINTS", "LAST PRINTED", "LAST");
                for tally in pipeline.summary().into_iter().take(limit) {
                    println!(
                        "{:<24} {:>7} {:>7}  {:<20} {:>6}",
                        tally.value.as_str(),
                        tally.total_copies,
                        tally.prints,
                        tally.last_printed.format("%Y-%m-%d %H:%M:%S").to_string(),
                        tally.last_id
                    );
                }
            } else {
                println!("{:>6}  {:<24} {:>6}  {:<16} {:<20}", "ID", "VALUE", "COPIES", "PRINTER", "PRINTED");
                for record in pipeline.history(ListOrder::NewestFirst).into_iter().take(limit) {
                    println!(
                        "{:>6}  {:<24} {:>6}  {:<16} {:<20}",
                        record.id,
                        record.value.as_str(),
                        record.copies,
                        record.printer,
                        record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
                    );
                }
            }
        }

        Commands::Reprint { id, printer } => {
            let pipeline = LabelPipeline::open(&config)?;
            let outcome = pipeline.reprint(id, printer.as_deref())?;
            report(&outcome)?;
        }

        Commands::Printers => {
            let default = config.default_printer_name();
            for printer in &config.printers {
                let g = &printer.geometry;
                let marker = if Some(printer.name.as_str()) == default { "*" } else { " " };
                println!(
                    "{} {:<20} {}x{} dots @ {} DPI ({:.1} x {:.1} mm)",
                    marker,
                    printer.name,
                    g.printable_width,
                    g.printable_height,
                    g.dpi,
                    g.width_mm(),
                    g.height_mm()
                );
            }
        }

        Commands::Serve { listen } => {
            let pipeline = LabelPipeline::open(&config)?;
            let listen_addr = listen.unwrap_or_else(|| config.listen_addr.clone());
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(pipeline, &listen_addr))?;
        }
    }

    Ok(())
}

/// Print a one-line summary; a partial print is an error exit.
fn report(outcome: &PrintOutcome) -> Result<(), EtiquetaError> {
    let result = &outcome.result;
    match (&result.error, &outcome.record) {
        (None, Some(record)) => {
            println!(
                "Printed {} x{} on {} (history #{})",
                record.value, record.copies, outcome.printer, record.id
            );
            Ok(())
        }
        (Some(e), _) => Err(EtiquetaError::Printer(format!(
            "{} of {} pages printed on {}: {}",
            result.pages_completed, result.total_requested, outcome.printer, e
        ))),
        (None, None) => Err(EtiquetaError::Printer(format!(
            "{} of {} pages printed on {}",
            result.pages_completed, result.total_requested, outcome.printer
        ))),
    }
}
