//! Main entry point for the pzip CLI application.
//!
//! Compresses files into PZIP containers, restores them, and lists the
//! record table of a container.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pzip::cli::Mode;
use pzip::{
    Cli, ContainerParser, Decoder, EncodeOptions, Encoder, LocalFileReader, ProgressSink, ReadAt,
};

/// Application entry point.
///
/// Parses command-line arguments and dispatches on the requested mode.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.mode() {
        Mode::Compress => compress(&cli).await,
        Mode::Decompress | Mode::List => {
            let path = Path::new(&cli.file);
            if !path.exists() {
                bail!("Input file does not exist: {}", path.display());
            }
            let reader = Arc::new(LocalFileReader::new(path)?);
            process_container(reader, &cli).await
        }
    }
}

/// Send library diagnostics to stderr; `RUST_LOG` overrides the default.
fn init_tracing(verbose: bool) {
    let default = if verbose { "pzip=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Progress sink that redraws a single status line on stderr.
struct ConsoleProgress {
    enabled: bool,
    line_open: Cell<bool>,
}

impl ConsoleProgress {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            line_open: Cell::new(false),
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn report(&self, message: &str, percent: f64) {
        if !self.enabled {
            return;
        }

        let finished = message.ends_with("successfully!");
        let failed = percent == 0.0 && message.contains("error:");

        if failed {
            // The error itself is printed when main returns.
            if self.line_open.replace(false) {
                eprintln!();
            }
        } else if finished {
            eprintln!("\r\x1b[K{}", message);
            self.line_open.set(false);
        } else {
            eprint!("\r\x1b[K[{:5.1}%] {}", percent, message);
            self.line_open.set(true);
        }
    }
}

/// Resolve `path` through `..` components and symlinks.
///
/// A path that does not exist yet is resolved through its parent
/// directory, so `dir/x/../a` and `dir/a` compare equal.
fn resolve(path: &Path) -> Result<PathBuf> {
    if let Ok(resolved) = path.canonicalize() {
        return Ok(resolved);
    }

    let absolute = std::path::absolute(path)?;
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => match parent.canonicalize() {
            Ok(parent) => Ok(parent.join(name)),
            Err(_) => Ok(absolute),
        },
        _ => Ok(absolute),
    }
}

/// Reject destinations that would clobber the input or an existing file.
fn check_output(input: &Path, output: &Path, force: bool) -> Result<()> {
    if resolve(input)? == resolve(output)? {
        bail!("Input and output files cannot be the same");
    }

    if output.exists() && !force {
        bail!("{} already exists (use -f to overwrite)", output.display());
    }

    Ok(())
}

fn output_path(cli: &Cli) -> Result<PathBuf> {
    cli.output_path().map_err(anyhow::Error::msg)
}

/// Compress a local file into a container.
async fn compress(cli: &Cli) -> Result<()> {
    let input = Path::new(&cli.file);
    if !input.is_file() {
        bail!("Input file does not exist: {}", input.display());
    }

    let output = output_path(cli)?;
    check_output(input, &output, cli.force)?;

    let encoder = Encoder::new(EncodeOptions {
        chunk_size: cli.chunk_size,
        level: cli.level,
    });
    let progress = ConsoleProgress::new(!cli.is_quiet());

    let summary = encoder
        .encode_file(input, &output, &progress)
        .await
        .with_context(|| format!("failed to compress {}", input.display()))?;

    if !cli.is_very_quiet() {
        println!(
            "{} -> {}: {} chunks, original {}, compressed {}, saved {:.1}% space",
            input.display(),
            output.display(),
            summary.chunk_count,
            format_size(summary.original_size),
            format_size(summary.compressed_size),
            summary.saved_percent()
        );
    }

    Ok(())
}

/// Decompress or list a container.
async fn process_container<R: ReadAt + 'static>(reader: Arc<R>, cli: &Cli) -> Result<()> {
    if cli.mode() == Mode::List {
        return list_records(reader, cli.verbose).await;
    }

    let output = output_path(cli)?;
    check_output(Path::new(&cli.file), &output, cli.force)?;

    let progress = ConsoleProgress::new(!cli.is_quiet());
    let summary = Decoder::new(reader)
        .decode_to_file(&output, &progress)
        .await
        .with_context(|| format!("failed to decompress {}", cli.file))?;

    if !cli.is_very_quiet() {
        println!(
            "{} -> {}: {} chunks, {}",
            cli.file,
            output.display(),
            summary.chunk_count,
            format_size(summary.original_size)
        );
    }

    Ok(())
}

/// List the header and, in verbose mode, every record of a container.
async fn list_records<R: ReadAt + 'static>(reader: Arc<R>, verbose: bool) -> Result<()> {
    let listing = ContainerParser::new(reader).list_records().await?;
    let header = &listing.header;

    println!("version:        {}", header.version);
    println!(
        "original size:  {} ({})",
        header.original_size,
        format_size(header.original_size)
    );
    println!(
        "chunk size:     {} ({})",
        header.chunk_size,
        format_size(header.chunk_size as u64)
    );
    println!("chunks:         {}", header.chunk_count);
    println!(
        "container size: {} ({})",
        listing.container_size,
        format_size(listing.container_size)
    );

    if verbose {
        println!();
        println!("{:>8}  {:>12}  {:>10}", "Chunk", "Offset", "Packed");
        println!("{}", "-".repeat(34));
        for record in &listing.records {
            println!(
                "{:>8}  {:>12}  {:>10}",
                record.index + 1,
                record.offset,
                record.payload_length
            );
        }
        println!("{}", "-".repeat(34));
    }

    let ratio = if header.original_size > 0 {
        format!(
            "{:.1}%",
            (1.0 - listing.container_size as f64 / header.original_size as f64) * 100.0
        )
    } else {
        "0.0%".to_string()
    };
    println!("saved:          {}", ratio);

    Ok(())
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
