use clap::Parser;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

/// File extension of PZIP containers
pub const EXTENSION: &str = "pzip";

#[derive(Parser, Debug)]
#[command(name = "pzip")]
#[command(version)]
#[command(about = "Chunked zlib compressor for the PZIP container format", long_about = None)]
#[command(after_help = "Examples:\n  \
  pzip big.log                      compress big.log into big.log.pzip\n  \
  pzip -c 4MB big.log -o out.pzip   compress with 4 MiB chunks\n  \
  pzip big.log.pzip                 restore big.log\n  \
  pzip -lv big.log.pzip             list the records of a container")]
pub struct Cli {
    /// File to compress, or .pzip container to restore or list
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Output path (default: FILE.pzip, or FILE without .pzip)
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Decompress (implied when FILE ends in .pzip)
    #[arg(short = 'd', long = "decompress")]
    pub decompress: bool,

    /// List container header and records
    #[arg(short = 'l', long = "list", conflicts_with = "decompress")]
    pub list: bool,

    /// Chunk size for compression, e.g. 512KB, 1MB, 4MiB or 65536
    #[arg(
        short = 'c',
        long = "chunk-size",
        value_name = "SIZE",
        default_value = "1MB",
        value_parser = parse_size
    )]
    pub chunk_size: NonZeroU32,

    /// zlib compression level
    #[arg(
        long = "level",
        default_value_t = 6,
        value_parser = clap::value_parser!(u32).range(0..=9)
    )]
    pub level: u32,

    /// Overwrite existing output
    #[arg(short = 'f', long = "force")]
    pub force: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', long = "quiet", action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// List verbosely / debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// What the invocation asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Compress,
    Decompress,
    List,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    pub fn mode(&self) -> Mode {
        if self.list {
            Mode::List
        } else if self.decompress || has_pzip_extension(&self.file) {
            Mode::Decompress
        } else {
            Mode::Compress
        }
    }

    /// Destination for compress/decompress, inferred from FILE when `-o`
    /// is absent.
    pub fn output_path(&self) -> Result<PathBuf, String> {
        if let Some(ref output) = self.output {
            return Ok(output.clone());
        }

        match self.mode() {
            Mode::Compress => Ok(PathBuf::from(format!("{}.{}", self.file, EXTENSION))),
            Mode::Decompress => match strip_pzip_extension(&self.file) {
                Some(stem) if !stem.is_empty() => Ok(PathBuf::from(stem)),
                _ => Err(format!(
                    "cannot infer output name for '{}', use -o",
                    self.file
                )),
            },
            Mode::List => Err("listing has no output".to_string()),
        }
    }
}

fn has_pzip_extension(name: &str) -> bool {
    strip_pzip_extension(name).is_some()
}

fn strip_pzip_extension(name: &str) -> Option<&str> {
    let path = Path::new(name);
    let ext = path.extension()?.to_str()?;
    if ext.eq_ignore_ascii_case(EXTENSION) {
        Some(&name[..name.len() - ext.len() - 1])
    } else {
        None
    }
}

/// Parse a byte count with an optional binary suffix.
///
/// `K`, `KB` and `KiB` all mean 1024; likewise for `M` and `G`. Case is
/// ignored.
pub fn parse_size(s: &str) -> Result<NonZeroU32, String> {
    let trimmed = s.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid size '{}'", s))?;

    let multiplier: u64 = match suffix.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => 1024,
        "m" | "mb" | "mib" => 1024 * 1024,
        "g" | "gb" | "gib" => 1024 * 1024 * 1024,
        other => return Err(format!("unknown size suffix '{}'", other)),
    };

    let bytes = value
        .checked_mul(multiplier)
        .and_then(|b| u32::try_from(b).ok())
        .ok_or_else(|| format!("size '{}' exceeds {} bytes", s, u32::MAX))?;

    NonZeroU32::new(bytes).ok_or_else(|| "size must be greater than zero".to_string())
}
