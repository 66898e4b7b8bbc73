//! ppz CLI - PP container compression tool.
//!
//! Compresses a file into a `.pp` container or restores one. The direction
//! is inferred from the input suffix and can be forced with `--decompress`.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use ppz::{envelope, header::Header, FileType, Stage};

/// A self-contained lossless compressor for the PP container format.
#[derive(Parser, Debug)]
#[command(name = "ppz")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file (a `.pp` container decompresses, anything else compresses)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Force decompression regardless of the input suffix
    #[arg(short, long)]
    decompress: bool,

    /// Compression level (1-9, higher = smaller file)
    #[arg(short, long, default_value = "6", value_parser = clap::value_parser!(u8).range(1..=9))]
    level: u8,

    /// Wrap the container in the one-byte plaintext envelope
    #[arg(long)]
    envelope: bool,

    /// Show progress and summary output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("ppz: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let data = fs::read(&args.input)
        .map_err(|e| format!("cannot read {}: {}", args.input.display(), e))?;

    let decompressing =
        args.decompress || args.input.extension().is_some_and(|ext| ext == "pp");

    let start = Instant::now();
    let (output_path, result) = if decompressing {
        (restore_path(args), restore(args, &data))
    } else {
        (compress_path(args), pack(args, &data))
    };
    let result = result?;

    fs::write(&output_path, &result)
        .map_err(|e| format!("cannot write {}: {}", output_path.display(), e))?;

    if args.verbose {
        let elapsed = start.elapsed();
        let ratio = if decompressing {
            result.len() as f64 / data.len().max(1) as f64
        } else {
            data.len() as f64 / result.len().max(1) as f64
        };
        eprintln!(
            "{} -> {} ({} -> {} bytes, ratio {:.2}, {:.1?})",
            args.input.display(),
            output_path.display(),
            data.len(),
            result.len(),
            ratio,
            elapsed
        );
    }
    Ok(())
}

fn pack(args: &Args, data: &[u8]) -> Result<Vec<u8>, String> {
    let verbose = args.verbose;
    let mut report = |stage: Stage, percent: u8, message: &str| {
        if verbose {
            eprintln!("  [{}] {:>3}% {}", stage, percent, message);
        }
    };

    let container = ppz::compress_with_progress(data, args.level, &mut report)
        .map_err(|e| e.to_string())?;

    if verbose {
        if let Ok((header, _)) = Header::parse(&container) {
            eprintln!(
                "  mode {}, filetype {}",
                header.mode.map(|m| m.name()).unwrap_or("?"),
                FileType::from_byte(header.filetype).name()
            );
        }
    }

    Ok(if args.envelope {
        envelope::wrap(&container)
    } else {
        container
    })
}

fn restore(args: &Args, data: &[u8]) -> Result<Vec<u8>, String> {
    // Strip the envelope when one is present; a container proper starts
    // with the 0x50 magic, never 0x00 or 0x01.
    let container = match data.first() {
        Some(&envelope::PREFIX_PLAIN) | Some(&envelope::PREFIX_ENCIPHERED) => {
            envelope::unwrap(data).map_err(|e| e.to_string())?
        }
        _ => data,
    };

    let verbose = args.verbose;
    let mut report = |stage: Stage, percent: u8, message: &str| {
        if verbose {
            eprintln!("  [{}] {:>3}% {}", stage, percent, message);
        }
    };

    ppz::decompress_with_progress(container, &mut report).map_err(|e| e.to_string())
}

fn compress_path(args: &Args) -> PathBuf {
    args.output.clone().unwrap_or_else(|| {
        let mut path = args.input.clone().into_os_string();
        path.push(".pp");
        PathBuf::from(path)
    })
}

fn restore_path(args: &Args) -> PathBuf {
    args.output.clone().unwrap_or_else(|| {
        if args.input.extension().is_some_and(|ext| ext == "pp") {
            args.input.with_extension("")
        } else {
            let mut path = args.input.clone().into_os_string();
            path.push(".out");
            PathBuf::from(path)
        }
    })
}
