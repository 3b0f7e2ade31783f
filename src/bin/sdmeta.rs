//! Command-line tool for inspecting generation metadata

use clap::Parser;
use sdmeta_core::parse_image_meta;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

/// Extract Stable-Diffusion-style generation metadata from an image file
#[derive(Parser)]
#[command(name = "sdmeta")]
#[command(about = "Extracts generation metadata from PNG/JPEG/WebP files")]
struct Cli {
    /// Image file to inspect
    file: PathBuf,

    /// Print only the normalized fields, not the raw map
    #[arg(long)]
    fields_only: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let bytes = match fs::read(&cli.file) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("sdmeta: {}: {err}", cli.file.display());
            return ExitCode::FAILURE;
        }
    };

    let hint = cli
        .file
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    let meta = parse_image_meta(&bytes, hint);
    tracing::debug!(file = %cli.file.display(), format = ?meta.format, "parsed image metadata");

    let output = if cli.fields_only {
        serde_json::to_string_pretty(&meta.fields)
    } else {
        serde_json::to_string_pretty(&meta)
    };

    match output {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("sdmeta: failed to serialize output: {err}");
            ExitCode::FAILURE
        }
    }
}
