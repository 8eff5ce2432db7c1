use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use chromepdf::{Pdf, PdfConfig};

/// Render an HTML file (or stdin) to a PDF via headless Chromium.
#[derive(Parser, Debug)]
#[command(name = "chromepdf", version, about)]
struct Args {
    /// HTML input file; reads stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// PDF output path
    #[arg(short, long)]
    output: PathBuf,

    /// Path to the Chrome/Chromium executable
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// Process timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Paper format (A4, Letter, Legal, ...)
    #[arg(long, default_value = "A4")]
    format: String,

    /// Landscape orientation
    #[arg(long)]
    landscape: bool,

    /// Uniform page margin in millimeters
    #[arg(long, default_value_t = 10)]
    margin: u32,

    /// Skip printing CSS backgrounds
    #[arg(long)]
    no_background: bool,

    /// Virtual-time budget in milliseconds for scripts to settle
    #[arg(long)]
    wait: Option<u64>,

    /// Scale factor (clamped to 0.1..=2.0)
    #[arg(long)]
    scale: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let html = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let mut config = PdfConfig::from_env();
    if let Some(chrome) = args.chrome {
        config.chrome_path = chrome;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }

    let mut builder = Pdf::new(config)
        .html(html)
        .format(&args.format)
        .margin(args.margin)
        .print_background(!args.no_background);

    if args.landscape {
        builder = builder.landscape();
    }
    if let Some(wait) = args.wait {
        builder = builder.wait_for(wait);
    }
    if let Some(scale) = args.scale {
        builder = builder.scale(scale);
    }

    let saved = builder.save(&args.output)?;
    println!("wrote {}", saved.display());
    Ok(())
}
