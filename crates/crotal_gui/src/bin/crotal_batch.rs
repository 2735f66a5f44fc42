//! Headless batch reader.
//!
//! ```bash
//! crotal_batch --server http://127.0.0.1:5000/ --out preds/ IMG_0001.jpg IMG_0002.tif
//! ```
//!
//! Prints one tab-separated line per file: `name  label  boxes`, or
//! `name  ERROR  reason` when the file could not be annotated.

use anyhow::{Context, Result};
use clap::Parser;
use crotal_core::{
    CancellationToken, Config, FileSelection, HttpTaskApi, RenderedCard, UploadWorkflow,
};
use directories_next::ProjectDirs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Upload ear tag photos to a Crotalpath backend and print the predicted numbers.
#[derive(Parser)]
#[command(name = "crotal_batch", version, about)]
struct Cli {
    /// Images to read
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Config file (default: the desktop app's config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend root URL, overrides the config and CROTALPATH_SERVER
    #[arg(long)]
    server: Option<String>,

    /// Write annotated images as `<stem>_pred.png` into this directory
    #[arg(long)]
    out: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn default_config_path() -> PathBuf {
    ProjectDirs::from("org", "crotalpath", "Crotalpath")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = Config::load(&path)?.with_env_overrides();
    if let Some(server) = &cli.server {
        config.server.base_url = server.clone();
    }
    config.validate()?;
    Ok(config)
}

fn prediction_path(out: &Path, file_name: &str) -> PathBuf {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    out.join(format!("{stem}_pred.png"))
}

fn report(card: &RenderedCard, out: Option<&Path>) -> Result<bool> {
    match &card.outcome {
        Ok(annotated) => {
            println!(
                "{}\t{}\t{}",
                card.file_name, annotated.label, annotated.rect_count
            );
            if let Some(out) = out {
                let path = prediction_path(out, &card.file_name);
                annotated
                    .image
                    .save_with_format(&path, image::ImageFormat::Png)
                    .with_context(|| format!("cannot write {}", path.display()))?;
            }
            Ok(true)
        }
        Err(err) => {
            println!("{}\tERROR\t{err}", card.file_name);
            Ok(false)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;
    let selection = FileSelection::from_paths(&cli.files)?;
    if let Some(out) = &cli.out {
        std::fs::create_dir_all(out)
            .with_context(|| format!("cannot create {}", out.display()))?;
    }

    let api = HttpTaskApi::new(&config.server.base_url, config.request_timeout())?;
    let workflow = UploadWorkflow::new(
        Arc::new(api),
        config.poll_policy(),
        config.overlay_style()?,
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut cards: Vec<RenderedCard> = Vec::new();
    if let Err(err) = workflow.run(selection, &mut cards, &cancel).await {
        eprintln!("crotal_batch: {err}");
        return Ok(ExitCode::from(1));
    }

    let mut all_ok = true;
    for card in &cards {
        all_ok &= report(card, cli.out.as_deref())?;
    }
    Ok(if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("crotal_batch: {err:#}");
            ExitCode::from(1)
        }
    }
}
