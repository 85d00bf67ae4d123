//! Scan the FBX models under the asset folder and write the generated
//! scrap definition list consumed by the game.

#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

#[cfg(not(target_arch = "wasm32"))]
use anyhow::{Context, Result, bail};
#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser, Debug)]
#[command(
    name = "extract-scrap",
    version,
    about = "Generate scrap definitions from FBX models"
)]
struct Cli {
    /// Directory asset paths are written relative to.
    #[arg(long, default_value = "src")]
    root: PathBuf,

    /// Directory scanned (recursively) for .fbx files.
    #[arg(long, default_value = "src/assets")]
    assets_dir: PathBuf,

    /// Output JSON file.
    #[arg(short, long, default_value = "src/data/generatedScrapDefinitions.json")]
    output: PathBuf,

    /// Exit with an error when any model fails to parse.
    #[arg(long)]
    strict: bool,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let options = orb_ascent::assets::ExtractOptions {
        root: cli.root,
        assets_dir: cli.assets_dir,
        output: cli.output,
    };
    let report = orb_ascent::assets::extract_all(&options)
        .with_context(|| format!("extracting from {}", options.assets_dir.display()))?;

    if !report.failed.is_empty() {
        for path in &report.failed {
            log::warn!("skipped {}", path.display());
        }
        if cli.strict {
            bail!("{} model(s) failed to parse", report.failed.len());
        }
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
