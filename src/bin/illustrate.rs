//! CLI for generating book illustrations.

use anyhow::Context;
use bookart::{Config, Generator, ImageBook, ImageManifest, ImageProvider, Mode, RunSummary};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "bookart-illustrate")]
#[command(about = "Generate every missing illustration in a book manifest via Gemini")]
#[command(version)]
struct Cli {
    /// Bundled book to illustrate
    #[arg(short, long, value_enum)]
    book: Option<ImageBook>,

    /// Manifest JSON file (alternative to --book)
    #[arg(short, long, conflicts_with = "book")]
    manifest: Option<PathBuf>,

    /// Directory the images are written to
    #[arg(short, long, default_value = "images")]
    output_dir: PathBuf,

    /// Model id (overrides GEMINI_IMAGE_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Seconds to wait between API calls
    #[arg(long)]
    delay: Option<u64>,

    /// Regenerate images that already exist
    #[arg(long)]
    force: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    bookart::logging::init_cli_logger(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    // Key check comes first
    let mut config = Config::from_env(Mode::Generate, &cli.output_dir)?.with_force(cli.force);
    if let Some(model) = &cli.model {
        config = config.with_model(model.parse()?);
    }
    if let Some(secs) = cli.delay {
        config = config.with_delay(Duration::from_secs(secs));
    }

    let manifest = load_manifest(&cli)?;
    let provider = config.provider()?;

    if !cli.json {
        print_banner(&manifest, provider.model(), &config);
    }

    let generator = Generator::new(provider, config);
    let summary = generator.run(&manifest.images).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(summary.all_succeeded())
}

fn load_manifest(cli: &Cli) -> anyhow::Result<ImageManifest> {
    match (&cli.manifest, cli.book) {
        (Some(path), _) => ImageManifest::load(path)
            .with_context(|| format!("failed to load manifest {}", path.display())),
        (None, Some(book)) => Ok(book.manifest()?),
        (None, None) => anyhow::bail!("either --book or --manifest is required"),
    }
}

fn print_banner(manifest: &ImageManifest, model: &str, config: &Config) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("  {} Image Generator", manifest.title);
    println!("  Model: {model}");
    println!("  Images to generate: {}", manifest.len());
    println!("  Output directory: {}", config.output_dir.display());
    println!("{rule}\n");
}

fn print_summary(summary: &RunSummary) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("  Generation Complete!");
    println!("  Generated: {}", summary.generated);
    println!("  Skipped:   {}", summary.skipped);
    println!("  Failed:    {}", summary.failed);
    println!("  Total:     {}", summary.total);
    println!("{rule}\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_source_is_reported_after_parse() {
        let cli = Cli::try_parse_from(["bookart-illustrate"]).unwrap();
        let err = load_manifest(&cli).unwrap_err();
        assert!(err.to_string().contains("--book or --manifest"));
    }

    #[test]
    fn test_book_and_manifest_conflict() {
        assert!(
            Cli::try_parse_from(["bookart-illustrate", "-b", "goldilocks", "-m", "x.json"]).is_err()
        );
    }
}
