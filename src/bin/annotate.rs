//! CLI for annotating screenshots with callouts and highlights.

use anyhow::Context;
use bookart::config::BACKUP_DIR_NAME;
use bookart::{
    AnnotationBook, AnnotationManifest, Annotator, Config, ImageProvider, Mode, RunSummary,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "bookart-annotate")]
#[command(about = "Annotate screenshots in place via Gemini, keeping pristine backups")]
#[command(version)]
struct Cli {
    /// Bundled screenshot set to annotate
    #[arg(short, long, value_enum)]
    book: Option<AnnotationBook>,

    /// Manifest JSON file (alternative to --book)
    #[arg(short, long, conflicts_with = "book")]
    manifest: Option<PathBuf>,

    /// Directory holding the live screenshots
    #[arg(short, long, default_value = "images")]
    images_dir: PathBuf,

    /// Directory for pristine originals (defaults to <images-dir>/raw)
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// Model id (overrides GEMINI_EDIT_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Seconds to wait between API calls
    #[arg(long)]
    delay: Option<u64>,

    /// Re-annotate screenshots that already have a backup
    #[arg(long)]
    force: bool,

    /// Copy every backup over the live screenshots and exit
    #[arg(long, conflicts_with = "force")]
    restore: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn backup_dir(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| self.images_dir.join(BACKUP_DIR_NAME))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    bookart::logging::init_cli_logger(cli.verbose);

    let result = if cli.restore {
        restore(&cli).await
    } else {
        annotate(&cli).await
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Restoring only touches the filesystem, so it runs without an API key.
async fn restore(cli: &Cli) -> anyhow::Result<bool> {
    let backup_dir = cli.backup_dir();
    let count = bookart::restore(&cli.images_dir, &backup_dir).await?;

    if cli.json {
        println!("{}", serde_json::json!({ "restored": count }));
    } else {
        println!("\n  {count} files restored from {}", backup_dir.display());
    }
    Ok(true)
}

async fn annotate(cli: &Cli) -> anyhow::Result<bool> {
    let mut config = Config::from_env(Mode::Annotate, &cli.images_dir)
        .map_err(|e| anyhow::anyhow!("{e}\n  export GEMINI_IMAGE_API_KEY='your-key-here'"))?
        .with_backup_dir(cli.backup_dir())
        .with_force(cli.force);
    if let Some(model) = &cli.model {
        config = config.with_model(model.parse()?);
    }
    if let Some(secs) = cli.delay {
        config = config.with_delay(Duration::from_secs(secs));
    }

    let manifest = load_manifest(cli)?;
    let provider = config.provider()?;

    if !cli.json {
        print_banner(&manifest, provider.model(), &config);
    }

    let annotator = Annotator::new(provider, config, &manifest.style_guide);
    let summary = annotator.run(&manifest.annotations).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, cli);
    }

    Ok(summary.all_succeeded())
}

fn load_manifest(cli: &Cli) -> anyhow::Result<AnnotationManifest> {
    match (&cli.manifest, cli.book) {
        (Some(path), _) => AnnotationManifest::load(path)
            .with_context(|| format!("failed to load manifest {}", path.display())),
        (None, Some(book)) => Ok(book.manifest()?),
        (None, None) => anyhow::bail!("either --book or --manifest is required"),
    }
}

fn print_banner(manifest: &AnnotationManifest, model: &str, config: &Config) {
    let excluded = manifest.excluded();
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("  {} Screenshot Annotator", manifest.title);
    println!("  Model:   {model}");
    println!(
        "  Images:  {} to annotate ({excluded} skipped)",
        manifest.annotations.len() - excluded
    );
    println!("  Source:  {}", config.output_dir.display());
    println!("  Backups: {}", config.backup_dir.display());
    println!("{rule}\n");
}

fn print_summary(summary: &RunSummary, cli: &Cli) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("  Annotation Complete!");
    println!("  Annotated: {}", summary.annotated);
    println!("  Skipped:   {}", summary.skipped);
    println!("  Failed:    {}", summary.failed);
    println!("{rule}");
    println!("\n  Originals in: {}", cli.backup_dir().display());
    println!("  To undo:  bookart-annotate --restore\n");
}
