//! Text-to-image generation runs.

use super::{is_complete, log_call, log_failure, pace, ItemOutcome, RunSummary, SkipReason};
use crate::config::Config;
use crate::error::Result;
use crate::image::{GenerationRequest, ImageProvider};
use crate::manifest::{write_snapshot, ManifestEntry};
use std::path::Path;

/// Generates every missing illustration in a manifest.
pub struct Generator<P> {
    provider: P,
    config: Config,
}

impl<P: ImageProvider> Generator<P> {
    /// Creates a generator that writes into `config.output_dir`.
    pub fn new(provider: P, config: Config) -> Self {
        Self { provider, config }
    }

    /// Runs the batch, then writes the `manifest.json` snapshot.
    ///
    /// Items whose output already exists with non-zero size are skipped unless
    /// `force` is set, so an interrupted run can simply be repeated.
    pub async fn run(&self, entries: &[ManifestEntry]) -> Result<RunSummary> {
        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let total = entries.len();
        let mut summary = RunSummary::new(total, 0);

        for (i, entry) in entries.iter().enumerate() {
            let index = i + 1;
            let outcome = self.process(index, total, entry).await;
            let attempted = outcome.was_attempted();
            summary.record(&entry.filename, outcome);

            if attempted && index < total {
                pace(self.config.delay).await;
            }
        }

        match write_snapshot(&self.config.output_dir, entries).await {
            Ok(path) => tracing::info!("manifest written to {}", path.display()),
            Err(e) => tracing::warn!("could not write manifest snapshot: {e}"),
        }

        Ok(summary)
    }

    async fn process(&self, index: usize, total: usize, entry: &ManifestEntry) -> ItemOutcome {
        let path = self.config.output_path(&entry.filename);

        if !self.config.force && is_complete(&path).await {
            tracing::info!("[{index}/{total}] SKIP (exists): {}", entry.filename);
            return ItemOutcome::Skipped {
                reason: SkipReason::Exists,
            };
        }

        tracing::info!("[{index}/{total}] Generating: {}", entry.filename);
        tracing::info!(
            "aspect: {}  resolution: {}",
            entry.aspect_ratio,
            entry.resolution
        );
        tracing::debug!(placement = %entry.placement, "layout note");

        match self.generate_one(entry, &path).await {
            Ok(bytes) => {
                tracing::info!("SAVED: {} ({} KB)", entry.filename, bytes / 1024);
                ItemOutcome::Generated { bytes }
            }
            Err(e) => {
                log_failure(&e);
                ItemOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn generate_one(&self, entry: &ManifestEntry, path: &Path) -> Result<usize> {
        let request = GenerationRequest::new(&entry.prompt)
            .with_aspect_ratio(entry.aspect_ratio)
            .with_resolution(entry.resolution);

        let image = self.provider.generate(&request).await?;
        log_call(&image);
        image.save(path).await?;
        Ok(image.size())
    }
}
