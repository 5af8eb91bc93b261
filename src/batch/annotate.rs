//! Screenshot annotation runs.
//!
//! The first time a screenshot is touched it is copied into the backup
//! directory. That copy is never overwritten afterwards and is always the
//! image sent for editing, so re-annotating with `force` starts from the
//! pristine original instead of stacking overlays.

use super::{log_call, log_failure, pace, ItemOutcome, RunSummary, SkipReason};
use crate::config::Config;
use crate::error::{BookartError, Result};
use crate::image::{GenerationRequest, ImageProvider, Modality};
use crate::manifest::{work_list, AnnotationEntry};

/// Annotates screenshots in place, keeping pristine backups.
pub struct Annotator<P> {
    provider: P,
    config: Config,
    style_guide: String,
}

impl<P: ImageProvider> Annotator<P> {
    /// Creates an annotator; `style_guide` is prepended to every instruction.
    pub fn new(provider: P, config: Config, style_guide: impl Into<String>) -> Self {
        Self {
            provider,
            config,
            style_guide: style_guide.into(),
        }
    }

    /// Annotates every entry whose annotation is not [`crate::manifest::Annotation::Skip`].
    pub async fn run(&self, entries: &[AnnotationEntry]) -> Result<RunSummary> {
        tokio::fs::create_dir_all(&self.config.backup_dir).await?;

        let work = work_list(entries);
        let total = work.len();
        let mut summary = RunSummary::new(total, entries.len() - total);

        for (i, entry) in work.into_iter().enumerate() {
            let index = i + 1;
            let outcome = self.process(index, total, entry).await;
            let attempted = outcome.was_attempted();
            summary.record(&entry.filename, outcome);

            if attempted && index < total {
                pace(self.config.delay).await;
            }
        }

        Ok(summary)
    }

    async fn process(&self, index: usize, total: usize, entry: &AnnotationEntry) -> ItemOutcome {
        let source = self.config.output_path(&entry.filename);
        let backup = self.config.backup_path(&entry.filename);

        if !exists(&source).await {
            tracing::info!("[{index}/{total}] MISSING: {}", entry.filename);
            return ItemOutcome::Skipped {
                reason: SkipReason::MissingSource,
            };
        }

        let backed_up = exists(&backup).await;
        if backed_up && !self.config.force {
            tracing::info!("[{index}/{total}] SKIP (done): {}", entry.filename);
            return ItemOutcome::Skipped {
                reason: SkipReason::AlreadyAnnotated,
            };
        }

        tracing::info!("[{index}/{total}] {}", entry.filename);
        tracing::info!("style: {}", entry.annotation.label());
        tracing::info!("{}", entry.description);

        match self.annotate_one(entry, backed_up).await {
            Ok(bytes) => {
                tracing::info!("SAVED ({} KB)", bytes / 1024);
                ItemOutcome::Annotated { bytes }
            }
            Err(e) => {
                log_failure(&e);
                ItemOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn annotate_one(&self, entry: &AnnotationEntry, backed_up: bool) -> Result<usize> {
        let source = self.config.output_path(&entry.filename);
        let backup = self.config.backup_path(&entry.filename);

        if !backed_up {
            tokio::fs::copy(&source, &backup).await?;
            tracing::info!("backed up -> {}", backup.display());
        }

        let prompt = entry.prompt(&self.style_guide).ok_or_else(|| {
            BookartError::Manifest(format!("{} has no instruction", entry.filename))
        })?;
        let original = tokio::fs::read(&backup).await?;
        let request = GenerationRequest::new(prompt)
            .with_input_image(original)
            .with_modalities([Modality::Image, Modality::Text]);

        let image = self.provider.generate(&request).await?;
        log_call(&image);
        for text in &image.text {
            tracing::debug!("model: {text}");
        }
        image.save(&source).await?;
        Ok(image.size())
    }
}

async fn exists(path: &std::path::Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
