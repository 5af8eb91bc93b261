//! Sequential batch runners.
//!
//! Every runner walks its work list in manifest order with exactly one vendor
//! call in flight. Each item ends in one terminal [`ItemOutcome`] after a single
//! attempt. Item-level errors are recorded and the batch moves on; only setup
//! failures (such as an uncreatable output directory) are returned as errors.

mod annotate;
mod generate;
mod restore;

pub use annotate::Annotator;
pub use generate::Generator;
pub use restore::restore;

use serde::Serialize;
use std::time::Duration;

/// Longest slice of vendor text echoed into the log.
const MAX_LOGGED_TEXT: usize = 200;

/// Why an item was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Output file already present with non-zero size.
    Exists,
    /// Screenshot to annotate is not on disk.
    MissingSource,
    /// A backup exists, so the screenshot was already annotated.
    AlreadyAnnotated,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Exists => "exists",
            Self::MissingSource => "missing",
            Self::AlreadyAnnotated => "done",
        })
    }
}

/// Terminal state of one manifest item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// A new image was written.
    Generated {
        /// Bytes written.
        bytes: usize,
    },
    /// The screenshot was overwritten with its annotated version.
    Annotated {
        /// Bytes written.
        bytes: usize,
    },
    /// No vendor call was made.
    Skipped {
        /// Why.
        reason: SkipReason,
    },
    /// The attempt failed.
    Failed {
        /// Error message.
        error: String,
    },
}

impl ItemOutcome {
    /// Whether a vendor call was made for this item.
    pub fn was_attempted(&self) -> bool {
        !matches!(self, Self::Skipped { .. })
    }
}

/// Outcome of one item, keyed by file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    /// Manifest file name.
    pub filename: String,
    /// What happened.
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Images written by generation.
    pub generated: usize,
    /// Screenshots overwritten by annotation.
    pub annotated: usize,
    /// Items not attempted.
    pub skipped: usize,
    /// Items attempted without success.
    pub failed: usize,
    /// Items in the work list.
    pub total: usize,
    /// Manifest entries left out of the work list (annotation `none`).
    pub excluded: usize,
    /// Per-item outcomes in processing order.
    pub items: Vec<ItemReport>,
}

impl RunSummary {
    pub(crate) fn new(total: usize, excluded: usize) -> Self {
        Self {
            total,
            excluded,
            ..Default::default()
        }
    }

    pub(crate) fn record(&mut self, filename: &str, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Generated { .. } => self.generated += 1,
            ItemOutcome::Annotated { .. } => self.annotated += 1,
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
        }
        self.items.push(ItemReport {
            filename: filename.to_string(),
            outcome,
        });
    }

    /// True when no item failed; drives the process exit code.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Number of vendor calls made.
    pub fn attempted(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.outcome.was_attempted())
            .count()
    }
}

/// Sleeps between vendor calls. Zero delay returns immediately.
async fn pace(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    tracing::info!("waiting {}s (rate limit)", delay.as_secs_f32());
    tokio::time::sleep(delay).await;
}

/// Whether an existing output counts as finished.
///
/// Only checks for a non-empty file, so a truncated write from a crashed run
/// also passes.
async fn is_complete(path: &std::path::Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.len() > 0)
        .unwrap_or(false)
}

fn truncate_for_log(text: &str) -> String {
    if text.chars().count() > MAX_LOGGED_TEXT {
        text.chars().take(MAX_LOGGED_TEXT).collect()
    } else {
        text.to_string()
    }
}

/// Logs which model answered and how long the round trip took.
fn log_call(image: &crate::image::GeneratedImage) {
    let meta = &image.metadata;
    tracing::debug!(
        model = meta.model.as_deref().unwrap_or("unknown"),
        duration_ms = meta.duration_ms.unwrap_or_default(),
        finish_reason = meta.finish_reason.as_deref().unwrap_or("none"),
        "vendor call finished"
    );
}

/// Logs the vendor diagnostics that come with an empty result.
fn log_failure(err: &crate::BookartError) {
    match err {
        crate::BookartError::NoImage {
            finish_reason,
            text,
        } => {
            tracing::warn!("no image data in response");
            for t in text {
                tracing::warn!("model: {}", truncate_for_log(t));
            }
            if let Some(reason) = finish_reason {
                tracing::warn!("finish reason: {reason}");
            }
        }
        other => tracing::error!("{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::new(4, 1);
        summary.record("a.png", ItemOutcome::Generated { bytes: 10 });
        summary.record(
            "b.png",
            ItemOutcome::Skipped {
                reason: SkipReason::Exists,
            },
        );
        summary.record(
            "c.png",
            ItemOutcome::Failed {
                error: "boom".into(),
            },
        );
        summary.record("d.png", ItemOutcome::Annotated { bytes: 3 });

        assert_eq!(summary.generated, 1);
        assert_eq!(summary.annotated, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.attempted(), 3);
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn test_summary_serializes_flat_items() {
        let mut summary = RunSummary::new(1, 0);
        summary.record(
            "a.png",
            ItemOutcome::Skipped {
                reason: SkipReason::MissingSource,
            },
        );
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["items"][0]["filename"], "a.png");
        assert_eq!(json["items"][0]["status"], "skipped");
        assert_eq!(json["items"][0]["reason"], "missing_source");
        assert!(summary.all_succeeded());
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short"), "short");
        assert_eq!(truncate_for_log(&"é".repeat(500)).chars().count(), MAX_LOGGED_TEXT);
    }

    #[tokio::test]
    async fn test_is_complete_treats_any_nonempty_file_as_done() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        let empty = dir.path().join("empty.png");
        let truncated = dir.path().join("truncated.png");
        std::fs::write(&empty, b"").unwrap();
        // First bytes of a PNG and nothing else, as left by an interrupted write
        std::fs::write(&truncated, [0x89, 0x50, 0x4E, 0x47]).unwrap();

        assert!(!is_complete(&missing).await);
        assert!(!is_complete(&empty).await);
        // Known gap: no checksum or completion marker, so this counts as done
        assert!(is_complete(&truncated).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pace_sleeps_for_delay() {
        let start = tokio::time::Instant::now();
        pace(Duration::from_secs(6)).await;
        assert!(start.elapsed() >= Duration::from_secs(6));
    }
}
