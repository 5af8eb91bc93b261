#![warn(missing_docs)]
//! Bookart - batch illustration and screenshot annotation for static books.
//!
//! A run takes an ordered manifest, calls the Gemini image API once per item
//! that is not already done, and writes the results to disk. Re-running a
//! batch is safe: finished items are detected on disk and skipped.
//!
//! # Illustrations
//!
//! ```no_run
//! use bookart::{Config, Generator, ImageBook, Mode};
//!
//! #[tokio::main]
//! async fn main() -> bookart::Result<()> {
//!     let config = Config::from_env(Mode::Generate, "images")?;
//!     let manifest = ImageBook::Goldilocks.manifest()?;
//!     let generator = Generator::new(config.provider()?, config);
//!     let summary = generator.run(&manifest.images).await?;
//!     println!("generated {} of {}", summary.generated, summary.total);
//!     Ok(())
//! }
//! ```
//!
//! # Screenshot annotation
//!
//! ```no_run
//! use bookart::{AnnotationBook, Annotator, Config, Mode};
//!
//! #[tokio::main]
//! async fn main() -> bookart::Result<()> {
//!     let config = Config::from_env(Mode::Annotate, "images")?;
//!     let manifest = AnnotationBook::CongaGettingStarted.manifest()?;
//!     let annotator = Annotator::new(config.provider()?, config, &manifest.style_guide);
//!     let summary = annotator.run(&manifest.annotations).await?;
//!     std::process::exit(if summary.all_succeeded() { 0 } else { 1 });
//! }
//! ```

pub mod batch;
pub mod books;
pub mod config;
mod error;
pub mod image;
pub mod logging;
pub mod manifest;

// Re-export error types at crate root
pub use error::{BookartError, Result};

pub use batch::{restore, Annotator, Generator, ItemOutcome, RunSummary, SkipReason};
pub use books::{AnnotationBook, ImageBook};
pub use config::{Config, Mode};
pub use image::providers::{GeminiModel, GeminiProvider, GeminiProviderBuilder};
pub use image::{AspectRatio, GeneratedImage, GenerationRequest, ImageProvider, Resolution};
pub use manifest::{
    Annotation, AnnotationEntry, AnnotationManifest, ImageManifest, ManifestEntry,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::batch::{Annotator, Generator, RunSummary};
    pub use crate::config::{Config, Mode};
    pub use crate::error::{BookartError, Result};
    pub use crate::image::providers::GeminiProvider;
    pub use crate::image::{GenerationRequest, ImageProvider};
}
