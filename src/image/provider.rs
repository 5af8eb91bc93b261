//! Image provider trait.

use crate::error::Result;
use crate::image::types::{GeneratedImage, GenerationRequest};
use async_trait::async_trait;

/// Trait for image generation and editing backends.
///
/// The batch runners only ever hold one request in flight, so implementations
/// need no internal coordination.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates (or, when the request carries an input image, edits) an image.
    ///
    /// Returns [`crate::BookartError::NoImage`] when the vendor answered but
    /// sent no inline image.
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage>;

    /// Returns the model identifier this provider talks to.
    fn model(&self) -> &str;
}
