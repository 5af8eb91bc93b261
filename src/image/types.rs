//! Core types for image generation and editing.

use crate::error::{BookartError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Maps a MIME type back to a format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Aspect ratios accepted by the Gemini image models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square.
    #[serde(rename = "1:1")]
    Square,
    /// 2:3 portrait.
    #[serde(rename = "2:3")]
    Portrait2x3,
    /// 3:2 landscape.
    #[serde(rename = "3:2")]
    Landscape3x2,
    /// 3:4 portrait.
    #[serde(rename = "3:4")]
    Portrait3x4,
    /// 4:3 landscape.
    #[serde(rename = "4:3")]
    Landscape4x3,
    /// 4:5 portrait (book page).
    #[serde(rename = "4:5")]
    Portrait4x5,
    /// 5:4 landscape.
    #[serde(rename = "5:4")]
    Landscape5x4,
    /// 9:16 tall portrait.
    #[serde(rename = "9:16")]
    Portrait9x16,
    /// 16:9 widescreen.
    #[serde(rename = "16:9")]
    Landscape16x9,
    /// 21:9 ultrawide.
    #[serde(rename = "21:9")]
    Ultrawide,
}

impl AspectRatio {
    /// Every ratio the vendor accepts.
    pub const ALL: [Self; 10] = [
        Self::Square,
        Self::Portrait2x3,
        Self::Landscape3x2,
        Self::Portrait3x4,
        Self::Landscape4x3,
        Self::Portrait4x5,
        Self::Landscape5x4,
        Self::Portrait9x16,
        Self::Landscape16x9,
        Self::Ultrawide,
    ];

    /// Returns the aspect ratio as a string (e.g., "4:5").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait2x3 => "2:3",
            Self::Landscape3x2 => "3:2",
            Self::Portrait3x4 => "3:4",
            Self::Landscape4x3 => "4:3",
            Self::Portrait4x5 => "4:5",
            Self::Landscape5x4 => "5:4",
            Self::Portrait9x16 => "9:16",
            Self::Landscape16x9 => "16:9",
            Self::Ultrawide => "21:9",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = BookartError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| BookartError::InvalidRequest(format!("unsupported aspect ratio: {s}")))
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output resolution tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Resolution {
    /// Roughly 1024px on the long edge.
    #[default]
    #[serde(rename = "1K")]
    OneK,
    /// Roughly 2048px on the long edge.
    #[serde(rename = "2K")]
    TwoK,
    /// Roughly 4096px on the long edge.
    #[serde(rename = "4K")]
    FourK,
}

impl Resolution {
    /// Returns the vendor's size label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneK => "1K",
            Self::TwoK => "2K",
            Self::FourK => "4K",
        }
    }
}

impl FromStr for Resolution {
    type Err = BookartError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1K" => Ok(Self::OneK),
            "2K" => Ok(Self::TwoK),
            "4K" => Ok(Self::FourK),
            other => Err(BookartError::InvalidRequest(format!(
                "unsupported resolution: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kinds of output the model is asked to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    /// Inline image data.
    Image,
    /// Free text (used by the editor for commentary).
    Text,
}

impl Modality {
    /// Returns the vendor's modality name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "IMAGE",
            Self::Text => "TEXT",
        }
    }
}

/// Metadata about the generation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Finish reason reported for the winning candidate.
    pub finish_reason: Option<String>,
    /// Round-trip duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// A request to generate or edit an image.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The text prompt describing the desired image or edit.
    pub prompt: String,
    /// Aspect ratio hint.
    pub aspect_ratio: Option<AspectRatio>,
    /// Resolution hint.
    pub resolution: Option<Resolution>,
    /// Input image for editing (raw bytes).
    pub input_image: Option<Vec<u8>>,
    /// Requested response modalities.
    pub modalities: Vec<Modality>,
}

impl GenerationRequest {
    /// Creates a new image-only request with the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: None,
            resolution: None,
            input_image: None,
            modalities: vec![Modality::Image],
        }
    }

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    /// Sets the resolution tier.
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Sets an input image for editing.
    pub fn with_input_image(mut self, image: Vec<u8>) -> Self {
        self.input_image = Some(image);
        self
    }

    /// Replaces the requested response modalities.
    pub fn with_modalities(mut self, modalities: impl Into<Vec<Modality>>) -> Self {
        self.modalities = modalities.into();
        self
    }

    /// Returns true if this is an image editing request (has input image).
    pub fn is_edit(&self) -> bool {
        self.input_image.is_some()
    }
}

/// A generated image with its data and metadata.
#[derive(Debug, Clone)]
#[must_use = "generated image should be saved or processed"]
pub struct GeneratedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Image format.
    pub format: ImageFormat,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
    /// Text parts that accompanied the image.
    pub text: Vec<String>,
}

impl GeneratedImage {
    /// Creates a new generated image.
    pub fn new(data: Vec<u8>, format: ImageFormat, metadata: GenerationMetadata) -> Self {
        Self {
            data,
            format,
            metadata,
            text: Vec::new(),
        }
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Writes the image bytes to `path`, replacing any existing file.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        tokio::fs::write(path, &self.data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"short"), None);
    }

    #[test]
    fn test_format_from_mime_type() {
        assert_eq!(ImageFormat::from_mime_type("image/png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_mime_type("image/jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime_type("text/plain"), None);
    }

    #[test]
    fn test_aspect_ratio_parse_and_display() {
        for ratio in AspectRatio::ALL {
            assert_eq!(ratio.as_str().parse::<AspectRatio>().unwrap(), ratio);
        }
        assert_eq!(AspectRatio::Portrait4x5.to_string(), "4:5");
        assert!("7:3".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_aspect_ratio_serde_uses_ratio_string() {
        let json = serde_json::to_string(&AspectRatio::Landscape3x2).unwrap();
        assert_eq!(json, "\"3:2\"");
        let back: AspectRatio = serde_json::from_str("\"3:4\"").unwrap();
        assert_eq!(back, AspectRatio::Portrait3x4);
    }

    #[test]
    fn test_resolution_parse() {
        assert_eq!("2K".parse::<Resolution>().unwrap(), Resolution::TwoK);
        assert_eq!("1k".parse::<Resolution>().unwrap(), Resolution::OneK);
        assert!("8K".parse::<Resolution>().is_err());
        let json = serde_json::to_string(&Resolution::FourK).unwrap();
        assert_eq!(json, "\"4K\"");
    }

    #[test]
    fn test_request_builder() {
        let req = GenerationRequest::new("A cottage")
            .with_aspect_ratio(AspectRatio::Portrait4x5)
            .with_resolution(Resolution::TwoK);
        assert!(!req.is_edit());
        assert_eq!(req.modalities, vec![Modality::Image]);

        let edit = GenerationRequest::new("Add a callout")
            .with_input_image(PNG_MAGIC.to_vec())
            .with_modalities([Modality::Image, Modality::Text]);
        assert!(edit.is_edit());
        assert_eq!(edit.modalities.len(), 2);
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        std::fs::write(&path, b"old contents that are longer").unwrap();

        let image = GeneratedImage::new(PNG_MAGIC.to_vec(), ImageFormat::Png, Default::default());
        image.save(&path).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), PNG_MAGIC.to_vec());
        assert_eq!(image.size(), 12);
    }
}
