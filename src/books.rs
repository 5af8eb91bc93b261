//! Manifests bundled with the crate, one per book project.

use crate::error::Result;
use crate::manifest::{AnnotationManifest, ImageManifest};

/// Bundled illustration manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ImageBook {
    /// Goldilocks and the Three Bears, classic telling.
    Goldilocks,
    /// Goldilocks retold with smart-home bears and a forest police force.
    GoldilocksFunny,
    /// MCP Integration Lab design document.
    McpIntegrationLab,
}

impl ImageBook {
    /// Every bundled illustration manifest.
    pub const ALL: [Self; 3] = [Self::Goldilocks, Self::GoldilocksFunny, Self::McpIntegrationLab];

    /// Directory-style identifier.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Goldilocks => "goldilocks",
            Self::GoldilocksFunny => "goldilocks-funny",
            Self::McpIntegrationLab => "mcp-integration-lab",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            Self::Goldilocks => include_str!("../books/goldilocks/images.json"),
            Self::GoldilocksFunny => include_str!("../books/goldilocks-funny/images.json"),
            Self::McpIntegrationLab => include_str!("../books/mcp-integration-lab/images.json"),
        }
    }

    /// Parses the embedded manifest.
    pub fn manifest(&self) -> Result<ImageManifest> {
        ImageManifest::from_json(self.source())
    }
}

/// Bundled annotation manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum AnnotationBook {
    /// Conga getting-started guide screenshots.
    CongaGettingStarted,
}

impl AnnotationBook {
    /// Every bundled annotation manifest.
    pub const ALL: [Self; 1] = [Self::CongaGettingStarted];

    /// Directory-style identifier.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::CongaGettingStarted => "conga-getting-started",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            Self::CongaGettingStarted => {
                include_str!("../books/conga-getting-started/annotations.json")
            }
        }
    }

    /// Parses the embedded manifest.
    pub fn manifest(&self) -> Result<AnnotationManifest> {
        AnnotationManifest::from_json(self.source())
    }
}
