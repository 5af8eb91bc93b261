//! Manifests: the ordered lists of images a run should produce or annotate.

use crate::error::{BookartError, Result};
use crate::image::{AspectRatio, Resolution};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the snapshot written into the output directory after a run.
pub const SNAPSHOT_FILE: &str = "manifest.json";

/// Separator between the shared annotation style guide and one item's instruction.
const INSTRUCTION_HEADER: &str = "\nSpecific instruction for this image:\n";

/// One illustration to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Output file name inside the output directory.
    pub filename: String,
    /// Full prompt sent to the model.
    pub prompt: String,
    /// Requested aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Requested resolution tier.
    pub resolution: Resolution,
    /// Layout note for the book designer. Never sent to the model.
    pub placement: String,
}

/// On-disk shape of an image entry: the scene without the book's style prefix.
#[derive(Debug, Deserialize)]
struct RawImageEntry {
    filename: String,
    scene: String,
    aspect_ratio: AspectRatio,
    resolution: Resolution,
    #[serde(default)]
    placement: String,
}

#[derive(Debug, Deserialize)]
struct RawImageManifest {
    title: String,
    #[serde(default)]
    style_prefix: String,
    images: Vec<RawImageEntry>,
}

/// A book's full list of illustrations.
#[derive(Debug, Clone)]
pub struct ImageManifest {
    /// Human-readable book title.
    pub title: String,
    /// Entries in generation order.
    pub images: Vec<ManifestEntry>,
}

impl ImageManifest {
    /// Parses a manifest from JSON, prefixing every scene with the style prefix.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawImageManifest = serde_json::from_str(json)?;
        let images = raw
            .images
            .into_iter()
            .map(|entry| {
                validate_filename(&entry.filename)?;
                Ok(ManifestEntry {
                    prompt: format!("{}{}", raw.style_prefix, entry.scene),
                    filename: entry.filename,
                    aspect_ratio: entry.aspect_ratio,
                    resolution: entry.resolution,
                    placement: entry.placement,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        ensure_unique(images.iter().map(|e| e.filename.as_str()))?;
        Ok(Self {
            title: raw.title,
            images,
        })
    }

    /// Reads and parses a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the manifest has no entries.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// What to draw on a screenshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// Leave the screenshot alone.
    Skip,
    /// Callout box with text and an arrow to the target.
    Callout {
        /// Placement instructions for the model.
        instruction: String,
    },
    /// Border around the target, optionally with a small label.
    Highlight {
        /// Placement instructions for the model.
        instruction: String,
    },
}

impl Annotation {
    /// Instruction text, or `None` for [`Annotation::Skip`].
    pub fn instruction(&self) -> Option<&str> {
        match self {
            Self::Skip => None,
            Self::Callout { instruction } | Self::Highlight { instruction } => Some(instruction),
        }
    }

    /// Short label used in progress output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skip => "none",
            Self::Callout { .. } => "callout",
            Self::Highlight { .. } => "highlight",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum AnnotationStyle {
    Callout,
    Highlight,
    None,
}

#[derive(Debug, Deserialize)]
struct RawAnnotationEntry {
    filename: String,
    style: AnnotationStyle,
    #[serde(default)]
    description: String,
    #[serde(default)]
    instruction: String,
}

/// One screenshot and the annotation it needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawAnnotationEntry")]
pub struct AnnotationEntry {
    /// Screenshot file name inside the images directory.
    pub filename: String,
    /// One-line summary for progress output.
    pub description: String,
    /// What to draw.
    pub annotation: Annotation,
}

impl TryFrom<RawAnnotationEntry> for AnnotationEntry {
    type Error = BookartError;

    fn try_from(raw: RawAnnotationEntry) -> Result<Self> {
        validate_filename(&raw.filename)?;
        let instruction = raw.instruction.trim().to_string();
        let annotation = match raw.style {
            AnnotationStyle::None => Annotation::Skip,
            _ if instruction.is_empty() => {
                return Err(BookartError::Manifest(format!(
                    "{}: annotation needs a non-empty instruction",
                    raw.filename
                )))
            }
            AnnotationStyle::Callout => Annotation::Callout { instruction },
            AnnotationStyle::Highlight => Annotation::Highlight { instruction },
        };
        Ok(Self {
            filename: raw.filename,
            description: raw.description,
            annotation,
        })
    }
}

impl AnnotationEntry {
    /// Builds the edit prompt: shared style guide followed by this item's instruction.
    ///
    /// Returns `None` for entries that are skipped.
    pub fn prompt(&self, style_guide: &str) -> Option<String> {
        self.annotation
            .instruction()
            .map(|instruction| format!("{style_guide}{INSTRUCTION_HEADER}{instruction}"))
    }
}

/// A set of screenshots plus the style guide shared by every annotation.
#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationManifest {
    /// Human-readable book title.
    pub title: String,
    /// Visual rules prepended to every instruction.
    pub style_guide: String,
    /// Entries in processing order, including skipped ones.
    pub annotations: Vec<AnnotationEntry>,
}

impl AnnotationManifest {
    /// Parses a manifest from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(json).map_err(|e| {
            // serde wraps `try_from` failures as plain messages
            BookartError::Manifest(e.to_string())
        })?;
        ensure_unique(manifest.annotations.iter().map(|e| e.filename.as_str()))?;
        Ok(manifest)
    }

    /// Reads and parses a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Entries that actually need an edit, in manifest order.
    pub fn work_list(&self) -> Vec<&AnnotationEntry> {
        work_list(&self.annotations)
    }

    /// Number of entries marked as needing no annotation.
    pub fn excluded(&self) -> usize {
        self.annotations.len() - self.work_list().len()
    }
}

/// Drops [`Annotation::Skip`] entries, keeping manifest order.
pub fn work_list(entries: &[AnnotationEntry]) -> Vec<&AnnotationEntry> {
    entries
        .iter()
        .filter(|e| e.annotation != Annotation::Skip)
        .collect()
}

/// One row of the post-run snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRecord {
    /// Output file name.
    pub filename: String,
    /// Requested aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Requested resolution tier.
    pub resolution: Resolution,
    /// Layout note.
    pub placement: String,
    /// Full prompt.
    pub prompt: String,
    /// Whether the output file is present on disk.
    pub exists: bool,
}

/// Writes `<dir>/manifest.json` describing every entry and whether its file exists.
///
/// Overwrites any previous snapshot.
pub async fn write_snapshot(dir: &Path, entries: &[ManifestEntry]) -> Result<PathBuf> {
    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        records.push(ManifestRecord {
            filename: entry.filename.clone(),
            aspect_ratio: entry.aspect_ratio,
            resolution: entry.resolution,
            placement: entry.placement.clone(),
            prompt: entry.prompt.clone(),
            exists: tokio::fs::try_exists(dir.join(&entry.filename))
                .await
                .unwrap_or(false),
        });
    }

    let path = dir.join(SNAPSHOT_FILE);
    tokio::fs::write(&path, serde_json::to_string_pretty(&records)?).await?;
    Ok(path)
}

/// Rejects names that would escape the output directory.
fn validate_filename(name: &str) -> Result<()> {
    let path = Path::new(name);
    let single_component = path.components().count() == 1
        && matches!(path.components().next(), Some(std::path::Component::Normal(_)));
    if name.is_empty() || !single_component {
        return Err(BookartError::Manifest(format!(
            "invalid file name {name:?}: must be a plain file name"
        )));
    }
    Ok(())
}

fn ensure_unique<'a>(names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(BookartError::Manifest(format!(
                "duplicate file name {name:?}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGES: &str = r#"{
        "title": "Test Book",
        "style_prefix": "Watercolor. ",
        "images": [
            {"filename": "a.png", "scene": "A cottage.", "aspect_ratio": "4:5", "resolution": "2K", "placement": "Cover"},
            {"filename": "b.png", "scene": "A forest.", "aspect_ratio": "3:2", "resolution": "1K"}
        ]
    }"#;

    const ANNOTATIONS: &str = r#"{
        "title": "Screens",
        "style_guide": "Blue boxes.",
        "annotations": [
            {"filename": "01.png", "style": "callout", "description": "Arrow", "instruction": "Point at Save."},
            {"filename": "02.png", "style": "none", "description": "Overview"},
            {"filename": "03.png", "style": "highlight", "description": "Box", "instruction": "Box the dropdown."}
        ]
    }"#;

    #[test]
    fn test_image_manifest_prefixes_prompts() {
        let manifest = ImageManifest::from_json(IMAGES).unwrap();
        assert_eq!(manifest.title, "Test Book");
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.images[0].prompt, "Watercolor. A cottage.");
        assert_eq!(manifest.images[0].aspect_ratio, AspectRatio::Portrait4x5);
        assert_eq!(manifest.images[1].resolution, Resolution::OneK);
        assert_eq!(manifest.images[1].placement, "");
    }

    #[test]
    fn test_image_manifest_rejects_bad_ratio() {
        let json = IMAGES.replace("\"4:5\"", "\"5:7\"");
        assert!(ImageManifest::from_json(&json).is_err());
    }

    #[test]
    fn test_image_manifest_rejects_path_escape() {
        let json = IMAGES.replace("\"a.png\"", "\"../a.png\"");
        assert!(matches!(
            ImageManifest::from_json(&json),
            Err(BookartError::Manifest(_))
        ));
    }

    #[test]
    fn test_image_manifest_rejects_duplicates() {
        let json = IMAGES.replace("\"b.png\"", "\"a.png\"");
        assert!(matches!(
            ImageManifest::from_json(&json),
            Err(BookartError::Manifest(_))
        ));
    }

    #[test]
    fn test_annotation_styles_become_variants() {
        let manifest = AnnotationManifest::from_json(ANNOTATIONS).unwrap();
        assert_eq!(manifest.annotations.len(), 3);
        assert_eq!(
            manifest.annotations[0].annotation,
            Annotation::Callout {
                instruction: "Point at Save.".into()
            }
        );
        assert_eq!(manifest.annotations[1].annotation, Annotation::Skip);
        assert_eq!(manifest.annotations[2].annotation.label(), "highlight");
    }

    #[test]
    fn test_work_list_excludes_skips() {
        let manifest = AnnotationManifest::from_json(ANNOTATIONS).unwrap();
        let work = manifest.work_list();
        let names: Vec<&str> = work.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, vec!["01.png", "03.png"]);
        assert_eq!(manifest.excluded(), 1);
        assert_eq!(work_list(&manifest.annotations[1..2]).len(), 0);
    }

    #[test]
    fn test_callout_without_instruction_is_rejected() {
        let json = ANNOTATIONS.replace("\"Point at Save.\"", "\"  \"");
        let err = AnnotationManifest::from_json(&json).unwrap_err();
        assert!(matches!(err, BookartError::Manifest(_)));
        assert!(err.to_string().contains("01.png"));
    }

    #[test]
    fn test_annotation_prompt() {
        let manifest = AnnotationManifest::from_json(ANNOTATIONS).unwrap();
        let prompt = manifest.annotations[0].prompt(&manifest.style_guide).unwrap();
        assert_eq!(
            prompt,
            "Blue boxes.\nSpecific instruction for this image:\nPoint at Save."
        );
        assert!(manifest.annotations[1].prompt(&manifest.style_guide).is_none());
    }

    #[tokio::test]
    async fn test_snapshot_records_existence() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = ImageManifest::from_json(IMAGES).unwrap();
        std::fs::write(dir.path().join("a.png"), b"png").unwrap();

        let path = write_snapshot(dir.path(), &manifest.images).await.unwrap();
        assert_eq!(path, dir.path().join(SNAPSHOT_FILE));

        let records: Vec<ManifestRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].exists);
        assert!(!records[1].exists);
        assert_eq!(records[0].prompt, "Watercolor. A cottage.");

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["aspect_ratio"], "4:5");
        assert_eq!(raw[0]["resolution"], "2K");
    }
}
