//! Run configuration, resolved once at startup.
//!
//! Nothing outside this module reads the process environment; binaries build a
//! [`Config`] in `main` and hand it to the runners.

use crate::error::{BookartError, Result};
use crate::image::providers::{GeminiModel, GeminiProvider, DEFAULT_API_BASE};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_IMAGE_API_KEY";
/// Optional model override for generation runs.
pub const GENERATION_MODEL_ENV: &str = "GEMINI_IMAGE_MODEL";
/// Optional model override for annotation runs.
pub const EDIT_MODEL_ENV: &str = "GEMINI_EDIT_MODEL";
/// Optional REST base URL override.
pub const API_BASE_ENV: &str = "GEMINI_API_BASE";

/// Name of the backup subdirectory created next to annotated screenshots.
pub const BACKUP_DIR_NAME: &str = "raw";

/// Which batch a configuration is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Text-to-image illustration runs.
    Generate,
    /// Screenshot annotation runs.
    Annotate,
}

impl Mode {
    /// Model used when no override is given.
    pub fn default_model(&self) -> GeminiModel {
        match self {
            Self::Generate => GeminiModel::FlashImage,
            Self::Annotate => GeminiModel::ProImagePreview,
        }
    }

    /// Pause between vendor calls.
    pub fn default_delay(&self) -> Duration {
        match self {
            Self::Generate => Duration::from_secs(6),
            Self::Annotate => Duration::from_secs(5),
        }
    }

    fn model_env(&self) -> &'static str {
        match self {
            Self::Generate => GENERATION_MODEL_ENV,
            Self::Annotate => EDIT_MODEL_ENV,
        }
    }
}

/// Everything a batch run needs to know.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key.
    pub api_key: String,
    /// Model to call.
    pub model: GeminiModel,
    /// REST base URL.
    pub api_base: String,
    /// Directory holding generated or annotated images.
    pub output_dir: PathBuf,
    /// Directory holding pristine originals (annotation only).
    pub backup_dir: PathBuf,
    /// Pause between vendor calls.
    pub delay: Duration,
    /// Re-process items that already look done.
    pub force: bool,
}

impl Config {
    /// Creates a configuration with the defaults for `mode`.
    pub fn new(mode: Mode, api_key: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            api_key: api_key.into(),
            model: mode.default_model(),
            api_base: DEFAULT_API_BASE.to_string(),
            backup_dir: output_dir.join(BACKUP_DIR_NAME),
            output_dir,
            delay: mode.default_delay(),
            force: false,
        }
    }

    /// Resolves a configuration from the process environment.
    ///
    /// Fails with [`BookartError::Config`] when the API key is missing, before
    /// anything touches the network or the output directory.
    pub fn from_env(mode: Mode, output_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::from_lookup(mode, output_dir, |name| std::env::var(name).ok())
    }

    /// Resolves a configuration from an arbitrary variable lookup.
    pub fn from_lookup(
        mode: Mode,
        output_dir: impl Into<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| BookartError::Config(format!("Set {API_KEY_ENV} environment variable.")))?;

        let mut config = Self::new(mode, api_key, output_dir);
        if let Some(model) = lookup(mode.model_env()).filter(|m| !m.trim().is_empty()) {
            config.model = model.parse()?;
        }
        if let Some(base) = lookup(API_BASE_ENV).filter(|b| !b.trim().is_empty()) {
            config.api_base = base;
        }
        Ok(config)
    }

    /// Sets the model.
    pub fn with_model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Sets the REST base URL.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Sets the backup directory.
    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = dir.into();
        self
    }

    /// Sets the pause between vendor calls.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets whether finished items are re-processed.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Path of a manifest item in the output directory.
    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }

    /// Path of a manifest item's pristine backup.
    pub fn backup_path(&self, filename: &str) -> PathBuf {
        self.backup_dir.join(filename)
    }

    /// Builds the Gemini client this configuration describes.
    pub fn provider(&self) -> Result<GeminiProvider> {
        GeminiProvider::builder()
            .api_key(&self.api_key)
            .model(self.model.clone())
            .api_base(&self.api_base)
            .build()
    }
}
