//! Image generation providers.

mod gemini;

pub use gemini::{GeminiModel, GeminiProvider, GeminiProviderBuilder, DEFAULT_API_BASE};
