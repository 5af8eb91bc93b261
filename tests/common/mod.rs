//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bookart::image::{GenerationMetadata, ImageFormat};
use bookart::{BookartError, GeneratedImage, GenerationRequest, ImageProvider};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Minimal PNG header; enough for magic-byte detection.
pub const PNG: [u8; 16] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R',
];

/// What the scripted provider should answer for one call.
pub enum Reply {
    Image(Vec<u8>),
    NoImage(Option<&'static str>),
    Error(u16),
}

/// Provider that replays canned replies and records every request.
///
/// Once the script runs out it keeps answering with a small PNG.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProvider for ScriptedProvider {
    async fn generate(&self, request: &GenerationRequest) -> bookart::Result<GeneratedImage> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Image(PNG.to_vec()));

        match reply {
            Reply::Image(data) => Ok(GeneratedImage::new(
                data,
                ImageFormat::Png,
                GenerationMetadata::default(),
            )),
            Reply::NoImage(reason) => Err(BookartError::NoImage {
                finish_reason: reason.map(str::to_string),
                text: vec!["I can only describe this image.".into()],
            }),
            Reply::Error(status) => Err(BookartError::Api {
                status,
                message: "scripted failure".into(),
            }),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Lets tests hand a shared provider to a runner and inspect it afterwards.
#[async_trait]
impl ImageProvider for &ScriptedProvider {
    async fn generate(&self, request: &GenerationRequest) -> bookart::Result<GeneratedImage> {
        (**self).generate(request).await
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
