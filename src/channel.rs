//! Per-platform delivery: chunking, pacing, image validation and the resend loop.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::chunker::{split_text, Markers};
use crate::constants::{IMAGE_EXTENSIONS, LOG_PREVIEW_CHARS};
use crate::error::{AppError, SendError};
use crate::retry::{send_with_retry, RetryPolicy};
use crate::stats::DeliveryStats;
use crate::traits::{Photo, PlatformApi};

/// Character limits a platform enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SendLimits {
    pub(crate) caption: usize,
    pub(crate) message: usize,
}

pub(crate) struct AdapterConfig {
    pub(crate) name: &'static str,
    pub(crate) chat_id: String,
    pub(crate) limits: SendLimits,
    pub(crate) markers: Markers,
    pub(crate) retry: RetryPolicy,
    pub(crate) chunk_delay: Duration,
}

/// What happened to one `send_text_with_image` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImageOutcome {
    /// The photo went out (trailing chunks may still have been skipped).
    Delivered,
    /// The image failed validation; nothing was sent.
    Invalid,
    /// The photo upload was rejected for good.
    Failed,
}

/// Sends to one chat on one platform.
pub(crate) struct ChannelAdapter {
    name: &'static str,
    api: Box<dyn PlatformApi>,
    chat_id: String,
    limits: SendLimits,
    markers: Markers,
    retry: RetryPolicy,
    chunk_delay: Duration,
    stats: DeliveryStats,
}

impl ChannelAdapter {
    pub(crate) fn new(api: Box<dyn PlatformApi>, config: AdapterConfig) -> Self {
        Self {
            name: config.name,
            api,
            chat_id: config.chat_id,
            limits: config.limits,
            markers: config.markers,
            retry: config.retry,
            chunk_delay: config.chunk_delay,
            stats: DeliveryStats::default(),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn stats(&self) -> &DeliveryStats {
        &self.stats
    }

    /// Verify the credentials before anything is sent.
    pub(crate) async fn open(&self) -> Result<(), AppError> {
        let api = self.api.as_ref();
        let label = format!("{} session", self.name);
        send_with_retry(&self.retry, &self.stats, &label, move || api.open())
            .await
            .map_err(|source| AppError::Session {
                platform: self.name,
                source,
            })?;
        info!(platform = self.name, chat_id = %self.chat_id, "Channel ready");
        Ok(())
    }

    pub(crate) async fn close(&self) {
        self.api.close().await;
    }

    /// Send `text` as one or more messages. Returns `true` when every chunk went out.
    pub(crate) async fn send_text(&self, text: &str) -> bool {
        let chunks = split_text(text, self.limits.message, &self.markers);
        let total = chunks.len();
        if total > 1 {
            info!(platform = self.name, chunks = total, "Message split into chunks");
        }

        let mut all_sent = true;
        for (idx, chunk) in chunks.iter().enumerate() {
            if idx > 0 {
                tokio::time::sleep(self.chunk_delay).await;
            }
            all_sent &= self.send_chunk(idx, total, chunk).await;
        }
        all_sent
    }

    /// Send one photo with the start of `text` as its caption and the rest as messages.
    pub(crate) async fn send_text_with_image(&self, text: &str, image: &Path) -> ImageOutcome {
        let photo = match self.load_photo(image).await {
            Ok(photo) => photo,
            Err(reason) => {
                warn!(platform = self.name, image = %image.display(), reason, "Skipping image");
                self.stats.record_skip();
                return ImageOutcome::Invalid;
            }
        };

        let chunks = split_text(text, self.limits.caption, &self.markers);
        let caption = chunks.first().map(String::as_str).unwrap_or_default();
        let api = self.api.as_ref();
        let chat_id = self.chat_id.as_str();
        let photo_ref = &photo;
        let label = format!("{} photo {}", self.name, photo.file_name);

        let result = send_with_retry(&self.retry, &self.stats, &label, move || {
            api.send_photo(chat_id, photo_ref, caption)
        })
        .await;
        if let Err(err) = result {
            warn!(
                platform = self.name,
                image = %image.display(),
                error = %err,
                "Photo not delivered, dropping its caption chunks"
            );
            self.stats.record_skip();
            return ImageOutcome::Failed;
        }
        self.stats.record_photo();
        info!(
            platform = self.name,
            image = %photo.file_name,
            caption_chunks = chunks.len(),
            "Photo sent"
        );

        let total = chunks.len();
        for (idx, chunk) in chunks.iter().enumerate().skip(1) {
            tokio::time::sleep(self.chunk_delay).await;
            self.send_chunk(idx, total, chunk).await;
        }
        ImageOutcome::Delivered
    }

    async fn send_chunk(&self, idx: usize, total: usize, chunk: &str) -> bool {
        if chunk.trim().is_empty() {
            debug!(platform = self.name, chunk = idx + 1, "Skipping empty chunk");
            return true;
        }

        let api = self.api.as_ref();
        let chat_id = self.chat_id.as_str();
        let label = format!("{} message {}/{total}", self.name, idx + 1);
        match send_with_retry(&self.retry, &self.stats, &label, move || {
            api.send_message(chat_id, chunk)
        })
        .await
        {
            Ok(()) => {
                self.stats.record_message();
                debug!(
                    platform = self.name,
                    chunk = idx + 1,
                    total,
                    preview = %preview(chunk),
                    "Message sent"
                );
                true
            }
            Err(err) => {
                self.report_skipped_chunk(idx, total, &err);
                false
            }
        }
    }

    fn report_skipped_chunk(&self, idx: usize, total: usize, err: &SendError) {
        warn!(
            platform = self.name,
            chunk = idx + 1,
            total,
            error = %err,
            "Message not delivered, skipping chunk"
        );
        self.stats.record_skip();
    }

    async fn load_photo(&self, image: &Path) -> Result<Photo, &'static str> {
        if !image.exists() {
            return Err("file not found");
        }
        let supported = image
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|allowed| ext.eq_ignore_ascii_case(allowed))
            });
        if !supported {
            return Err("unsupported image format");
        }
        let bytes = tokio::fs::read(image)
            .await
            .map_err(|_| "file is not readable")?;
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Photo { file_name, bytes })
    }
}

fn preview(text: &str) -> String {
    let flat: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
    let flat = flat.replace('\n', " ");
    if text.chars().count() > LOG_PREVIEW_CHARS {
        format!("{flat}...")
    } else {
        flat
    }
}
