//! Walks the extracted sections in order and hands them to a channel adapter.

use std::time::Duration;

use clap::ValueEnum;
use serde::Deserialize;
use tracing::{info, warn};

use crate::channel::{ChannelAdapter, ImageOutcome};
use crate::constants::{DEFAULT_BATCH_DELAY_MS, DEFAULT_BATCH_SIZE, DEFAULT_SECTION_DELAY_MS};
use crate::document::Section;
use crate::error::AppError;
use crate::stats::StatsSnapshot;

/// What happens to a section's text after an image send did not deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum CaptionPolicy {
    /// The text rides on the first image attempt only, delivered or not.
    #[default]
    ClearAfterFirstAttempt,
    /// The text moves on to the next image until one is delivered. When none
    /// is, it is sent as plain messages.
    KeepUntilDelivered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pacing {
    pub(crate) section_delay: Duration,
    pub(crate) batch_size: usize,
    pub(crate) batch_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            section_delay: Duration::from_millis(DEFAULT_SECTION_DELAY_MS),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
        }
    }
}

pub(crate) struct Orchestrator {
    pacing: Pacing,
    caption_policy: CaptionPolicy,
}

impl Orchestrator {
    pub(crate) fn new(pacing: Pacing, caption_policy: CaptionPolicy) -> Self {
        Self {
            pacing,
            caption_policy,
        }
    }

    /// Deliver every section through `adapter`, one at a time.
    ///
    /// Only a failed session open is an error; individual units that fail are
    /// skipped and counted. The session is closed on every path once opened.
    pub(crate) async fn deliver(
        &self,
        adapter: &ChannelAdapter,
        sections: &[Section],
    ) -> Result<StatsSnapshot, AppError> {
        if let Err(err) = adapter.open().await {
            adapter.close().await;
            return Err(err);
        }

        let batch_size = self.pacing.batch_size.max(1);
        let total = sections.len();
        info!(platform = adapter.name(), sections = total, batch_size, "Delivery started");

        for (idx, section) in sections.iter().enumerate() {
            if idx > 0 {
                tokio::time::sleep(self.pacing.section_delay).await;
                if idx % batch_size == 0 {
                    info!(
                        platform = adapter.name(),
                        done = idx,
                        total,
                        delay_ms = self.pacing.batch_delay.as_millis() as u64,
                        "Batch finished, pausing"
                    );
                    tokio::time::sleep(self.pacing.batch_delay).await;
                }
            }
            let complete = self.deliver_section(adapter, section).await;
            adapter.stats().record_section();
            info!(
                platform = adapter.name(),
                section = idx + 1,
                total,
                images = section.images.len(),
                complete,
                "Section delivered"
            );
        }

        adapter.close().await;
        Ok(adapter.stats().snapshot())
    }

    /// Returns `false` when the text or an image did not go out. Trailing
    /// caption chunks after a delivered photo only show up in the stats.
    async fn deliver_section(&self, adapter: &ChannelAdapter, section: &Section) -> bool {
        if section.images.is_empty() {
            return adapter.send_text(&section.text).await;
        }

        let mut complete = true;
        let mut pending_text = Some(section.text.as_str());
        for image in &section.images {
            let text = pending_text.unwrap_or_default();
            let outcome = adapter.send_text_with_image(text, image).await;
            complete &= outcome == ImageOutcome::Delivered;
            let consumed = match self.caption_policy {
                CaptionPolicy::ClearAfterFirstAttempt => true,
                CaptionPolicy::KeepUntilDelivered => outcome == ImageOutcome::Delivered,
            };
            if consumed {
                pending_text = None;
            }
        }

        if let Some(text) = pending_text {
            warn!(
                platform = adapter.name(),
                images = section.images.len(),
                "No image delivered, sending section text on its own"
            );
            complete &= adapter.send_text(text).await;
        }
        complete
    }
}
