//! Credentials and delivery tuning, resolved from CLI flags and an optional YAML file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::channel::SendLimits;
use crate::constants::DEFAULT_CHUNK_DELAY_MS;
use crate::error::AppError;
use crate::orchestrator::{CaptionPolicy, Pacing};
use crate::platform::Platform;
use crate::retry::MaxRetries;

/// Bot token and target chat for one platform.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Credentials {
    pub(crate) token: String,
    pub(crate) chat_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl Credentials {
    /// Both values must be present and non-blank.
    pub(crate) fn require(
        platform: Platform,
        token: Option<String>,
        chat_id: Option<String>,
    ) -> Result<Self, AppError> {
        let (token_var, chat_var) = env_names(platform);
        let token = non_blank(token)
            .ok_or_else(|| AppError::Config(format!("{token_var} is not set")))?;
        let chat_id = non_blank(chat_id)
            .ok_or_else(|| AppError::Config(format!("{chat_var} is not set")))?;
        Ok(Self { token, chat_id })
    }
}

pub(crate) fn env_names(platform: Platform) -> (&'static str, &'static str) {
    match platform {
        Platform::Telegram => ("TELEGRAM_API_TOKEN", "TELEGRAM_CHAT_ID"),
        Platform::Bale => ("BALE_API_TOKEN", "BALE_CHAT_ID"),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Delivery knobs that may come from flags or from the config file.
///
/// Every field is optional so that layers can be stacked: flags win over the
/// file, the file wins over built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Tuning {
    pub(crate) chunk_delay_ms: Option<u64>,
    pub(crate) section_delay_ms: Option<u64>,
    pub(crate) batch_size: Option<usize>,
    pub(crate) batch_delay_ms: Option<u64>,
    pub(crate) max_retries: Option<MaxRetries>,
    pub(crate) caption_policy: Option<CaptionPolicy>,
    pub(crate) telegram_message_limit: Option<usize>,
    pub(crate) bale_message_limit: Option<usize>,
}

impl Tuning {
    pub(crate) fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        let tuning: Tuning = serde_yaml::from_str(&raw)?;
        debug!(path = %path.display(), ?tuning, "Loaded config file");
        Ok(tuning)
    }

    /// Fill every unset field of `self` from `lower`.
    pub(crate) fn over(self, lower: Tuning) -> Tuning {
        Tuning {
            chunk_delay_ms: self.chunk_delay_ms.or(lower.chunk_delay_ms),
            section_delay_ms: self.section_delay_ms.or(lower.section_delay_ms),
            batch_size: self.batch_size.or(lower.batch_size),
            batch_delay_ms: self.batch_delay_ms.or(lower.batch_delay_ms),
            max_retries: self.max_retries.or(lower.max_retries),
            caption_policy: self.caption_policy.or(lower.caption_policy),
            telegram_message_limit: self.telegram_message_limit.or(lower.telegram_message_limit),
            bale_message_limit: self.bale_message_limit.or(lower.bale_message_limit),
        }
    }
}

/// Fully resolved delivery settings shared by every platform in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DeliveryConfig {
    pub(crate) chunk_delay: Duration,
    pub(crate) pacing: Pacing,
    pub(crate) max_retries: MaxRetries,
    pub(crate) caption_policy: CaptionPolicy,
    telegram_message_limit: Option<usize>,
    bale_message_limit: Option<usize>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self::from_tuning(Tuning::default())
    }
}

impl DeliveryConfig {
    pub(crate) fn from_tuning(tuning: Tuning) -> Self {
        let defaults = Pacing::default();
        Self {
            chunk_delay: Duration::from_millis(
                tuning.chunk_delay_ms.unwrap_or(DEFAULT_CHUNK_DELAY_MS).max(1),
            ),
            pacing: Pacing {
                section_delay: tuning
                    .section_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.section_delay),
                batch_size: tuning.batch_size.unwrap_or(defaults.batch_size).max(1),
                batch_delay: tuning
                    .batch_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.batch_delay),
            },
            max_retries: tuning.max_retries.unwrap_or_default(),
            caption_policy: tuning.caption_policy.unwrap_or_default(),
            telegram_message_limit: tuning.telegram_message_limit,
            bale_message_limit: tuning.bale_message_limit,
        }
    }

    /// Platform limits with any configured message limit applied.
    pub(crate) fn limits_for(&self, platform: Platform) -> SendLimits {
        let mut limits = platform.limits();
        let configured = match platform {
            Platform::Telegram => self.telegram_message_limit,
            Platform::Bale => self.bale_message_limit,
        };
        if let Some(message) = configured.filter(|&m| m > 0) {
            limits.message = message;
        }
        limits
    }
}
