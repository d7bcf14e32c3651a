//! Messaging platforms and the Bot API client that talks to them.

mod bot_api;
mod response;

pub(crate) use bot_api::BotApiClient;

use crate::channel::SendLimits;
use crate::chunker::Markers;
use crate::constants::{
    BALE_API_BASE, BALE_CAPTION_LEN, BALE_MESSAGE_LEN, CONTINUATION_END, CONTINUATION_START,
    TELEGRAM_API_BASE, TELEGRAM_CAPTION_LEN, TELEGRAM_MESSAGE_LEN,
};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Platform {
    Telegram,
    Bale,
}

impl Platform {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Platform::Telegram => "telegram",
            Platform::Bale => "bale",
        }
    }

    pub(crate) fn default_api_base(self) -> &'static str {
        match self {
            Platform::Telegram => TELEGRAM_API_BASE,
            Platform::Bale => BALE_API_BASE,
        }
    }

    pub(crate) fn limits(self) -> SendLimits {
        match self {
            Platform::Telegram => SendLimits {
                caption: TELEGRAM_CAPTION_LEN,
                message: TELEGRAM_MESSAGE_LEN,
            },
            Platform::Bale => SendLimits {
                caption: BALE_CAPTION_LEN,
                message: BALE_MESSAGE_LEN,
            },
        }
    }

    /// Persian continuation markers, identical on every platform.
    pub(crate) fn markers(self) -> Markers {
        Markers::new(CONTINUATION_START, CONTINUATION_END)
    }
}

/// Which platforms a run publishes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Destination {
    Telegram,
    Bale,
    All,
}

impl Destination {
    /// Parse the single-letter selector: `T`, `B` or `A`, any case.
    pub(crate) fn from_selector(input: &str) -> Result<Self, AppError> {
        match input.trim().to_ascii_uppercase().as_str() {
            "T" => Ok(Destination::Telegram),
            "B" => Ok(Destination::Bale),
            "A" => Ok(Destination::All),
            _ => Err(AppError::InvalidDestination(input.trim().to_string())),
        }
    }

    pub(crate) fn platforms(self) -> &'static [Platform] {
        match self {
            Destination::Telegram => &[Platform::Telegram],
            Destination::Bale => &[Platform::Bale],
            Destination::All => &[Platform::Telegram, Platform::Bale],
        }
    }
}
