/// Telegram's caption limit for `sendPhoto`.
pub(crate) const TELEGRAM_CAPTION_LEN: usize = 1024;

/// Telegram message length we split at (the hard limit is 4096).
pub(crate) const TELEGRAM_MESSAGE_LEN: usize = 4000;

/// Bale caption limit for `sendPhoto`.
pub(crate) const BALE_CAPTION_LEN: usize = 1024;

/// Bale rejects long messages well before 1024 characters.
pub(crate) const BALE_MESSAGE_LEN: usize = 950;

pub(crate) const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub(crate) const BALE_API_BASE: &str = "https://tapi.bale.ai";

/// Continuation markers, shared by both channels.
pub(crate) const CONTINUATION_START: &str = "🔄 این پیام ادامه‌ی پیام قبلی است...";
pub(crate) const CONTINUATION_END: &str = "⏳ ادامه در پیام بعدی...";

/// Phrases that mark a rejected send as flood-controlled.
pub(crate) const RATE_LIMIT_MARKERS: &[&str] = &["Retry in", "retry after"];

/// Wait used when a rate-limit message carries no usable number.
pub(crate) const DEFAULT_RETRY_WAIT_SECS: u64 = 5;

/// Pause between consecutive chunks of one message, in milliseconds.
pub(crate) const DEFAULT_CHUNK_DELAY_MS: u64 = 1000;

/// Pause between consecutive sections, in milliseconds.
pub(crate) const DEFAULT_SECTION_DELAY_MS: u64 = 1000;

/// Extra pause after every full batch of sections, in milliseconds.
pub(crate) const DEFAULT_BATCH_DELAY_MS: u64 = 1000;

/// Sections per batch.
pub(crate) const DEFAULT_BATCH_SIZE: usize = 5;

/// Image extensions the platforms accept for `sendPhoto`.
pub(crate) const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Directory extracted images are written to.
pub(crate) const DEFAULT_IMAGE_DIR: &str = "extracted_images";

/// Section text used when a Heading 4 has no text of its own.
pub(crate) const EMPTY_HEADING_TEXT: &str = "خبر!";

pub(crate) const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
pub(crate) const HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Characters of a message shown in log lines.
pub(crate) const LOG_PREVIEW_CHARS: usize = 30;
