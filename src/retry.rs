//! Flood-control handling: classify rejected sends and drive the resend loop.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::constants::{DEFAULT_RETRY_WAIT_SECS, RATE_LIMIT_MARKERS};
use crate::error::SendError;
use crate::stats::DeliveryStats;

/// How many times a rate-limited unit may be resent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "RawMaxRetries")]
pub(crate) enum MaxRetries {
    #[default]
    Unbounded,
    Limited(u32),
}

impl MaxRetries {
    fn allows(self, retries_done: u32) -> bool {
        match self {
            MaxRetries::Unbounded => true,
            MaxRetries::Limited(max) => retries_done < max,
        }
    }
}

/// Config files spell the budget as a bare count or as `unbounded`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMaxRetries {
    Count(u32),
    Word(String),
}

impl TryFrom<RawMaxRetries> for MaxRetries {
    type Error = String;

    fn try_from(raw: RawMaxRetries) -> Result<Self, Self::Error> {
        match raw {
            RawMaxRetries::Count(n) => Ok(MaxRetries::Limited(n)),
            RawMaxRetries::Word(word) => word.parse(),
        }
    }
}

impl FromStr for MaxRetries {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unbounded") {
            return Ok(MaxRetries::Unbounded);
        }
        s.parse::<u32>()
            .map(MaxRetries::Limited)
            .map_err(|_| format!("expected \"unbounded\" or a retry count, got {s:?}"))
    }
}

impl fmt::Display for MaxRetries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxRetries::Unbounded => write!(f, "unbounded"),
            MaxRetries::Limited(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryDirective {
    pub(crate) retryable: bool,
    pub(crate) wait_secs: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct RetryPolicy {
    markers: Vec<String>,
    default_wait_secs: u64,
    max_retries: MaxRetries,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            markers: RATE_LIMIT_MARKERS.iter().map(|m| m.to_string()).collect(),
            default_wait_secs: DEFAULT_RETRY_WAIT_SECS,
            max_retries: MaxRetries::Unbounded,
        }
    }
}

impl RetryPolicy {
    pub(crate) fn new(max_retries: MaxRetries) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub(crate) fn default_wait_secs(&self) -> u64 {
        self.default_wait_secs
    }

    /// Decide whether a failure message is a rate-limit rejection and how long to wait.
    ///
    /// The wait is the first integer after the marker phrase. A marker with no
    /// number after it still counts as retryable and uses the default wait.
    pub(crate) fn classify(&self, message: &str) -> RetryDirective {
        for marker in &self.markers {
            let Some(pos) = message.find(marker.as_str()) else {
                continue;
            };
            let rest = &message[pos + marker.len()..];
            let wait_secs = digits_re()
                .find(rest)
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .unwrap_or(self.default_wait_secs);
            return RetryDirective {
                retryable: true,
                wait_secs,
            };
        }
        RetryDirective {
            retryable: false,
            wait_secs: 0,
        }
    }

    /// Map a platform failure description to a typed send error.
    pub(crate) fn to_send_error(&self, message: &str) -> SendError {
        let directive = self.classify(message);
        if directive.retryable {
            SendError::RateLimited {
                wait_secs: directive.wait_secs,
            }
        } else {
            SendError::fatal(message)
        }
    }
}

fn digits_re() -> &'static Regex {
    static DIGITS_RE: OnceLock<Regex> = OnceLock::new();
    DIGITS_RE.get_or_init(|| Regex::new(r"\d+").unwrap())
}

/// Run `attempt` until it succeeds, fails for good, or the retry budget is spent.
///
/// Every `RateLimited` error sleeps for the requested number of seconds and
/// resends the identical unit. The wait never grows between attempts.
pub(crate) async fn send_with_retry<F, Fut>(
    policy: &RetryPolicy,
    stats: &DeliveryStats,
    label: &str,
    mut attempt: F,
) -> Result<(), SendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), SendError>>,
{
    let mut retries = 0u32;
    loop {
        match attempt().await {
            Ok(()) => return Ok(()),
            Err(SendError::RateLimited { wait_secs }) if policy.max_retries.allows(retries) => {
                retries += 1;
                stats.record_retry();
                warn!(
                    unit = label,
                    wait_secs,
                    retry = retries,
                    max_retries = %policy.max_retries,
                    "Flood control exceeded, waiting before resend"
                );
                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
            }
            Err(err @ SendError::RateLimited { .. }) => {
                warn!(unit = label, retries, "Retry budget spent, giving up");
                return Err(err);
            }
            Err(err) => return Err(err),
        }
    }
}
