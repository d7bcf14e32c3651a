use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Delivery counters for one platform run.
pub(crate) struct DeliveryStats {
    start_time: Instant,
    sections: AtomicU64,
    messages_sent: AtomicU64,
    photos_sent: AtomicU64,
    retries: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of [`DeliveryStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StatsSnapshot {
    pub(crate) sections: u64,
    pub(crate) messages_sent: u64,
    pub(crate) photos_sent: u64,
    pub(crate) retries: u64,
    pub(crate) skipped: u64,
}

impl Default for DeliveryStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            sections: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            photos_sent: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }
}

impl DeliveryStats {
    pub(crate) fn record_section(&self) {
        self.sections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_message(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_photo(&self) {
        self.photos_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// A chunk or photo that was given up on, or an image that failed validation.
    pub(crate) fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sections: self.sections.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            photos_sent: self.photos_sent.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

pub(crate) fn build_stats_json(platform: &str, stats: &DeliveryStats) -> serde_json::Value {
    let snap = stats.snapshot();
    serde_json::json!({
        "platform": platform,
        "elapsed_secs": stats.start_time.elapsed().as_secs(),
        "sections": snap.sections,
        "messages_sent": snap.messages_sent,
        "photos_sent": snap.photos_sent,
        "retries": snap.retries,
        "skipped": snap.skipped,
        "version": env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_stats_json_initially_zero() {
        let stats = DeliveryStats::default();
        let json = build_stats_json("telegram", &stats);

        assert_eq!(json["sections"], 0);
        assert_eq!(json["messages_sent"], 0);
        assert_eq!(json["photos_sent"], 0);
        assert_eq!(json["retries"], 0);
        assert_eq!(json["skipped"], 0);
    }

    #[test]
    fn test_stats_json_format() {
        let stats = DeliveryStats::default();
        let json = build_stats_json("bale", &stats);

        assert!(json.is_object());
        assert!(json["elapsed_secs"].is_u64());
        assert!(json["sections"].is_u64());
        assert!(json["messages_sent"].is_u64());
        assert!(json["photos_sent"].is_u64());
        assert!(json["retries"].is_u64());
        assert!(json["skipped"].is_u64());
        assert!(json["version"].is_string());
        assert_eq!(json["platform"], "bale");
    }

    #[test]
    fn test_stats_reflect_recorded_events() {
        let stats = DeliveryStats::default();

        stats.record_section();
        stats.record_section();
        stats.record_message();
        stats.record_photo();
        stats.record_retry();
        stats.record_retry();
        stats.record_retry();
        stats.record_skip();

        let snap = stats.snapshot();
        assert_eq!(
            snap,
            StatsSnapshot {
                sections: 2,
                messages_sent: 1,
                photos_sent: 1,
                retries: 3,
                skipped: 1,
            }
        );

        let json = build_stats_json("telegram", &stats);
        assert_eq!(json["sections"], 2);
        assert_eq!(json["retries"], 3);
    }
}
