use extract::{EventDocument, PipelineReport};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,

    // Timing (in microseconds)
    total_extract_time_us: AtomicU64,

    // Counts
    documents_processed: AtomicUsize,
    events_extracted: AtomicUsize,
    entities_extracted: AtomicUsize,
    relations_linked: AtomicUsize,
    augmentation_fallbacks: AtomicUsize,
    parse_failures: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            total_extract_time_us: AtomicU64::new(0),
            documents_processed: AtomicUsize::new(0),
            events_extracted: AtomicUsize::new(0),
            entities_extracted: AtomicUsize::new(0),
            relations_linked: AtomicUsize::new(0),
            augmentation_fallbacks: AtomicUsize::new(0),
            parse_failures: AtomicUsize::new(0),
        })
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_document(&self, duration: std::time::Duration, document: &EventDocument, report: &PipelineReport) {
        self.total_extract_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
        self.events_extracted.fetch_add(document.events.len(), Ordering::Relaxed);
        self.entities_extracted.fetch_add(document.entities.len(), Ordering::Relaxed);
        self.relations_linked.fetch_add(report.relations, Ordering::Relaxed);

        let fallbacks = [&report.entity_augmentation, &report.event_augmentation]
            .iter()
            .filter(|s| s.fell_back())
            .count();
        self.augmentation_fallbacks.fetch_add(fallbacks, Ordering::Relaxed);
        if report.parse_failed {
            self.parse_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            avg_extract_time_ms: self.avg_time_ms(&self.total_extract_time_us, &self.documents_processed),
            documents_processed: self.documents_processed.load(Ordering::Relaxed),
            events_extracted: self.events_extracted.load(Ordering::Relaxed),
            entities_extracted: self.entities_extracted.load(Ordering::Relaxed),
            relations_linked: self.relations_linked.load(Ordering::Relaxed),
            augmentation_fallbacks: self.augmentation_fallbacks.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
        }
    }

    fn avg_time_ms(&self, total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
        let total = total_us.load(Ordering::Relaxed) as f64;
        let cnt = count.load(Ordering::Relaxed) as f64;
        if cnt > 0.0 {
            total / cnt / 1000.0 // Convert to ms
        } else {
            0.0
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub avg_extract_time_ms: f64,
    pub documents_processed: usize,
    pub events_extracted: usize,
    pub entities_extracted: usize,
    pub relations_linked: usize,
    pub augmentation_fallbacks: usize,
    pub parse_failures: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
