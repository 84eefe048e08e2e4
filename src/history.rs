use std::collections::VecDeque;

use crate::models::{LogEntry, PcInfo};

/// Most-recent-first activity log. Capacity 50; the oldest entry is
/// dropped when a new one arrives at capacity.
pub const LOG_CAPACITY: usize = 50;

/// Rolling window per metric stream, oldest first. One minute of the
/// agent's per-second reports.
pub const METRIC_CAPACITY: usize = 60;

#[derive(Debug, Default)]
pub struct LogRing {
    entries: VecDeque<LogEntry>,
}

impl LogRing {
    pub fn new() -> Self {
        LogRing {
            entries: VecDeque::with_capacity(LOG_CAPACITY),
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.entries.len() == LOG_CAPACITY {
            self.entries.pop_back();
        }
        self.entries.push_front(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest-first copy for the presentation snapshot.
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[derive(Debug, Default)]
pub struct MetricSeries {
    samples: VecDeque<f64>,
}

impl MetricSeries {
    pub fn new() -> Self {
        MetricSeries {
            samples: VecDeque::with_capacity(METRIC_CAPACITY),
        }
    }

    pub fn push(&mut self, sample: f64) {
        if self.samples.len() == METRIC_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Oldest-first copy for charting.
    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }
}

/// The tracked streams: CPU percent as reported, RAM as percent of total.
#[derive(Debug, Default)]
pub struct MetricHistory {
    pub cpu: MetricSeries,
    pub ram: MetricSeries,
}

impl MetricHistory {
    pub fn new() -> Self {
        MetricHistory {
            cpu: MetricSeries::new(),
            ram: MetricSeries::new(),
        }
    }

    pub fn record(&mut self, info: &PcInfo) {
        self.cpu.push(info.cpu_percent);
        self.ram.push(info.ram_percent());
    }

    /// Wipe every stream. Done on transition to offline — stale charts
    /// must not be shown for a dead connection.
    pub fn clear(&mut self) {
        self.cpu.clear();
        self.ram.clear();
    }
}
