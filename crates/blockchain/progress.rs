use std::time::{Duration, Instant};

use blockreplay_core::types::{Block, BlockNumber};
use tracing::info;

const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(8);

/// Import throughput tracker. Logs a progress line whenever the report interval elapses and
/// a summary when the import finishes.
#[derive(Debug, Clone)]
pub struct ImportProgress {
    interval: Duration,
    started: Instant,
    last_report: Instant,
    total: Counters,
    since_report: Counters,
    head: Option<BlockNumber>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub blocks: u64,
    pub transactions: u64,
    pub gas: u64,
}

impl Counters {
    fn add(&mut self, block: &Block) {
        self.blocks += 1;
        self.transactions += block.body.transactions.len() as u64;
        self.gas += block.header.gas_used;
    }
}

impl Default for ImportProgress {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_INTERVAL)
    }
}

impl ImportProgress {
    pub fn new(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            interval,
            started: now,
            last_report: now,
            total: Counters::default(),
            since_report: Counters::default(),
            head: None,
        }
    }

    /// Accounts for an imported block, returns true if a progress line was logged
    pub fn record(&mut self, block: &Block) -> bool {
        self.total.add(block);
        self.since_report.add(block);
        self.head = Some(block.header.number);

        let elapsed = self.last_report.elapsed();
        if elapsed < self.interval {
            return false;
        }
        let seconds = elapsed.as_secs_f64().max(f64::EPSILON);
        info!(
            head = self.head,
            blocks = self.since_report.blocks,
            "Import progress: {:.2} blocks/s, {:.2} tx/s, {:.2} Mgas/s",
            self.since_report.blocks as f64 / seconds,
            self.since_report.transactions as f64 / seconds,
            self.since_report.gas as f64 / seconds / 1_000_000f64,
        );
        self.since_report = Counters::default();
        self.last_report = Instant::now();
        true
    }

    pub fn totals(&self) -> Counters {
        self.total
    }

    pub fn finish(&self) {
        info!(
            head = self.head,
            blocks = self.total.blocks,
            transactions = self.total.transactions,
            gas = self.total.gas,
            "Import finished in {}",
            format_duration_as_mm_ss(self.started.elapsed())
        );
    }
}

pub fn format_duration_as_mm_ss(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}
