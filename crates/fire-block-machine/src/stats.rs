use {
    crate::{block::BlockRef, logger::Logger, pb::Block},
    std::{
        fmt,
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::{Duration, Instant},
    },
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
};

pub const DEFAULT_STATS_LOG_INTERVAL: Duration = Duration::from_secs(30);

const NO_LAST_BLOCK: u64 = u64::MAX;

///
/// Counters updated by the reader each time a block completes.
///
/// Single writer (the parser), any number of readers. Counters are independent atomics so a reader
/// may observe a block count and a transaction count coming from two different blocks.
///
#[derive(Debug)]
pub struct ReaderStats {
    blocks: AtomicU64,
    transactions: AtomicU64,
    parse_time_nanos: AtomicU64,
    last_block_num: AtomicU64,
}

impl Default for ReaderStats {
    fn default() -> Self {
        Self {
            blocks: AtomicU64::new(0),
            transactions: AtomicU64::new(0),
            parse_time_nanos: AtomicU64::new(0),
            last_block_num: AtomicU64::new(NO_LAST_BLOCK),
        }
    }
}

///
/// Raw monotonic totals at a point in time.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsTotals {
    pub blocks: u64,
    pub transactions: u64,
    pub parse_time: Duration,
    pub last_block: Option<BlockRef>,
}

impl ReaderStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_block_completed(&self, block: &Block, started_at: Instant) {
        self.record_block_completed_with_clock(block, started_at, Instant::now());
    }

    pub fn record_block_completed_with_clock(
        &self,
        block: &Block,
        started_at: Instant,
        now: Instant,
    ) {
        let elapsed = now.saturating_duration_since(started_at);
        self.blocks.fetch_add(1, Ordering::Relaxed);
        self.transactions
            .fetch_add(block.transactions.len() as u64, Ordering::Relaxed);
        self.parse_time_nanos.fetch_add(
            u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
        self.last_block_num.store(block.height, Ordering::Relaxed);
    }

    pub fn totals(&self) -> StatsTotals {
        let last_block = match self.last_block_num.load(Ordering::Relaxed) {
            NO_LAST_BLOCK => None,
            num => Some(BlockRef::new(num)),
        };
        StatsTotals {
            blocks: self.blocks.load(Ordering::Relaxed),
            transactions: self.transactions.load(Ordering::Relaxed),
            parse_time: Duration::from_nanos(self.parse_time_nanos.load(Ordering::Relaxed)),
            last_block,
        }
    }
}

///
/// Rates observed over the last sampling window.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    pub block_rate: f64,
    pub trx_rate: f64,
    pub block_average_parse_time: Duration,
    pub last_block: Option<BlockRef>,
    pub window: Duration,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block_rate={:.2} blocks/s trx_rate={:.2} trxs/s block_average_parse_time={:.3}ms last_block=",
            self.block_rate,
            self.trx_rate,
            self.block_average_parse_time.as_secs_f64() * 1000.0,
        )?;
        match &self.last_block {
            Some(block) => write!(f, "{block}"),
            None => f.write_str("None"),
        }
    }
}

///
/// Turns successive [`StatsTotals`] into per-window rates.
///
#[derive(Debug)]
pub struct StatsSampler {
    previous: StatsTotals,
    previous_at: Instant,
}

impl StatsSampler {
    pub fn new(start: StatsTotals, now: Instant) -> Self {
        Self {
            previous: start,
            previous_at: now,
        }
    }

    pub fn sample(&mut self, current: StatsTotals, now: Instant) -> StatsSnapshot {
        let window = now.saturating_duration_since(self.previous_at);
        let blocks = current.blocks.saturating_sub(self.previous.blocks);
        let transactions = current.transactions.saturating_sub(self.previous.transactions);
        let parse_time = current.parse_time.saturating_sub(self.previous.parse_time);

        let per_second = |count: u64| {
            if window.is_zero() {
                0.0
            } else {
                count as f64 / window.as_secs_f64()
            }
        };

        let block_average_parse_time = if blocks == 0 {
            Duration::ZERO
        } else {
            parse_time / u32::try_from(blocks).unwrap_or(u32::MAX)
        };

        let snapshot = StatsSnapshot {
            block_rate: per_second(blocks),
            trx_rate: per_second(transactions),
            block_average_parse_time,
            last_block: current.last_block,
            window,
        };

        self.previous = current;
        self.previous_at = now;
        snapshot
    }
}

///
/// Background task sampling [`ReaderStats`] on its own interval.
///
/// It must be stopped with [`StatsReporter::shutdown`], dropping it leaves the task running until
/// the runtime goes away.
///
pub struct StatsReporter {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl StatsReporter {
    pub fn spawn<F>(stats: Arc<ReaderStats>, every: Duration, mut on_snapshot: F) -> Self
    where
        F: FnMut(StatsSnapshot) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut sampler = StatsSampler::new(stats.totals(), Instant::now());
            let mut ticker = tokio::time::interval(every);
            // The first tick of a tokio interval completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let snapshot = sampler.sample(stats.totals(), Instant::now());
                        on_snapshot(snapshot);
                    }
                }
            }
            tracing::trace!("stats reporter stopped");
        });

        Self { cancel, handle }
    }

    ///
    /// Spawns a reporter logging every snapshot through `logger`.
    ///
    pub fn spawn_logging(
        stats: Arc<ReaderStats>,
        every: Duration,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self::spawn(stats, every, move |snapshot| {
            let block_rate = format!("{:.2} blocks/s", snapshot.block_rate);
            let trx_rate = format!("{:.2} trxs/s", snapshot.trx_rate);
            let parse_time = format!(
                "{:.3} ms/block",
                snapshot.block_average_parse_time.as_secs_f64() * 1000.0
            );
            let last_block = snapshot
                .last_block
                .map(|block| block.to_string())
                .unwrap_or_else(|| "None".to_owned());
            logger.info(
                "reader read statistics",
                &[
                    ("block_rate", &block_rate),
                    ("trx_rate", &trx_rate),
                    ("last_block", &last_block),
                    ("block_average_parse_time", &parse_time),
                ],
            );
        })
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!("stats reporter task failed: {e}");
        }
    }
}
