use {
    crate::{block::DEFAULT_FIRST_STREAMABLE_BLOCK, stats::DEFAULT_STATS_LOG_INTERVAL},
    serde::Deserialize,
    std::time::Duration,
};

pub const DEFAULT_LINE_BUFFER_CAPACITY: usize = 10_000;
pub const DEFAULT_OUTPUT_CHANNEL_CAPACITY: usize = 1_000;

///
/// Tunables of the console reader.
///
/// Every field is optional when deserialized, missing ones take their default value.
///
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Number of raw lines buffered between the line producer and the parser.
    pub line_buffer_capacity: usize,
    /// Number of results buffered between the parser and the block consumer.
    pub output_channel_capacity: usize,
    pub stats_log_interval_secs: u64,
    pub first_streamable_block: u64,
    /// Spawn the periodic statistics reporter along with the reader.
    pub log_stats: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            line_buffer_capacity: DEFAULT_LINE_BUFFER_CAPACITY,
            output_channel_capacity: DEFAULT_OUTPUT_CHANNEL_CAPACITY,
            stats_log_interval_secs: DEFAULT_STATS_LOG_INTERVAL.as_secs(),
            first_streamable_block: DEFAULT_FIRST_STREAMABLE_BLOCK,
            log_stats: true,
        }
    }
}

impl ReaderConfig {
    pub fn stats_log_interval(&self) -> Duration {
        // A zero period would make the reporter spin
        Duration::from_secs(self.stats_log_interval_secs.max(1))
    }
}
