use {
    crate::{
        logger::{Field, Logger},
        pb::{Timestamp, Transaction, TransactionType},
    },
    base64::{Engine, engine::general_purpose::STANDARD},
    chrono::DateTime,
    prost::Message,
    std::sync::Mutex,
    tracing::Level,
    tracing_subscriber::{
        EnvFilter,
        layer::SubscriberExt,
        util::{SubscriberInitExt, TryInitError},
    },
};

pub fn setup_tracing_test(module: &str) -> Result<(), TryInitError> {
    let io_layer = tracing_subscriber::fmt::layer()
        .with_ansi(true)
        .with_line_number(true)
        .with_test_writer();

    let level_layer = EnvFilter::builder()
        .with_default_directive(format!("{module}=trace").parse().expect("invalid module"))
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(io_layer)
        .with(level_layer)
        .try_init()?;
    Ok(())
}

pub fn setup_tracing_test_many(
    modules: impl IntoIterator<Item = &'static str>,
) -> Result<(), TryInitError> {
    let io_layer = tracing_subscriber::fmt::layer()
        .with_ansi(true)
        .with_line_number(true)
        .with_test_writer();

    let directives = modules
        .into_iter()
        .fold(EnvFilter::default(), |filter, module| {
            filter.add_directive(format!("{module}=trace").parse().expect("invalid module"))
        });

    tracing_subscriber::registry()
        .with(io_layer)
        .with(directives)
        .try_init()?;
    Ok(())
}

pub fn ts(rfc3339: &str) -> Timestamp {
    let time = DateTime::parse_from_rfc3339(rfc3339).expect("invalid rfc3339 timestamp");
    Timestamp {
        seconds: time.timestamp(),
        nanos: time.timestamp_subsec_nanos() as i32,
    }
}

pub fn transaction(
    version: u64,
    r#type: TransactionType,
    timestamp: Option<Timestamp>,
) -> Transaction {
    Transaction {
        timestamp,
        version,
        r#type: r#type as i32,
        ..Default::default()
    }
}

pub fn encode_trx(transaction: &Transaction) -> String {
    STANDARD.encode(transaction.encode_to_vec())
}

pub fn fire_init() -> String {
    fire_init_custom("aptos-node 0.0.0 aptos 0 0 4")
}

pub fn fire_init_custom(params: &str) -> String {
    format!("FIRE INIT {params}")
}

pub fn fire_block_start(height: u64) -> String {
    format!("FIRE BLOCK_START {height}")
}

pub fn fire_trx(transaction: &Transaction) -> String {
    format!("FIRE TRX {}", encode_trx(transaction))
}

pub fn fire_block_end(height: u64) -> String {
    format!("FIRE BLOCK_END {height}")
}

///
/// Complete console output for one block: start, the given transactions, end.
///
pub fn fire_block(height: u64, transactions: &[Transaction]) -> Vec<String> {
    let mut lines = vec![fire_block_start(height)];
    lines.extend(transactions.iter().map(fire_trx));
    lines.push(fire_block_end(height));
    lines
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub level: Level,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl Record {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

///
/// [`Logger`] keeping every record in memory.
///
#[derive(Debug)]
pub struct RecordingLogger {
    min_level: Level,
    records: Mutex<Vec<Record>>,
}

impl Default for RecordingLogger {
    fn default() -> Self {
        Self::with_min_level(Level::TRACE)
    }
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_level(min_level: Level) -> Self {
        Self {
            min_level,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().expect("poisoned").clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .map(|record| record.message)
            .collect()
    }
}

impl Logger for RecordingLogger {
    fn enabled(&self, level: Level) -> bool {
        // `tracing` orders levels by verbosity, TRACE being the greatest
        level <= self.min_level
    }

    fn log(&self, level: Level, message: &str, fields: &[Field<'_>]) {
        let record = Record {
            level,
            message: message.to_owned(),
            fields: fields
                .iter()
                .map(|(key, value)| (*key, value.to_string()))
                .collect(),
        };
        self.records.lock().expect("poisoned").push(record);
    }
}
