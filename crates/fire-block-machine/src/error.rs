use {
    crate::block::transaction_type_name,
    std::{borrow::Cow, num::ParseIntError},
};

///
/// Every reason a protocol line can be rejected.
///
/// The variants only describe the cause, the offending line is attached by [`ReaderError`].
///
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid log line, expecting at least two tokens")]
    MalformedLine,
    #[error("invalid {event} line: {expected} fields required but found {found}")]
    InvalidParamCount {
        event: &'static str,
        expected: String,
        found: usize,
    },
    #[error("invalid {event} {field:?} param {value:?}: {source}")]
    InvalidNumber {
        event: &'static str,
        field: &'static str,
        value: String,
        source: ParseIntError,
    },
    #[error("invalid INIT line: expected named \"chain_id\" param, got {got:?}")]
    InvalidChainIdName { got: String },
    #[error("only able to consume firehose format with major version {supported}, got {got}")]
    UnsupportedMajorVersion { supported: u64, got: u64 },
    #[error("received INIT line while one has already been read")]
    DuplicateHeader,
    #[error("no active block in progress when reading {event}")]
    NoActiveBlock { event: &'static str },
    #[error("read trx in block {height}: invalid base64 value: {source}")]
    InvalidBase64 {
        height: u64,
        source: base64::DecodeError,
    },
    #[error("read trx in block {height}: invalid proto: {source}")]
    InvalidPayload {
        height: u64,
        source: prost::DecodeError,
    },
    #[error(transparent)]
    InvalidTransactionOrdering(#[from] OrderingViolation),
    #[error("active block's height {active} does not match BLOCK_END received height {received}")]
    HeightMismatch { active: u64, received: u64 },
    #[error("active block height {height} does not contain any transaction")]
    EmptyBlock { height: u64 },
    #[error("received BLOCK_END for height {received} while block {last} was already emitted")]
    HeightRegression { last: u64, received: u64 },
}

fn type_name(value: &i32) -> Cow<'static, str> {
    transaction_type_name(*value)
}

///
/// Carries the raw transaction type as decoded, which may be outside of the known types.
///
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderingViolation {
    #[error(
        "received first TRX of type \"{}\" that is not a valid block start boundary transaction (only Block Metadata and Genesis transaction are)",
        type_name(.0)
    )]
    FirstNotBoundary(i32),
    #[error(
        "received non-first block start boundary TRX of type \"{}\", expecting to only ever receive a single block start boundary transaction within an active block",
        type_name(.0)
    )]
    BoundaryNotFirst(i32),
}

///
/// A fatal error for the current read, carrying the raw line that triggered it.
///
#[derive(Debug, thiserror::Error)]
#[error("{source} (on line {line:?})")]
pub struct ReaderError {
    pub line: String,
    pub source: ProtocolError,
}

impl ReaderError {
    pub fn new(line: impl Into<String>, source: ProtocolError) -> Self {
        Self {
            line: line.into(),
            source,
        }
    }

    pub fn kind(&self) -> &ProtocolError {
        &self.source
    }
}

///
/// Errors raised while feeding lines from a byte stream into the reader.
///
#[derive(Debug, thiserror::Error)]
pub enum LineSourceError {
    #[error("reading console output: {0}")]
    Io(#[from] std::io::Error),
}
