use {
    crate::pb::{Block, Timestamp, Transaction, TransactionType},
    chrono::{DateTime, Utc},
    prost::Message,
    std::{borrow::Cow, fmt},
};

/// Height below which the chain has no predecessor worth streaming.
pub const DEFAULT_FIRST_STREAMABLE_BLOCK: u64 = 0;

/// Payload version stamped on every [`StreamBlock`].
pub const STREAM_PAYLOAD_VERSION: i32 = 1;

fn height_to_id(height: u64) -> String {
    hex::encode(height.to_be_bytes())
}

///
/// Protobuf name of a raw transaction type, `UNKNOWN(<value>)` for values outside of
/// [`TransactionType`].
///
pub fn transaction_type_name(value: i32) -> Cow<'static, str> {
    match TransactionType::try_from(value) {
        Ok(known) => Cow::Borrowed(known.as_str_name()),
        Err(_) => Cow::Owned(format!("UNKNOWN({value})")),
    }
}

impl Timestamp {
    pub fn from_datetime(time: DateTime<Utc>) -> Self {
        Self {
            seconds: time.timestamp(),
            nanos: time.timestamp_subsec_nanos() as i32,
        }
    }

    /// Returns `None` when the value is outside of the range `chrono` can represent.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let nanos = u32::try_from(self.nanos).ok()?;
        DateTime::from_timestamp(self.seconds, nanos)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::from_datetime(value)
    }
}

impl Transaction {
    pub fn id(&self) -> String {
        height_to_id(self.version)
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_ref().and_then(Timestamp::to_datetime)
    }

    pub fn type_name(&self) -> Cow<'static, str> {
        transaction_type_name(self.r#type)
    }

    ///
    /// Genesis and block metadata transactions open a block. Every block starts with exactly one
    /// of them and no other transaction of the block may be one.
    ///
    /// The raw value is checked, unknown types are never boundaries.
    ///
    pub fn is_block_start_boundary(&self) -> bool {
        matches!(
            TransactionType::try_from(self.r#type),
            Ok(TransactionType::Genesis | TransactionType::BlockMetadata)
        )
    }
}

impl Block {
    ///
    /// Block identifier, the big-endian encoding of the height rendered as hex.
    ///
    /// There is exactly one block per height so the height is a sufficient identity.
    ///
    pub fn id(&self) -> String {
        height_to_id(self.height)
    }

    pub fn number(&self) -> u64 {
        self.height
    }

    pub fn previous_num(&self, first_streamable: u64) -> u64 {
        if self.height <= first_streamable {
            return first_streamable;
        }
        self.height - 1
    }

    pub fn previous_id(&self, first_streamable: u64) -> String {
        height_to_id(self.previous_num(first_streamable))
    }

    ///
    /// Last irreversible block number as seen from this block.
    ///
    /// Without forks the block itself is final, but downstream consumers are not prepared for
    /// `lib_num == num` so the previous block is reported instead.
    ///
    pub fn lib_num(&self, first_streamable: u64) -> u64 {
        if self.height <= first_streamable {
            return self.height;
        }
        self.height - 1
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_ref().and_then(Timestamp::to_datetime)
    }

    pub fn block_ref(&self) -> BlockRef {
        BlockRef::new(self.height)
    }

    pub fn txn_len(&self) -> usize {
        self.transactions.len()
    }

    ///
    /// Wraps the block into the envelope understood by the block streaming pipeline.
    ///
    pub fn to_stream_block(&self, first_streamable: u64) -> StreamBlock {
        StreamBlock {
            id: self.id(),
            number: self.number(),
            previous_id: self.previous_id(first_streamable),
            previous_num: self.previous_num(first_streamable),
            timestamp: self.time(),
            lib_num: self.lib_num(first_streamable),
            payload_kind: PayloadKind::Unknown,
            payload_version: STREAM_PAYLOAD_VERSION,
            payload: self.encode_to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRef {
    pub num: u64,
}

impl BlockRef {
    pub fn new(num: u64) -> Self {
        Self { num }
    }

    pub fn id(&self) -> String {
        height_to_id(self.num)
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.num, self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Unknown,
}

///
/// Protocol agnostic envelope around an encoded [`Block`].
///
#[derive(Debug, Clone, PartialEq)]
pub struct StreamBlock {
    pub id: String,
    pub number: u64,
    pub previous_id: String,
    pub previous_num: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub lib_num: u64,
    pub payload_kind: PayloadKind,
    pub payload_version: i32,
    pub payload: Vec<u8>,
}

impl StreamBlock {
    pub fn decode_block(&self) -> Result<Block, prost::DecodeError> {
        Block::decode(self.payload.as_slice())
    }
}

///
/// Header announced by the node with `FIRE INIT` before any block.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    pub client_name: String,
    pub client_version: String,
    pub fork: String,
    pub major_version: u64,
    pub minor_version: u64,
    pub chain_id: u32,
}
