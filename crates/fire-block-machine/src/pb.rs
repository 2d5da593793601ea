//! Protobuf messages exchanged on the console log (`TRX` payloads) and handed
//! to the downstream block pipeline.
//!
//! These mirror the `sf.aptos.type.v1` definitions. Field tags are part of the
//! wire contract with the instrumented node and must never be renumbered.

#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Timestamp {
    /// Seconds since the Unix epoch.
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    /// Non-negative fraction of a second, `0..=999_999_999`.
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Block {
    #[prost(uint64, tag = "1")]
    pub height: u64,
    #[prost(uint32, tag = "2")]
    pub chain_id: u32,
    /// Timestamp of the first transaction of the block.
    #[prost(message, optional, tag = "3")]
    pub timestamp: ::core::option::Option<Timestamp>,
    #[prost(message, repeated, tag = "4")]
    pub transactions: ::prost::alloc::vec::Vec<Transaction>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Transaction {
    #[prost(message, optional, tag = "1")]
    pub timestamp: ::core::option::Option<Timestamp>,
    /// Globally increasing ledger version of the transaction.
    #[prost(uint64, tag = "2")]
    pub version: u64,
    #[prost(message, optional, tag = "3")]
    pub info: ::core::option::Option<TransactionInfo>,
    #[prost(uint64, tag = "4")]
    pub epoch: u64,
    #[prost(uint64, tag = "5")]
    pub block_height: u64,
    #[prost(enumeration = "TransactionType", tag = "6")]
    pub r#type: i32,
    #[prost(oneof = "transaction::TxnData", tags = "7, 8, 9, 10")]
    pub txn_data: ::core::option::Option<transaction::TxnData>,
}

/// Nested message and enum types in `Transaction`.
pub mod transaction {
    /// Type specific content, kept encoded since the reader never looks into it.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum TxnData {
        #[prost(bytes, tag = "7")]
        BlockMetadata(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes, tag = "8")]
        Genesis(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes, tag = "9")]
        StateCheckpoint(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes, tag = "10")]
        User(::prost::alloc::vec::Vec<u8>),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionInfo {
    #[prost(bytes = "vec", tag = "1")]
    pub hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub state_root_hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub event_root_hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, tag = "4")]
    pub gas_used: u64,
    #[prost(bool, tag = "5")]
    pub success: bool,
    #[prost(string, tag = "6")]
    pub vm_status: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "7")]
    pub accumulator_root_hash: ::prost::alloc::vec::Vec<u8>,
    /// Encoded write set changes.
    #[prost(bytes = "vec", repeated, tag = "8")]
    pub changes: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TransactionType {
    Genesis = 0,
    BlockMetadata = 1,
    StateCheckpoint = 2,
    User = 3,
}

impl TransactionType {
    /// Name of the variant as it appears in the protobuf definition.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            TransactionType::Genesis => "GENESIS",
            TransactionType::BlockMetadata => "BLOCK_METADATA",
            TransactionType::StateCheckpoint => "STATE_CHECKPOINT",
            TransactionType::User => "USER",
        }
    }

    pub fn from_str_name(value: &str) -> Option<Self> {
        match value {
            "GENESIS" => Some(Self::Genesis),
            "BLOCK_METADATA" => Some(Self::BlockMetadata),
            "STATE_CHECKPOINT" => Some(Self::StateCheckpoint),
            "USER" => Some(Self::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str_name())
    }
}
