use {
    base64::{Engine, engine::general_purpose::STANDARD},
    fire_block_machine::pb::{
        Block, Timestamp, Transaction, TransactionInfo, transaction::TxnData,
    },
    prost::Message,
    serde::Serialize,
};

fn rfc3339(timestamp: Option<&Timestamp>) -> Option<String> {
    timestamp
        .and_then(Timestamp::to_datetime)
        .map(|time| time.to_rfc3339())
}

///
/// One line of `fire-reader read` output.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    pub height: u64,
    pub id: String,
    pub previous_id: String,
    pub timestamp: Option<String>,
    pub trx_count: usize,
    pub lib_num: u64,
}

impl BlockSummary {
    pub fn new(block: &Block, first_streamable_block: u64) -> Self {
        let stream_block = block.to_stream_block(first_streamable_block);
        Self {
            height: stream_block.number,
            id: stream_block.id,
            previous_id: stream_block.previous_id,
            timestamp: stream_block.timestamp.map(|time| time.to_rfc3339()),
            trx_count: block.txn_len(),
            lib_num: stream_block.lib_num,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeTrxError {
    #[error("invalid base64 standard with padding transaction's input: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid transaction's bytes: {0}")]
    Proto(#[from] prost::DecodeError),
}

pub fn decode_transaction(input: &str) -> Result<Transaction, DecodeTrxError> {
    let bytes = STANDARD.decode(input)?;
    Ok(Transaction::decode(bytes.as_slice())?)
}

///
/// JSON rendering of a [`Transaction`], bytes are base64 encoded.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionView {
    pub id: String,
    pub version: u64,
    pub r#type: String,
    pub timestamp: Option<String>,
    pub epoch: u64,
    pub block_height: u64,
    pub info: Option<TransactionInfoView>,
    pub txn_data: Option<TxnDataView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionInfoView {
    pub hash: String,
    pub state_root_hash: String,
    pub event_root_hash: String,
    pub gas_used: u64,
    pub success: bool,
    pub vm_status: String,
    pub accumulator_root_hash: String,
    pub changes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxnDataView {
    pub kind: &'static str,
    pub data: String,
}

impl From<&TransactionInfo> for TransactionInfoView {
    fn from(info: &TransactionInfo) -> Self {
        Self {
            hash: STANDARD.encode(&info.hash),
            state_root_hash: STANDARD.encode(&info.state_root_hash),
            event_root_hash: STANDARD.encode(&info.event_root_hash),
            gas_used: info.gas_used,
            success: info.success,
            vm_status: info.vm_status.clone(),
            accumulator_root_hash: STANDARD.encode(&info.accumulator_root_hash),
            changes: info.changes.iter().map(|c| STANDARD.encode(c)).collect(),
        }
    }
}

impl From<&TxnData> for TxnDataView {
    fn from(data: &TxnData) -> Self {
        let (kind, bytes) = match data {
            TxnData::BlockMetadata(bytes) => ("block_metadata", bytes),
            TxnData::Genesis(bytes) => ("genesis", bytes),
            TxnData::StateCheckpoint(bytes) => ("state_checkpoint", bytes),
            TxnData::User(bytes) => ("user", bytes),
        };
        Self {
            kind,
            data: STANDARD.encode(bytes),
        }
    }
}

impl From<&Transaction> for TransactionView {
    fn from(trx: &Transaction) -> Self {
        Self {
            id: trx.id(),
            version: trx.version,
            r#type: trx.type_name().into_owned(),
            timestamp: rfc3339(trx.timestamp.as_ref()),
            epoch: trx.epoch,
            block_height: trx.block_height,
            info: trx.info.as_ref().map(TransactionInfoView::from),
            txn_data: trx.txn_data.as_ref().map(TxnDataView::from),
        }
    }
}
