use {
    crate::{
        error::{OrderingViolation, ProtocolError},
        pb::{Block, Timestamp, Transaction},
    },
    std::time::Instant,
};

///
/// Block between its `BLOCK_START` and `BLOCK_END` lines.
///
#[derive(Debug)]
pub struct PendingBlock {
    pub height: u64,
    pub chain_id: u32,
    timestamp: Option<Timestamp>,
    transactions: Vec<Transaction>,
    started_at: Instant,
}

impl PendingBlock {
    pub fn new_with_clock(height: u64, chain_id: u32, clock: Instant) -> Self {
        Self {
            height,
            chain_id,
            timestamp: None,
            transactions: Vec::new(),
            started_at: clock,
        }
    }

    pub fn new(height: u64, chain_id: u32) -> Self {
        Self::new_with_clock(height, chain_id, Instant::now())
    }

    pub fn txn_len(&self) -> usize {
        self.transactions.len()
    }

    fn push(&mut self, transaction: Transaction) -> Result<(), OrderingViolation> {
        let is_boundary = transaction.is_block_start_boundary();
        if self.transactions.is_empty() {
            if !is_boundary {
                return Err(OrderingViolation::FirstNotBoundary(transaction.r#type));
            }
            // Every transaction of a block shares the timestamp of the first one
            self.timestamp = transaction.timestamp;
        } else if is_boundary {
            return Err(OrderingViolation::BoundaryNotFirst(transaction.r#type));
        }

        self.transactions.push(transaction);
        Ok(())
    }

    fn freeze(self) -> Block {
        Block {
            height: self.height,
            chain_id: self.chain_id,
            timestamp: self.timestamp,
            transactions: self.transactions,
        }
    }
}

///
/// A block that passed every `BLOCK_END` check.
///
#[derive(Debug)]
pub struct FinalizedBlock {
    pub block: Block,
    pub started_at: Instant,
}

///
/// Owns the single [`PendingBlock`] and enforces the transaction ordering rules while it fills up.
///
#[derive(Debug, Default)]
pub struct BlockAssembler {
    pending: Option<PendingBlock>,
}

impl BlockAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Starts a new pending block, returning the one it replaces if any.
    ///
    pub fn start(&mut self, block: PendingBlock) -> Option<PendingBlock> {
        self.pending.replace(block)
    }

    pub fn pending(&self) -> Option<&PendingBlock> {
        self.pending.as_ref()
    }

    pub fn is_accumulating(&self) -> bool {
        self.pending.is_some()
    }

    pub fn discard(&mut self) -> Option<PendingBlock> {
        self.pending.take()
    }

    pub fn append(&mut self, transaction: Transaction) -> Result<(), ProtocolError> {
        let Some(pending) = self.pending.as_mut() else {
            return Err(ProtocolError::NoActiveBlock {
                event: crate::tokenizer::LOG_TRX,
            });
        };
        pending.push(transaction)?;
        Ok(())
    }

    ///
    /// Closes the pending block at `height`.
    ///
    /// On error the pending block is left untouched.
    ///
    pub fn finalize(&mut self, height: u64) -> Result<FinalizedBlock, ProtocolError> {
        let Some(pending) = self.pending.as_ref() else {
            return Err(ProtocolError::NoActiveBlock {
                event: crate::tokenizer::LOG_BLOCK_END,
            });
        };

        if pending.height != height {
            return Err(ProtocolError::HeightMismatch {
                active: pending.height,
                received: height,
            });
        }

        if pending.transactions.is_empty() {
            return Err(ProtocolError::EmptyBlock {
                height: pending.height,
            });
        }

        let pending = self
            .pending
            .take()
            .ok_or(ProtocolError::NoActiveBlock {
                event: crate::tokenizer::LOG_BLOCK_END,
            })?;
        let started_at = pending.started_at;
        Ok(FinalizedBlock {
            block: pending.freeze(),
            started_at,
        })
    }
}
