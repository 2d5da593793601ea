//! Fire Block Machine
//!
//! This crate turns the Firehose instrumentation output of a node process into blocks.
//!
//! An instrumented node prints, interleaved with its regular logs, lines starting with the `FIRE`
//! marker. Those lines describe, in order, the stream header and then every block the node
//! executed, one transaction at a time. The block machine reads that line stream and emits a
//! [`pb::Block`] each time a block is complete and valid.
//!
//! # Protocol
//!
//! ```text
//! FIRE INIT <client_name> <client_version> <fork> <major> <minor> <chain_id>
//! FIRE BLOCK_START <height>
//! FIRE TRX <base64 protobuf encoded transaction>
//! FIRE TRX <base64 protobuf encoded transaction>
//! FIRE BLOCK_END <height>
//! ```
//!
//! - `INIT` comes exactly once, before anything else. Protocol lines read before it are skipped
//!   with a warning. Only major version `0` is understood. The chain id can also be given as a
//!   named param: `... <minor> chain_id <chain_id>`.
//! - `BLOCK_START` opens a block. Receiving one while a block is open drops the open block, the
//!   node restarted its execution.
//! - `TRX` appends a transaction. The first transaction of a block must be a block start boundary
//!   (`GENESIS` or `BLOCK_METADATA`), any other must not be. The block timestamp is the one of its
//!   first transaction.
//! - `BLOCK_END` closes the block. Its height must match the open block and the block must hold at
//!   least one transaction.
//!
//! Everything else is node output, ignored by the block machine. Unknown `FIRE` tags are skipped.
//! Any other violation is fatal: the read fails with a [`error::ReaderError`] carrying the exact
//! line that caused it, and no retry is attempted.
//!
//! # Layers
//!
//! - [`tokenizer`]: splits a line into a [`tokenizer::ProtocolEvent`].
//! - [`assembler`]: owns the open block and enforces transaction ordering.
//! - [`state_machine`]: sans-IO [`state_machine::ConsoleReaderSM`], one line in, maybe one block
//!   out.
//! - [`stats`]: lock-free counters and the periodic statistics reporter.
//! - [`reader`]: async [`reader::ConsoleReader`] over a bounded line queue, plus a driver pushing
//!   blocks into any [`futures_util::Sink`].
//!
//! # Example
//!
//! ```ignore
//! let (tx, rx) = line_channel(config.line_buffer_capacity);
//! tokio::spawn(pump_lines(BufReader::new(child_stdout), tx));
//!
//! let reader = ConsoleReader::new(rx, Arc::new(TracingLogger), &config);
//! let mut blocks = spawn_block_stream(reader, config.output_channel_capacity, Vec::new());
//! while let Some(result) = blocks.recv().await {
//!     match result {
//!         Ok(block) => println!("block {} with {} trxs", block.block_ref(), block.txn_len()),
//!         Err(e) => {
//!             eprintln!("{e}");
//!             break;
//!         }
//!     }
//! }
//! ```
//!
//! # Building your own driver
//!
//! [`state_machine::ConsoleReaderSM`] does no IO at all, feed it lines from wherever they come
//! from:
//!
//! ```ignore
//! let mut sm = ConsoleReaderSM::new(Arc::new(TracingLogger), Arc::new(ReaderStats::new()));
//! for line in lines {
//!     if let Some(block) = sm.process_line(&line)? {
//!         archive(block);
//!     }
//! }
//! ```
//!
pub mod assembler;
pub mod block;
pub mod config;
pub mod error;
pub mod logger;
pub mod pb;
pub mod reader;
pub mod state_machine;
pub mod stats;
#[cfg(test)]
pub mod testkit;
pub mod tokenizer;
