//! `fire-reader`: reads the Firehose console output of a node and prints the blocks it contains.
//!
//! The protocol work happens in [`fire_block_machine`], this crate adds what is needed around it to
//! run against a real node: settings, node log forwarding and output rendering.
pub mod node_log;
pub mod output;
pub mod settings;
