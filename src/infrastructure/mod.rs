//! Adapters implementing the domain ports.

pub mod in_memory;
pub mod jsonl;
pub mod payload_detector;
pub mod scripted;
