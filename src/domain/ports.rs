use super::frame::{DetectionEvent, Frame, FramePull};
use super::transaction::{PendingTransaction, TransactionRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Pull-based camera abstraction.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Acquires the device. Fails with `DeviceUnavailable` if it cannot be opened.
    async fn open(&mut self) -> Result<()>;
    /// Pulls the next frame. Callers bound the wait with their own timeout.
    async fn next_frame(&mut self) -> Result<FramePull>;
    /// Releases the device. Safe to call more than once.
    async fn close(&mut self);
}

/// Turns a frame into the codes visible in it.
///
/// Must be deterministic for identical frames and must never fail: an unreadable
/// frame simply yields no events.
pub trait CodeDetector: Send + Sync {
    fn detect<'a>(&'a self, frame: &'a Frame) -> Box<dyn Iterator<Item = DetectionEvent> + 'a>;
}

/// Append-only record of completed sales.
#[async_trait]
pub trait TransactionLog: Send + Sync {
    /// Assigns the next sequence number and commits the record. Once this returns
    /// `Ok` the record is durable.
    async fn append(&self, pending: PendingTransaction) -> Result<TransactionRecord>;
    /// Snapshot of every committed record in sequence order.
    async fn read_all(&self) -> Result<Vec<TransactionRecord>>;
}

pub type FrameSourceBox = Box<dyn FrameSource>;
pub type CodeDetectorBox = Box<dyn CodeDetector>;
pub type TransactionLogRef = Arc<dyn TransactionLog>;
