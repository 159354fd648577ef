/// One captured image buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub id: u64,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(id: u64, data: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            data: data.into(),
        }
    }
}

/// Result of a single pull from a frame source.
#[derive(Debug, Clone, PartialEq)]
pub enum FramePull {
    Frame(Frame),
    /// The source is alive but had nothing to hand out this time.
    Empty,
    /// The source has no more frames and never will (a finished recording).
    EndOfStream,
}

/// A code read from a frame. Lives only for the tick that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionEvent {
    pub raw_code: String,
    pub frame_id: u64,
}
