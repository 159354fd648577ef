//! Application layer: the scan-and-pay loop and the session runner.
//!
//! `ScanPayOrchestrator` owns the frame source and drives capture, detection,
//! payment and logging at a fixed tick rate. Session state lives in a separate
//! task fed by message passing over `tokio` channels.

pub mod debounce;
pub mod orchestrator;
pub mod session;
