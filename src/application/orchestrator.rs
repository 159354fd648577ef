use super::debounce::Debouncer;
use crate::config::ScanPayConfig;
use crate::domain::catalog::{ProductCatalog, ProductRecord};
use crate::domain::frame::{Frame, FramePull};
use crate::domain::money::Balance;
use crate::domain::ports::{CodeDetectorBox, FrameSourceBox, TransactionLogRef};
use crate::domain::session::{ScanEvent, StopReason};
use crate::domain::transaction::{PendingTransaction, TransactionRecord};
use crate::domain::wallet::Wallet;
use crate::error::{Result, ScanPayError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Scanning,
}

/// A debit that went through on the wallet but never reached the log.
#[derive(Debug, Clone, PartialEq)]
pub struct UnrecordedDebit {
    pub pending: PendingTransaction,
    pub reason: String,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    NotScanning,
    /// Timeout, empty pull or read failure; counted towards the failure budget.
    FrameFailed,
    NoCode,
    Debounced { code: String },
    Unresolved { code: String },
    Paid(TransactionRecord),
    Declined { product: ProductRecord, balance: Balance },
    Unrecorded(UnrecordedDebit),
    Stopped(StopReason),
}

/// Stops a running [`ScanPayOrchestrator::run`] loop.
#[derive(Clone)]
pub struct ScannerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl ScannerHandle {
    /// Creates a handle and the receiver to pass to `run`.
    pub fn new() -> (Self, mpsc::Receiver<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        (Self { shutdown_tx }, shutdown_rx)
    }

    /// Asks the loop to stop after the tick in progress.
    pub async fn shutdown(&self) {
        // A closed channel means the loop has already returned.
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// The capture, detect, resolve, debit, log loop.
///
/// Owns the frame source and drives it at a fixed rate. Each tick acts on at
/// most one code (the first one the detector yields) and therefore makes at
/// most one debit attempt. The wallet and the log are shared with other
/// callers and are only touched through their own contracts.
pub struct ScanPayOrchestrator {
    source: FrameSourceBox,
    detector: CodeDetectorBox,
    catalog: Arc<ProductCatalog>,
    wallet: Arc<Wallet>,
    log: TransactionLogRef,
    events: Option<mpsc::UnboundedSender<ScanEvent>>,
    tick_interval: Duration,
    frame_timeout: Duration,
    max_failures: u32,
    phase: ScanPhase,
    tick: u64,
    consecutive_failures: u32,
    debouncer: Debouncer,
    unrecorded: Vec<UnrecordedDebit>,
}

impl ScanPayOrchestrator {
    pub fn new(
        source: FrameSourceBox,
        detector: CodeDetectorBox,
        catalog: Arc<ProductCatalog>,
        wallet: Arc<Wallet>,
        log: TransactionLogRef,
        config: &ScanPayConfig,
    ) -> Self {
        Self {
            source,
            detector,
            catalog,
            wallet,
            log,
            events: None,
            tick_interval: config.tick_interval(),
            frame_timeout: config.frame_timeout(),
            max_failures: config.max_consecutive_failures.max(1),
            phase: ScanPhase::Idle,
            tick: 0,
            consecutive_failures: 0,
            debouncer: Debouncer::new(config.debounce_ticks),
            unrecorded: Vec::new(),
        }
    }

    /// Returns a receiver for session events. Replaces any earlier subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ScanEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Debits still waiting to be written to the log.
    pub fn unrecorded(&self) -> &[UnrecordedDebit] {
        &self.unrecorded
    }

    fn emit(&self, event: ScanEvent) {
        if let Some(events) = &self.events
            && events.send(event).is_err()
        {
            debug!("Session listener has gone away");
        }
    }

    /// Opens the frame source and enters `Scanning`.
    ///
    /// If the device cannot be opened the orchestrator stays `Idle` and the
    /// error is both returned and published as `DeviceUnavailable`.
    pub async fn start(&mut self) -> Result<()> {
        if self.phase == ScanPhase::Scanning {
            return Ok(());
        }

        if let Err(e) = self.source.open().await {
            let reason = match e {
                ScanPayError::DeviceUnavailable(reason) => reason,
                other => other.to_string(),
            };
            warn!(reason = %reason, "Capture device unavailable");
            self.emit(ScanEvent::DeviceUnavailable {
                reason: reason.clone(),
            });
            return Err(ScanPayError::DeviceUnavailable(reason));
        }

        self.phase = ScanPhase::Scanning;
        self.consecutive_failures = 0;
        self.debouncer.reset();

        let balance = self.wallet.balance().await;
        info!(balance = %balance, "Scanning started");
        self.emit(ScanEvent::ScannerStarted { balance });
        Ok(())
    }

    /// Releases the frame source and returns to `Idle`.
    pub async fn stop(&mut self, reason: StopReason) {
        if self.phase == ScanPhase::Idle {
            return;
        }
        self.source.close().await;
        self.phase = ScanPhase::Idle;
        info!(?reason, "Scanning stopped");
        self.emit(ScanEvent::ScannerStopped { reason });
    }

    /// Runs one iteration: pull a frame, detect, resolve, debit, log.
    pub async fn tick(&mut self) -> TickOutcome {
        if self.phase != ScanPhase::Scanning {
            return TickOutcome::NotScanning;
        }
        self.tick += 1;

        let pulled = tokio::time::timeout(self.frame_timeout, self.source.next_frame()).await;
        let frame = match pulled {
            Ok(Ok(FramePull::Frame(frame))) => frame,
            Ok(Ok(FramePull::Empty)) | Err(_) => {
                return self.frame_failed(ScanPayError::FrameTimeout).await;
            }
            Ok(Ok(FramePull::EndOfStream)) => {
                self.stop(StopReason::EndOfStream).await;
                return TickOutcome::Stopped(StopReason::EndOfStream);
            }
            Ok(Err(e)) => return self.frame_failed(e).await,
        };
        self.consecutive_failures = 0;

        self.process_frame(&frame).await
    }

    async fn frame_failed(&mut self, error: ScanPayError) -> TickOutcome {
        self.consecutive_failures += 1;
        let failures = self.consecutive_failures;

        if failures >= self.max_failures {
            error!(failures, error = %error, "Frame source keeps failing, leaving scan mode");
            self.stop(StopReason::DeviceLost).await;
            return TickOutcome::Stopped(StopReason::DeviceLost);
        }
        if failures * 2 >= self.max_failures {
            warn!(failures, limit = self.max_failures, error = %error, "Frame pull failed");
        } else {
            debug!(failures, error = %error, "Frame pull failed");
        }
        TickOutcome::FrameFailed
    }

    async fn process_frame(&mut self, frame: &Frame) -> TickOutcome {
        let tick = self.tick;

        // First match wins. The rest of the frame is only used to keep a charged
        // code in view for the debouncer.
        let detection = {
            let mut detections = self.detector.detect(frame);
            let Some(first) = detections.next() else {
                return TickOutcome::NoCode;
            };
            for behind in detections {
                self.debouncer.seen(&behind.raw_code, tick);
            }
            first
        };
        let code = detection.raw_code;

        if self.debouncer.suppress(&code, tick) {
            debug!(code = %code, tick, "Ignoring repeat of charged code");
            return TickOutcome::Debounced { code };
        }

        let Some(product) = self.catalog.resolve(&code).cloned() else {
            info!(code = %code, frame = detection.frame_id, "Unrecognized code");
            self.emit(ScanEvent::CodeUnresolved { code: code.clone() });
            return TickOutcome::Unresolved { code };
        };

        let balance = match self.wallet.debit(product.price).await {
            Ok(balance) => balance,
            Err(declined) => {
                info!(
                    item = %product.name,
                    price = %product.price,
                    balance = %declined.balance,
                    "Payment declined"
                );
                self.emit(ScanEvent::PaymentDeclined {
                    product: product.clone(),
                    balance: declined.balance,
                });
                return TickOutcome::Declined {
                    product,
                    balance: declined.balance,
                };
            }
        };
        self.debouncer.charged(&code, tick);

        let pending = PendingTransaction::new(product.name.clone(), product.price);
        match self.log.append(pending.clone()).await {
            Ok(record) => {
                info!(
                    seq = record.sequence_no,
                    item = %record.item_name,
                    amount = %record.amount,
                    balance = %balance,
                    "Payment recorded"
                );
                self.emit(ScanEvent::PaymentAccepted {
                    record: record.clone(),
                    balance,
                });
                TickOutcome::Paid(record)
            }
            Err(e) => {
                let reason = e.to_string();
                error!(
                    item = %product.name,
                    amount = %product.price,
                    error = %reason,
                    "Wallet debited but transaction not recorded"
                );
                let unrecorded = UnrecordedDebit {
                    pending,
                    reason: reason.clone(),
                };
                self.unrecorded.push(unrecorded.clone());
                self.emit(ScanEvent::PaymentUnrecorded {
                    product,
                    balance,
                    reason,
                });
                TickOutcome::Unrecorded(unrecorded)
            }
        }
    }

    /// Writes pending unrecorded debits to the log, oldest first.
    ///
    /// Stops at the first failure; that entry and everything after it stay
    /// pending. Returns the records written by this call.
    pub async fn reconcile(&mut self) -> Vec<TransactionRecord> {
        let mut written = Vec::new();
        let mut pending = std::mem::take(&mut self.unrecorded).into_iter();

        while let Some(entry) = pending.next() {
            match self.log.append(entry.pending.clone()).await {
                Ok(record) => {
                    info!(seq = record.sequence_no, item = %record.item_name, "Reconciled debit");
                    written.push(record);
                }
                Err(e) => {
                    warn!(error = %e, "Reconciliation halted, log still unavailable");
                    self.unrecorded.push(UnrecordedDebit {
                        pending: entry.pending,
                        reason: e.to_string(),
                    });
                    self.unrecorded.extend(pending);
                    break;
                }
            }
        }
        written
    }

    /// Scans at the configured rate until asked to stop, the stream ends or
    /// the frame source keeps failing.
    ///
    /// Shutdown is honoured between ticks, so a debit and its log append are
    /// never cut in half. Dropping every `ScannerHandle` also stops the loop.
    pub async fn run(&mut self, mut shutdown: mpsc::Receiver<()>) -> Result<StopReason> {
        self.start().await?;

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    self.stop(StopReason::Requested).await;
                    return Ok(StopReason::Requested);
                }

                _ = interval.tick() => {
                    if let TickOutcome::Stopped(reason) = self.tick().await {
                        return Ok(reason);
                    }
                }
            }
        }
    }
}
