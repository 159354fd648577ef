//! What the till is currently showing, driven purely by messages.
//!
//! The scanner publishes [`ScanEvent`]s and the UI layer sends [`NavCommand`]s;
//! [`SessionMachine`] folds both into a [`SessionView`]. Nothing here performs I/O.

use super::catalog::ProductRecord;
use super::money::{Amount, Balance};
use super::transaction::TransactionRecord;
use serde::Serialize;

/// Why a scanning session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Requested,
    EndOfStream,
    DeviceLost,
}

/// Notifications emitted by the scanner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    ScannerStarted {
        balance: Balance,
    },
    ScannerStopped {
        reason: StopReason,
    },
    DeviceUnavailable {
        reason: String,
    },
    PaymentAccepted {
        record: TransactionRecord,
        balance: Balance,
    },
    PaymentDeclined {
        product: ProductRecord,
        balance: Balance,
    },
    CodeUnresolved {
        code: String,
    },
    /// The wallet was debited but the log write failed.
    PaymentUnrecorded {
        product: ProductRecord,
        balance: Balance,
        reason: String,
    },
}

/// Navigation requests from the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum NavCommand {
    OpenItemReview(ProductRecord),
    IncrementQuantity,
    DecrementQuantity,
    Close,
    DismissNotice,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Scanning,
    ItemReview(ProductRecord, u32),
}

/// The latest thing worth telling the customer.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Paid { item_name: String, amount: Amount },
    Declined { item_name: String, price: Amount },
    Unresolved { code: String },
    DeviceUnavailable { reason: String },
    Unrecorded { item_name: String, amount: Amount },
}

/// Everything the UI needs to draw the current screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub state: SessionState,
    pub balance: Balance,
    pub notice: Option<Notice>,
    pub scanner_active: bool,
}

#[derive(Debug, Clone)]
pub struct SessionMachine {
    view: SessionView,
}

impl SessionMachine {
    pub fn new(balance: Balance) -> Self {
        Self {
            view: SessionView {
                state: SessionState::Idle,
                balance,
                notice: None,
                scanner_active: false,
            },
        }
    }

    pub fn view(&self) -> &SessionView {
        &self.view
    }

    pub fn apply_event(&mut self, event: &ScanEvent) -> &SessionView {
        let view = &mut self.view;
        match event {
            ScanEvent::ScannerStarted { balance } => {
                view.scanner_active = true;
                view.balance = *balance;
                if view.state == SessionState::Idle {
                    view.state = SessionState::Scanning;
                }
            }
            ScanEvent::ScannerStopped { .. } => {
                view.scanner_active = false;
                if view.state == SessionState::Scanning {
                    view.state = SessionState::Idle;
                }
            }
            ScanEvent::DeviceUnavailable { reason } => {
                view.scanner_active = false;
                if view.state == SessionState::Scanning {
                    view.state = SessionState::Idle;
                }
                view.notice = Some(Notice::DeviceUnavailable {
                    reason: reason.clone(),
                });
            }
            ScanEvent::PaymentAccepted { record, balance } => {
                view.balance = *balance;
                view.notice = Some(Notice::Paid {
                    item_name: record.item_name.clone(),
                    amount: record.amount,
                });
            }
            ScanEvent::PaymentDeclined { product, balance } => {
                view.balance = *balance;
                view.notice = Some(Notice::Declined {
                    item_name: product.name.clone(),
                    price: product.price,
                });
            }
            ScanEvent::CodeUnresolved { code } => {
                view.notice = Some(Notice::Unresolved { code: code.clone() });
            }
            ScanEvent::PaymentUnrecorded {
                product, balance, ..
            } => {
                view.balance = *balance;
                view.notice = Some(Notice::Unrecorded {
                    item_name: product.name.clone(),
                    amount: product.price,
                });
            }
        }
        &self.view
    }

    pub fn apply_command(&mut self, command: NavCommand) -> &SessionView {
        let view = &mut self.view;
        match command {
            NavCommand::OpenItemReview(product) => {
                view.state = SessionState::ItemReview(product, 1);
            }
            NavCommand::IncrementQuantity => {
                if let SessionState::ItemReview(_, quantity) = &mut view.state {
                    *quantity = quantity.saturating_add(1);
                }
            }
            NavCommand::DecrementQuantity => {
                if let SessionState::ItemReview(_, quantity) = &mut view.state
                    && *quantity > 1
                {
                    *quantity -= 1;
                }
            }
            NavCommand::Close => {
                if matches!(view.state, SessionState::ItemReview(..)) {
                    view.state = if view.scanner_active {
                        SessionState::Scanning
                    } else {
                        SessionState::Idle
                    };
                }
            }
            NavCommand::DismissNotice => view.notice = None,
        }
        &self.view
    }
}
