use super::money::{Amount, Balance};
use crate::error::ScanPayError;
use thiserror::Error;
use tokio::sync::Mutex;

/// Returned by [`Wallet::debit`] when the balance cannot cover the amount.
///
/// This is a business outcome, not a system fault.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("Insufficient funds: balance {balance}, requested {requested}")]
pub struct InsufficientFunds {
    pub balance: Balance,
    pub requested: Amount,
}

/// The customer's balance ledger.
///
/// The balance is the only mutable field and lives behind a single mutex, so the
/// `balance >= amount` check and the subtraction in [`Wallet::debit`] happen in
/// one critical section. Share it between tasks with `Arc<Wallet>`.
#[derive(Debug)]
pub struct Wallet {
    balance: Mutex<Balance>,
}

impl Wallet {
    /// Opens a wallet with a non-negative starting balance.
    pub fn new(initial: Balance) -> Result<Self, ScanPayError> {
        if initial < Balance::ZERO {
            return Err(ScanPayError::ValidationError(format!(
                "Initial balance must not be negative, got {}",
                initial
            )));
        }
        Ok(Self {
            balance: Mutex::new(initial),
        })
    }

    /// Takes `amount` from the balance, or leaves it untouched and reports why.
    ///
    /// Returns the balance after the debit.
    pub async fn debit(&self, amount: Amount) -> Result<Balance, InsufficientFunds> {
        let mut balance = self.balance.lock().await;
        if !balance.covers(amount) {
            return Err(InsufficientFunds {
                balance: *balance,
                requested: amount,
            });
        }
        *balance -= amount.into();
        Ok(*balance)
    }

    /// Adds `amount` to the balance and returns the new balance.
    pub async fn credit(&self, amount: Amount) -> Balance {
        let mut balance = self.balance.lock().await;
        *balance += amount.into();
        *balance
    }

    pub async fn balance(&self) -> Balance {
        *self.balance.lock().await
    }
}
