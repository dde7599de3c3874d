//! The value-transfer primitive and a simulated backend.
//!
//! Moving value out of escrow is the only step of a marketplace operation
//! that can fail after its preconditions have been checked. Backends
//! implement [`ValueTransfer`]; the ledger decides what happens to its own
//! books when a transfer fails.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use hire_core::{Address, Amount};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{LedgerError, Result};

/// Unique transfer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferId(String);

impl TransferId {
    /// Create a new random transfer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("xfer-{}", Uuid::new_v4()))
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Proof that a transfer completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Transfer identifier.
    pub id: TransferId,
    /// Recipient.
    pub to: Address,
    /// Amount moved.
    pub amount: Amount,
    /// Completion time.
    pub at: DateTime<Utc>,
}

/// Moves value from the marketplace's custody to a participant.
pub trait ValueTransfer: Send + Sync {
    /// Pays `amount` to `to`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::TransferFailed` if the value could not be moved.
    /// A failed transfer must not have moved any value.
    fn transfer(&self, to: &Address, amount: Amount) -> Result<TransferReceipt>;
}

impl<T: ValueTransfer + ?Sized> ValueTransfer for std::sync::Arc<T> {
    fn transfer(&self, to: &Address, amount: Amount) -> Result<TransferReceipt> {
        (**self).transfer(to, amount)
    }
}

#[derive(Debug, Default)]
struct BankState {
    balances: HashMap<Address, Amount>,
    receipts: Vec<TransferReceipt>,
    rejected: HashSet<Address>,
    fail_next: bool,
}

/// Simulated transfer backend holding participant balances in memory.
///
/// Attached call values are withdrawn from the payer with
/// [`InMemoryBank::withdraw`]; payouts arrive through [`ValueTransfer`].
#[derive(Debug, Default)]
pub struct InMemoryBank {
    state: Mutex<BankState>,
}

impl InMemoryBank {
    /// Create an empty bank.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the balance of an address.
    #[must_use]
    pub fn balance(&self, address: &Address) -> Amount {
        self.state
            .lock()
            .balances
            .get(address)
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Credit an address from outside the marketplace.
    pub fn deposit(&self, address: &Address, amount: Amount) {
        let mut state = self.state.lock();
        let balance = state.balances.entry(*address).or_insert(Amount::ZERO);
        *balance = balance.saturating_add(amount);
        info!(address = %address, amount = %amount, "deposit completed");
    }

    /// Debit an address, e.g. for the value attached to a call.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InsufficientBalance` if the address holds less
    /// than `amount`.
    pub fn withdraw(&self, address: &Address, amount: Amount) -> Result<()> {
        let mut state = self.state.lock();
        let have = state.balances.get(address).copied().unwrap_or(Amount::ZERO);
        let remaining = have
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                address: *address,
                have,
                need: amount,
            })?;
        state.balances.insert(*address, remaining);
        debug!(address = %address, amount = %amount, "withdrawal completed");
        Ok(())
    }

    /// Make every future transfer to `address` fail.
    pub fn fail_transfers_to(&self, address: &Address) {
        self.state.lock().rejected.insert(*address);
    }

    /// Accept transfers to `address` again.
    pub fn accept_transfers_to(&self, address: &Address) {
        self.state.lock().rejected.remove(address);
    }

    /// Make the next transfer fail, whoever it is for.
    pub fn fail_next_transfer(&self) {
        self.state.lock().fail_next = true;
    }

    /// Completed transfers, oldest first.
    #[must_use]
    pub fn receipts(&self) -> Vec<TransferReceipt> {
        self.state.lock().receipts.clone()
    }
}

impl ValueTransfer for InMemoryBank {
    fn transfer(&self, to: &Address, amount: Amount) -> Result<TransferReceipt> {
        let mut state = self.state.lock();

        if std::mem::take(&mut state.fail_next) {
            return Err(LedgerError::transfer_failed(*to, amount, "injected failure"));
        }
        if state.rejected.contains(to) {
            return Err(LedgerError::transfer_failed(
                *to,
                amount,
                "recipient rejects transfers",
            ));
        }

        let balance = state.balances.entry(*to).or_insert(Amount::ZERO);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::transfer_failed(*to, amount, "recipient balance overflow"))?;

        let receipt = TransferReceipt {
            id: TransferId::new(),
            to: *to,
            amount,
            at: Utc::now(),
        };
        state.receipts.push(receipt.clone());

        debug!(to = %to, amount = %amount, id = %receipt.id, "transfer completed");
        Ok(receipt)
    }
}
