//! Per-job escrow accounting.
//!
//! The ledger holds the value attributed to each job and pays a job's entire
//! balance out in one step. It trusts its caller to have checked that the
//! job may be paid out; the job state machine is what prevents a second
//! release or refund of the same credit.

use std::collections::HashMap;

use hire_core::{Address, Amount, JobId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, Result};
use crate::transfer::{TransferReceipt, ValueTransfer};

/// Why value left escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutKind {
    /// Paid to the employee on completion.
    Release,
    /// Returned to the employer on cancellation.
    Refund,
}

/// A completed payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Job the value was held for.
    pub job_id: JobId,
    /// Recipient.
    pub to: Address,
    /// Amount paid out.
    pub amount: Amount,
    /// Release or refund.
    pub kind: PayoutKind,
    /// Backend receipt; `None` when the balance was zero and nothing moved.
    pub receipt: Option<TransferReceipt>,
}

/// Lifetime totals of value that entered and left escrow.
///
/// `credited == released + refunded + held` holds after every operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Total ever credited.
    pub credited: Amount,
    /// Total paid to employees.
    pub released: Amount,
    /// Total returned to employers.
    pub refunded: Amount,
}

/// Escrow accounts keyed by job.
#[derive(Debug)]
pub struct EscrowLedger<T> {
    transfer: T,
    accounts: HashMap<JobId, Amount>,
    totals: LedgerTotals,
}

impl<T: ValueTransfer> EscrowLedger<T> {
    /// Create an empty ledger paying out through `transfer`.
    #[must_use]
    pub fn new(transfer: T) -> Self {
        Self {
            transfer,
            accounts: HashMap::new(),
            totals: LedgerTotals::default(),
        }
    }

    /// Add value to a job's account, opening it if needed.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Overflow` if the balance would overflow.
    pub fn credit(&mut self, job_id: JobId, amount: Amount) -> Result<()> {
        let held = self.accounts.get(&job_id).copied().unwrap_or(Amount::ZERO);
        let updated = held.checked_add(amount).ok_or(LedgerError::Overflow {
            job_id,
            held,
            amount,
        })?;
        self.accounts.insert(job_id, updated);
        self.totals.credited = self.totals.credited.saturating_add(amount);

        debug!(job_id = %job_id, amount = %amount, held = %updated, "escrow credited");
        Ok(())
    }

    /// Pay the job's whole balance to the employee.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::UnknownJob` if no account exists, or
    /// `LedgerError::TransferFailed` if the transfer failed. On failure the
    /// balance is unchanged.
    pub fn release(&mut self, job_id: JobId, to: &Address) -> Result<Payout> {
        self.pay_out(job_id, to, PayoutKind::Release)
    }

    /// Return the job's whole balance to the employer.
    ///
    /// # Errors
    ///
    /// Same as [`EscrowLedger::release`].
    pub fn refund(&mut self, job_id: JobId, to: &Address) -> Result<Payout> {
        self.pay_out(job_id, to, PayoutKind::Refund)
    }

    fn pay_out(&mut self, job_id: JobId, to: &Address, kind: PayoutKind) -> Result<Payout> {
        let amount = self
            .accounts
            .get(&job_id)
            .copied()
            .ok_or(LedgerError::UnknownJob(job_id))?;

        let receipt = if amount.is_zero() {
            None
        } else {
            match self.transfer.transfer(to, amount) {
                Ok(receipt) => Some(receipt),
                Err(e) => {
                    warn!(job_id = %job_id, to = %to, amount = %amount, ?kind, error = %e, "escrow payout failed");
                    return Err(e);
                }
            }
        };

        self.accounts.insert(job_id, Amount::ZERO);
        match kind {
            PayoutKind::Release => {
                self.totals.released = self.totals.released.saturating_add(amount);
            }
            PayoutKind::Refund => {
                self.totals.refunded = self.totals.refunded.saturating_add(amount);
            }
        }

        info!(job_id = %job_id, to = %to, amount = %amount, ?kind, "escrow paid out");
        Ok(Payout {
            job_id,
            to: *to,
            amount,
            kind,
            receipt,
        })
    }

    /// Value currently held for a job.
    #[must_use]
    pub fn balance_of(&self, job_id: JobId) -> Amount {
        self.accounts.get(&job_id).copied().unwrap_or(Amount::ZERO)
    }

    /// Whether an account was ever opened for the job.
    #[must_use]
    pub fn has_account(&self, job_id: JobId) -> bool {
        self.accounts.contains_key(&job_id)
    }

    /// Value currently held across all jobs.
    #[must_use]
    pub fn total_held(&self) -> Amount {
        self.accounts
            .values()
            .fold(Amount::ZERO, |acc, v| acc.saturating_add(*v))
    }

    /// Lifetime totals.
    #[must_use]
    pub const fn totals(&self) -> LedgerTotals {
        self.totals
    }
}
