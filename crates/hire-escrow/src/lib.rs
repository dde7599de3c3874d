//! # hire-escrow
//!
//! Custody of job payments for the HireHub marketplace.
//!
//! This crate provides:
//! - The [`ValueTransfer`] primitive, the only fallible step of a payout
//! - [`InMemoryBank`], a simulated transfer backend with failure injection
//! - [`EscrowLedger`], which holds value per job and pays it out all-or-nothing
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hire_core::{Address, Amount, JobId};
//! use hire_escrow::{EscrowLedger, InMemoryBank};
//!
//! # fn example() -> hire_escrow::Result<()> {
//! let bank = Arc::new(InMemoryBank::new());
//! let mut ledger = EscrowLedger::new(Arc::clone(&bank));
//!
//! let job = JobId::new(0);
//! let employee = Address::random();
//! ledger.credit(job, Amount::new(100))?;
//! ledger.release(job, &employee)?;
//!
//! assert_eq!(bank.balance(&employee), Amount::new(100));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod ledger;
pub mod transfer;

pub use error::{LedgerError, Result};
pub use ledger::{EscrowLedger, LedgerTotals, Payout, PayoutKind};
pub use transfer::{InMemoryBank, TransferId, TransferReceipt, ValueTransfer};
