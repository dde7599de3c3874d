//! # hire-market
//!
//! The HireHub hiring marketplace: employers post jobs with an escrowed
//! payment, employees apply and deliver work, and both sides rate each other
//! once the job is done.
//!
//! This crate provides:
//!
//! - [`JobRegistry`] - the job lifecycle state machine
//! - [`RatingRegistry`], [`ReviewRegistry`] and [`ResumeRegistry`]
//! - [`IdentityGate`] - caller authorization checks
//! - [`EventLog`] and [`EventSink`] - the committed event stream
//! - [`JobHistory`] - per-job state rebuilt from the event stream
//! - [`Marketplace`] - the facade that serializes every operation
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::Utc;
//! use hire_core::{Address, Amount, Role};
//! use hire_escrow::InMemoryBank;
//! use hire_market::Marketplace;
//!
//! # fn example() -> hire_market::Result<()> {
//! let bank = Arc::new(InMemoryBank::new());
//! let market = Marketplace::new(Arc::clone(&bank));
//! let employer = Address::random();
//! let employee = Address::random();
//!
//! let job = market.create_job(&employer, Utc::now(), "Port the parser", "rust", Amount::new(100))?;
//! market.apply_for_job(&employee, job)?;
//! market.assign_job(&employer, job, &employee)?;
//! market.ask_to_review_job(&employee, job, "https://example.org/pr/1")?;
//! market.complete_job(&employer, job)?;
//! market.create_rating(&employer, job, 5, "great work", Role::Employee, &employee)?;
//!
//! assert_eq!(bank.balance(&employee), Amount::new(100));
//! assert_eq!(market.karma(&employee), 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod events;
pub mod gate;
pub mod history;
pub mod job;
pub mod marketplace;
pub mod rating;
pub mod resume;
pub mod review;

pub use config::{ApplicationPolicy, CONFIG_ENV, MarketConfig};
pub use error::{ErrorKind, MarketError, Result};
pub use events::{EventLog, EventRecord, EventSink, MarketEvent, NoopEventSink, TracingEventSink};
pub use gate::IdentityGate;
pub use history::{JobHistory, JobSnapshot};
pub use job::{ApplyOutcome, Job, JobRegistry, JobStatus, NewJob};
pub use marketplace::{Marketplace, MarketplaceBuilder};
pub use rating::{NewRating, Rating, RatingFilter, RatingKind, RatingRegistry};
pub use resume::{Resume, ResumeRegistry};
pub use review::{Review, ReviewRegistry};
