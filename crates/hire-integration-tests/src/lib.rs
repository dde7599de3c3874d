//! Integration test crate for the HireHub marketplace.
//!
//! This crate exists solely to run integration tests that span the core,
//! escrow and market crates. It has no public API - all functionality is in
//! the test modules.

#![forbid(unsafe_code)]
