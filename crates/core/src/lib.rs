//! Core business logic for Mizan.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Double-entry bookkeeping with fund restrictions
//! - `reports` - Trial balance and day book assembly
//! - `membership` - Membership payments recorded as receipts

pub mod ledger;
pub mod membership;
pub mod reports;
