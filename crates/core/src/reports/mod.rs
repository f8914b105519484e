//! Ledger report generation.
//!
//! Pure assembly of report rows from accounts, balances, and entries:
//! - Trial Balance
//! - Day Book

pub mod service;
pub mod types;


pub use service::ReportService;
pub use types::*;
