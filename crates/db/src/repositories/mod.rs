//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod account;
pub mod balance;
pub mod journal;
pub mod membership;
pub mod voucher;

pub use account::{AccountError, AccountFilter, AccountRepository};
pub use balance::BalanceRepository;
pub use journal::{EntryFilter, JournalError, JournalRepository};
pub use membership::MembershipLedger;
pub use voucher::VoucherSequenceRepository;
