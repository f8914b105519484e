//! Shared fixtures for repository tests.
//!
//! Each test gets a fresh in-memory SQLite database migrated with the real
//! `Migrator`. The pool holds a single connection so the in-memory database
//! lives as long as the pool and writers are serialized. Tests that need
//! overlapping transactions use `setup_file_backed` instead.

#![allow(dead_code)]

use std::path::Path;

use chrono::NaiveDate;
use mizan_core::ledger::{AccountType, FundTag, LedgerAccount, NewAccount};
use mizan_db::AccountRepository;
use mizan_db::migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

pub async fn setup() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Opens a pool of `connections` on a SQLite file under `dir`.
///
/// The caller keeps `dir` alive for as long as the pool is used.
pub async fn setup_file_backed(dir: &Path, connections: u32) -> DatabaseConnection {
    let url = format!("sqlite://{}?mode=rwc", dir.join("ledger.db").display());
    let mut options = ConnectOptions::new(url);
    options
        .max_connections(connections)
        .min_connections(connections)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open file-backed database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// A small mosque chart with one account per role the tests need.
pub struct TestChart {
    pub bank: LedgerAccount,
    pub cash: LedgerAccount,
    pub membership_fees: LedgerAccount,
    pub general_donations: LedgerAccount,
    pub zakat_fund: LedgerAccount,
    pub salary: LedgerAccount,
    pub relief: LedgerAccount,
}

pub async fn seed_chart(db: &DatabaseConnection) -> TestChart {
    let repo = AccountRepository::new(db.clone());
    let create = |input: NewAccount| {
        let repo = repo.clone();
        async move { repo.create(input).await.expect("Failed to create account") }
    };

    TestChart {
        bank: create(NewAccount::new("1001", "Bank", AccountType::Asset)).await,
        cash: create(NewAccount::new("1002", "Cash in Hand", AccountType::Asset)).await,
        membership_fees: create(
            NewAccount::new("4001", "Membership Fees", AccountType::Income)
                .with_fund_tag(FundTag::General),
        )
        .await,
        general_donations: create(
            NewAccount::new("4002", "General Donations", AccountType::Income)
                .with_fund_tag(FundTag::General),
        )
        .await,
        zakat_fund: create(
            NewAccount::new("4003", "Zakat Fund", AccountType::Income)
                .with_fund_tag(FundTag::Zakat),
        )
        .await,
        salary: create(
            NewAccount::new("5001", "Salary Expense", AccountType::Expense)
                .with_fund_tag(FundTag::General),
        )
        .await,
        relief: create(
            NewAccount::new("5003", "Relief Expense", AccountType::Expense)
                .with_fund_tag(FundTag::Zakat),
        )
        .await,
    }
}
