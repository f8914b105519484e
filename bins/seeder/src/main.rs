//! Seeds the standard chart of accounts.
//!
//! Safe to run repeatedly: existing accounts are matched by code and left
//! untouched. Usage: cargo run --bin seeder

use std::collections::HashMap;

use mizan_core::ledger::{AccountMatcher, AccountType, FundTag, NewAccount};
use mizan_db::AccountRepository;
use mizan_shared::types::AccountId;
use mizan_shared::{AppConfig, AppError, AppResult};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A row of the standard chart.
struct Seed {
    code: &'static str,
    name: &'static str,
    account_type: AccountType,
    fund_tag: Option<FundTag>,
    parent: Option<&'static str>,
    system: bool,
}

const fn seed(
    code: &'static str,
    name: &'static str,
    account_type: AccountType,
    fund_tag: Option<FundTag>,
    parent: Option<&'static str>,
) -> Seed {
    Seed {
        code,
        name,
        account_type,
        fund_tag,
        parent,
        system: parent.is_none(),
    }
}

/// Parents come before their children.
const STANDARD_CHART: &[Seed] = &[
    seed("1000", "Current Assets", AccountType::Asset, None, None),
    seed("1001", "Bank", AccountType::Asset, None, Some("1000")),
    seed("1002", "Cash", AccountType::Asset, None, Some("1000")),
    seed("2000", "Liabilities", AccountType::Liability, None, None),
    seed("2001", "Amanat", AccountType::Liability, None, Some("2000")),
    seed("3000", "Corpus", AccountType::Equity, None, None),
    seed("4000", "Income", AccountType::Income, Some(FundTag::General), None),
    seed("4001", "Membership Fees", AccountType::Income, Some(FundTag::General), Some("4000")),
    seed("4002", "General Donations", AccountType::Income, Some(FundTag::General), Some("4000")),
    seed("4003", "Zakat Fund", AccountType::Income, Some(FundTag::Zakat), Some("4000")),
    seed("4004", "Sadaqah", AccountType::Income, Some(FundTag::Sadaqah), Some("4000")),
    seed(
        "4005",
        "Construction Fund",
        AccountType::Income,
        Some(FundTag::Construction),
        Some("4000"),
    ),
    seed("5000", "Expenses", AccountType::Expense, Some(FundTag::General), None),
    seed("5001", "Salaries", AccountType::Expense, Some(FundTag::General), Some("5000")),
    seed("5002", "Utilities", AccountType::Expense, Some(FundTag::General), Some("5000")),
    seed("5003", "Zakat Relief", AccountType::Expense, Some(FundTag::Zakat), Some("5000")),
    seed(
        "5004",
        "Construction Works",
        AccountType::Expense,
        Some(FundTag::Construction),
        Some("5000"),
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mizan=info,seeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load_with_dotenv()?;
    let db = mizan_db::connect_with(&config.database).await?;
    info!("Connected to database");

    let seeded = seed_chart(&AccountRepository::new(db), STANDARD_CHART).await?;
    info!(accounts = seeded, "Standard chart of accounts seeded");
    Ok(())
}

/// Resolves every row of `chart`, creating the missing ones.
///
/// Returns the number of rows resolved.
async fn seed_chart(accounts: &AccountRepository, chart: &[Seed]) -> AppResult<usize> {
    let mut ids: HashMap<&str, AccountId> = HashMap::new();
    for row in chart {
        let mut input = NewAccount::new(row.code, row.name, row.account_type);
        if let Some(tag) = row.fund_tag {
            input = input.with_fund_tag(tag);
        }
        if let Some(parent) = row.parent {
            let parent_id = ids.get(parent).ok_or_else(|| {
                let code = row.code;
                AppError::Internal(format!("account {code} listed before its parent {parent}"))
            })?;
            input = input.with_parent(*parent_id);
        }
        if row.system {
            input = input.system();
        }

        let matcher = AccountMatcher {
            code: row.code.to_string(),
            account_type: row.account_type,
        };
        let account = accounts.find_or_create(&matcher, input).await?;
        ids.insert(row.code, account.id);
    }
    Ok(ids.len())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_standard_chart_lists_parents_first() {
        let mut seen = HashSet::new();
        for row in STANDARD_CHART {
            if let Some(parent) = row.parent {
                assert!(seen.contains(parent), "{} precedes its parent {parent}", row.code);
            }
            assert!(seen.insert(row.code), "duplicate code {}", row.code);
        }
    }
}
