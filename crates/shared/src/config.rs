//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger posting rules.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// How far fund restrictions are traced when validating an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundTracing {
    /// Only credits and expense debits inside the entry being posted are compared.
    #[default]
    SameEntry,
    /// Restricted money is followed through asset accounts across committed entries.
    CrossEntry,
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Fund tags whose money may only pay expenses carrying the same tag.
    #[serde(default = "default_exclusive_funds")]
    pub exclusive_funds: Vec<String>,
    /// Receipts above this total must carry the donor's PAN. `"none"` disables the check.
    #[serde(default = "default_pan_required_above", deserialize_with = "deserialize_threshold")]
    pub pan_required_above: Option<Decimal>,
    /// Fund restriction tracing scope.
    #[serde(default)]
    pub fund_tracing: FundTracing,
    /// Codes of the accounts the membership integration posts against.
    #[serde(default)]
    pub well_known_codes: WellKnownCodes,
}

fn default_exclusive_funds() -> Vec<String> {
    vec!["ZAKAT".to_string()]
}

#[allow(clippy::unnecessary_wraps)]
fn default_pan_required_above() -> Option<Decimal> {
    Some(Decimal::new(2000, 0))
}

/// Accepts an amount, or `"none"`/`"off"` for no threshold.
fn deserialize_threshold<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Threshold {
        Amount(Decimal),
        Keyword(String),
    }

    match Threshold::deserialize(deserializer)? {
        Threshold::Amount(amount) => Ok(Some(amount)),
        Threshold::Keyword(word)
            if word.eq_ignore_ascii_case("none") || word.eq_ignore_ascii_case("off") =>
        {
            Ok(None)
        }
        Threshold::Keyword(word) => Err(serde::de::Error::custom(format!(
            "invalid pan_required_above: {word}"
        ))),
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            exclusive_funds: default_exclusive_funds(),
            pan_required_above: default_pan_required_above(),
            fund_tracing: FundTracing::default(),
            well_known_codes: WellKnownCodes::default(),
        }
    }
}

/// Account codes for the well-known accounts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WellKnownCodes {
    /// Default bank account receiving online payments.
    #[serde(default = "default_bank_code")]
    pub bank: String,
    /// Income account for membership subscriptions.
    #[serde(default = "default_membership_fees_code")]
    pub membership_fees: String,
    /// Income account for voluntary donations.
    #[serde(default = "default_general_donations_code")]
    pub general_donations: String,
}

fn default_bank_code() -> String {
    "1001".to_string()
}

fn default_membership_fees_code() -> String {
    "4001".to_string()
}

fn default_general_donations_code() -> String {
    "4002".to_string()
}

impl Default for WellKnownCodes {
    fn default() -> Self {
        Self {
            bank: default_bank_code(),
            membership_fees: default_membership_fees_code(),
            general_donations: default_general_donations_code(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones: `config/default.toml`,
    /// `config/{RUN_MODE}.toml`, then `MIZAN__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("MIZAN")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("ledger.exclusive_funds")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Loads configuration after reading a `.env` file if one is present.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load_with_dotenv() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        Self::load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ledger_defaults() {
        let ledger = LedgerConfig::default();
        assert_eq!(ledger.exclusive_funds, vec!["ZAKAT".to_string()]);
        assert_eq!(ledger.pan_required_above, Some(dec!(2000)));
        assert_eq!(ledger.fund_tracing, FundTracing::SameEntry);
        assert_eq!(ledger.well_known_codes.bank, "1001");
        assert_eq!(ledger.well_known_codes.membership_fees, "4001");
        assert_eq!(ledger.well_known_codes.general_donations, "4002");
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("test-env-only")),
                ("MIZAN__DATABASE__URL", Some("sqlite::memory:")),
                ("MIZAN__DATABASE__MAX_CONNECTIONS", Some("3")),
                ("MIZAN__LEDGER__FUND_TRACING", Some("cross_entry")),
                ("MIZAN__LEDGER__EXCLUSIVE_FUNDS", Some("ZAKAT,SADAQAH")),
                ("MIZAN__LEDGER__PAN_REQUIRED_ABOVE", Some("none")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "sqlite::memory:");
                assert_eq!(config.database.max_connections, 3);
                assert_eq!(config.database.min_connections, 1);
                assert_eq!(config.ledger.fund_tracing, FundTracing::CrossEntry);
                assert_eq!(
                    config.ledger.exclusive_funds,
                    vec!["ZAKAT".to_string(), "SADAQAH".to_string()]
                );
                assert_eq!(config.ledger.pan_required_above, None);
            },
        );
    }

    #[test]
    fn test_load_requires_database_url() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("test-env-only")),
                ("MIZAN__DATABASE__URL", None::<&str>),
            ],
            || {
                // config/default.toml may supply a url when run from the workspace root
                if std::path::Path::new("config/default.toml").exists() {
                    return;
                }
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
