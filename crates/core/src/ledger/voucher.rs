//! Voucher numbers: `<PREFIX>-<YEAR>-<NNN>`.
//!
//! The sequence is zero-padded to at least three digits and keeps growing past
//! 999 (`RCP-2025-1000`). Sequences are scoped by prefix and calendar year.

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use super::error::LedgerError;

/// Voucher number prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VoucherPrefix {
    /// Receipts.
    Rcp,
    /// Payments.
    Pay,
    /// Journals.
    Jrn,
    /// Any voucher type without its own prefix.
    Txn,
}

impl VoucherPrefix {
    /// Text form used in voucher numbers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rcp => "RCP",
            Self::Pay => "PAY",
            Self::Jrn => "JRN",
            Self::Txn => "TXN",
        }
    }

    /// Maps a voucher type code to its prefix; unmapped codes get `TXN`.
    #[must_use]
    pub fn for_type_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "RECEIPT" => Self::Rcp,
            "PAYMENT" => Self::Pay,
            "JOURNAL" => Self::Jrn,
            _ => Self::Txn,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "RCP" => Some(Self::Rcp),
            "PAY" => Some(Self::Pay),
            "JRN" => Some(Self::Jrn),
            "TXN" => Some(Self::Txn),
            _ => None,
        }
    }
}

impl std::fmt::Display for VoucherPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed voucher number. Orders by prefix, then year, then sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoucherNumber {
    prefix: VoucherPrefix,
    year: i32,
    sequence: u32,
}

impl VoucherNumber {
    /// Creates a voucher number.
    ///
    /// # Errors
    ///
    /// Returns `InvalidVoucherNumber` for a zero sequence or a year outside 1000..=9999.
    pub fn new(prefix: VoucherPrefix, year: i32, sequence: u32) -> Result<Self, LedgerError> {
        if sequence == 0 || !(1000..=9999).contains(&year) {
            return Err(LedgerError::InvalidVoucherNumber(format!(
                "{prefix}-{year}-{sequence:03}"
            )));
        }
        Ok(Self {
            prefix,
            year,
            sequence,
        })
    }

    /// First number for `prefix` in the year of `date`.
    pub fn first(prefix: VoucherPrefix, date: NaiveDate) -> Result<Self, LedgerError> {
        Self::new(prefix, date.year(), 1)
    }

    /// Prefix.
    #[must_use]
    pub const fn prefix(&self) -> VoucherPrefix {
        self.prefix
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Sequence within prefix and year.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// The following number in the same series.
    ///
    /// # Errors
    ///
    /// Returns `InvalidVoucherNumber` if the sequence would overflow.
    pub fn next(&self) -> Result<Self, LedgerError> {
        let sequence = self
            .sequence
            .checked_add(1)
            .ok_or_else(|| LedgerError::InvalidVoucherNumber(self.to_string()))?;
        Self::new(self.prefix, self.year, sequence)
    }

    /// Returns true if both numbers are in the same prefix/year series.
    #[must_use]
    pub fn same_series(&self, prefix: VoucherPrefix, year: i32) -> bool {
        self.prefix == prefix && self.year == year
    }
}

impl std::fmt::Display for VoucherNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:04}-{:03}", self.prefix, self.year, self.sequence)
    }
}

impl std::str::FromStr for VoucherNumber {
    type Err = LedgerError;

    /// Parses the canonical form only: `RCP-2025-1` and `RCP-2025-0001` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidVoucherNumber(s.to_string());
        let mut parts = s.split('-');
        let (Some(prefix), Some(year), Some(sequence), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !digits(year) || !digits(sequence) {
            return Err(invalid());
        }
        let prefix = VoucherPrefix::parse(prefix).ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let sequence: u32 = sequence.parse().map_err(|_| invalid())?;
        let number = Self::new(prefix, year, sequence).map_err(|_| invalid())?;
        if number.to_string() != s {
            return Err(invalid());
        }
        Ok(number)
    }
}

impl Serialize for VoucherNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Computes the next number in a series by scanning existing voucher numbers.
///
/// Numbers that do not parse or belong to another series are ignored, so the
/// result is one past the highest matching sequence (or 1 if none match).
pub fn next_from_existing<I, S>(
    prefix: VoucherPrefix,
    date: NaiveDate,
    existing: I,
) -> Result<VoucherNumber, LedgerError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let year = date.year();
    let highest = existing
        .into_iter()
        .filter_map(|raw| raw.as_ref().parse::<VoucherNumber>().ok())
        .filter(|number| number.same_series(prefix, year))
        .max_by_key(VoucherNumber::sequence);
    match highest {
        Some(number) => number.next(),
        None => VoucherNumber::first(prefix, date),
    }
}
