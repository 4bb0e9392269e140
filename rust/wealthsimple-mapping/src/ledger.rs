use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
};
use strum_macros::{Display, EnumString, IntoStaticStr};
use time::Date;

use super::MappingError;

/// Metadata on directives and postings, kept ordered so output is stable.
pub type Metadata = BTreeMap<String, String>;

/// The root of an account name, which determines its role in the ledger.
#[derive(
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Clone,
    Copy,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
    Debug,
)]
pub enum AccountType {
    Assets,
    Liabilities,
    Equity,
    Income,
    Expenses,
}

/// A colon-separated account name, validated on construction.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Serialize, Deserialize, Debug)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName {
    name: String,
    account_type: AccountType,
}

impl AccountName {
    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl TryFrom<&str> for AccountName {
    type Error = MappingError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let invalid = || MappingError::InvalidAccountName(value.to_string());

        let mut segments = value.split(':');
        let account_type = segments
            .next()
            .and_then(|root| root.parse::<AccountType>().ok())
            .ok_or_else(invalid)?;

        let mut subaccounts = 0;
        for segment in segments {
            if segment.is_empty() || segment.chars().any(char::is_whitespace) {
                return Err(invalid());
            }
            subaccounts += 1;
        }
        if subaccounts == 0 {
            return Err(invalid());
        }

        Ok(AccountName {
            name: value.to_string(),
            account_type,
        })
    }
}

impl TryFrom<String> for AccountName {
    type Error = MappingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AccountName::try_from(value.as_str())
    }
}

impl From<AccountName> for String {
    fn from(value: AccountName) -> Self {
        value.name
    }
}

impl Display for AccountName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An exact number of some commodity, with the number of decimal digits to show.
///
/// Equality and hashing ignore the precision, which is purely presentational,
/// so `10.5 ABC` and `10.50 ABC` are the same amount.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Amount {
    pub number: Decimal,
    pub commodity: String,
    pub precision: u32,
}

impl Amount {
    pub fn new(number: Decimal, commodity: impl Into<String>, precision: u32) -> Self {
        Amount {
            number,
            commodity: commodity.into(),
            precision,
        }
    }

    pub fn zero(commodity: impl Into<String>) -> Self {
        Amount::new(Decimal::ZERO, commodity, 0)
    }

    /// Sum of two amounts in the same commodity, `None` for different commodities or on overflow.
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        if self.commodity != other.commodity {
            return None;
        }

        self.number.checked_add(other.number).map(|number| Amount {
            number,
            commodity: self.commodity.clone(),
            precision: self.precision.max(other.precision),
        })
    }
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number && self.commodity == other.commodity
    }
}

impl Eq for Amount {}

impl Hash for Amount {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.number.hash(state);
        self.commodity.hash(state);
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.*} {}",
            self.precision as usize,
            self.number.round_dp(self.precision),
            &self.commodity
        )
    }
}

/// Cost basis of a lot.  All parts are optional, the empty cost `{}` being used when reducing.
#[derive(PartialEq, Eq, Clone, Default, Serialize, Deserialize, Debug)]
pub struct Cost {
    pub amount: Option<Amount>,
    pub date: Option<Date>,
    pub label: Option<String>,
}

impl Cost {
    pub fn per_unit(amount: Amount) -> Self {
        Cost {
            amount: Some(amount),
            ..Default::default()
        }
    }
}

impl Display for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::default();
        if let Some(amount) = &self.amount {
            parts.push(amount.to_string());
        }
        if let Some(date) = &self.date {
            parts.push(date.to_string());
        }
        if let Some(label) = &self.label {
            parts.push(format!("\"{label}\""));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

#[derive(PartialEq, Eq, Clone, Serialize, Deserialize, Debug)]
pub struct Posting {
    pub account: AccountName,
    pub amount: Amount,
    #[serde(default)]
    pub price: Option<Amount>,
    #[serde(default)]
    pub cost: Option<Cost>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Posting {
    pub fn new(account: AccountName, amount: Amount) -> Self {
        Posting {
            account,
            amount,
            price: None,
            cost: None,
            metadata: Metadata::default(),
        }
    }

    pub fn with_price(self, price: Option<Amount>) -> Self {
        Posting { price, ..self }
    }

    pub fn with_cost(self, cost: Cost) -> Self {
        Posting {
            cost: Some(cost),
            ..self
        }
    }

    /// The amount this posting contributes towards balancing its transaction.
    ///
    /// A cost with a number takes precedence over a price, which takes precedence over the units.
    pub fn weight(&self) -> Result<Amount, MappingError> {
        let per_unit = self
            .cost
            .as_ref()
            .and_then(|cost| cost.amount.as_ref())
            .or(self.price.as_ref());

        match per_unit {
            Some(per_unit) => {
                let number = self
                    .amount
                    .number
                    .checked_mul(per_unit.number)
                    .ok_or_else(|| {
                        MappingError::InvalidAmount(format!("{} * {}", &self.amount, per_unit))
                    })?;

                Ok(Amount::new(
                    number,
                    per_unit.commodity.clone(),
                    self.amount.precision.max(per_unit.precision),
                ))
            }
            None => Ok(self.amount.clone()),
        }
    }
}

impl Display for Posting {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "  {} {}", &self.account, &self.amount)?;
        if let Some(cost) = &self.cost {
            write!(f, " {cost}")?;
        }
        if let Some(price) = &self.price {
            write!(f, " @ {price}")?;
        }
        for (key, value) in &self.metadata {
            write!(f, "\n    {key}: \"{value}\"")?;
        }
        Ok(())
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize, Debug)]
pub enum Flag {
    #[default]
    #[serde(rename = "*")]
    Complete,
    #[serde(rename = "!")]
    Incomplete,
}

impl Display for Flag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use Flag::*;

        f.write_str(match self {
            Complete => "*",
            Incomplete => "!",
        })
    }
}

#[derive(PartialEq, Eq, Clone, Serialize, Deserialize, Debug)]
pub struct Transaction {
    pub date: Date,
    #[serde(default)]
    pub payee: String,
    #[serde(default)]
    pub narration: String,
    #[serde(default)]
    pub flag: Flag,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub postings: Vec<Posting>,
}

impl Transaction {
    /// The first posting on an account of the given type.
    pub fn posting_of_type(&self, account_type: AccountType) -> Option<&Posting> {
        self.postings
            .iter()
            .find(|posting| posting.account.account_type() == account_type)
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} \"{}\" \"{}\"",
            &self.date,
            &self.flag,
            escaped(&self.payee),
            escaped(&self.narration)
        )?;
        for tag in &self.tags {
            write!(f, " #{tag}")?;
        }
        for (key, value) in &self.metadata {
            write!(f, "\n  {key}: \"{}\"", escaped(value))?;
        }
        for posting in &self.postings {
            write!(f, "\n{posting}")?;
        }
        Ok(())
    }
}

fn escaped(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(PartialEq, Eq, Hash, Clone, Serialize, Deserialize, Debug)]
pub struct Price {
    pub date: Date,
    pub commodity: String,
    pub amount: Amount,
}

impl Display for Price {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} price {} {}",
            &self.date, &self.commodity, &self.amount
        )
    }
}

#[derive(PartialEq, Eq, Hash, Clone, Serialize, Deserialize, Debug)]
pub struct Balance {
    pub date: Date,
    pub account: AccountName,
    pub amount: Amount,
}

impl Display for Balance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} balance {} {}",
            &self.date, &self.account, &self.amount
        )
    }
}

/// An open account in the ledger, whose metadata may tag it for import.
#[derive(PartialEq, Eq, Clone, Serialize, Deserialize, Debug)]
pub struct LedgerAccount {
    pub name: AccountName,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A commodity declared in the ledger, whose metadata may tag it with a broker symbol.
#[derive(PartialEq, Eq, Clone, Serialize, Deserialize, Debug)]
pub struct Commodity {
    pub symbol: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Everything the mapping needs to know about an existing ledger.
#[derive(PartialEq, Eq, Clone, Default, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct LedgerSnapshot {
    pub accounts: Vec<LedgerAccount>,
    pub commodities: Vec<Commodity>,
    pub prices: Vec<Price>,
    pub balances: Vec<Balance>,
    pub transactions: Vec<Transaction>,
}
