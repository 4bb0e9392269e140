use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const ACCOUNT_TYPE_KEY: &str = "external-type";
pub const ACCOUNT_SYMBOL_KEY: &str = "external-symbol";
pub const COMMODITY_ID_KEY: &str = "external-id";
pub const TXNID_KEY: &str = "wealthsimple-id";
pub const NRWT_TXNID_KEY: &str = "wealthsimple-id-nrwt";
pub const RECORD_DATE_KEY: &str = "record-date";
pub const SHARES_KEY: &str = "shares";
pub const SYMBOL_KEY: &str = "symbol";

/// Symbol under which the expense account for rounding differences is tagged.
pub const ROUNDING_SYMBOL: &str = "rounding";

pub const DEFAULT_PAYEE: &str = "Wealthsimple";

pub fn default_tolerance() -> Decimal {
    Decimal::new(5, 3) // 0.005
}

/// Metadata keys linking ledger accounts, commodities and transactions to the broker.
#[derive(PartialEq, Eq, Clone, Serialize, Deserialize, Debug)]
#[serde(default, rename_all = "kebab-case")]
pub struct MetadataKeys {
    pub account_type: String,
    pub account_symbol: String,
    pub commodity_id: String,
    pub txnid: String,
    pub nrwt_txnid: String,
    pub record_date: String,
    pub shares: String,
    pub symbol: String,
}

impl Default for MetadataKeys {
    fn default() -> Self {
        MetadataKeys {
            account_type: ACCOUNT_TYPE_KEY.to_string(),
            account_symbol: ACCOUNT_SYMBOL_KEY.to_string(),
            commodity_id: COMMODITY_ID_KEY.to_string(),
            txnid: TXNID_KEY.to_string(),
            nrwt_txnid: NRWT_TXNID_KEY.to_string(),
            record_date: RECORD_DATE_KEY.to_string(),
            shares: SHARES_KEY.to_string(),
            symbol: SYMBOL_KEY.to_string(),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Serialize, Deserialize, Debug)]
#[serde(default, rename_all = "kebab-case")]
pub struct MappingOptions {
    pub keys: MetadataKeys,
    /// Largest per-commodity residual still considered balanced.
    pub tolerance: Decimal,
    /// Payee of fee transactions.
    pub payee: String,
}

impl Default for MappingOptions {
    fn default() -> Self {
        MappingOptions {
            keys: MetadataKeys::default(),
            tolerance: default_tolerance(),
            payee: DEFAULT_PAYEE.to_string(),
        }
    }
}
