use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};
use time::Date;

/// A broker account, e.g. a TFSA or an RRSP.
#[derive(PartialEq, Eq, Clone, Serialize, Deserialize, Debug)]
pub struct Account {
    pub id: String,
    /// The broker's account type, e.g. `ca_tfsa`, used to select tagged ledger accounts.
    pub account_type: String,
    pub currency: String,
}

#[derive(PartialEq, Eq, Hash, Clone, Copy, Display, EnumString, IntoStaticStr, Serialize, Deserialize, Debug)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetKind {
    Currency,
    Equity,
    ExchangeTradedFund,
    MutualFund,
    Bond,
    Cryptocurrency,
}

#[derive(PartialEq, Eq, Clone, Serialize, Deserialize, Debug)]
pub struct Asset {
    pub symbol: String,
    pub kind: AssetKind,
}

impl Asset {
    pub fn is_currency(&self) -> bool {
        self.kind == AssetKind::Currency
    }
}

/// Holding of one asset in an account on a given date.  Numbers are as sent by the broker.
#[derive(PartialEq, Eq, Clone, Serialize, Deserialize, Debug)]
pub struct Position {
    pub account_id: String,
    pub asset: Asset,
    pub quantity: String,
    pub price_amount: String,
    pub price_currency: String,
    pub position_date: Date,
}

/// The closed set of transaction kinds the broker reports.
///
/// Only some of them can be mapped, see [TransactionKind::is_supported].
#[derive(PartialEq, Eq, Hash, Clone, Copy, Display, EnumString, IntoStaticStr, Serialize, Deserialize, Debug)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionKind {
    Buy,
    Sell,
    Dividend,
    Fee,
    Contribution,
    Deposit,
    Refund,
    NonResidentWithholdingTax,
    Withdrawal,
    PaymentTransferOut,
    TransferIn,
    TransferOut,
    CustodianFee,
    StockDistribution,
    ReturnOfCapital,
    Reimbursement,
    Hst,
}

impl TransactionKind {
    pub fn is_supported(&self) -> bool {
        use TransactionKind::*;

        matches!(
            self,
            Buy | Sell
                | Dividend
                | Fee
                | Contribution
                | Deposit
                | Refund
                | NonResidentWithholdingTax
        )
    }
}

/// A transaction as reported by the broker.  Numbers are as sent by the broker.
#[derive(PartialEq, Eq, Clone, Serialize, Deserialize, Debug)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub kind: TransactionKind,
    pub symbol: String,
    pub description: String,
    pub effective_date: Date,
    pub process_date: Date,
    pub net_cash_amount: String,
    pub net_cash_currency: String,
    pub market_price_amount: String,
    pub market_price_currency: String,
    pub market_value_currency: String,
    pub fx_rate: String,
    pub quantity: String,
}
