use std::{
    error::Error,
    fmt::{Debug, Display},
};

use super::AccountType;

/// Failure to map a single account's positions or transactions.
///
/// All of these are data or configuration problems, never transient, so retrying is pointless.
/// Each names the symbol, type or account involved so the ledger owner knows which tag to add.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum MappingError {
    MissingCommodity(String),
    MissingAssetAccount(String, String),
    MissingIncomeAccount(String, String),
    MissingExpenseAccount(String, String),
    UnsupportedTransactionType(String),
    UnexpectedDescription(String),
    AccountNotFound(String),
    InvalidAmount(String),
    InvalidAccountName(String),
    CrossAccountBatch { expected: String, found: String },
}

impl MappingError {
    pub(crate) fn missing_account(
        role: AccountType,
        symbol: impl Into<String>,
        account_type: impl Into<String>,
    ) -> Self {
        use AccountType::*;

        let (symbol, account_type) = (symbol.into(), account_type.into());
        match role {
            Income => MappingError::MissingIncomeAccount(symbol, account_type),
            Expenses => MappingError::MissingExpenseAccount(symbol, account_type),
            Assets | Liabilities | Equity => {
                MappingError::MissingAssetAccount(symbol, account_type)
            }
        }
    }
}

impl Display for MappingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use MappingError::*;

        match self {
            MissingCommodity(symbol) => write!(f, "no commodity tagged for symbol {symbol}"),
            MissingAssetAccount(symbol, account_type) => write!(
                f,
                "no asset account tagged for symbol {symbol} and account type {account_type}"
            ),
            MissingIncomeAccount(symbol, account_type) => write!(
                f,
                "no income account tagged for symbol {symbol} and account type {account_type}"
            ),
            MissingExpenseAccount(symbol, account_type) => write!(
                f,
                "no expense account tagged for symbol {symbol} and account type {account_type}"
            ),
            UnsupportedTransactionType(kind) => write!(f, "unsupported transaction type {kind}"),
            UnexpectedDescription(description) => {
                write!(f, "unexpected description \"{description}\"")
            }
            AccountNotFound(id) => write!(f, "account {id} not found"),
            InvalidAmount(text) => write!(f, "invalid amount \"{text}\""),
            InvalidAccountName(name) => write!(f, "invalid account name \"{name}\""),
            CrossAccountBatch { expected, found } => write!(
                f,
                "batch for account {expected} contains data for account {found}"
            ),
        }
    }
}

impl Error for MappingError {}

/// Problems with the metadata tagging found while indexing a ledger snapshot.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum TaggingIssue {
    DuplicateAccountTag {
        role: AccountType,
        account_type: String,
        symbol: String,
        accounts: (String, String),
    },
    DuplicateCommodityTag {
        id: String,
        commodities: (String, String),
    },
    IncompleteAccountTag {
        account: String,
        missing_key: String,
    },
    UnsupportedAccountRole(String),
}

impl Display for TaggingIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use TaggingIssue::*;

        match self {
            DuplicateAccountTag {
                role,
                account_type,
                symbol,
                accounts: (first, second),
            } => write!(
                f,
                "{role} accounts {first} and {second} are both tagged for symbol {symbol} and account type {account_type}"
            ),
            DuplicateCommodityTag {
                id,
                commodities: (first, second),
            } => write!(f, "commodities {first} and {second} are both tagged with id {id}"),
            IncompleteAccountTag {
                account,
                missing_key,
            } => write!(f, "account {account} is missing the {missing_key} tag"),
            UnsupportedAccountRole(account) => write!(
                f,
                "account {account} is tagged but is not an asset, income or expense account"
            ),
        }
    }
}

/// All tagging issues of a ledger snapshot, reported together rather than one at a time.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SnapshotError(pub Vec<TaggingIssue>);

impl Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} tagging issue(s) in ledger", self.0.len())?;
        for issue in &self.0 {
            write!(f, "\n  {issue}")?;
        }
        Ok(())
    }
}

impl Error for SnapshotError {}
