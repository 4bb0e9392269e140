use hashbrown::{HashMap, HashSet};
use rust_decimal::Decimal;
use time::Date;

use super::{
    broker, AccountName, AccountType, Amount, Balance, LedgerAccount, LedgerSnapshot,
    MappingError, MappingOptions, MetadataKeys, Price, SnapshotError, TaggingIssue, Transaction,
};

pub trait Tolerance {
    /// compute residual, ignoring sums which are tolerably small
    fn residual(
        &self,
        values: impl Iterator<Item = Decimal>,
        commodity: &str,
    ) -> Result<Option<Decimal>, MappingError>;
}

/// The same tolerance for every commodity.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct FixedTolerance(pub Decimal);

impl Tolerance for FixedTolerance {
    fn residual(
        &self,
        mut values: impl Iterator<Item = Decimal>,
        commodity: &str,
    ) -> Result<Option<Decimal>, MappingError> {
        let sum = values
            .try_fold(Decimal::ZERO, |sum, value| sum.checked_add(value))
            .ok_or_else(|| MappingError::InvalidAmount(format!("sum of {commodity} overflowed")))?;

        if sum.abs() > self.0 {
            tracing::trace!("residual {sum} {commodity} exceeds tolerance {}", self.0);
            Ok(Some(sum))
        } else {
            Ok(None)
        }
    }
}

// role, broker account type, symbol
type AccountKey = (AccountType, String, String);

// date, account, commodity
type BalanceKey = (Date, AccountName, String);

fn balance_key(balance: &Balance) -> BalanceKey {
    (
        balance.date,
        balance.account.clone(),
        balance.amount.commodity.clone(),
    )
}

/// Index over a ledger snapshot, built once and then only read while mapping.
#[derive(Debug)]
pub struct LedgerLookup {
    options: MappingOptions,
    tolerance: FixedTolerance,
    accounts: HashMap<AccountKey, AccountName>,
    commodities: HashMap<String, String>,
    prices: HashSet<Price>,
    balances: HashMap<BalanceKey, Vec<Amount>>,
    txnids: HashSet<String>,
}

impl LedgerLookup {
    /// Index the snapshot, failing with every tagging problem found if there are any.
    pub fn new(snapshot: &LedgerSnapshot, options: &MappingOptions) -> Result<Self, SnapshotError> {
        let mut builder = LookupBuilder::new(&options.keys);

        for account in &snapshot.accounts {
            builder.account(account);
        }
        for commodity in &snapshot.commodities {
            builder.commodity(&commodity.symbol, commodity.metadata.get(&options.keys.commodity_id));
        }
        for transaction in &snapshot.transactions {
            builder.transaction(transaction);
        }

        let LookupBuilder {
            accounts,
            commodities,
            txnids,
            issues,
            ..
        } = builder;

        if !issues.is_empty() {
            return Err(SnapshotError(issues));
        }

        let mut balances = HashMap::<BalanceKey, Vec<Amount>>::default();
        for balance in &snapshot.balances {
            balances
                .entry(balance_key(balance))
                .or_default()
                .push(balance.amount.clone());
        }

        tracing::debug!(
            "indexed {} tagged accounts, {} commodities, {} transaction ids",
            accounts.len(),
            commodities.len(),
            txnids.len()
        );

        Ok(LedgerLookup {
            options: options.clone(),
            tolerance: FixedTolerance(options.tolerance),
            accounts,
            commodities,
            prices: snapshot.prices.iter().cloned().collect(),
            balances,
            txnids,
        })
    }

    pub fn options(&self) -> &MappingOptions {
        &self.options
    }

    pub fn keys(&self) -> &MetadataKeys {
        &self.options.keys
    }

    /// The ledger commodity for an asset, currencies being used as they are.
    pub fn ledger_symbol(&self, asset: &broker::Asset) -> Result<String, MappingError> {
        if asset.is_currency() {
            Ok(asset.symbol.clone())
        } else {
            self.ledger_symbol_for(&asset.symbol)
        }
    }

    /// The ledger commodity tagged with the broker symbol.
    pub fn ledger_symbol_for(&self, symbol: &str) -> Result<String, MappingError> {
        self.commodities
            .get(symbol)
            .cloned()
            .ok_or_else(|| MappingError::MissingCommodity(symbol.to_string()))
    }

    /// The ledger account of the given role tagged for the broker account's type and the symbol,
    /// which defaults to the account's currency.
    pub fn ledger_account_name(
        &self,
        account: &broker::Account,
        role: AccountType,
        symbol: Option<&str>,
    ) -> Result<AccountName, MappingError> {
        let symbol = symbol.unwrap_or(&account.currency);
        self.accounts
            .get(&(role, account.account_type.clone(), symbol.to_string()))
            .cloned()
            .ok_or_else(|| MappingError::missing_account(role, symbol, &account.account_type))
    }

    /// Every broker account without a tagged cash account, reported in one go.
    pub fn missing_cash_accounts(&self, accounts: &[broker::Account]) -> Vec<MappingError> {
        accounts
            .iter()
            .filter_map(|account| {
                self.ledger_account_name(account, AccountType::Assets, None)
                    .err()
            })
            .collect()
    }

    pub fn price_exists(&self, price: &Price) -> bool {
        self.prices.contains(price)
    }

    /// Whether any balance in the ledger for the same date, account and commodity has this amount.
    pub fn balance_exists(&self, balance: &Balance) -> bool {
        self.balances
            .get(&balance_key(balance))
            .is_some_and(|existing| existing.contains(&balance.amount))
    }

    /// An existing balance for the same date, account and commodity, when none has this amount.
    pub fn conflicting_balance(&self, balance: &Balance) -> Option<&Amount> {
        self.balances
            .get(&balance_key(balance))
            .filter(|existing| !existing.contains(&balance.amount))
            .and_then(|existing| existing.first())
    }

    /// Whether a transaction carrying the same broker id is already in the ledger.
    pub fn transaction_exists(&self, transaction: &Transaction) -> bool {
        transaction
            .metadata
            .get(&self.options.keys.txnid)
            .is_some_and(|id| self.broker_transaction_exists(id))
    }

    /// Whether the broker id is recorded in the ledger, either directly or as a merged transaction.
    pub fn broker_transaction_exists(&self, id: &str) -> bool {
        self.txnids.contains(id)
    }

    pub fn is_balanced(&self, transaction: &Transaction) -> Result<bool, MappingError> {
        Ok(self.residuals(transaction)?.is_empty())
    }

    /// The amounts which would bring each unbalanced commodity back to zero.
    pub fn rounding_amounts(&self, transaction: &Transaction) -> Result<Vec<Amount>, MappingError> {
        Ok(self
            .residuals(transaction)?
            .into_iter()
            .map(|(commodity, residual, precision)| Amount::new(-residual, commodity, precision))
            .collect())
    }

    fn residuals(
        &self,
        transaction: &Transaction,
    ) -> Result<Vec<(String, Decimal, u32)>, MappingError> {
        let mut weights = HashMap::<String, (Vec<Decimal>, u32)>::default();
        for posting in &transaction.postings {
            let weight = posting.weight()?;
            let (numbers, precision) = weights.entry(weight.commodity).or_default();
            numbers.push(weight.number);
            *precision = (*precision).max(weight.precision);
        }

        let mut residuals = Vec::default();
        for (commodity, (numbers, precision)) in weights {
            if let Some(residual) = self.tolerance.residual(numbers.into_iter(), &commodity)? {
                residuals.push((commodity, residual, precision));
            }
        }
        residuals.sort();
        Ok(residuals)
    }
}

struct LookupBuilder<'a> {
    keys: &'a MetadataKeys,
    accounts: HashMap<AccountKey, AccountName>,
    commodities: HashMap<String, String>,
    txnids: HashSet<String>,
    issues: Vec<TaggingIssue>,
}

impl<'a> LookupBuilder<'a> {
    fn new(keys: &'a MetadataKeys) -> Self {
        Self {
            keys,
            accounts: HashMap::default(),
            commodities: HashMap::default(),
            txnids: HashSet::default(),
            issues: Vec::default(),
        }
    }

    fn account(&mut self, account: &LedgerAccount) {
        use hashbrown::hash_map::Entry::*;

        let account_types = account.metadata.get(&self.keys.account_type);
        let symbols = account.metadata.get(&self.keys.account_symbol);

        let (account_types, symbols) = match (account_types, symbols) {
            (None, None) => return,
            (Some(account_types), Some(symbols)) => (account_types, symbols),
            (Some(_), None) => {
                self.issues.push(TaggingIssue::IncompleteAccountTag {
                    account: account.name.to_string(),
                    missing_key: self.keys.account_symbol.clone(),
                });
                return;
            }
            (None, Some(_)) => {
                self.issues.push(TaggingIssue::IncompleteAccountTag {
                    account: account.name.to_string(),
                    missing_key: self.keys.account_type.clone(),
                });
                return;
            }
        };

        let role = account.name.account_type();
        if !matches!(
            role,
            AccountType::Assets | AccountType::Income | AccountType::Expenses
        ) {
            self.issues
                .push(TaggingIssue::UnsupportedAccountRole(account.name.to_string()));
            return;
        }

        // tag values may each list several entries
        for account_type in account_types.split_whitespace() {
            for symbol in symbols.split_whitespace() {
                match self
                    .accounts
                    .entry((role, account_type.to_string(), symbol.to_string()))
                {
                    Occupied(entry) => {
                        self.issues.push(TaggingIssue::DuplicateAccountTag {
                            role,
                            account_type: account_type.to_string(),
                            symbol: symbol.to_string(),
                            accounts: (entry.get().to_string(), account.name.to_string()),
                        });
                    }
                    Vacant(entry) => {
                        entry.insert(account.name.clone());
                    }
                }
            }
        }
    }

    fn commodity(&mut self, symbol: &str, id: Option<&String>) {
        use hashbrown::hash_map::Entry::*;

        if let Some(id) = id {
            match self.commodities.entry(id.clone()) {
                Occupied(entry) => {
                    self.issues.push(TaggingIssue::DuplicateCommodityTag {
                        id: id.clone(),
                        commodities: (entry.get().clone(), symbol.to_string()),
                    });
                }
                Vacant(entry) => {
                    entry.insert(symbol.to_string());
                }
            }
        }
    }

    fn transaction(&mut self, transaction: &Transaction) {
        // record transaction ID if it exists in the metadata
        for txnid_key in [&self.keys.txnid, &self.keys.nrwt_txnid] {
            if let Some(txnid) = transaction.metadata.get(txnid_key) {
                self.txnids.insert(txnid.clone());
            }
        }
    }
}
