use hashbrown::HashSet;
use time::Date;

use super::{
    broker::{self, TransactionKind},
    map_positions, map_transaction,
    merge::is_withheld_from,
    merge_withholding_tax, Balance, LedgerLookup, MappingError, Price, Transaction,
};

/// Maps batches of broker data, one account at a time, onto ledger directives missing from the ledger.
#[derive(Debug)]
pub struct Mapper<'a> {
    lookup: &'a LedgerLookup,
    accounts: Vec<broker::Account>,
}

impl<'a> Mapper<'a> {
    pub fn new(lookup: &'a LedgerLookup, accounts: Vec<broker::Account>) -> Self {
        Self { lookup, accounts }
    }

    pub fn lookup(&self) -> &LedgerLookup {
        self.lookup
    }

    pub fn accounts(&self) -> &[broker::Account] {
        &self.accounts
    }

    pub fn account(&self, id: &str) -> Result<&broker::Account, MappingError> {
        self.accounts
            .iter()
            .find(|account| account.id == id)
            .ok_or_else(|| MappingError::AccountNotFound(id.to_string()))
    }

    pub fn map_positions(
        &self,
        account_id: &str,
        positions: &[broker::Position],
        as_of: Date,
    ) -> Result<(Vec<Price>, Vec<Balance>), MappingError> {
        map_positions(self.lookup, self.account(account_id)?, positions, as_of)
    }

    /// Map the transactions of one account, merging withholding taxes into their dividends.
    ///
    /// Transactions and prices already in the ledger are dropped.  Withholding taxes which match no dividend
    /// are emitted on their own, after everything else.
    pub fn map_transactions(
        &self,
        account_id: &str,
        transactions: &[broker::Transaction],
    ) -> Result<(Vec<Price>, Vec<Transaction>), MappingError> {
        let account = self.account(account_id)?;

        if let Some(foreign) = transactions
            .iter()
            .find(|transaction| transaction.account_id != account.id)
        {
            return Err(MappingError::CrossAccountBatch {
                expected: account.id.clone(),
                found: foreign.account_id.clone(),
            });
        }

        let (mut withholdings, others): (Vec<_>, Vec<_>) = transactions
            .iter()
            .partition(|transaction| transaction.kind == TransactionKind::NonResidentWithholdingTax);
        // already booked, either standalone or merged
        withholdings.retain(|withholding| !self.lookup.broker_transaction_exists(&withholding.id));

        let mut output = MappedTransactions::new(self.lookup);

        for transaction in others {
            let (price, mut mapped) = map_transaction(self.lookup, account, transaction)?;

            if !self.lookup.transaction_exists(&mapped) {
                if transaction.kind == TransactionKind::Dividend {
                    if let Some(i) = withholdings
                        .iter()
                        .position(|withholding| is_withheld_from(withholding, transaction))
                    {
                        if let Some(merged) =
                            merge_withholding_tax(self.lookup, account, withholdings[i], &mapped)?
                        {
                            mapped = merged;
                            withholdings.remove(i);
                        }
                    }
                }
                output.transactions.push(mapped);
            }
            output.price(price);
        }

        for withholding in withholdings {
            let (price, mapped) = map_transaction(self.lookup, account, withholding)?;
            output.transaction(mapped);
            output.price(price);
        }

        tracing::debug!(
            "account {} transactions mapped to {} prices and {} transactions",
            &account.id,
            output.prices.len(),
            output.transactions.len()
        );

        Ok((output.prices, output.transactions))
    }
}

struct MappedTransactions<'a> {
    lookup: &'a LedgerLookup,
    seen_prices: HashSet<Price>,
    prices: Vec<Price>,
    transactions: Vec<Transaction>,
}

impl<'a> MappedTransactions<'a> {
    fn new(lookup: &'a LedgerLookup) -> Self {
        Self {
            lookup,
            seen_prices: HashSet::default(),
            prices: Vec::default(),
            transactions: Vec::default(),
        }
    }

    fn price(&mut self, price: Option<Price>) {
        if let Some(price) = price {
            if !self.lookup.price_exists(&price) && self.seen_prices.insert(price.clone()) {
                self.prices.push(price);
            }
        }
    }

    fn transaction(&mut self, transaction: Transaction) {
        if !self.lookup.transaction_exists(&transaction) {
            self.transactions.push(transaction);
        }
    }
}
