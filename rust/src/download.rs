use color_eyre::eyre::Result;
use serde::Deserialize;
use std::path::Path;
use wealthsimple_mapping::broker::{Account, Position, Transaction};

use crate::json;

/// Everything fetched from Wealthsimple in one go, for any number of accounts.
#[derive(Deserialize, Debug)]
pub(crate) struct Download {
    pub(crate) accounts: Vec<Account>,
    #[serde(default)]
    pub(crate) positions: Vec<Position>,
    #[serde(default)]
    pub(crate) transactions: Vec<Transaction>,
}

impl Download {
    pub(crate) fn load_from(path: &Path) -> Result<Self> {
        let download = json::read::<Download>(path)?;

        tracing::debug!(
            "loaded {} accounts, {} positions, {} transactions from {}",
            download.accounts.len(),
            download.positions.len(),
            download.transactions.len(),
            path.display()
        );

        Ok(download)
    }

    pub(crate) fn positions_for(&self, account: &Account) -> Vec<Position> {
        self.positions
            .iter()
            .filter(|position| position.account_id == account.id)
            .cloned()
            .collect()
    }

    pub(crate) fn transactions_for(&self, account: &Account) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|transaction| transaction.account_id == account.id)
            .cloned()
            .collect()
    }
}
