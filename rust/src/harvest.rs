use color_eyre::eyre::Result;
use rayon::prelude::*;
use serde::Serialize;
use std::io::Write;
use time::Date;
use wealthsimple_mapping::{broker, Balance, Mapper, MappingError, Price, Transaction};

use crate::{download::Download, json};

/// Directives missing from the ledger, across all accounts in a download.
#[derive(Default, Serialize, Debug)]
pub(crate) struct Harvest {
    pub(crate) prices: Vec<Price>,
    pub(crate) balances: Vec<Balance>,
    pub(crate) transactions: Vec<Transaction>,
    #[serde(skip)]
    pub(crate) failures: Vec<(String, MappingError)>,
}

struct AccountHarvest {
    prices: Vec<Price>,
    balances: Vec<Balance>,
    transactions: Vec<Transaction>,
}

impl Harvest {
    /// Map accounts in parallel, so one account's failure leaves the others intact.
    pub(crate) fn collect(mapper: &Mapper<'_>, download: &Download, as_of: Date) -> Self {
        let results = mapper
            .accounts()
            .par_iter()
            .map(|account| {
                let result = harvest_account(mapper, download, account, as_of);
                (account.id.clone(), result)
            })
            .collect::<Vec<_>>();

        let mut harvest = Harvest::default();
        for (id, result) in results {
            match result {
                Ok(account) => {
                    tracing::debug!("harvested account {id}");
                    harvest.prices.extend(account.prices);
                    harvest.balances.extend(account.balances);
                    harvest.transactions.extend(account.transactions);
                }
                Err(e) => {
                    tracing::error!("account {id} failed: {e}");
                    harvest.failures.push((id, e));
                }
            }
        }

        harvest.sort();
        harvest
    }

    /// Prices and transactions may come from several accounts, so are deduplicated and sorted by date.
    fn sort(&mut self) {
        self.prices.sort_by(|a, b| {
            (a.date, &a.commodity, &a.amount.commodity, a.amount.number).cmp(&(
                b.date,
                &b.commodity,
                &b.amount.commodity,
                b.amount.number,
            ))
        });
        self.prices.dedup();
        self.balances
            .sort_by(|a, b| (a.date, &a.account).cmp(&(b.date, &b.account)));
        self.transactions.sort_by_key(|transaction| transaction.date);
    }

    pub(crate) fn write_as_beancount<W>(&self, out_w: W) -> Result<()>
    where
        W: Write + Copy,
    {
        use std::io::BufWriter;

        let mut buffered_out_w = BufWriter::new(out_w);

        for price in &self.prices {
            writeln!(buffered_out_w, "{price}")?;
        }
        if !self.prices.is_empty() {
            writeln!(buffered_out_w)?;
        }

        for transaction in &self.transactions {
            writeln!(buffered_out_w, "{transaction}\n")?;
        }

        for balance in &self.balances {
            writeln!(buffered_out_w, "{balance}")?;
        }

        Ok(())
    }

    pub(crate) fn write_as_json<W>(&self, out_w: W) -> Result<()>
    where
        W: Write + Copy,
    {
        json::write(self, out_w)
    }

    pub(crate) fn write_failures<W>(&self, error_w: W) -> Result<()>
    where
        W: Write + Copy,
    {
        use std::io::BufWriter;

        let mut buffered_error_w = BufWriter::new(error_w);
        for (id, e) in &self.failures {
            writeln!(buffered_error_w, "account {id}: {e}")?;
        }

        Ok(())
    }
}

fn harvest_account(
    mapper: &Mapper<'_>,
    download: &Download,
    account: &broker::Account,
    as_of: Date,
) -> Result<AccountHarvest, MappingError> {
    let (mut prices, balances) =
        mapper.map_positions(&account.id, &download.positions_for(account), as_of)?;
    let (transaction_prices, transactions) =
        mapper.map_transactions(&account.id, &download.transactions_for(account))?;
    prices.extend(transaction_prices);

    Ok(AccountHarvest {
        prices,
        balances,
        transactions,
    })
}
