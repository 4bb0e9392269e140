use super::{
    amount::{self, ParsedNumber},
    broker::{self, TransactionKind},
    options::ROUNDING_SYMBOL,
    AccountType, Amount, Cost, Description, DividendDescription, Flag, LedgerLookup,
    MappingError, Metadata, Posting, Price, Transaction,
    WithholdingTaxDescription,
};

impl broker::Transaction {
    pub(crate) fn net_cash(&self) -> Result<Amount, MappingError> {
        amount::amount(&self.net_cash_amount, &self.net_cash_currency)
    }

    pub(crate) fn negated_net_cash(&self) -> Result<Amount, MappingError> {
        amount::negated_amount(&self.net_cash_amount, &self.net_cash_currency)
    }

    pub(crate) fn market_price(&self) -> Result<Amount, MappingError> {
        amount::amount(&self.market_price_amount, &self.market_price_currency)
    }

    /// The exchange rate turned around, so it prices the cash currency in the market currency.
    pub(crate) fn fx_amount(&self) -> Result<Amount, MappingError> {
        Ok(ParsedNumber::parse(&self.fx_rate)?
            .inverted()?
            .into_amount(&self.market_price_currency))
    }

    /// The FX price for the cash leg, present only if the trade was in another currency.
    pub(crate) fn fx_price(&self) -> Result<Option<Amount>, MappingError> {
        if self.market_value_currency != self.net_cash_currency {
            self.fx_amount().map(Some)
        } else {
            Ok(None)
        }
    }

    /// The FX price for the cash leg, in the currency of an amount parsed from the description.
    pub(crate) fn fx_price_in(&self, commodity: &str) -> Result<Amount, MappingError> {
        let fx = self.fx_amount()?;
        Ok(Amount::new(fx.number, commodity, fx.precision))
    }

    pub(crate) fn quantity_amount(&self, lookup: &LedgerLookup) -> Result<Amount, MappingError> {
        amount::amount(&self.quantity, &lookup.ledger_symbol_for(&self.symbol)?)
    }
}

/// Map a single broker transaction onto a balanced ledger transaction, along with the market price
/// it reveals, if any.
pub fn map_transaction(
    lookup: &LedgerLookup,
    account: &broker::Account,
    transaction: &broker::Transaction,
) -> Result<(Option<Price>, Transaction), MappingError> {
    use AccountType::*;
    use TransactionKind::*;

    if !transaction.kind.is_supported() {
        return Err(MappingError::UnsupportedTransactionType(
            transaction.kind.to_string(),
        ));
    }

    tracing::debug!(
        "mapping {} transaction {} in account {}",
        transaction.kind,
        &transaction.id,
        &account.id
    );

    let keys = lookup.keys();
    let kind_symbol: &'static str = transaction.kind.into();
    let cash_account = lookup.ledger_account_name(account, Assets, None)?;
    let mut payee = String::default();
    let mut narration = String::default();
    let mut metadata = Metadata::from([(keys.txnid.clone(), transaction.id.clone())]);
    let mut price = None;

    let description = Description::parse(transaction.kind, &transaction.description)?;

    let postings = match (transaction.kind, description) {
        (Buy, _) => {
            let market_price = transaction.market_price()?;
            let security = Posting::new(
                lookup.ledger_account_name(account, Assets, Some(&transaction.symbol))?,
                transaction.quantity_amount(lookup)?,
            )
            .with_cost(Cost::per_unit(market_price.clone()));
            price = Some(Price {
                date: transaction.process_date,
                commodity: security.amount.commodity.clone(),
                amount: market_price,
            });

            vec![
                Posting::new(cash_account, transaction.net_cash()?)
                    .with_price(transaction.fx_price()?),
                security,
            ]
        }

        (Sell, _) => {
            let market_price = transaction.market_price()?;
            let security = Posting::new(
                lookup.ledger_account_name(account, Assets, Some(&transaction.symbol))?,
                transaction.quantity_amount(lookup)?,
            )
            .with_price(Some(market_price.clone()))
            .with_cost(Cost::default());
            price = Some(Price {
                date: transaction.process_date,
                commodity: security.amount.commodity.clone(),
                amount: market_price,
            });

            vec![
                Posting::new(cash_account, transaction.net_cash()?)
                    .with_price(transaction.fx_price()?),
                security,
            ]
        }

        (
            Dividend,
            Some(Description::Dividend(DividendDescription {
                record_date,
                shares,
                foreign_gross,
            })),
        ) => {
            metadata.insert(keys.record_date.clone(), record_date.to_string());
            metadata.insert(keys.shares.clone(), shares);

            let (income, fx_price) = match foreign_gross {
                Some(gross) => {
                    let fx_price = transaction.fx_price_in(&gross.commodity)?;
                    (gross, Some(fx_price))
                }
                None => (transaction.negated_net_cash()?, None),
            };

            vec![
                Posting::new(cash_account, transaction.net_cash()?).with_price(fx_price),
                Posting::new(
                    lookup.ledger_account_name(account, Income, Some(&transaction.symbol))?,
                    income,
                ),
            ]
        }

        (Fee, _) => {
            payee = lookup.options().payee.clone();
            narration = transaction.description.clone();

            vec![
                Posting::new(cash_account, transaction.net_cash()?),
                Posting::new(
                    lookup.ledger_account_name(account, Expenses, Some(kind_symbol))?,
                    transaction.negated_net_cash()?,
                ),
            ]
        }

        (Contribution | Deposit, _) => vec![
            Posting::new(cash_account, transaction.net_cash()?),
            Posting::new(
                lookup.ledger_account_name(account, Assets, Some(kind_symbol))?,
                transaction.negated_net_cash()?,
            ),
        ],

        (Refund, _) => vec![
            Posting::new(cash_account, transaction.net_cash()?),
            Posting::new(
                lookup.ledger_account_name(account, Income, Some(kind_symbol))?,
                transaction.negated_net_cash()?,
            ),
        ],

        (
            NonResidentWithholdingTax,
            Some(Description::WithholdingTax(WithholdingTaxDescription { withheld })),
        ) => {
            metadata.insert(keys.symbol.clone(), transaction.symbol.clone());
            let fx_price = transaction.fx_price_in(&withheld.commodity)?;

            vec![
                Posting::new(cash_account, transaction.net_cash()?).with_price(Some(fx_price)),
                Posting::new(
                    lookup.ledger_account_name(account, Expenses, Some(kind_symbol))?,
                    withheld,
                ),
            ]
        }

        (kind, _) => return Err(MappingError::UnsupportedTransactionType(kind.to_string())),
    };

    let mapped = Transaction {
        date: transaction.effective_date,
        payee,
        narration,
        flag: Flag::Complete,
        tags: Vec::default(),
        metadata,
        postings,
    };

    Ok((price, balanced(lookup, account, mapped)?))
}

/// Append a rounding posting for each commodity which doesn't balance.
pub(crate) fn balanced(
    lookup: &LedgerLookup,
    account: &broker::Account,
    mut transaction: Transaction,
) -> Result<Transaction, MappingError> {
    if !lookup.is_balanced(&transaction)? {
        let rounding_account =
            lookup.ledger_account_name(account, AccountType::Expenses, Some(ROUNDING_SYMBOL))?;

        for amount in lookup.rounding_amounts(&transaction)? {
            tracing::debug!("rounding {} on {}", &amount, &transaction.date);
            transaction
                .postings
                .push(Posting::new(rounding_account.clone(), amount));
        }
    }

    Ok(transaction)
}
