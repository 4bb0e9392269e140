use time::Date;

use super::{
    amount, broker, AccountType, Amount, Balance, LedgerLookup, MappingError, Price,
};

/// Map the positions of a single account onto prices and balances not already in the ledger.
///
/// An account without positions still gets a zero balance in its currency as of the given date,
/// so that it doesn't silently drop out of the ledger.
pub fn map_positions(
    lookup: &LedgerLookup,
    account: &broker::Account,
    positions: &[broker::Position],
    as_of: Date,
) -> Result<(Vec<Price>, Vec<Balance>), MappingError> {
    let mut prices = Vec::default();
    let mut balances = Vec::default();

    for position in positions {
        if position.account_id != account.id {
            return Err(MappingError::CrossAccountBatch {
                expected: account.id.clone(),
                found: position.account_id.clone(),
            });
        }

        let symbol = lookup.ledger_symbol(&position.asset)?;

        if !position.asset.is_currency() {
            let price = Price {
                date: position.position_date,
                commodity: symbol.clone(),
                amount: amount::amount(&position.price_amount, &position.price_currency)?,
            };
            if !lookup.price_exists(&price) {
                prices.push(price);
            }
        }

        let balance = Balance {
            date: position.position_date,
            account: lookup.ledger_account_name(
                account,
                AccountType::Assets,
                Some(&position.asset.symbol),
            )?,
            amount: amount::amount(&position.quantity, &symbol)?,
        };
        push_balance(lookup, &mut balances, balance);
    }

    if positions.is_empty() {
        let balance = Balance {
            date: as_of,
            account: lookup.ledger_account_name(account, AccountType::Assets, None)?,
            amount: Amount::zero(&account.currency),
        };
        push_balance(lookup, &mut balances, balance);
    }

    tracing::debug!(
        "account {} positions mapped to {} prices and {} balances",
        &account.id,
        prices.len(),
        balances.len()
    );

    Ok((prices, balances))
}

fn push_balance(lookup: &LedgerLookup, balances: &mut Vec<Balance>, balance: Balance) {
    if lookup.balance_exists(&balance) {
        return;
    }

    if let Some(existing) = lookup.conflicting_balance(&balance) {
        tracing::warn!(
            "{} on {} is {} but ledger already asserts {}",
            &balance.account,
            &balance.date,
            &balance.amount,
            existing
        );
    }

    balances.push(balance);
}
