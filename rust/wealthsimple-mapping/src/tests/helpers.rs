use rust_decimal::Decimal;
use time::macros::date;
use tracing_subscriber::EnvFilter;

use crate::{
    broker::{self, AssetKind, TransactionKind},
    AccountName, Amount, Commodity, LedgerAccount, LedgerLookup, LedgerSnapshot, MappingOptions,
    Metadata, Transaction,
};

pub(crate) const ACCOUNT_ID: &str = "tfsa-1";
pub(crate) const ACCOUNT_TYPE: &str = "ca_tfsa";

pub(crate) const CASH: &str = "Assets:Wealthsimple:TFSA:Cash";
pub(crate) const ABC: &str = "Assets:Wealthsimple:TFSA:ABC";
pub(crate) const VTI: &str = "Assets:Wealthsimple:TFSA:VTI";
pub(crate) const CHEQUING: &str = "Assets:Bank:Chequing";
pub(crate) const ABC_INCOME: &str = "Income:Wealthsimple:TFSA:ABC";
pub(crate) const VTI_INCOME: &str = "Income:Wealthsimple:TFSA:VTI";
pub(crate) const REFUNDS: &str = "Income:Wealthsimple:Refund";
pub(crate) const FEES: &str = "Expenses:Wealthsimple:Fee";
pub(crate) const WITHHOLDING_TAX: &str = "Expenses:Wealthsimple:NRWT";
pub(crate) const ROUNDING: &str = "Expenses:Wealthsimple:Rounding";

pub(crate) const VTI_DIVIDEND: &str =
    "VTI - Vanguard Total Stock Market ETF: 05-Mar-21 (record date) 20.0000 shares, gross 10.00 USD, convert to CAD @ 1.327";
pub(crate) const VTI_WITHHOLDING: &str =
    "VTI - Vanguard Total Stock Market ETF: Non-resident tax withheld at source (1.50 USD, convert to CAD @ 1.327)";
pub(crate) const ABC_DIVIDEND: &str = "ABC - ABC Corp: 15-Jun-21 (record date) 100.0000 shares";

pub(crate) fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).unwrap();
    });
}

pub(crate) fn account_name(name: &str) -> AccountName {
    AccountName::try_from(name).unwrap()
}

pub(crate) fn amount(number: Decimal, commodity: &str) -> Amount {
    Amount::new(number, commodity, number.scale())
}

pub(crate) fn tagged_account(name: &str, account_type: &str, symbol: &str) -> LedgerAccount {
    LedgerAccount {
        name: account_name(name),
        metadata: Metadata::from([
            ("external-type".to_string(), account_type.to_string()),
            ("external-symbol".to_string(), symbol.to_string()),
        ]),
    }
}

pub(crate) fn untagged_account(name: &str) -> LedgerAccount {
    LedgerAccount {
        name: account_name(name),
        metadata: Metadata::default(),
    }
}

pub(crate) fn commodity(symbol: &str, id: Option<&str>) -> Commodity {
    Commodity {
        symbol: symbol.to_string(),
        metadata: id
            .map(|id| Metadata::from([("external-id".to_string(), id.to_string())]))
            .unwrap_or_default(),
    }
}

/// A ledger tagged for a single TFSA holding ABC in CAD and VTI in USD.
pub(crate) fn snapshot() -> LedgerSnapshot {
    LedgerSnapshot {
        accounts: vec![
            tagged_account(CASH, ACCOUNT_TYPE, "CAD"),
            tagged_account(ABC, ACCOUNT_TYPE, "ABC"),
            tagged_account(VTI, ACCOUNT_TYPE, "VTI"),
            tagged_account(CHEQUING, ACCOUNT_TYPE, "contribution deposit"),
            tagged_account(ABC_INCOME, ACCOUNT_TYPE, "ABC"),
            tagged_account(VTI_INCOME, ACCOUNT_TYPE, "VTI"),
            tagged_account(REFUNDS, ACCOUNT_TYPE, "refund"),
            tagged_account(FEES, ACCOUNT_TYPE, "fee"),
            tagged_account(WITHHOLDING_TAX, ACCOUNT_TYPE, "non_resident_withholding_tax"),
            tagged_account(ROUNDING, ACCOUNT_TYPE, "rounding"),
            untagged_account("Assets:Bank:Savings"),
        ],
        commodities: vec![
            commodity("CAD", None),
            commodity("USD", None),
            commodity("ABC", Some("ABC")),
            commodity("VTI", Some("VTI")),
        ],
        ..Default::default()
    }
}

pub(crate) fn lookup_for(snapshot: &LedgerSnapshot) -> LedgerLookup {
    LedgerLookup::new(snapshot, &MappingOptions::default()).unwrap()
}

pub(crate) fn lookup() -> LedgerLookup {
    lookup_for(&snapshot())
}

/// The snapshot with the given transactions already in the ledger.
pub(crate) fn lookup_with_transactions(transactions: &[Transaction]) -> LedgerLookup {
    lookup_for(&LedgerSnapshot {
        transactions: transactions.to_vec(),
        ..snapshot()
    })
}

pub(crate) fn tfsa() -> broker::Account {
    broker::Account {
        id: ACCOUNT_ID.to_string(),
        account_type: ACCOUNT_TYPE.to_string(),
        currency: "CAD".to_string(),
    }
}

/// A CAD transaction on the TFSA, with everything not given set to something innocuous.
pub(crate) fn transaction(
    id: &str,
    kind: TransactionKind,
    symbol: &str,
    net_cash: &str,
) -> broker::Transaction {
    broker::Transaction {
        id: id.to_string(),
        account_id: ACCOUNT_ID.to_string(),
        kind,
        symbol: symbol.to_string(),
        description: String::default(),
        effective_date: date!(2021 - 03 - 08),
        process_date: date!(2021 - 03 - 08),
        net_cash_amount: net_cash.to_string(),
        net_cash_currency: "CAD".to_string(),
        market_price_amount: "0".to_string(),
        market_price_currency: "CAD".to_string(),
        market_value_currency: "CAD".to_string(),
        fx_rate: "1".to_string(),
        quantity: "0".to_string(),
    }
}

pub(crate) fn vti_dividend(id: &str) -> broker::Transaction {
    broker::Transaction {
        description: VTI_DIVIDEND.to_string(),
        market_value_currency: "USD".to_string(),
        fx_rate: "1.327".to_string(),
        ..transaction(id, TransactionKind::Dividend, "VTI", "13.27")
    }
}

pub(crate) fn vti_withholding(id: &str) -> broker::Transaction {
    broker::Transaction {
        description: VTI_WITHHOLDING.to_string(),
        market_value_currency: "USD".to_string(),
        fx_rate: "1.327".to_string(),
        ..transaction(id, TransactionKind::NonResidentWithholdingTax, "VTI", "-1.99")
    }
}

pub(crate) fn position(
    symbol: &str,
    kind: AssetKind,
    quantity: &str,
    price: (&str, &str),
) -> broker::Position {
    broker::Position {
        account_id: ACCOUNT_ID.to_string(),
        asset: broker::Asset {
            symbol: symbol.to_string(),
            kind,
        },
        quantity: quantity.to_string(),
        price_amount: price.0.to_string(),
        price_currency: price.1.to_string(),
        position_date: date!(2021 - 03 - 10),
    }
}

/// Every commodity of the transaction sums to zero within the default tolerance.
pub(crate) fn assert_balanced(transaction: &Transaction) {
    let mut sums = hashbrown::HashMap::<String, Decimal>::default();
    for posting in &transaction.postings {
        let weight = posting.weight().unwrap();
        *sums.entry(weight.commodity).or_default() += weight.number;
    }
    for (commodity, sum) in sums {
        assert!(
            sum.abs() <= crate::options::default_tolerance(),
            "{commodity} unbalanced by {sum} in\n{transaction}"
        );
    }
}

pub(crate) fn posting_accounts(transaction: &Transaction) -> Vec<&str> {
    transaction
        .postings
        .iter()
        .map(|posting| posting.account.as_str())
        .collect()
}
