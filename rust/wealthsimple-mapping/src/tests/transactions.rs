use rstest::rstest;
use rust_decimal_macros::dec;
use time::macros::date;

use super::{
    amount, assert_balanced, init_tracing, lookup, lookup_for, posting_accounts,
    snapshot, tfsa, transaction, vti_dividend, vti_withholding, ABC, ABC_DIVIDEND, ABC_INCOME,
    CASH, CHEQUING, FEES, REFUNDS, ROUNDING, VTI, VTI_INCOME, WITHHOLDING_TAX,
};
use crate::{
    broker::{self, TransactionKind::*},
    map_transaction, Cost, LedgerSnapshot, MappingError, Metadata, Price,
};

fn abc_buy(net_cash: &str) -> broker::Transaction {
    broker::Transaction {
        market_price_amount: "25.30".to_string(),
        quantity: "10".to_string(),
        process_date: date!(2021 - 03 - 10),
        ..transaction("buy-1", Buy, "ABC", net_cash)
    }
}

#[test]
fn test_buy() {
    init_tracing();

    let (price, mapped) = map_transaction(&lookup(), &tfsa(), &abc_buy("-253.00")).unwrap();

    assert_eq!(
        price,
        Some(Price {
            date: date!(2021 - 03 - 10),
            commodity: "ABC".to_string(),
            amount: amount(dec!(25.30), "CAD"),
        })
    );
    assert_eq!(posting_accounts(&mapped), vec![CASH, ABC]);
    assert_eq!(
        mapped.postings[1].cost,
        Some(Cost::per_unit(amount(dec!(25.30), "CAD")))
    );
    assert_eq!(mapped.postings[0].price, None);
    assert_eq!(
        mapped.to_string(),
        r#"2021-03-08 * "" ""
  wealthsimple-id: "buy-1"
  Assets:Wealthsimple:TFSA:Cash -253.00 CAD
  Assets:Wealthsimple:TFSA:ABC 10.00 ABC {25.30 CAD}"#
    );
}

#[test]
fn test_buy_in_foreign_currency() {
    let buy = broker::Transaction {
        market_price_amount: "200.00".to_string(),
        market_price_currency: "USD".to_string(),
        market_value_currency: "USD".to_string(),
        fx_rate: "1.327".to_string(),
        quantity: "2".to_string(),
        ..transaction("buy-2", Buy, "VTI", "-530.80")
    };

    let (price, mapped) = map_transaction(&lookup(), &tfsa(), &buy).unwrap();

    assert_eq!(
        price.map(|price| price.amount),
        Some(amount(dec!(200.00), "USD"))
    );
    assert_eq!(posting_accounts(&mapped), vec![CASH, VTI]);
    assert_eq!(
        mapped.postings[0].to_string(),
        "  Assets:Wealthsimple:TFSA:Cash -530.80 CAD @ 0.754 USD"
    );
    assert_balanced(&mapped);
}

#[test]
fn test_sell() {
    let sell = broker::Transaction {
        market_price_amount: "26.00".to_string(),
        quantity: "-5".to_string(),
        ..transaction("sell-1", Sell, "ABC", "130.00")
    };

    let (price, mapped) = map_transaction(&lookup(), &tfsa(), &sell).unwrap();

    assert_eq!(
        price.map(|price| price.amount),
        Some(amount(dec!(26.00), "CAD"))
    );
    assert_eq!(
        mapped.postings[1].to_string(),
        "  Assets:Wealthsimple:TFSA:ABC -5.00 ABC {} @ 26.00 CAD"
    );
    assert_balanced(&mapped);
}

#[test]
fn test_dividend_in_account_currency() {
    let dividend = broker::Transaction {
        description: ABC_DIVIDEND.to_string(),
        ..transaction("div-1", Dividend, "ABC", "5.25")
    };

    let (price, mapped) = map_transaction(&lookup(), &tfsa(), &dividend).unwrap();

    assert_eq!(price, None);
    assert_eq!(posting_accounts(&mapped), vec![CASH, ABC_INCOME]);
    assert_eq!(mapped.postings[1].amount, amount(dec!(-5.25), "CAD"));
    assert_eq!(
        mapped.metadata,
        Metadata::from([
            ("record-date".to_string(), "2021-06-15".to_string()),
            ("shares".to_string(), "100.0000".to_string()),
            ("wealthsimple-id".to_string(), "div-1".to_string()),
        ])
    );
}

#[test]
fn test_dividend_with_foreign_gross() {
    let (price, mapped) = map_transaction(&lookup(), &tfsa(), &vti_dividend("div-2")).unwrap();

    assert_eq!(price, None);
    assert_eq!(posting_accounts(&mapped), vec![CASH, VTI_INCOME]);
    assert_eq!(
        mapped.postings[0].to_string(),
        "  Assets:Wealthsimple:TFSA:Cash 13.27 CAD @ 0.754 USD"
    );
    assert_eq!(mapped.postings[1].amount, amount(dec!(-10.00), "USD"));
    assert_balanced(&mapped);
}

#[test]
fn test_fee() {
    let fee = broker::Transaction {
        description: "Management fee".to_string(),
        ..transaction("fee-1", Fee, "", "-1.50")
    };

    let (_, mapped) = map_transaction(&lookup(), &tfsa(), &fee).unwrap();

    assert_eq!(mapped.payee, "Wealthsimple");
    assert_eq!(mapped.narration, "Management fee");
    assert_eq!(posting_accounts(&mapped), vec![CASH, FEES]);
    assert_eq!(mapped.postings[1].amount, amount(dec!(1.50), "CAD"));
}

#[rstest]
#[case(Contribution, CHEQUING)]
#[case(Deposit, CHEQUING)]
#[case(Refund, REFUNDS)]
fn test_cash_transfers(#[case] kind: broker::TransactionKind, #[case] counter_account: &str) {
    let (price, mapped) =
        map_transaction(&lookup(), &tfsa(), &transaction("cash-1", kind, "", "100.00")).unwrap();

    assert_eq!(price, None);
    assert_eq!(posting_accounts(&mapped), vec![CASH, counter_account]);
    assert_eq!(mapped.postings[1].amount, amount(dec!(-100.00), "CAD"));
    assert_eq!(mapped.payee, "");
}

#[test]
fn test_withholding_tax() {
    let (price, mapped) =
        map_transaction(&lookup(), &tfsa(), &vti_withholding("nrwt-1")).unwrap();

    assert_eq!(price, None);
    assert_eq!(posting_accounts(&mapped), vec![CASH, WITHHOLDING_TAX]);
    assert_eq!(
        mapped.metadata.get("symbol").map(String::as_str),
        Some("VTI")
    );
    assert_eq!(
        mapped.postings[0].to_string(),
        "  Assets:Wealthsimple:TFSA:Cash -1.99 CAD @ 0.754 USD"
    );
    assert_eq!(mapped.postings[1].amount, amount(dec!(1.50), "USD"));
    assert_balanced(&mapped);
}

#[rstest]
#[case(Withdrawal, "withdrawal")]
#[case(PaymentTransferOut, "payment_transfer_out")]
#[case(TransferIn, "transfer_in")]
#[case(TransferOut, "transfer_out")]
#[case(CustodianFee, "custodian_fee")]
#[case(StockDistribution, "stock_distribution")]
#[case(ReturnOfCapital, "return_of_capital")]
#[case(Reimbursement, "reimbursement")]
#[case(Hst, "hst")]
fn test_unsupported(#[case] kind: broker::TransactionKind, #[case] name: &str) {
    assert_eq!(
        map_transaction(&lookup(), &tfsa(), &transaction("x-1", kind, "", "1.00")),
        Err(MappingError::UnsupportedTransactionType(name.to_string()))
    );
}

#[test]
fn test_rounding_posting_appended() {
    let (_, mapped) = map_transaction(&lookup(), &tfsa(), &abc_buy("-253.01")).unwrap();

    assert_eq!(posting_accounts(&mapped), vec![CASH, ABC, ROUNDING]);
    assert_eq!(mapped.postings[2].amount, amount(dec!(0.01), "CAD"));
    assert_balanced(&mapped);
}

#[test]
fn test_rounding_account_required_only_when_unbalanced() {
    let mut snapshot = snapshot();
    snapshot
        .accounts
        .retain(|account| account.name.as_str() != ROUNDING);
    let lookup = lookup_for(&snapshot);

    assert!(map_transaction(&lookup, &tfsa(), &abc_buy("-253.00")).is_ok());
    assert_eq!(
        map_transaction(&lookup, &tfsa(), &abc_buy("-253.01")),
        Err(MappingError::MissingExpenseAccount(
            "rounding".to_string(),
            "ca_tfsa".to_string()
        ))
    );
}

#[test]
fn test_missing_income_account() {
    let dividend = broker::Transaction {
        description: ABC_DIVIDEND.to_string(),
        ..transaction("div-3", Dividend, "DEF", "5.25")
    };

    assert_eq!(
        map_transaction(&lookup(), &tfsa(), &dividend),
        Err(MappingError::MissingIncomeAccount(
            "DEF".to_string(),
            "ca_tfsa".to_string()
        ))
    );
}

#[test]
fn test_missing_cash_account() {
    let lookup = lookup_for(&LedgerSnapshot::default());

    assert_eq!(
        map_transaction(&lookup, &tfsa(), &transaction("fee-2", Fee, "", "-1.50")),
        Err(MappingError::MissingAssetAccount(
            "CAD".to_string(),
            "ca_tfsa".to_string()
        ))
    );
}

#[test]
fn test_malformed_input_fails() {
    assert_eq!(
        map_transaction(&lookup(), &tfsa(), &transaction("fee-3", Fee, "", "one fifty")),
        Err(MappingError::InvalidAmount("one fifty".to_string()))
    );
    assert_eq!(
        map_transaction(&lookup(), &tfsa(), &transaction("div-4", Dividend, "ABC", "5.25")),
        Err(MappingError::UnexpectedDescription(String::default()))
    );

    let zero_rate = broker::Transaction {
        fx_rate: "0".to_string(),
        ..vti_withholding("nrwt-2")
    };
    assert!(matches!(
        map_transaction(&lookup(), &tfsa(), &zero_rate),
        Err(MappingError::InvalidAmount(_))
    ));
}

#[test]
fn test_overflowing_cost_fails() {
    let huge = broker::Transaction {
        market_price_amount: "99999999999999".to_string(),
        quantity: "99999999999999999".to_string(),
        ..abc_buy("-253.00")
    };

    assert!(matches!(
        map_transaction(&lookup(), &tfsa(), &huge),
        Err(MappingError::InvalidAmount(_))
    ));
}
