use super::{
    broker::{self, TransactionKind},
    transaction::balanced,
    AccountType, LedgerLookup, MappingError, ParseDescription, Posting, Transaction,
    WithholdingTaxDescription,
};

/// Whether the withholding tax was levied on the dividend.
pub(crate) fn is_withheld_from(
    withholding: &broker::Transaction,
    dividend: &broker::Transaction,
) -> bool {
    withholding.symbol == dividend.symbol && withholding.process_date == dividend.process_date
}

/// Fold a non-resident withholding tax transaction into the dividend it was withheld from.
///
/// The income posting is kept, the tax becomes an expense posting, and the cash posting is reduced by the
/// tax actually deducted.  `None` if the cash currencies differ, in which case the two are left separate.
pub fn merge_withholding_tax(
    lookup: &LedgerLookup,
    account: &broker::Account,
    withholding: &broker::Transaction,
    dividend: &Transaction,
) -> Result<Option<Transaction>, MappingError> {
    let (Some(asset), Some(income)) = (
        dividend.posting_of_type(AccountType::Assets),
        dividend.posting_of_type(AccountType::Income),
    ) else {
        return Ok(None);
    };

    let withheld_cash = withholding.net_cash()?;
    if withheld_cash.commodity != asset.amount.commodity {
        tracing::warn!(
            "not merging withholding tax {} in {} into dividend in {}",
            &withholding.id,
            &withheld_cash.commodity,
            &asset.amount.commodity
        );
        return Ok(None);
    }
    let net_cash = asset.amount.checked_add(&withheld_cash).ok_or_else(|| {
        MappingError::InvalidAmount(format!("{} + {}", &asset.amount, &withheld_cash))
    })?;

    let WithholdingTaxDescription { withheld } =
        WithholdingTaxDescription::parse(&withholding.description)?;
    let kind_symbol: &'static str = TransactionKind::NonResidentWithholdingTax.into();
    let expense = Posting::new(
        lookup.ledger_account_name(account, AccountType::Expenses, Some(kind_symbol))?,
        withheld,
    );

    let asset = Posting {
        amount: net_cash,
        ..asset.clone()
    };

    let mut metadata = dividend.metadata.clone();
    metadata.insert(lookup.keys().nrwt_txnid.clone(), withholding.id.clone());

    tracing::debug!(
        "merged withholding tax {} into dividend on {}",
        &withholding.id,
        &dividend.date
    );

    let merged = Transaction {
        metadata,
        postings: vec![asset, income.clone(), expense],
        ..dividend.clone()
    };

    balanced(lookup, account, merged).map(Some)
}
