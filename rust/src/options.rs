use color_eyre::eyre::{eyre, Result};
use wealthsimple_mapping::{parse_amount, MappingOptions};

/// Apply `name=value` overrides on top of the default mapping options.
pub(crate) fn mapping_options(overrides: &[String]) -> Result<MappingOptions> {
    let mut options = MappingOptions::default();

    for option in overrides {
        let (name, value) = option
            .split_once('=')
            .ok_or_else(|| eyre!("option {option} must be of the form name=value"))?;
        let value = value.to_string();

        match name {
            "account-type-key" => options.keys.account_type = value,
            "account-symbol-key" => options.keys.account_symbol = value,
            "commodity-id-key" => options.keys.commodity_id = value,
            "txnid-key" => options.keys.txnid = value,
            "nrwt-txnid-key" => options.keys.nrwt_txnid = value,
            "record-date-key" => options.keys.record_date = value,
            "shares-key" => options.keys.shares = value,
            "symbol-key" => options.keys.symbol = value,
            "payee" => options.payee = value,
            "tolerance" => options.tolerance = parse_amount(&value)?.0,
            _ => return Err(eyre!("unknown option {name}")),
        }
    }

    tracing::debug!("mapping options {:?}", &options);

    Ok(options)
}
