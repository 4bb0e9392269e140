use regex::{Captures, Regex};
use std::sync::LazyLock;
use time::{Date, Month};

use super::{amount, broker::TransactionKind, Amount, MappingError};

static DIVIDEND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[^:]*:\s+(?P<date>[^\s]+)\s+\(record date\)\s+(?P<shares>[^\s]+)\s+shares(,\s+gross\s+(?P<gross>[-+]?[0-9]+(,[0-9]{3})*(\.[0-9]+)?)\s+(?P<currency>[^\s]+), convert to\s+.*)?$",
    )
    .unwrap()
});

static NRWT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[^:]*: Non-resident tax withheld at source \((?P<amount>[-+]?[0-9]+(,[0-9]{3})*(\.[0-9]+)?)\s+(?P<currency>[^\s]+), convert to\s+.*$",
    )
    .unwrap()
});

// e.g. 05-Mar-21
static RECORD_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,2})-([A-Za-z]{3})-([0-9]{2})$").unwrap());

/// Structured data embedded by the broker in a transaction description.
pub trait ParseDescription: Sized {
    fn parse(raw: &str) -> Result<Self, MappingError>;
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct DividendDescription {
    pub record_date: Date,
    pub shares: String,
    /// Gross dividend in the security's currency, negated as it is booked as income.
    pub foreign_gross: Option<Amount>,
}

impl ParseDescription for DividendDescription {
    fn parse(raw: &str) -> Result<Self, MappingError> {
        let captures = single_match(&DIVIDEND, raw)?;
        let record_date =
            parse_record_date(&captures["date"]).ok_or_else(|| unexpected(raw))?;
        let foreign_gross = match (captures.name("gross"), captures.name("currency")) {
            (Some(gross), Some(currency)) => Some(
                amount::negated_amount(gross.as_str(), currency.as_str())
                    .map_err(|_| unexpected(raw))?,
            ),
            _ => None,
        };

        Ok(DividendDescription {
            record_date,
            shares: captures["shares"].to_string(),
            foreign_gross,
        })
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct WithholdingTaxDescription {
    pub withheld: Amount,
}

impl ParseDescription for WithholdingTaxDescription {
    fn parse(raw: &str) -> Result<Self, MappingError> {
        let captures = single_match(&NRWT, raw)?;
        let withheld = amount::amount(&captures["amount"], &captures["currency"])
            .map_err(|_| unexpected(raw))?;

        Ok(WithholdingTaxDescription { withheld })
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Description {
    Dividend(DividendDescription),
    WithholdingTax(WithholdingTaxDescription),
}

impl Description {
    /// Parse the description with the parser for the transaction kind, if it has one.
    pub fn parse(kind: TransactionKind, raw: &str) -> Result<Option<Self>, MappingError> {
        use TransactionKind::*;

        match kind {
            Dividend => DividendDescription::parse(raw).map(|d| Some(Description::Dividend(d))),
            NonResidentWithholdingTax => {
                WithholdingTaxDescription::parse(raw).map(|d| Some(Description::WithholdingTax(d)))
            }
            _ => Ok(None),
        }
    }
}

fn unexpected(raw: &str) -> MappingError {
    MappingError::UnexpectedDescription(raw.to_string())
}

fn single_match<'h>(regex: &Regex, raw: &'h str) -> Result<Captures<'h>, MappingError> {
    let mut matches = regex.captures_iter(raw);
    match (matches.next(), matches.next()) {
        (Some(captures), None) => Ok(captures),
        _ => Err(unexpected(raw)),
    }
}

fn parse_record_date(text: &str) -> Option<Date> {
    let captures = RECORD_DATE.captures(text)?;
    let day = captures[1].parse::<u8>().ok()?;
    let month = month_from_abbreviation(&captures[2])?;
    let year = 2000 + captures[3].parse::<i32>().ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

fn month_from_abbreviation(abbreviation: &str) -> Option<Month> {
    use Month::*;

    match abbreviation.to_ascii_lowercase().as_str() {
        "jan" => Some(January),
        "feb" => Some(February),
        "mar" => Some(March),
        "apr" => Some(April),
        "may" => Some(May),
        "jun" => Some(June),
        "jul" => Some(July),
        "aug" => Some(August),
        "sep" => Some(September),
        "oct" => Some(October),
        "nov" => Some(November),
        "dec" => Some(December),
        _ => None,
    }
}
