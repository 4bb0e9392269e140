use regex::Regex;
use rust_decimal::Decimal;
use std::{str::FromStr, sync::LazyLock};

use super::{Amount, MappingError};

// The broker drops a trailing zero in the second decimal place, but every amount we deal with has at least two.
const MIN_PRECISION: u32 = 2;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([-+])?([0-9]+(?:,[0-9]{3})*)(?:\.([0-9]+))?$").unwrap());

/// A number as sent by the broker, with the count of decimal digits to show.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct ParsedNumber {
    pub value: Decimal,
    pub precision: u32,
}

impl ParsedNumber {
    pub fn parse(text: &str) -> Result<Self, MappingError> {
        let invalid = || MappingError::InvalidAmount(text.to_string());

        let captures = NUMBER.captures(text.trim()).ok_or_else(invalid)?;
        let negative = captures.get(1).is_some_and(|sign| sign.as_str() == "-");
        let integral = captures[2].replace(',', "");
        let fractional = captures.get(3).map(|m| m.as_str()).unwrap_or_default();

        let digits = if fractional.is_empty() {
            integral
        } else {
            format!("{integral}.{fractional}")
        };
        let mut value = Decimal::from_str(&digits).map_err(|_| invalid())?;
        let precision = (fractional.len() as u32).max(MIN_PRECISION);
        value.rescale(precision);
        if negative {
            value = -value;
        }

        Ok(ParsedNumber { value, precision })
    }

    pub fn negated(self) -> Self {
        ParsedNumber {
            value: -self.value,
            ..self
        }
    }

    /// The reciprocal, as used to turn an exchange rate into a price in the other direction.
    pub fn inverted(self) -> Result<Self, MappingError> {
        let value = Decimal::ONE
            .checked_div(self.value)
            .ok_or_else(|| MappingError::InvalidAmount(self.value.to_string()))?;

        Ok(ParsedNumber { value, ..self })
    }

    pub fn into_amount(self, commodity: impl Into<String>) -> Amount {
        Amount::new(self.value, commodity, self.precision)
    }
}

/// Parse a broker number into its exact value and display precision.
pub fn parse_amount(text: &str) -> Result<(Decimal, u32), MappingError> {
    ParsedNumber::parse(text).map(|number| (number.value, number.precision))
}

pub(crate) fn amount(text: &str, commodity: &str) -> Result<Amount, MappingError> {
    ParsedNumber::parse(text).map(|number| number.into_amount(commodity))
}

pub(crate) fn negated_amount(text: &str, commodity: &str) -> Result<Amount, MappingError> {
    ParsedNumber::parse(text).map(|number| number.negated().into_amount(commodity))
}
