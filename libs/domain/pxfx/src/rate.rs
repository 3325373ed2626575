use crate::{pattern, Ccy};

// -----------------------------------------------------------------------------
// ConversionError
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ConversionError {
    #[error("currency {code} not found in exchange rates")]
    MissingRate { code: Ccy },
}

// -----------------------------------------------------------------------------
// ExchangeRate
// -----------------------------------------------------------------------------
/// Conversion factor for one source currency.
///
/// `rate` is expressed as target-currency units per one source-currency
/// unit. Upstream quotes come in the opposite direction (source units per
/// target unit) and are inverted at fetch time, so a source amount is
/// multiplied by `rate` to obtain the target amount.
#[derive(
    Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, schemars::JsonSchema,
)]
pub struct ExchangeRate {
    pub code: Ccy,
    pub rate: f64,
}

// -----------------------------------------------------------------------------
// RateTable
// -----------------------------------------------------------------------------
/// The cached exchange rates, replaced wholesale on every refresh.
///
/// Only codes present in the fixed pattern set occur here; everything else
/// from an upstream payload is dropped when the table is built.
#[derive(
    Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize, schemars::JsonSchema,
)]
#[serde(transparent)]
pub struct RateTable(Vec<ExchangeRate>);

//
// ctors
//
impl RateTable {
    #[inline]
    pub fn new(rates: Vec<ExchangeRate>) -> Self {
        Self(rates)
    }

    /// Build a table from upstream `(code, quote)` pairs.
    ///
    /// Codes outside the pattern set, unknown codes, and quotes that are not
    /// finite positive numbers are skipped. Each retained quote is inverted
    /// to the direction described on [`ExchangeRate`].
    ///
    /// ```
    /// use pxfx::{Ccy, RateTable};
    ///
    /// let table = RateTable::from_quotes([("brl", 5.0), ("usd", 1.0), ("xyz", 2.0)]);
    /// assert_eq!(table.rate_for(Ccy::BRL), Some(0.2));
    /// assert_eq!(table.rate_for(Ccy::USD), None);
    /// ```
    pub fn from_quotes<'a>(quotes: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let rates = quotes
            .into_iter()
            .filter_map(|(code, quote)| {
                let code = code.parse::<Ccy>().ok()?;
                if !pattern::supported(code) {
                    return None;
                }
                (quote.is_finite() && quote > 0.0).then(|| ExchangeRate {
                    code,
                    rate: 1.0 / quote,
                })
            })
            .collect();
        Self(rates)
    }
}

//
// methods
//
impl RateTable {
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, ExchangeRate> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn rate_for(&self, code: Ccy) -> Option<f64> {
        self.0.iter().find(|r| r.code == code).map(|r| r.rate)
    }

    /// Convert a source-currency amount into target-currency units.
    ///
    /// # Errors
    /// - [`ConversionError::MissingRate`]: `source` is absent from the table.
    pub fn convert(&self, amount: f64, source: Ccy) -> Result<f64, ConversionError> {
        self.rate_for(source)
            .map(|rate| amount * rate)
            .ok_or(ConversionError::MissingRate { code: source })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_from_quotes_inverts_and_filters() {
        let table = RateTable::from_quotes([
            ("ars", 350.0),
            ("brl", 5.0),
            ("eur", 0.92),
            ("jpy", 150.0),
            ("bogus", 1.0),
        ]);

        assert_eq!(table.len(), 2);
        assert_abs_diff_eq!(table.rate_for(Ccy::ARS).unwrap(), 1.0 / 350.0);
        assert_abs_diff_eq!(table.rate_for(Ccy::BRL).unwrap(), 0.2);
        assert_eq!(table.rate_for(Ccy::EUR), None);
        assert_eq!(table.rate_for(Ccy::JPY), None);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-3.5)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_from_quotes_drops_unusable_quotes(#[case] quote: f64) {
        let table = RateTable::from_quotes([("try", quote)]);

        assert!(table.is_empty());
    }

    #[test]
    fn test_convert_multiplies_by_stored_rate() {
        let table = RateTable::new(vec![ExchangeRate {
            code: Ccy::TRY,
            rate: 0.031,
        }]);

        let converted = table.convert(1299.99, Ccy::TRY).unwrap();

        assert_abs_diff_eq!(converted, 1299.99 * 0.031, epsilon = 1e-9);
    }

    #[test]
    fn test_convert_missing_rate() {
        let table = RateTable::default();

        let res = table.convert(10.0, Ccy::RUB);

        assert_eq!(res, Err(ConversionError::MissingRate { code: Ccy::RUB }));
    }

    #[test]
    fn test_serde_roundtrip() {
        let table = RateTable::new(vec![ExchangeRate {
            code: Ccy::BRL,
            rate: 0.2,
        }]);

        let ser = serde_json::to_string(&table).unwrap();
        assert_eq!(ser, r#"[{"code":"BRL","rate":0.2}]"#);

        let de: RateTable = serde_json::from_str(&ser).unwrap();
        assert_eq!(de, table);
    }
}
