use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::Ccy;

// -----------------------------------------------------------------------------
// FractionDigits
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FractionDigits {
    pub min: u8,
    pub max: u8,
}

/// Every recognized currency renders with exactly two fraction digits.
pub const FRACTION_DIGITS: FractionDigits = FractionDigits { min: 2, max: 2 };

// -----------------------------------------------------------------------------
// CurrencyPattern
// -----------------------------------------------------------------------------
/// A recognized on-page surface form of a source currency.
///
/// The matcher captures the numeric literal as its first group; the
/// separators describe how that literal is written, not how converted output
/// is rendered (see [`crate::render`]).
#[derive(Debug, Clone)]
pub struct CurrencyPattern {
    pub code: Ccy,
    matcher: Regex,
    pub group_separator: char,
    pub decimal_separator: char,
    pub fraction_digits: FractionDigits,
}

impl CurrencyPattern {
    fn new(code: Ccy, pattern: &str, group_separator: char, decimal_separator: char) -> Self {
        Self {
            code,
            matcher: Regex::new(pattern).expect("static currency patterns are well formed"),
            group_separator,
            decimal_separator,
            fraction_digits: FRACTION_DIGITS,
        }
    }

    #[inline]
    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }

    #[inline]
    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    /// Parse a numeric literal captured by this pattern.
    ///
    /// Every group separator is stripped and the decimal separator mapped to
    /// `.` before parsing.
    ///
    /// ```
    /// use pxfx::pattern::pattern_for;
    /// use pxfx::Ccy;
    ///
    /// let pat = pattern_for(Ccy::BRL).unwrap();
    /// assert_eq!(pat.parse_amount("1.234,56").unwrap(), 1234.56);
    /// ```
    ///
    /// # Errors
    /// - The normalized literal is not a decimal number.
    pub fn parse_amount(&self, literal: &str) -> anyhow::Result<f64> {
        let normalized: String = literal
            .chars()
            .filter(|c| *c != self.group_separator)
            .map(|c| if c == self.decimal_separator { '.' } else { c })
            .collect();
        normalized
            .parse()
            .with_context(|| format!("cannot parse amount literal {literal:?}"))
    }
}

// -----------------------------------------------------------------------------
// pattern table
// -----------------------------------------------------------------------------
/// The fixed table of recognized source-currency patterns.
///
/// Patterns are mutually exclusive on real pages but nothing here enforces
/// that; rewriting tests all of them against every candidate text node.
pub fn patterns() -> &'static [CurrencyPattern] {
    static PATTERNS: Lazy<Vec<CurrencyPattern>> = Lazy::new(|| {
        vec![
            CurrencyPattern::new(Ccy::ARS, r"(?i)ARS\$\s*([0-9.,]+)", '.', ','),
            CurrencyPattern::new(Ccy::BRL, r"(?i)R\$\s*([0-9.,]+)", '.', ','),
            CurrencyPattern::new(Ccy::TRY, r"(?i)([0-9.,]+)\sTL", '.', ','),
            CurrencyPattern::new(Ccy::RUB, r"(?i)([0-9.,]+)\sруб\.", '.', ','),
        ]
    });
    &PATTERNS
}

/// Pattern whose source currency is `code`, if `code` is in the fixed set.
pub fn pattern_for(code: Ccy) -> Option<&'static CurrencyPattern> {
    patterns().iter().find(|p| p.code == code)
}

/// Whether `code` has a pattern, i.e. may appear in a rate table.
#[inline]
pub fn supported(code: Ccy) -> bool {
    pattern_for(code).is_some()
}

/// Whether any pattern matches `text`.
pub fn any_match(text: &str) -> bool {
    patterns().iter().any(|p| p.is_match(text))
}
