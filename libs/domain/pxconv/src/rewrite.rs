use pxdom::tree::{Document, NodeId};
use pxfx::{
    pattern::{self, CurrencyPattern},
    render::format_amount,
    Ccy, ConversionError, RateTable,
};

use crate::settings::AppSettings;

// -----------------------------------------------------------------------------
// ConversionView
// -----------------------------------------------------------------------------
/// The slice of settings a rewrite pass needs.
#[derive(Debug, Clone, Copy)]
pub struct ConversionView<'a> {
    pub target_currency: Ccy,
    pub exchange_rates: &'a RateTable,
}

impl<'a> From<&'a AppSettings> for ConversionView<'a> {
    fn from(settings: &'a AppSettings) -> Self {
        Self {
            target_currency: settings.target_currency,
            exchange_rates: &settings.exchange_rates,
        }
    }
}

// -----------------------------------------------------------------------------
// rewrite
// -----------------------------------------------------------------------------
/// Replace every match of `pattern` in the text nodes under `root` with the
/// converted amount rendered in the target currency.
///
/// All matches within a node are replaced in one pass; surrounding text is
/// preserved verbatim. A literal that fails to parse keeps its original
/// text, with a diagnostic. Returns the number of text nodes that changed.
///
/// # Errors
/// - [`ConversionError::MissingRate`]: the pattern's source currency has no
///   rate in the table. No text is modified in that case.
pub fn rewrite(
    doc: &mut Document,
    root: NodeId,
    pattern: &CurrencyPattern,
    view: &ConversionView<'_>,
) -> Result<usize, ConversionError> {
    let rate = view
        .exchange_rates
        .rate_for(pattern.code)
        .ok_or(ConversionError::MissingRate { code: pattern.code })?;

    let nodes = doc.matching_text_nodes(root, |text| pattern.is_match(text));
    let mut rewritten = 0;
    for node in nodes {
        let content = doc
            .text(node)
            .expect("walker only yields text nodes")
            .to_owned();
        let replaced = pattern
            .matcher()
            .replace_all(&content, |caps: &regex::Captures<'_>| {
                let literal = &caps[1];
                match pattern.parse_amount(literal) {
                    Ok(amount) => format_amount(
                        amount * rate,
                        view.target_currency,
                        pattern.fraction_digits,
                    ),
                    Err(err) => {
                        log::warn!("keeping unparseable amount {literal:?}: {err:#}");
                        caps[0].to_owned()
                    }
                }
            });
        if replaced != content {
            doc.set_text(node, replaced.into_owned())
                .expect("walker only yields text nodes");
            rewritten += 1;
        }
    }
    Ok(rewritten)
}

/// Run every pattern in the fixed table against the subtree.
///
/// Patterns that match nothing under `root` are skipped, so a missing rate
/// only fails the pass when its pattern actually occurs.
///
/// # Errors
/// - [`ConversionError::MissingRate`]: see [`rewrite`].
pub fn rewrite_all(
    doc: &mut Document,
    root: NodeId,
    view: &ConversionView<'_>,
) -> Result<usize, ConversionError> {
    let text = doc.text_content(root);
    let mut rewritten = 0;
    for pattern in pattern::patterns() {
        if pattern.is_match(&text) {
            rewritten += rewrite(doc, root, pattern, view)?;
        }
    }
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use pxfx::ExchangeRate;
    use rstest::rstest;

    use super::*;

    fn doc_with_text(content: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let text = doc.create_text(content);
        doc.append_child(doc.root(), div).unwrap();
        doc.append_child(div, text).unwrap();
        (doc, text)
    }

    fn rates() -> RateTable {
        RateTable::new(vec![
            ExchangeRate {
                code: Ccy::TRY,
                rate: 0.031,
            },
            ExchangeRate {
                code: Ccy::BRL,
                rate: 0.2,
            },
        ])
    }

    fn view(table: &RateTable) -> ConversionView<'_> {
        ConversionView {
            target_currency: Ccy::USD,
            exchange_rates: table,
        }
    }

    #[rstest]
    #[case("1.299,99 TL", "40,30 USD")]
    #[case("Buy now: 100 TL!", "Buy now: 3,10 USD!")]
    #[case("R$ 49,90 + R$ 5,00 shipping", "9,98 USD + 1,00 USD shipping")]
    fn test_rewrite_all_replaces_every_match(#[case] content: &str, #[case] expected: &str) {
        let (mut doc, text) = doc_with_text(content);
        let table = rates();

        let rewritten = { let root = doc.root(); rewrite_all(&mut doc, root, &view(&table)) }.unwrap();

        assert_eq!(rewritten, 1);
        assert_eq!(doc.text(text), Some(expected));
    }

    #[test]
    fn test_original_substring_is_gone() {
        let (mut doc, text) = doc_with_text("price 1.299,99 TL today");
        let table = rates();

        { let root = doc.root(); rewrite_all(&mut doc, root, &view(&table)) }.unwrap();

        let after = doc.text(text).unwrap().to_owned();
        assert!(!after.contains("1.299,99 TL"));
        assert!(after.contains("40,30 USD"));
        assert!(after.starts_with("price "));
        assert!(after.ends_with(" today"));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let (mut doc, text) = doc_with_text("1.299,99 TL");
        let table = rates();

        { let root = doc.root(); rewrite_all(&mut doc, root, &view(&table)) }.unwrap();
        let once = doc.text(text).unwrap().to_owned();

        let second = { let root = doc.root(); rewrite_all(&mut doc, root, &view(&table)) }.unwrap();

        assert_eq!(second, 0);
        assert_eq!(doc.text(text), Some(once.as_str()));
    }

    #[test]
    fn test_missing_rate_leaves_text_unmodified() {
        let (mut doc, text) = doc_with_text("ARS$ 100,00");
        let table = rates();

        let res = { let root = doc.root(); rewrite_all(&mut doc, root, &view(&table)) };

        assert_eq!(res, Err(ConversionError::MissingRate { code: Ccy::ARS }));
        assert_eq!(doc.text(text), Some("ARS$ 100,00"));
    }

    #[test]
    fn test_non_matching_pattern_with_missing_rate_is_skipped() {
        let (mut doc, text) = doc_with_text("100 TL");
        let table = RateTable::new(vec![ExchangeRate {
            code: Ccy::TRY,
            rate: 0.031,
        }]);

        // ARS/BRL/RUB rates are absent but their patterns match nothing
        let rewritten = { let root = doc.root(); rewrite_all(&mut doc, root, &view(&table)) }.unwrap();

        assert_eq!(rewritten, 1);
        assert_eq!(doc.text(text), Some("3,10 USD"));
    }

    #[test]
    fn test_script_text_is_untouched() {
        let mut doc = Document::new();
        let script = doc.create_element("script");
        let code = doc.create_text("var price = 'R$ 10,00';");
        doc.append_child(doc.root(), script).unwrap();
        doc.append_child(script, code).unwrap();
        let table = rates();

        { let root = doc.root(); rewrite_all(&mut doc, root, &view(&table)) }.unwrap();

        assert_eq!(doc.text(code), Some("var price = 'R$ 10,00';"));
    }

    #[test]
    fn test_conversion_uses_multiplication_by_stored_rate() {
        // upstream usd quote eur=0.92 stores 1/0.92 for EUR-style sources;
        // here TRY with rate 1/0.92 exercises the same direction
        let (mut doc, text) = doc_with_text("100 TL");
        let table = RateTable::new(vec![ExchangeRate {
            code: Ccy::TRY,
            rate: 1.0 / 0.92,
        }]);

        { let root = doc.root(); rewrite_all(&mut doc, root, &view(&table)) }.unwrap();

        assert_eq!(doc.text(text), Some("108,70 USD"));
    }
}
