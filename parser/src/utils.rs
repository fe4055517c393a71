use unicode_normalization::UnicodeNormalization;

use crate::model::DOMESTIC_CURRENCY;

/// Parses a locale-formatted amount ("1 234,56", "-12,00", "1.234,56")
/// into a signed float.
///
/// Dots are thousands separators only when a decimal comma is present;
/// spaces and non-breaking spaces are always noise. Returns `None` when the
/// remaining text is not numeric - a soft failure, never an error.
pub(crate) fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let negative = s.starts_with('-');

    let mut cleaned: String = s
        .chars()
        .filter(|c| *c != '-' && *c != ' ' && *c != '\u{a0}')
        .collect();

    if cleaned.contains(',') {
        cleaned.retain(|c| c != '.');
        cleaned = cleaned.replace(',', ".");
    }

    let value: f64 = cleaned.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Canonicalizes a currency token. Anything starting with the domestic
/// currency letter ("Kc", "Kč", "KC") collapses to [`DOMESTIC_CURRENCY`];
/// other tokens are passed through uppercased.
pub(crate) fn normalize_currency(token: &str) -> Option<String> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let upper = token.to_uppercase();
    if upper.starts_with('K') {
        return Some(DOMESTIC_CURRENCY.to_string());
    }
    Some(upper)
}

/// ASCII-folded lowercase form of a line, for keyword matching only.
/// Output text always keeps the original spelling.
pub(crate) fn normalize_text(text: &str) -> String {
    text.nfkd()
        .filter(|c| c.is_ascii())
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    // parse_amount

    #[test]
    fn parse_amount_handles_domestic_grouping() {
        assert_eq!(parse_amount("1 234,56"), Some(1234.56));
        assert_eq!(parse_amount("12 345 678,00"), Some(12_345_678.0));
        assert_eq!(parse_amount("456,00"), Some(456.0));
    }

    #[test]
    fn parse_amount_handles_negative_values() {
        assert_eq!(parse_amount("-12,00"), Some(-12.0));
        assert_eq!(parse_amount("- 1 000,50"), Some(-1000.5));
    }

    #[test]
    fn parse_amount_treats_dots_as_thousands_only_with_comma() {
        // dot is a grouping separator when a decimal comma is present
        assert_eq!(parse_amount("1.234,56"), Some(1234.56));
        // without a comma the dot stays a decimal point
        assert_eq!(parse_amount("12.5"), Some(12.5));
    }

    #[test]
    fn parse_amount_strips_non_breaking_spaces() {
        assert_eq!(parse_amount("1\u{a0}234,56"), Some(1234.56));
    }

    #[test]
    fn parse_amount_returns_none_on_non_numeric_text() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("12,34,56"), None);
    }

    // normalize_currency

    #[test]
    fn normalize_currency_collapses_domestic_tokens() {
        assert_eq!(normalize_currency("Kc").as_deref(), Some("CZK"));
        assert_eq!(normalize_currency("Kč").as_deref(), Some("CZK"));
        assert_eq!(normalize_currency("KC").as_deref(), Some("CZK"));
    }

    #[test]
    fn normalize_currency_passes_other_codes_through() {
        assert_eq!(normalize_currency("USD").as_deref(), Some("USD"));
        assert_eq!(normalize_currency("eur").as_deref(), Some("EUR"));
    }

    #[test]
    fn normalize_currency_is_idempotent() {
        for token in ["Kc", "CZK", "USD", "eur", ""] {
            let once = normalize_currency(token);
            let twice = once.as_deref().and_then(normalize_currency);
            assert_eq!(once, twice, "not idempotent for {token:?}");
        }
    }

    #[test]
    fn normalize_currency_rejects_empty_input() {
        assert_eq!(normalize_currency(""), None);
        assert_eq!(normalize_currency("   "), None);
    }

    // normalize_text

    #[test]
    fn normalize_text_folds_diacritics_and_case() {
        assert_eq!(normalize_text("Výpis z účtu"), "vypis z uctu");
        assert_eq!(normalize_text("Komerční banka, a. s."), "komercni banka, a. s.");
    }

    #[test]
    fn normalize_text_keeps_plain_ascii() {
        assert_eq!(normalize_text("PLATBA KARTOU"), "platba kartou");
    }
}
