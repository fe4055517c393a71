use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::normalize_text;

/// Leading date token, tolerant of spacing: "12. 3. 2024", "12.3.2024".
pub(super) static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,2}\.\s*\d{1,2}\.\s*\d{4})").unwrap());

/// Header lines always print the date with spaces after the dots.
static HEADER_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d{1,2}\.\s+\d{1,2}\.\s+\d{4}").unwrap());

/// Amount token followed by a currency token at end of line. The currency
/// is either a 3-letter code or "K" plus one word character (the printed
/// domestic currency, "Kč").
static HEADER_AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<amount>-?\s*(?:\d{1,3}(?:[ .]\d{3})*|\d+),\d{2})\s+(?P<currency>K\w|[A-Z]{3})\s*$",
    )
    .unwrap()
});

/// Bare page counter, "3/12".
static PAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+/\d+$").unwrap());

/// Masked card, spaced digit groups: "1234 56** **** 7890" with a 4-6
/// digit leading group.
pub(super) static CARD_MASK_SPACED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{4,6}\s\d{2}\*{2}\s\*{4}\s\d{4}\b").unwrap());

/// Masked card, "123456XXXX1234" form.
pub(super) static CARD_MASK_X_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d{6}X{4,6}\d{4}\b").unwrap());

/// Masked card, "123456****1234" form.
pub(super) static CARD_MASK_STAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{6}\*{4,6}\d{4}\b").unwrap());

/// Account with a prefix part: "123-4567890123/0800".
pub(super) static ACCOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,10}-\d{1,10}/\d{4}\b").unwrap());

/// Account without a prefix: "4567890123/0800".
pub(super) static ACCOUNT_SHORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,10}/\d{4}\b").unwrap());

pub(super) static VISA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bVISA\b").unwrap());

pub(super) static MASTERCARD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bMASTERCARD\b").unwrap());

pub(super) static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Boilerplate substrings (normalized form). A line containing any of them
/// is dropped wherever it appears in a block body.
const IGNORE_SUBSTRINGS: &[&str] = &[
    "vypis z uctu",
    "datum vypisu",
    "informace o uctu",
    "zustatky",
    "pocatecni zustatek",
    "konecny zustatek",
    "komercni banka, a. s.",
    "zapsana v obchodnim rejstriku",
    "trvaly pobyt",
    "cislo uctu",
    "iban",
    "hlavni mena",
    "typ uctu",
    "transakce",
];

/// Trailing "amount currency" pair found at the end of a line.
#[derive(Debug, Clone)]
pub(super) struct TrailingAmount {
    /// byte offset of the amount token within the line
    pub(super) start: usize,
    /// amount exactly as printed (may carry a leading space from the match)
    pub(super) amount: String,
    /// currency token as printed
    pub(super) currency: String,
}

/// Finds the amount+currency pair closing a line, skipping any candidate
/// whose amount continues a longer digit run ("1234 567,89" must yield
/// "567,89", not "234 567,89"). The original expressed this with a
/// `(?<!\d)` look-behind, which the regex crate does not support.
pub(super) fn find_trailing_amount(line: &str, from: usize) -> Option<TrailingAmount> {
    let mut search = from;

    loop {
        let caps = HEADER_AMOUNT_RE.captures(&line[search..])?;
        let amount = caps.name("amount")?;
        let abs_start = search + amount.start();

        let preceded_by_digit = line[..abs_start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_digit());

        if !preceded_by_digit {
            let currency = caps.name("currency")?;
            return Some(TrailingAmount {
                start: abs_start,
                amount: amount.as_str().to_string(),
                currency: currency.as_str().to_string(),
            });
        }

        // candidate continues a digit run, re-anchor just past its start
        let step = line[abs_start..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(1);
        search = abs_start + step;
    }
}

/// Blank lines, page counters and boilerplate text.
pub(super) fn is_ignored_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return true;
    }
    if PAGE_RE.is_match(trimmed) {
        return true;
    }

    let n = normalize_text(line);
    IGNORE_SUBSTRINGS.iter().any(|s| n.contains(s))
}

/// The fixed-phrase line separating a block's header/FX preamble from its
/// detail body.
pub(super) fn is_label_line(line: &str) -> bool {
    let n = normalize_text(line);
    n.contains("datum proved") && n.contains("transakce")
}

/// Message-introducer line ("Zpráva pro příjemce: ...").
pub(super) fn is_message_line(line: &str) -> bool {
    normalize_text(line).starts_with("zpr")
}

/// Transaction-header shape: spaced date at the start, amount+currency at
/// the end. Deliberately does not consult the ignore list; see the block
/// segmenter.
pub(super) fn is_header_line(line: &str) -> bool {
    let Some(date) = HEADER_DATE_RE.find(line) else {
        return false;
    };
    find_trailing_amount(line, date.end()).is_some()
}

/// Text after the first colon, or the whole line when there is none.
pub(super) fn after_colon(line: &str) -> &str {
    line.split_once(':').map(|(_, rest)| rest).unwrap_or(line).trim()
}
