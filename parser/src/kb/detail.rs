use once_cell::sync::Lazy;
use regex::Regex;

use super::utils::{DATE_RE, after_colon, is_ignored_line, is_message_line};
use crate::model::{MergePolicy, Transaction, merge_field};
use crate::utils::{normalize_currency, normalize_text};

/// FX detail: compact date, amount, 3-letter currency anywhere in the line.
static FX_DATE_AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<date>\d{1,2}\.\d{1,2}\.\d{4})\s+(?P<amount>\d[\d\s\.]*,\d{2})\s+(?P<currency>[A-Z]{3})\b",
    )
    .unwrap()
});

/// FX detail: amount + currency opening the line.
static FX_AMOUNT_ONLY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<amount>\d[\d\s\.]*,\d{2})\s+(?P<currency>[A-Z]{3})\b").unwrap()
});

/// Unit rate quotation, "1 USD = 22,50 Kč".
static FX_RATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*1\s+[A-Z]{3}\s*=\s*(?P<rate>\d[\d\s]*,\d+)\s*(?P<quote>K\w)\b").unwrap()
});

/// Connector words a wrapped transaction type tends to end with.
const CONTINUATION_TRIGGERS: &[&str] = &[
    "na",
    "pres",
    "za",
    "pro",
    "do",
    "od",
    "v",
    "ve",
    "s",
    "z",
    "extra",
    "vyrovnavaci",
];

/// Tries the three FX line shapes in order, first match wins; every field
/// is first-wins so repeated FX lines cannot overwrite anything.
///
/// Returns whether the line was recognized as FX-related at all, which the
/// walker uses for routing.
pub(super) fn parse_fx_line(line: &str, tx: &mut Transaction) -> bool {
    if let Some(caps) = FX_RATE_RE.captures(line) {
        if let Some(rate) = caps.name("rate") {
            let rate = rate.as_str().replace(' ', "");
            merge_field(&mut tx.fx_rate, &rate, MergePolicy::FirstWins);
        }
        if tx.fx_rate_currency.is_none() {
            if let Some(quote) = caps.name("quote") {
                tx.fx_rate_currency = normalize_currency(quote.as_str());
            }
        }
        return true;
    }

    if let Some(caps) = FX_DATE_AMOUNT_RE.captures(line) {
        if let Some(date) = caps.name("date") {
            merge_field(&mut tx.fx_date, date.as_str(), MergePolicy::FirstWins);
        }
        if let Some(amount) = caps.name("amount") {
            let amount = amount.as_str().replace(' ', "");
            merge_field(&mut tx.fx_amount, &amount, MergePolicy::FirstWins);
        }
        if let Some(currency) = caps.name("currency") {
            merge_field(&mut tx.fx_currency, currency.as_str(), MergePolicy::FirstWins);
        }
        if let Some(whole) = caps.get(0) {
            // text before the match is an auxiliary note, e.g. the merchant
            let prefix = line[..whole.start()].trim();
            merge_field(&mut tx.fx_info, prefix, MergePolicy::FirstWins);
        }
        return true;
    }

    if let Some(caps) = FX_AMOUNT_ONLY_RE.captures(line) {
        if let Some(amount) = caps.name("amount") {
            let amount = amount.as_str().replace(' ', "");
            merge_field(&mut tx.fx_amount, &amount, MergePolicy::FirstWins);
        }
        if let Some(currency) = caps.name("currency") {
            merge_field(&mut tx.fx_currency, currency.as_str(), MergePolicy::FirstWins);
        }
        return true;
    }

    // a rate line in some other shape is still consumed, not overflowed
    line.to_lowercase().contains("kurz")
}

/// Alphanumeric fragment of at least 8 characters with a digit somewhere,
/// i.e. the tail of a transaction code split by a line wrap.
fn looks_like_code_fragment(token: &str) -> bool {
    let token = token.trim();
    if token.len() < 8 {
        return false;
    }
    if !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    token.chars().any(|c| c.is_ascii_digit())
}

/// Whether a body line is a continuation of the transaction type text.
fn should_append_type(line: &str, current_type: Option<&str>) -> bool {
    if line.trim().is_empty() {
        return false;
    }
    if line.contains(':') || line.contains(" - ") || line.contains('/') || line.contains('*') {
        return false;
    }

    let n_line = normalize_text(line);
    if n_line.starts_with("popis pro me") || n_line.starts_with("id souvisejici") {
        return false;
    }

    let n_type = normalize_text(current_type.unwrap_or(""));
    let Some(last_word) = n_type.split_whitespace().last() else {
        return false;
    };

    if CONTINUATION_TRIGGERS.contains(&last_word) {
        return true;
    }

    // a lone-word type followed by a short, digit-free line is usually a
    // wrapped type as well
    n_type.split_whitespace().count() == 1
        && line.split_whitespace().count() <= 2
        && !line.chars().any(|c| c.is_ascii_digit())
}

/// Walks the body of one block, phase by phase, with exclusive ownership
/// of the in-progress record. [`BlockWalker::finish`] hands the record
/// back once the block is exhausted.
pub(super) struct BlockWalker {
    tx: Transaction,
    extra_lines: Vec<String>,
}

impl BlockWalker {
    pub(super) fn new(tx: Transaction) -> Self {
        BlockWalker {
            tx,
            extra_lines: Vec::new(),
        }
    }

    /// Phase A: a line between the header and the label line is either FX
    /// detail or miscellaneous.
    pub(super) fn preamble_line(&mut self, line: &str) {
        if parse_fx_line(line, &mut self.tx) {
            return;
        }
        self.misc_line(line);
    }

    /// Phases B-D over the lines after the label line.
    pub(super) fn walk_detail(&mut self, lines: &[String]) {
        let mut idx = 0;

        // anything before the first date-anchored line is still preamble
        while idx < lines.len() && !DATE_RE.is_match(&lines[idx]) {
            let line = &lines[idx];
            if !parse_fx_line(line, &mut self.tx) {
                self.misc_line(line);
            }
            idx += 1;
        }

        if idx >= lines.len() {
            return;
        }

        // phase B: the detail main line
        self.detail_main_line(&lines[idx]);
        idx += 1;

        // phase C: code fragments, type continuations, misc
        while idx < lines.len() {
            let line = &lines[idx];

            // the FX test applies its side effects even when it stops the
            // scan; the stopping line is then reprocessed below
            if is_message_line(line) || parse_fx_line(line, &mut self.tx) {
                break;
            }
            if DATE_RE.is_match(line) {
                break;
            }
            if is_ignored_line(line) {
                idx += 1;
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if self.tx.transaction_code.is_some()
                && tokens.first().is_some_and(|t| looks_like_code_fragment(t))
            {
                let code = self.tx.transaction_code.take().unwrap_or_default();
                self.tx.transaction_code = Some(format!("{code}{}", tokens[0]));
                if tokens.len() > 1 {
                    let extra_type = tokens[1..].join(" ");
                    self.append_type(&extra_type);
                }
                idx += 1;
                continue;
            }

            if should_append_type(line, self.tx.transaction_type.as_deref()) {
                self.append_type(line.trim());
            } else {
                self.misc_line(line);
            }
            idx += 1;
        }

        // phase D: trailing sweep, starting with the line that stopped C
        for line in &lines[idx..] {
            self.trailing_line(line);
        }
    }

    /// Returns the finished record; supplement lines collapse into one
    /// pipe-joined field.
    pub(super) fn finish(mut self) -> Transaction {
        let non_empty: Vec<&str> = self
            .extra_lines
            .iter()
            .map(String::as_str)
            .filter(|l| !l.is_empty())
            .collect();
        if !non_empty.is_empty() {
            self.tx.supplement = Some(non_empty.join(" | "));
        }
        self.tx
    }

    /// Phase B: date, transaction code, type text and the three payment
    /// symbols. Fewer than four tokens after the date means only the
    /// execution date is trustworthy.
    fn detail_main_line(&mut self, line: &str) {
        let Some(caps) = DATE_RE.captures(line) else {
            return;
        };
        let (Some(whole), Some(date)) = (caps.get(0), caps.get(1)) else {
            return;
        };

        self.tx.execution_date = Some(date.as_str().trim().to_string());

        let rest = line[whole.end()..].trim();
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        if tokens.len() < 4 {
            return;
        }

        let n = tokens.len();
        self.tx.transaction_code = Some(tokens[0].to_string());
        self.tx.variable_symbol = clean_symbol(tokens[n - 3]);
        self.tx.specific_symbol = clean_symbol(tokens[n - 2]);
        self.tx.constant_symbol = clean_symbol(tokens[n - 1]);

        let type_text = tokens[1..n - 3].join(" ");
        self.tx.transaction_type = if type_text.is_empty() {
            None
        } else {
            Some(type_text)
        };
    }

    /// Phase D: messages, late FX lines, misc.
    fn trailing_line(&mut self, line: &str) {
        if is_ignored_line(line) {
            return;
        }
        if is_message_line(line) {
            merge_field(&mut self.tx.message, after_colon(line), MergePolicy::Append);
            return;
        }
        if parse_fx_line(line, &mut self.tx) {
            return;
        }
        self.misc_line(line);
    }

    /// Labeled miscellaneous fields; anything unrecognized is kept
    /// verbatim as supplement.
    fn misc_line(&mut self, line: &str) {
        if is_ignored_line(line) {
            return;
        }

        let n = normalize_text(line);
        if n.starts_with("popis pro me") {
            merge_field(
                &mut self.tx.own_description,
                after_colon(line),
                MergePolicy::FirstWins,
            );
            return;
        }
        if n.starts_with("id souvisejici platby") {
            merge_field(
                &mut self.tx.related_payment_id,
                after_colon(line),
                MergePolicy::FirstWins,
            );
            return;
        }
        if n.starts_with("atm id") {
            merge_field(&mut self.tx.atm_id, after_colon(line), MergePolicy::FirstWins);
            return;
        }

        self.extra_lines.push(line.trim().to_string());
    }

    fn append_type(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let current = self.tx.transaction_type.take().unwrap_or_default();
        let joined = format!("{current} {text}");
        self.tx.transaction_type = Some(joined.trim().to_string());
    }
}

fn clean_symbol(token: &str) -> Option<String> {
    if token == "-" {
        None
    } else {
        Some(token.to_string())
    }
}
