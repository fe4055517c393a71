mod detail;
mod utils;

use std::io::{BufRead, BufReader, Read};

use crate::error::ParseError;
use crate::model::{DOMESTIC_CURRENCY, Statement, Transaction};
use crate::utils::{normalize_currency, parse_amount};
use detail::BlockWalker;
use utils::*;

/// Raw text of one KB statement, segmented into per-transaction blocks.
///
/// For parsing use [`KbData::parse`], then convert with
/// `Statement::from(data)`.
///
/// Example:
/// ```rust,no_run
/// use std::io::Cursor;
/// use parser::{KbData, Statement};
/// # use parser::ParseError;
/// # fn main() -> Result<(), ParseError> {
/// let reader = Cursor::new("12. 3. 2024 SHOP -456,00 CZK\n");
/// let data = KbData::parse(reader)?;
/// let statement = Statement::from(data);
/// #     Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct KbData {
    /// lines before the first header-shaped line; no transaction can be
    /// recovered from them, kept so nothing is lost
    pub preamble: Vec<String>,

    /// one entry per transaction block; the first line of every block
    /// matches the header shape
    pub blocks: Vec<Vec<String>>,
}

impl KbData {
    /// Splits the extracted text into transaction blocks.
    ///
    /// Single forward pass: a header-shaped line closes the open block and
    /// starts a new one, anything else appends to the open block. The
    /// ignore list is deliberately not consulted here, so a boilerplate
    /// line with the header shape still opens a (spurious) block; the
    /// header parser then treats it like any other block.
    pub fn parse<R: Read>(reader: R) -> Result<Self, ParseError> {
        let buf_reader = BufReader::new(reader);

        let mut preamble: Vec<String> = Vec::new();
        let mut blocks: Vec<Vec<String>> = Vec::new();
        let mut current: Option<Vec<String>> = None;

        for line_result in buf_reader.lines() {
            let line = line_result?;
            let line = line.trim_end_matches('\r').to_string();

            if is_header_line(&line) {
                if let Some(block) = current.take() {
                    blocks.push(block);
                }
                current = Some(vec![line]);
            } else if let Some(block) = current.as_mut() {
                block.push(line);
            } else {
                preamble.push(line);
            }
        }

        if let Some(block) = current.take() {
            blocks.push(block);
        }

        Ok(KbData { preamble, blocks })
    }
}

impl From<KbData> for Statement {
    fn from(data: KbData) -> Self {
        // blocks whose header does not parse are filtered, never an error
        let transactions = data
            .blocks
            .iter()
            .filter_map(|block| block_to_transaction(block))
            .collect();

        Statement { transactions }
    }
}

/// Typed fields carved out of a block's header line.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderFields {
    /// transaction date token, verbatim
    pub date: String,

    /// cleaned remainder, `None` when empty
    pub header_description: Option<String>,

    /// same cleaned remainder; the duplication is part of the schema
    pub counterparty: String,

    /// counterparty account, if one of the two account shapes matched
    pub account: Option<String>,

    /// masked card number, if one of the three mask shapes matched
    pub card: Option<String>,

    /// "VISA" / "MASTERCARD" when the keyword appeared in the remainder
    pub card_network: Option<String>,

    /// principal amount exactly as printed
    pub amount_raw: Option<String>,

    /// principal amount as a signed float
    pub amount: Option<f64>,

    /// canonicalized header currency
    pub currency: Option<String>,
}

impl HeaderFields {
    /// Parses a header line. `None` means the line does not open a
    /// transaction block at all.
    pub fn from_line(line: &str) -> Option<Self> {
        let date_caps = DATE_RE.captures(line)?;
        let date = date_caps.get(1)?.as_str().trim().to_string();
        let date_end = date_caps.get(0)?.end();

        let trailing = find_trailing_amount(line, 0);
        let (amount_raw, amount, currency, amount_start) = match &trailing {
            Some(t) => (
                Some(t.amount.trim().to_string()),
                parse_amount(&t.amount),
                normalize_currency(&t.currency),
                t.start,
            ),
            None => (None, None, None, line.len()),
        };

        let mut remainder = line[date_end..amount_start.max(date_end)].trim().to_string();

        let card_network = if VISA_RE.is_match(&remainder) {
            Some("VISA")
        } else if MASTERCARD_RE.is_match(&remainder) {
            Some("MASTERCARD")
        } else {
            None
        };

        let card = CARD_MASK_SPACED_RE
            .find(&remainder)
            .or_else(|| CARD_MASK_X_RE.find(&remainder))
            .or_else(|| CARD_MASK_STAR_RE.find(&remainder))
            .map(|m| m.as_str().trim().to_string());
        if let Some(card) = &card {
            remainder = remainder.replace(card.as_str(), " ");
        }

        if let Some(network) = card_network {
            let word_re = match network {
                "VISA" => &*VISA_RE,
                _ => &*MASTERCARD_RE,
            };
            remainder = word_re.replace_all(&remainder, " ").into_owned();
        }

        let account = ACCOUNT_RE
            .find(&remainder)
            .or_else(|| ACCOUNT_SHORT_RE.find(&remainder))
            .map(|m| m.as_str().to_string());
        if let Some(account) = &account {
            remainder = remainder.replace(account.as_str(), " ");
        }

        let counterparty = MULTI_SPACE_RE
            .replace_all(&remainder, " ")
            .trim()
            .to_string();
        let header_description = if counterparty.is_empty() {
            None
        } else {
            Some(counterparty.clone())
        };

        Some(HeaderFields {
            date,
            header_description,
            counterparty,
            account,
            card,
            card_network: card_network.map(str::to_string),
            amount_raw,
            amount,
            currency,
        })
    }
}

/// Assembles one record from a block, or `None` when the block's first
/// line fails the header parse.
fn block_to_transaction(block: &[String]) -> Option<Transaction> {
    let header = HeaderFields::from_line(block.first()?)?;

    let mut tx = Transaction::new(header.date);
    tx.header_description = header.header_description;
    tx.counterparty = Some(header.counterparty);
    tx.counterparty_account = header.account;
    tx.card = header.card;
    tx.card_network = header.card_network;
    tx.amount_raw = header.amount_raw;
    tx.amount = header.amount;
    tx.header_currency = header.currency;

    // the header line itself can carry the label phrases; only the body
    // lines are candidates
    let Some(label_idx) = block[1..]
        .iter()
        .position(|l| is_label_line(l))
        .map(|i| i + 1)
    else {
        // header-only block: no detail body to walk
        finalize(&mut tx, block);
        return Some(tx);
    };

    let mut walker = BlockWalker::new(tx);
    for line in &block[1..label_idx] {
        walker.preamble_line(line);
    }
    walker.walk_detail(&block[label_idx + 1..]);

    let mut tx = walker.finish();
    finalize(&mut tx, block);
    Some(tx)
}

/// Derived defaults applied once a block's lines are exhausted.
fn finalize(tx: &mut Transaction, block: &[String]) {
    if tx.fx_currency.is_none() {
        tx.fx_currency = Some(
            tx.header_currency
                .clone()
                .unwrap_or_else(|| DOMESTIC_CURRENCY.to_string()),
        );
    }
    tx.block_text = Some(block.join(" | "));
}
