use chrono::NaiveDate;
use serde::Serialize;

/// ISO code of the statement's home currency, used whenever no explicit
/// currency is detected.
pub const DOMESTIC_CURRENCY: &str = "CZK";

/// Central/root structure of the library, containing all transactions
/// recovered from one statement, in block order.
#[derive(Debug, Default, PartialEq)]
pub struct Statement {
    /// transactions
    pub transactions: Vec<Transaction>,
}

impl Statement {
    /// Earliest and latest transaction date found in the statement.
    ///
    /// `None` when no record carries a parseable date.
    pub fn period(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates: Vec<NaiveDate> = self
            .transactions
            .iter()
            .filter_map(|tx| tx.date_parsed())
            .collect();

        let from = *dates.iter().min()?;
        let until = *dates.iter().max()?;
        Some((from, until))
    }
}

/// One statement transaction.
///
/// Serialized fields are declared in output column order; the serde renames
/// are the CSV column names of the statement schema. Fields marked
/// `#[serde(skip)]` are working values used while a block is assembled and
/// never reach the output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transaction {
    /// transaction date, verbatim date token from the header line
    #[serde(rename = "Datum")]
    pub date: String,

    /// cleaned header remainder; `None` when the remainder was empty
    #[serde(rename = "Popis_hlavicka")]
    pub header_description: Option<String>,

    /// counterparty name, same cleaned remainder as the header description
    #[serde(rename = "Protistrana")]
    pub counterparty: Option<String>,

    /// counterparty account, `digits-digits/bank` or `digits/bank`
    #[serde(rename = "Protiucet")]
    pub counterparty_account: Option<String>,

    /// masked card number as printed on the statement
    #[serde(rename = "Karta")]
    pub card: Option<String>,

    /// principal amount parsed from the header, signed
    #[serde(rename = "Castka_CZK")]
    pub amount: Option<f64>,

    /// principal amount exactly as printed
    #[serde(rename = "Castka_raw")]
    pub amount_raw: Option<String>,

    /// execution date from the detail main line, verbatim
    #[serde(rename = "Datum_provedeni")]
    pub execution_date: Option<String>,

    /// transaction code, first token of the detail main line
    #[serde(rename = "Kod_transakce")]
    pub transaction_code: Option<String>,

    /// transaction type text, possibly accumulated over several lines
    #[serde(rename = "Typ_transakce")]
    pub transaction_type: Option<String>,

    /// variable payment symbol
    #[serde(rename = "VS")]
    pub variable_symbol: Option<String>,

    /// specific payment symbol
    #[serde(rename = "SS")]
    pub specific_symbol: Option<String>,

    /// constant payment symbol
    #[serde(rename = "KS")]
    pub constant_symbol: Option<String>,

    /// message for the recipient; multiple messages joined with " | "
    #[serde(rename = "Zprava")]
    pub message: Option<String>,

    /// ATM identifier
    #[serde(rename = "ATM_ID")]
    pub atm_id: Option<String>,

    /// foreign-exchange currency; defaults to the header currency or
    /// [`DOMESTIC_CURRENCY`] when the block never names one
    #[serde(rename = "FX_mena")]
    pub fx_currency: Option<String>,

    /// foreign-exchange rate, digits as printed with spaces stripped
    #[serde(rename = "FX_kurz")]
    pub fx_rate: Option<String>,

    /// quote currency of the exchange rate
    #[serde(rename = "FX_kurz_mena")]
    pub fx_rate_currency: Option<String>,

    /// recognized-but-unmapped body lines, joined with " | "
    #[serde(rename = "Doplnek")]
    pub supplement: Option<String>,

    /// verbatim copy of the whole source block, joined with " | "
    #[serde(rename = "Blok_text")]
    pub block_text: Option<String>,

    /// card network detected in the header (derived, not persisted)
    #[serde(skip)]
    pub card_network: Option<String>,

    #[serde(skip)]
    pub(crate) header_currency: Option<String>,

    #[serde(skip)]
    pub(crate) fx_date: Option<String>,

    #[serde(skip)]
    pub(crate) fx_amount: Option<String>,

    #[serde(skip)]
    pub(crate) fx_info: Option<String>,

    #[serde(skip)]
    pub(crate) own_description: Option<String>,

    #[serde(skip)]
    pub(crate) related_payment_id: Option<String>,
}

impl Transaction {
    /// Empty record anchored to its header date; everything else is filled
    /// in by the block walker.
    pub(crate) fn new(date: String) -> Self {
        Transaction {
            date,
            ..Transaction::default()
        }
    }

    /// Transaction date as a typed date, if the verbatim token parses.
    pub fn date_parsed(&self) -> Option<NaiveDate> {
        parse_statement_date(&self.date)
    }

    /// Execution date as a typed date, if present and parseable.
    pub fn execution_date_parsed(&self) -> Option<NaiveDate> {
        parse_statement_date(self.execution_date.as_deref()?)
    }
}

/// How repeated writes to the same string field combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// keep the value that was set first
    FirstWins,
    /// join successive values with " | "
    Append,
}

/// Writes `value` into `slot` under the given policy. Empty values are
/// dropped regardless of policy.
pub(crate) fn merge_field(slot: &mut Option<String>, value: &str, policy: MergePolicy) {
    if value.is_empty() {
        return;
    }

    match policy {
        MergePolicy::FirstWins => {
            if slot.is_none() {
                *slot = Some(value.to_string());
            }
        }
        MergePolicy::Append => match slot {
            Some(existing) => {
                existing.push_str(" | ");
                existing.push_str(value);
            }
            None => *slot = Some(value.to_string()),
        },
    }
}

/// Dates on the statement look like "12. 3. 2024" or "12.3.2024"; the
/// spacing is not stable, so it is dropped before parsing.
fn parse_statement_date(raw: &str) -> Option<NaiveDate> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    NaiveDate::parse_from_str(&compact, "%d.%m.%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // merge_field

    #[test]
    fn merge_field_first_wins_keeps_initial_value() {
        let mut slot = None;
        merge_field(&mut slot, "first", MergePolicy::FirstWins);
        merge_field(&mut slot, "second", MergePolicy::FirstWins);
        assert_eq!(slot.as_deref(), Some("first"));
    }

    #[test]
    fn merge_field_append_joins_with_separator() {
        let mut slot = None;
        merge_field(&mut slot, "one", MergePolicy::Append);
        merge_field(&mut slot, "two", MergePolicy::Append);
        assert_eq!(slot.as_deref(), Some("one | two"));
    }

    #[test]
    fn merge_field_drops_empty_values() {
        let mut slot = Some("kept".to_string());
        merge_field(&mut slot, "", MergePolicy::Append);
        assert_eq!(slot.as_deref(), Some("kept"));

        let mut empty = None;
        merge_field(&mut empty, "", MergePolicy::FirstWins);
        assert!(empty.is_none());
    }

    // date accessors

    #[test]
    fn date_parsed_handles_spaced_and_compact_tokens() {
        let mut tx = Transaction::new("12. 3. 2024".to_string());
        assert_eq!(
            tx.date_parsed(),
            Some(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap())
        );

        tx.date = "1.12.2023".to_string();
        assert_eq!(
            tx.date_parsed(),
            Some(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap())
        );
    }

    #[test]
    fn date_parsed_returns_none_on_garbage() {
        let tx = Transaction::new("not a date".to_string());
        assert!(tx.date_parsed().is_none());
    }

    #[test]
    fn execution_date_parsed_requires_field() {
        let mut tx = Transaction::new("12. 3. 2024".to_string());
        assert!(tx.execution_date_parsed().is_none());

        tx.execution_date = Some("13. 3. 2024".to_string());
        assert_eq!(
            tx.execution_date_parsed(),
            Some(NaiveDate::from_ymd_opt(2024, 3, 13).unwrap())
        );
    }

    // Statement::period

    #[test]
    fn period_spans_min_and_max_transaction_dates() {
        let stmt = Statement {
            transactions: vec![
                Transaction::new("20. 3. 2024".to_string()),
                Transaction::new("12. 3. 2024".to_string()),
                Transaction::new("25. 3. 2024".to_string()),
            ],
        };

        let (from, until) = stmt.period().unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
        assert_eq!(until, NaiveDate::from_ymd_opt(2024, 3, 25).unwrap());
    }

    #[test]
    fn period_is_none_for_empty_statement() {
        assert!(Statement::default().period().is_none());
    }
}
