use thiserror::Error;

/// Errors while reading statement text or writing the output.
///
/// These are the only hard failures the library surfaces. A block that is
/// not a transaction, or a token that is not a number, degrades to `None`
/// fields instead of an error.
#[derive(Debug, Error)]
pub enum ParseError {
    /// wrapper for std::io::Error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// wrapper for csv::Error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
