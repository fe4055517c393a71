pub mod error;
pub mod kb;
pub mod model;
pub mod serialization;

mod utils;

pub use crate::error::ParseError;
pub use crate::kb::{HeaderFields, KbData};
pub use crate::model::{DOMESTIC_CURRENCY, Statement, Transaction};
