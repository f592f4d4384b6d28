//! Cell-level parsing shared by CSV ingestion and query parameters.

pub mod date;
pub mod decimal;

pub use date::{parse_date, DateError};
pub use decimal::{DecimalError, Hundredths};
