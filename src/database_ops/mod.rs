pub mod category_share;
pub mod csv_ingest;
pub mod db;
pub mod error;
pub mod models;
pub mod product;
pub mod sales_transaction;

pub use error::{ServiceError, ServiceResult};
