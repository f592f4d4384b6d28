// Row types written by CSV ingestion and read back by the aggregation queries

use crate::normalization::Hundredths;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProductCategoryLink {
    pub product_id: i64,
    pub category_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSalesTransaction {
    pub date: NaiveDate,
    pub product_id: i64,
    pub quantity: i64,
    pub revenue: Hundredths,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategoryShare {
    pub date: NaiveDate,
    pub product_id: i64,
    pub market_share: Hundredths,
}

/// Outcome of one CSV upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub rows_inserted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products_created: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories_created: Option<u64>,
}

/// Revenue for one unique combination of the requested dimensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionGroup {
    #[serde(flatten)]
    pub key: Map<String, Value>,
    pub total_revenue: Hundredths,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryShareChange {
    pub category_id: i64,
    pub category_name: Option<String>,
    pub market_share_change: Hundredths,
}
