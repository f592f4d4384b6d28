// API request/response models (DTOs)

use crate::database_ops::models::{CategoryShareChange, DimensionGroup, IngestSummary};
use crate::database_ops::sales_transaction::Dimension;
use crate::normalization::Hundredths;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// Standard success envelope: `status`, the payload's own fields, and `meta`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    #[serde(flatten)]
    pub data: T,
    pub meta: Meta,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: STATUS_SUCCESS,
            data,
            meta: Meta::now(),
        }
    }
}

/// Body of every 4xx/5xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR,
            detail: detail.into(),
        }
    }
}

/// Metadata included in all successful API responses
#[derive(Debug, Serialize)]
pub struct Meta {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub version: String,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: uuid::Uuid::new_v4().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Per-process settings shared with handlers through `web::Data`.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub upload_max_bytes: usize,
    pub started_at: Instant,
}

impl ApiSettings {
    pub fn new(upload_max_bytes: usize) -> Self {
        Self {
            upload_max_bytes,
            started_at: Instant::now(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub database: &'static str,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub detail: String,
    #[serde(flatten)]
    pub summary: IngestSummary,
}

impl UploadResponse {
    pub fn new(detail: impl Into<String>, summary: IngestSummary) -> Self {
        Self {
            detail: detail.into(),
            summary,
        }
    }
}

/// `?start_date=&end_date=`; both are checked by the handler so a missing
/// value gets the JSON error envelope rather than an extractor error.
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignificantQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DimensionsQuery {
    pub dimensions: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TotalSalesResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_sales: Hundredths,
}

#[derive(Debug, Serialize)]
pub struct SalesByDimensionsResponse {
    pub dimensions: Vec<Dimension>,
    pub sales_by_dimensions: Vec<DimensionGroup>,
}

#[derive(Debug, Serialize)]
pub struct SignificantSharesResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub limit: u32,
    pub significant_category_shares: Vec<CategoryShareChange>,
}
