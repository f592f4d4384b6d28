// HTTP request handlers for API endpoints

use crate::api::error::ApiError;
use crate::api::models::*;
use crate::api::upload::read_csv_upload;
use crate::database_ops::category_share::{self, DEFAULT_SIGNIFICANT_LIMIT};
use crate::database_ops::db::Db;
use crate::database_ops::{product, sales_transaction, ServiceResult};
use crate::normalization::parse_date;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;

type HandlerResult = Result<HttpResponse, ApiError>;

fn require_period(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let (Some(start), Some(end)) = (
        start.filter(|s| !s.trim().is_empty()),
        end.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Start date and End date are required".to_string(),
        ));
    };
    let start = parse_date(start).map_err(|e| ApiError::BadRequest(format!("start_date: {e}")))?;
    let end = parse_date(end).map_err(|e| ApiError::BadRequest(format!("end_date: {e}")))?;
    Ok((start, end))
}

/// Run a CSV parse on actix's blocking thread pool.
async fn parse_blocking<T, F>(parse: F) -> Result<T, ApiError>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    web::block(parse)
        .await
        .map_err(|e| ApiError::Internal(format!("CSV parsing was interrupted: {e}")))?
        .map_err(ApiError::from)
}

/// Health check endpoint
pub async fn health_check(db: web::Data<Db>, settings: web::Data<ApiSettings>) -> HttpResponse {
    let database = match db.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unreachable");
            "disconnected"
        }
    };

    HttpResponse::Ok().json(ApiResponse::success(HealthResponse {
        database,
        uptime_seconds: settings.started_at.elapsed().as_secs(),
    }))
}

pub async fn upload_products(
    db: web::Data<Db>,
    settings: web::Data<ApiSettings>,
    payload: Multipart,
) -> HandlerResult {
    let upload = read_csv_upload(payload, settings.upload_max_bytes).await?;
    let filename = upload.filename.clone();
    let links = parse_blocking(move || product::parse_products_csv(&upload.text)).await?;
    let summary = product::insert_product_categories(&db, &links).await?;
    tracing::info!(filename = %filename, rows = summary.rows_inserted, "product csv ingested");

    Ok(HttpResponse::Ok().json(ApiResponse::success(UploadResponse::new(
        "Products were successfully uploaded.",
        summary,
    ))))
}

pub async fn upload_sales_transactions(
    db: web::Data<Db>,
    settings: web::Data<ApiSettings>,
    payload: Multipart,
) -> HandlerResult {
    let upload = read_csv_upload(payload, settings.upload_max_bytes).await?;
    let filename = upload.filename.clone();
    let transactions =
        parse_blocking(move || sales_transaction::parse_sales_transactions_csv(&upload.text))
            .await?;
    let summary = sales_transaction::insert_sales_transactions(&db, &transactions).await?;
    tracing::info!(filename = %filename, rows = summary.rows_inserted, "sales csv ingested");

    Ok(HttpResponse::Ok().json(ApiResponse::success(UploadResponse::new(
        "Transactions were successfully uploaded.",
        summary,
    ))))
}

pub async fn upload_category_shares(
    db: web::Data<Db>,
    settings: web::Data<ApiSettings>,
    payload: Multipart,
) -> HandlerResult {
    let upload = read_csv_upload(payload, settings.upload_max_bytes).await?;
    let filename = upload.filename.clone();
    let shares =
        parse_blocking(move || category_share::parse_category_share_csv(&upload.text)).await?;
    let summary = category_share::insert_category_shares(&db, &shares).await?;
    tracing::info!(filename = %filename, rows = summary.rows_inserted, "category share csv ingested");

    Ok(HttpResponse::Ok().json(ApiResponse::success(UploadResponse::new(
        "Category Shares were successfully uploaded.",
        summary,
    ))))
}

/// Total revenue between `start_date` and `end_date`, inclusive.
pub async fn total_sales(db: web::Data<Db>, query: web::Query<PeriodQuery>) -> HandlerResult {
    let (start_date, end_date) =
        require_period(query.start_date.as_deref(), query.end_date.as_deref())?;
    let total_sales =
        sales_transaction::total_revenue_for_period(&db, start_date, end_date).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(TotalSalesResponse {
        start_date,
        end_date,
        total_sales,
    })))
}

/// Revenue per unique combination of `?dimensions=a,b,c`.
pub async fn sales_by_dimensions(
    db: web::Data<Db>,
    query: web::Query<DimensionsQuery>,
) -> HandlerResult {
    let raw = query.dimensions.as_deref().unwrap_or_default();
    let dimensions = sales_transaction::parse_dimensions(raw)?;
    let sales_by_dimensions = sales_transaction::sales_by_dimensions(&db, &dimensions).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(SalesByDimensionsResponse {
        dimensions,
        sales_by_dimensions,
    })))
}

pub async fn significant_category_shares(
    db: web::Data<Db>,
    query: web::Query<SignificantQuery>,
) -> HandlerResult {
    let (start_date, end_date) =
        require_period(query.start_date.as_deref(), query.end_date.as_deref())?;
    let limit = query.limit.unwrap_or(DEFAULT_SIGNIFICANT_LIMIT);
    let significant_category_shares =
        category_share::significant_category_shares(&db, start_date, end_date, limit).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(SignificantSharesResponse {
        start_date,
        end_date,
        limit,
        significant_category_shares,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn period_requires_both_dates() {
        assert!(require_period(Some("2024-01-01"), None).is_err());
        assert!(require_period(Some(" "), Some("2024-01-01")).is_err());
        let (start, end) = require_period(Some("2024-01-01"), Some("2024-12-31")).unwrap();
        assert!(start < end);
    }

    #[test]
    fn period_reports_which_date_is_malformed() {
        let err = require_period(Some("2024-01-01"), Some("31.12.2024")).unwrap_err();
        assert!(err.to_string().starts_with("end_date: "), "{err}");
    }

    #[test]
    fn period_rejects_years_outside_four_digits() {
        let err = require_period(Some("2024-01-01"), Some("+10000-12-31")).unwrap_err();
        assert!(err.to_string().starts_with("end_date: "), "{err}");
        let err = require_period(Some("-0001-01-01"), Some("2024-12-31")).unwrap_err();
        assert!(err.to_string().starts_with("start_date: "), "{err}");
    }

    #[actix_web::test]
    async fn blocking_parse_keeps_the_error_tier() {
        let text = String::from("product_id,quantity,revenue,date\n3,2,4.50,2024-03-01\n");
        let rows = parse_blocking(move || sales_transaction::parse_sales_transactions_csv(&text))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].revenue.minor(), 450);

        let err = parse_blocking(|| category_share::parse_category_share_csv("data"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), actix_web::http::StatusCode::BAD_REQUEST);

        let err = parse_blocking(|| product::parse_products_csv("product_id,category_id\nx,1\n"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
