// API route configuration

use crate::api::{error, handlers};
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .service(
            web::scope("/api")
                // Liveness (both spellings kept for probes)
                .route("/health", web::get().to(handlers::health_check))
                .route("/monitoring/health", web::get().to(handlers::health_check))
                .service(
                    web::scope("/product")
                        .route("/csv", web::post().to(handlers::upload_products)),
                )
                .service(
                    web::scope("/sales-transaction")
                        .route("/csv", web::post().to(handlers::upload_sales_transactions))
                        .route("/total", web::get().to(handlers::total_sales))
                        .route("/dimentions", web::get().to(handlers::sales_by_dimensions))
                        .route("/dimensions", web::get().to(handlers::sales_by_dimensions)),
                )
                .service(
                    web::scope("/category-share")
                        .route("/csv", web::post().to(handlers::upload_category_shares))
                        .route(
                            "/significant",
                            web::get().to(handlers::significant_category_shares),
                        ),
                ),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ApiSettings;
    use crate::database_ops::db::Db;
    use actix_web::{http::header, http::StatusCode, test, App};
    use serde_json::{json, Value};

    const BOUNDARY: &str = "gobble-test-boundary";

    macro_rules! test_app {
        ($db:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($db))
                    .app_data(web::Data::new(ApiSettings::new(64 * 1024)))
                    .configure(configure_routes),
            )
            .await
        };
    }

    fn csv_upload(uri: &str, filename: &str, body: &str) -> test::TestRequest {
        let payload = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {body}\r\n\
             --{BOUNDARY}--\r\n"
        );
        test::TestRequest::post()
            .uri(uri)
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(payload)
    }

    #[actix_web::test]
    async fn health_reports_database() {
        let app = test_app!(Db::in_memory().await.unwrap());
        for uri in ["/api/health", "/api/monitoring/health"] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["status"], "success");
            assert_eq!(body["database"], "connected");
            assert!(body["meta"]["request_id"].is_string());
        }
    }

    #[actix_web::test]
    async fn category_share_upload_rejects_non_csv_content() {
        let app = test_app!(Db::in_memory().await.unwrap());
        let req = csv_upload("/api/category-share/csv", "category_share.csv", "data").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "error");
        assert!(body["detail"].as_str().unwrap().contains("market_share, product_id, date"));
    }

    #[actix_web::test]
    async fn upload_requires_csv_filename() {
        let app = test_app!(Db::in_memory().await.unwrap());
        let req = csv_upload("/api/product/csv", "products.xlsx", "product_id,category_id\n1,2\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "Invalid file format. Please upload a CSV file.");
    }

    #[actix_web::test]
    async fn upload_without_multipart_is_rejected() {
        let app = test_app!(Db::in_memory().await.unwrap());
        let req = test::TestRequest::post()
            .uri("/api/sales-transaction/csv")
            .insert_header((header::CONTENT_TYPE, "text/csv"))
            .set_payload("product_id,quantity,revenue,date\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn oversized_upload_is_rejected() {
        let app = test_app!(Db::in_memory().await.unwrap());
        let mut body = String::from("product_id,quantity,revenue,date\n");
        while body.len() <= 64 * 1024 {
            body.push_str("1,1,1.00,2024-01-01\n");
        }
        let req = csv_upload("/api/sales-transaction/csv", "big.csv", &body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[actix_web::test]
    async fn uploaded_sales_are_visible_through_aggregations() {
        let app = test_app!(Db::in_memory().await.unwrap());
        let csv = "product_id,quantity,revenue,date\n\
                   1,2,19.99,2024-05-01\n\
                   2,1,5.01,2024-05-02\n\
                   1,4,40.00,2024-06-01";
        let resp = test::call_service(
            &app,
            csv_upload("/api/sales-transaction/csv", "sales.csv", csv).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["rows_inserted"], 3);
        assert_eq!(body["detail"], "Transactions were successfully uploaded.");

        let req = test::TestRequest::get()
            .uri("/api/sales-transaction/total?start_date=2024-05-01&end_date=2024-05-31")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total_sales"], "25.00");

        let req = test::TestRequest::get()
            .uri("/api/sales-transaction/dimentions?dimensions=product")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["dimensions"], json!(["product"]));
        assert_eq!(
            body["sales_by_dimensions"],
            json!([
                {"product": 1, "total_revenue": "59.99"},
                {"product": 2, "total_revenue": "5.01"},
            ])
        );
    }

    #[actix_web::test]
    async fn total_for_empty_period_is_zero() {
        let app = test_app!(Db::in_memory().await.unwrap());
        let req = test::TestRequest::get()
            .uri("/api/sales-transaction/total?start_date=2020-01-01&end_date=2020-12-31")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["total_sales"], "0.00");
    }

    #[actix_web::test]
    async fn query_endpoints_validate_parameters() {
        let app = test_app!(Db::in_memory().await.unwrap());
        for uri in [
            "/api/sales-transaction/total?start_date=2024-01-01",
            "/api/sales-transaction/total?start_date=2024-01-01&end_date=tomorrow",
            "/api/sales-transaction/total?start_date=2024-01-01&end_date=%2B10000-12-31",
            "/api/category-share/significant?start_date=-0001-01-01&end_date=2024-01-01",
            "/api/sales-transaction/dimentions?dimensions=product,weather",
            "/api/sales-transaction/dimentions",
            "/api/category-share/significant?end_date=2024-01-01",
            "/api/category-share/significant?start_date=2024-01-01&end_date=2024-02-01&limit=ten",
        ] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["status"], "error", "{uri}");
        }
    }

    #[actix_web::test]
    async fn malformed_cell_is_a_server_error_and_persists_nothing() {
        let db = Db::in_memory().await.unwrap();
        let app = test_app!(db.clone());
        let csv = "product_id,quantity,revenue,date\n1,1,abc,2024-01-01\n";
        let resp = test::call_service(
            &app,
            csv_upload("/api/sales-transaction/csv", "sales.csv", csv).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["detail"].as_str().unwrap().starts_with("line 2: "));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales_transactions")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[actix_web::test]
    async fn five_digit_year_upload_is_refused_whole() {
        let db = Db::in_memory().await.unwrap();
        let app = test_app!(db.clone());
        let csv = "product_id,quantity,revenue,date\n\
                   1,1,10.00,2024-06-01\n\
                   1,1,5.00,+10000-01-01\n";
        let resp = test::call_service(
            &app,
            csv_upload("/api/sales-transaction/csv", "sales.csv", csv).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["detail"].as_str().unwrap().starts_with("line 3: "));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales_transactions")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[actix_web::test]
    async fn products_and_shares_feed_significant_changes() {
        let db = Db::in_memory().await.unwrap();
        let app = test_app!(db.clone());

        let resp = test::call_service(
            &app,
            csv_upload(
                "/api/product/csv",
                "product_category.csv",
                "product_id,category_id\n1,7\n2,7\n3,8\n",
            )
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["categories_created"], 2);
        assert_eq!(body["products_created"], 3);

        let shares = "date,product_id,market_share\n\
                      2024-01-01,1,10.00\n\
                      2024-01-31,2,12.50\n\
                      2024-01-01,3,30.00\n\
                      2024-01-31,3,31.00\n";
        let resp = test::call_service(
            &app,
            csv_upload("/api/category-share/csv", "shares.csv", shares).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/category-share/significant?start_date=2024-01-01&end_date=2024-01-31&limit=1")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["limit"], 1);
        let top = body["significant_category_shares"].as_array().unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0]["category_id"], 7);
        assert_eq!(top[0]["market_share_change"], "2.50");
        assert!(top[0]["category_name"].as_str().unwrap().starts_with("category-7-"));
    }
}
