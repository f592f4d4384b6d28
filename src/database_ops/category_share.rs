use crate::database_ops::csv_ingest::{read_rows, CsvLayout, INSERT_CHUNK_ROWS};
use crate::database_ops::db::Db;
use crate::database_ops::error::ServiceResult;
use crate::database_ops::models::{CategoryShareChange, IngestSummary, NewCategoryShare};
use crate::normalization::{decimal::MARKET_SHARE_MAX_DIGITS, Hundredths};
use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite};
use tracing::{info, instrument};

pub const CATEGORY_SHARE_CSV: CsvLayout = CsvLayout {
    required: &["market_share", "product_id", "date"],
};

pub const DEFAULT_SIGNIFICANT_LIMIT: u32 = 10;

#[derive(sqlx::FromRow)]
struct ShareChangeRow {
    category_id: i64,
    category_name: Option<String>,
    change_minor: i64,
}

pub fn parse_category_share_csv(data: &str) -> ServiceResult<Vec<NewCategoryShare>> {
    read_rows(data, &CATEGORY_SHARE_CSV, |row| {
        Ok(NewCategoryShare {
            product_id: row.int("product_id")?,
            market_share: row.decimal("market_share", MARKET_SHARE_MAX_DIGITS)?,
            date: row.date("date")?,
        })
    })
}

#[instrument(skip(db, data), fields(bytes = data.len()))]
pub async fn bulk_upload_category_share_from_csv(
    db: &Db,
    data: &str,
) -> ServiceResult<IngestSummary> {
    let shares = parse_category_share_csv(data)?;
    insert_category_shares(db, &shares).await
}

#[instrument(skip_all, fields(count = shares.len()))]
pub async fn insert_category_shares(
    db: &Db,
    shares: &[NewCategoryShare],
) -> ServiceResult<IngestSummary> {
    let mut tx = db.pool.begin().await?;
    let mut inserted = 0u64;
    for chunk in shares.chunks(INSERT_CHUNK_ROWS) {
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "INSERT INTO category_shares (date, product_id, market_share_minor) ",
        );
        qb.push_values(chunk, |mut b, s| {
            b.push_bind(s.date)
                .push_bind(s.product_id)
                .push_bind(s.market_share.minor());
        });
        inserted += qb.build().execute(&mut *tx).await?.rows_affected();
    }
    tx.commit().await?;

    info!(rows = inserted, "category shares uploaded");
    Ok(IngestSummary {
        rows_inserted: inserted,
        ..Default::default()
    })
}

/// Categories whose market share moved the most within `[start, end]`.
///
/// A category's change is `MAX(share) - MIN(share)` over the shares of every
/// product linked to it. Ordered by change descending, then category id;
/// `limit == 0` returns every category.
#[instrument(skip(db))]
pub async fn significant_category_shares(
    db: &Db,
    start: NaiveDate,
    end: NaiveDate,
    limit: u32,
) -> ServiceResult<Vec<CategoryShareChange>> {
    let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
        "SELECT pc.category_id AS category_id,
                c.name AS category_name,
                MAX(cs.market_share_minor) - MIN(cs.market_share_minor) AS change_minor
         FROM product_categories pc
         JOIN category_shares cs ON cs.product_id = pc.product_id
         LEFT JOIN categories c ON c.id = pc.category_id
         WHERE cs.date BETWEEN ",
    );
    qb.push_bind(start).push(" AND ").push_bind(end);
    qb.push(
        " GROUP BY pc.category_id, c.name
          ORDER BY change_minor DESC, pc.category_id ASC",
    );
    if limit > 0 {
        qb.push(" LIMIT ").push_bind(i64::from(limit));
    }

    let rows = qb
        .build_query_as::<ShareChangeRow>()
        .fetch_all(&db.pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|r| CategoryShareChange {
            category_id: r.category_id,
            category_name: r.category_name,
            market_share_change: Hundredths::from_minor(r.change_minor),
        })
        .collect())
}
