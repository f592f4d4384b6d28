use crate::database_ops::csv_ingest::{read_rows, CsvLayout, INSERT_CHUNK_ROWS};
use crate::database_ops::db::Db;
use crate::database_ops::error::{ServiceError, ServiceResult};
use crate::database_ops::models::{DimensionGroup, IngestSummary, NewSalesTransaction};
use crate::normalization::{decimal::REVENUE_MAX_DIGITS, Hundredths};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};
use std::fmt;
use std::str::FromStr;
use tracing::{info, instrument, warn};

pub const SALES_TRANSACTION_CSV: CsvLayout = CsvLayout {
    required: &["product_id", "quantity", "revenue", "date"],
};

/// Grouping key accepted by the sales-by-dimension report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Category,
    Product,
    Quantity,
    Revenue,
    Date,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Category,
        Dimension::Product,
        Dimension::Quantity,
        Dimension::Revenue,
        Dimension::Date,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Category => "category",
            Dimension::Product => "product",
            Dimension::Quantity => "quantity",
            Dimension::Revenue => "revenue",
            Dimension::Date => "date",
        }
    }

    /// SQL expression grouped on; `pc` is only joined when `Category` is requested.
    fn column(self) -> &'static str {
        match self {
            Dimension::Category => "pc.category_id",
            Dimension::Product => "st.product_id",
            Dimension::Quantity => "st.quantity",
            Dimension::Revenue => "st.revenue_minor",
            Dimension::Date => "st.date",
        }
    }

    fn decode(self, row: &SqliteRow) -> Result<Value, sqlx::Error> {
        let alias = self.as_str();
        Ok(match self {
            // transactions for products without a category group under null
            Dimension::Category => Value::from(row.try_get::<Option<i64>, _>(alias)?),
            Dimension::Product | Dimension::Quantity => Value::from(row.try_get::<i64, _>(alias)?),
            Dimension::Revenue => {
                Value::from(Hundredths::from_minor(row.try_get::<i64, _>(alias)?).to_string())
            }
            Dimension::Date => Value::from(row.try_get::<String, _>(alias)?),
        })
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| {
                let available: Vec<&str> = Dimension::ALL.iter().map(|d| d.as_str()).collect();
                ServiceError::validation(format!(
                    "Invalid dimension: {s}. Available dimensions are: {}",
                    available.join(", ")
                ))
            })
    }
}

/// Split a comma-separated dimension list, dropping blanks and repeats.
pub fn parse_dimensions(raw: &str) -> ServiceResult<Vec<Dimension>> {
    let mut dimensions: Vec<Dimension> = Vec::new();
    let mut duplicates = false;
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let dimension: Dimension = token.parse()?;
        if dimensions.contains(&dimension) {
            duplicates = true;
        } else {
            dimensions.push(dimension);
        }
    }
    if duplicates {
        warn!(raw, "Duplicate dimensions found in the query");
    }
    if dimensions.is_empty() {
        return Err(ServiceError::validation("At least one dimension is required"));
    }
    Ok(dimensions)
}

/// Validate headers and parse every row; CPU-bound, touches no connection.
pub fn parse_sales_transactions_csv(data: &str) -> ServiceResult<Vec<NewSalesTransaction>> {
    read_rows(data, &SALES_TRANSACTION_CSV, |row| {
        Ok(NewSalesTransaction {
            product_id: row.int("product_id")?,
            quantity: row.int("quantity")?,
            revenue: row.decimal("revenue", REVENUE_MAX_DIGITS)?,
            date: row.date("date")?,
        })
    })
}

#[instrument(skip(db, data), fields(bytes = data.len()))]
pub async fn bulk_upload_sales_transactions_from_csv(
    db: &Db,
    data: &str,
) -> ServiceResult<IngestSummary> {
    let transactions = parse_sales_transactions_csv(data)?;
    insert_sales_transactions(db, &transactions).await
}

/// Insert parsed rows in one transaction.
#[instrument(skip_all, fields(count = transactions.len()))]
pub async fn insert_sales_transactions(
    db: &Db,
    transactions: &[NewSalesTransaction],
) -> ServiceResult<IngestSummary> {
    let mut tx = db.pool.begin().await?;
    let mut inserted = 0u64;
    for chunk in transactions.chunks(INSERT_CHUNK_ROWS) {
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "INSERT INTO sales_transactions (date, product_id, quantity, revenue_minor) ",
        );
        qb.push_values(chunk, |mut b, t| {
            b.push_bind(t.date)
                .push_bind(t.product_id)
                .push_bind(t.quantity)
                .push_bind(t.revenue.minor());
        });
        inserted += qb.build().execute(&mut *tx).await?.rows_affected();
    }
    tx.commit().await?;

    info!(rows = inserted, "sales transactions uploaded");
    Ok(IngestSummary {
        rows_inserted: inserted,
        ..Default::default()
    })
}

/// Sum of revenue for transactions dated within `[start, end]`; zero when none match.
#[instrument(skip(db))]
pub async fn total_revenue_for_period(
    db: &Db,
    start: NaiveDate,
    end: NaiveDate,
) -> ServiceResult<Hundredths> {
    let total: Option<i64> = sqlx::query_scalar(
        "SELECT SUM(revenue_minor) FROM sales_transactions WHERE date BETWEEN ?1 AND ?2",
    )
    .bind(start)
    .bind(end)
    .fetch_one(&db.pool)
    .await?;
    Ok(total.map(Hundredths::from_minor).unwrap_or(Hundredths::ZERO))
}

/// Revenue summed per unique combination of `dimensions`, ordered by the keys.
#[instrument(skip(db))]
pub async fn sales_by_dimensions(
    db: &Db,
    dimensions: &[Dimension],
) -> ServiceResult<Vec<DimensionGroup>> {
    if dimensions.is_empty() {
        return Err(ServiceError::validation("At least one dimension is required"));
    }

    let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT ");
    for d in dimensions {
        qb.push(d.column())
            .push(" AS \"")
            .push(d.as_str())
            .push("\", ");
    }
    qb.push("SUM(st.revenue_minor) AS total_revenue_minor FROM sales_transactions st");
    if dimensions.contains(&Dimension::Category) {
        qb.push(" LEFT JOIN product_categories pc ON pc.product_id = st.product_id");
    }
    let keys: Vec<&str> = dimensions.iter().map(|d| d.column()).collect();
    let keys = keys.join(", ");
    qb.push(" GROUP BY ").push(&keys).push(" ORDER BY ").push(&keys);

    let rows = qb.build().fetch_all(&db.pool).await?;
    let groups = rows
        .iter()
        .map(|row| {
            let mut key = Map::with_capacity(dimensions.len());
            for d in dimensions {
                key.insert(d.as_str().to_string(), d.decode(row)?);
            }
            let total: i64 = row.try_get("total_revenue_minor")?;
            Ok(DimensionGroup {
                key,
                total_revenue: Hundredths::from_minor(total),
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    info!(groups = groups.len(), "sales grouped by dimensions");
    Ok(groups)
}
