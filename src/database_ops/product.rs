use crate::database_ops::csv_ingest::{read_rows, CsvLayout, INSERT_CHUNK_ROWS};
use crate::database_ops::db::Db;
use crate::database_ops::error::ServiceResult;
use crate::database_ops::models::{IngestSummary, ProductCategoryLink};
use rand::Rng;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

pub const PRODUCT_CSV: CsvLayout = CsvLayout {
    required: &["product_id", "category_id"],
};

/// Entities created on demand when a product file references an unknown id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Product,
    Category,
}

impl Placeholder {
    fn table(self) -> &'static str {
        match self {
            Placeholder::Product => "products",
            Placeholder::Category => "categories",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Placeholder::Product => "product",
            Placeholder::Category => "category",
        }
    }
}

fn placeholder_names(kind: Placeholder, ids: &BTreeSet<i64>) -> Vec<(i64, String)> {
    let mut rng = rand::thread_rng();
    ids.iter()
        .map(|&id| {
            let tag: u32 = rng.gen_range(0..0x100_0000);
            (id, format!("{}-{id}-{tag:06x}", kind.prefix()))
        })
        .collect()
}

/// Insert a named placeholder for every id not already present; returns how many were created.
async fn upsert_placeholders(
    conn: &mut SqliteConnection,
    kind: Placeholder,
    ids: &BTreeSet<i64>,
) -> ServiceResult<u64> {
    let rows = placeholder_names(kind, ids);
    let mut created = 0u64;
    for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("INSERT INTO ");
        qb.push(kind.table()).push(" (id, name) ");
        qb.push_values(chunk, |mut b, (id, name)| {
            b.push_bind(*id).push_bind(name.as_str());
        });
        qb.push(" ON CONFLICT (id) DO NOTHING");
        created += qb.build().execute(&mut *conn).await?.rows_affected();
    }
    debug!(table = kind.table(), created, referenced = ids.len(), "placeholders ensured");
    Ok(created)
}

/// Load `product_id,category_id` pairs, creating placeholder products and
/// categories for ids not seen before. Repeated pairs are stored once.
#[instrument(skip(db, data), fields(bytes = data.len()))]
pub async fn bulk_upload_products_from_csv(db: &Db, data: &str) -> ServiceResult<IngestSummary> {
    let links = parse_products_csv(data)?;
    insert_product_categories(db, &links).await
}

pub fn parse_products_csv(data: &str) -> ServiceResult<Vec<ProductCategoryLink>> {
    read_rows(data, &PRODUCT_CSV, |row| {
        Ok(ProductCategoryLink {
            product_id: row.int("product_id")?,
            category_id: row.int("category_id")?,
        })
    })
}

#[instrument(skip_all, fields(count = links.len()))]
pub async fn insert_product_categories(
    db: &Db,
    links: &[ProductCategoryLink],
) -> ServiceResult<IngestSummary> {
    let product_ids: BTreeSet<i64> = links.iter().map(|l| l.product_id).collect();
    let category_ids: BTreeSet<i64> = links.iter().map(|l| l.category_id).collect();
    let unique_links: Vec<ProductCategoryLink> = links
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut tx = db.pool.begin().await?;
    let products_created = upsert_placeholders(&mut tx, Placeholder::Product, &product_ids).await?;
    let categories_created =
        upsert_placeholders(&mut tx, Placeholder::Category, &category_ids).await?;

    let mut inserted = 0u64;
    for chunk in unique_links.chunks(INSERT_CHUNK_ROWS) {
        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("INSERT INTO product_categories (product_id, category_id) ");
        qb.push_values(chunk, |mut b, l| {
            b.push_bind(l.product_id).push_bind(l.category_id);
        });
        qb.push(" ON CONFLICT (product_id, category_id) DO NOTHING");
        inserted += qb.build().execute(&mut *tx).await?.rows_affected();
    }
    tx.commit().await?;

    info!(
        rows = inserted,
        products_created, categories_created, "product categories uploaded"
    );
    Ok(IngestSummary {
        rows_inserted: inserted,
        products_created: Some(products_created),
        categories_created: Some(categories_created),
    })
}
