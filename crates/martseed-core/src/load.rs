//! # Bulk Loader
//!
//! Reads the dimension CSV files and inserts them into the warehouse.
//! Each dimension loads inside a single transaction built from batched
//! multi-row INSERT statements: the whole dimension commits together or
//! not at all. After loading, `fetch_keys` reads back the store-assigned
//! surrogate keys (products together with their price snapshot) for the
//! transaction synthesizer.

use std::path::{Path, PathBuf};

use sqlx::{PgPool, Row};
use tracing::debug;

use crate::dimensions::customer::CustomerRecord;
use crate::dimensions::date::DateRecord;
use crate::dimensions::product::ProductRecord;
use crate::dimensions::DimensionRecord;
use crate::error::{MartSeedError, Result};
use crate::output::csv::read_dimension_file;

/// Rows per multi-row INSERT statement. Keeps statements well under the
/// parser limits while still amortizing round trips.
pub const INSERT_BATCH_SIZE: usize = 500;

/// Surrogate key and price snapshot of one loaded product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductKey {
    pub product_id: i32,
    pub price: f64,
}

/// The full key sets available to the transaction synthesizer, read back
/// from the store after the dimensions commit.
#[derive(Debug, Clone, Default)]
pub struct DimensionKeys {
    pub customer_ids: Vec<i32>,
    pub products: Vec<ProductKey>,
    pub date_ids: Vec<i32>,
}

/// Row counts loaded per dimension.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadSummary {
    pub dates: usize,
    pub customers: usize,
    pub products: usize,
}

pub struct BulkLoader<'a> {
    pool: &'a PgPool,
    data_dir: PathBuf,
}

impl<'a> BulkLoader<'a> {
    pub fn new(pool: &'a PgPool, data_dir: &Path) -> Self {
        Self {
            pool,
            data_dir: data_dir.to_path_buf(),
        }
    }

    /// Load all three dimensions, dates first. A failure in one dimension
    /// rolls that dimension back and aborts; dimensions already committed
    /// stay committed.
    pub async fn load_all(
        &self,
        progress: Option<&(dyn Fn(&str, usize) + Send + Sync)>,
    ) -> Result<LoadSummary> {
        let dates = self.load_dimension::<DateRecord>().await?;
        if let Some(cb) = progress {
            cb(DateRecord::TABLE, dates);
        }
        let customers = self.load_dimension::<CustomerRecord>().await?;
        if let Some(cb) = progress {
            cb(CustomerRecord::TABLE, customers);
        }
        let products = self.load_dimension::<ProductRecord>().await?;
        if let Some(cb) = progress {
            cb(ProductRecord::TABLE, products);
        }
        Ok(LoadSummary {
            dates,
            customers,
            products,
        })
    }

    /// Load one dimension file inside a single transaction.
    pub async fn load_dimension<R: DimensionRecord>(&self) -> Result<usize> {
        let path = self.data_dir.join(R::FILE_NAME);
        let rows = read_dimension_file(&path, R::HEADER)?;

        let mut records = Vec::with_capacity(rows.len());
        for (idx, fields) in rows.iter().enumerate() {
            let record = R::from_csv_row(fields).map_err(|message| MartSeedError::FlatFile {
                path: path.display().to_string(),
                // +2: one for the header row, one for 1-based numbering.
                line: idx + 2,
                message,
            })?;
            records.push(record);
        }

        let mut tx = self.pool.begin().await.map_err(|e| MartSeedError::InsertFailed {
            table: R::TABLE.to_string(),
            batch: 0,
            message: "Failed to begin transaction".to_string(),
            sql_preview: "BEGIN".to_string(),
            source: e,
        })?;

        let col_list = R::HEADER.join(", ");
        for (batch_idx, chunk) in records.chunks(INSERT_BATCH_SIZE).enumerate() {
            let sql = build_batched_insert(R::TABLE, &col_list, chunk.iter().map(R::sql_tuple));
            sqlx::query(&sql).execute(&mut *tx).await.map_err(|e| {
                MartSeedError::InsertFailed {
                    table: R::TABLE.to_string(),
                    batch: batch_idx,
                    message: "Batched INSERT failed".to_string(),
                    sql_preview: truncate_sql(&sql, 200),
                    source: e,
                }
            })?;
        }

        tx.commit().await.map_err(|e| MartSeedError::InsertFailed {
            table: R::TABLE.to_string(),
            batch: records.len() / INSERT_BATCH_SIZE,
            message: "Failed to commit transaction".to_string(),
            sql_preview: "COMMIT".to_string(),
            source: e,
        })?;

        debug!(table = R::TABLE, rows = records.len(), "dimension loaded");
        Ok(records.len())
    }

    /// Read back the surrogate keys assigned during load.
    pub async fn fetch_keys(&self) -> Result<DimensionKeys> {
        let customer_ids: Vec<i32> =
            sqlx::query_scalar("SELECT customer_id FROM customers ORDER BY customer_id")
                .fetch_all(self.pool)
                .await
                .map_err(|e| MartSeedError::Query {
                    message: "fetching customer keys".to_string(),
                    source: e,
                })?;

        let date_ids: Vec<i32> =
            sqlx::query_scalar("SELECT date_id FROM date_dimension ORDER BY date_id")
                .fetch_all(self.pool)
                .await
                .map_err(|e| MartSeedError::Query {
                    message: "fetching date keys".to_string(),
                    source: e,
                })?;

        let product_rows =
            sqlx::query("SELECT product_id, price::float8 AS price FROM products ORDER BY product_id")
                .fetch_all(self.pool)
                .await
                .map_err(|e| MartSeedError::Query {
                    message: "fetching product keys".to_string(),
                    source: e,
                })?;

        let mut products = Vec::with_capacity(product_rows.len());
        for row in product_rows {
            products.push(ProductKey {
                product_id: row.try_get("product_id").map_err(|e| MartSeedError::Query {
                    message: "decoding product_id".to_string(),
                    source: e,
                })?,
                price: row.try_get("price").map_err(|e| MartSeedError::Query {
                    message: "decoding product price".to_string(),
                    source: e,
                })?,
            });
        }

        Ok(DimensionKeys {
            customer_ids,
            products,
            date_ids,
        })
    }
}

/// Build a multi-row INSERT statement from pre-rendered VALUES tuples.
///
/// Produces: `INSERT INTO table (col1, col2) VALUES (v1, v2), (v3, v4)`
pub(crate) fn build_batched_insert<I>(table: &str, col_list: &str, tuples: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut sql = format!("INSERT INTO {} ({}) VALUES ", table, col_list);
    for (i, tuple) in tuples.into_iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&tuple);
    }
    sql
}

/// Truncate a SQL string for error messages.
pub(crate) fn truncate_sql(sql: &str, max_len: usize) -> String {
    if sql.len() <= max_len {
        sql.to_string()
    } else {
        format!("{}...", &sql[..max_len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_build_batched_insert() {
        let d1 = crate::dimensions::date::DateRecord::for_date(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        );
        let d2 = crate::dimensions::date::DateRecord::for_date(
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
        );

        let sql = build_batched_insert(
            DateRecord::TABLE,
            &DateRecord::HEADER.join(", "),
            [&d1, &d2].iter().map(|r| r.sql_tuple()),
        );

        assert!(sql.starts_with(
            "INSERT INTO date_dimension (date_value, year, quarter, month, day, day_of_week, week_of_year, is_weekend) VALUES "
        ));
        assert!(sql.contains("('2023-01-01', 2023, 1, 1, 1, 7, 52, TRUE)"));
        assert!(sql.contains("('2023-01-02', 2023, 1, 1, 2, 1, 1, FALSE)"));
    }

    #[test]
    fn test_truncate_sql() {
        assert_eq!(truncate_sql("SELECT 1", 200), "SELECT 1");
        let long = "A".repeat(300);
        let truncated = truncate_sql(&long, 200);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
    }
}
