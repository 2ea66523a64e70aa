//! # Load Verification
//!
//! Human-observable confirmation after a seed run: row counts per table
//! and a small sample join across all four tables.

use chrono::NaiveDate;
use sqlx::{PgPool, Row};

use crate::error::{MartSeedError, Result};

/// Tables checked, in report order.
pub const TABLES: [&str; 4] = [
    "customers",
    "products",
    "date_dimension",
    "sales_transactions",
];

#[derive(Debug, Clone, Copy)]
pub struct TableCount {
    pub table: &'static str,
    pub rows: i64,
}

/// One row of the four-way sample join.
#[derive(Debug, Clone)]
pub struct SampleTransaction {
    pub customer: String,
    pub product: String,
    pub date: NaiveDate,
    pub total: f64,
}

impl SampleTransaction {
    /// The confirmation sentence printed by the CLI.
    pub fn sentence(&self) -> String {
        format!(
            "{} bought {} on {} for ${:.2}",
            self.customer, self.product, self.date, self.total
        )
    }
}

/// Count rows in every warehouse table.
pub async fn row_counts(pool: &PgPool) -> Result<Vec<TableCount>> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .map_err(|e| MartSeedError::Query {
                message: format!("counting rows in {}", table),
                source: e,
            })?;
        counts.push(TableCount { table, rows });
    }
    Ok(counts)
}

/// Fetch a few fact rows joined to all three dimensions.
pub async fn sample_transactions(pool: &PgPool, limit: i64) -> Result<Vec<SampleTransaction>> {
    let rows = sqlx::query(
        "SELECT c.first_name, p.product_name, d.date_value, st.total_amount::float8 AS total
         FROM sales_transactions st
         JOIN customers c ON st.customer_id = c.customer_id
         JOIN products p ON st.product_id = p.product_id
         JOIN date_dimension d ON st.date_id = d.date_id
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| MartSeedError::Query {
        message: "sampling transactions".to_string(),
        source: e,
    })?;

    let mut samples = Vec::with_capacity(rows.len());
    for row in rows {
        samples.push(SampleTransaction {
            customer: row.try_get("first_name").map_err(decode_err)?,
            product: row.try_get("product_name").map_err(decode_err)?,
            date: row.try_get("date_value").map_err(decode_err)?,
            total: row.try_get("total").map_err(decode_err)?,
        });
    }
    Ok(samples)
}

fn decode_err(e: sqlx::Error) -> MartSeedError {
    MartSeedError::Query {
        message: "decoding sample transaction".to_string(),
        source: e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_sentence() {
        let s = SampleTransaction {
            customer: "Ada".to_string(),
            product: "BrandA Laptops 7".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 3, 14).unwrap(),
            total: 199.9,
        };
        assert_eq!(s.sentence(), "Ada bought BrandA Laptops 7 on 2023-03-14 for $199.90");
    }
}
