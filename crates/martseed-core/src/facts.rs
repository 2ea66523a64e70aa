//! # Transaction Synthesizer
//!
//! Generates the sales fact rows. Each row samples one customer, product,
//! and date key uniformly with replacement from the loaded key sets —
//! uniform synthetic noise, not a demand model — copies the product's
//! price snapshot as `unit_price`, then derives the monetary fields under
//! the banker's-rounding convention in [`crate::money`].
//!
//! Processing is batched: every batch is generated, bulk-inserted, and
//! committed in its own transaction before the next begins. A failure in
//! batch *k* leaves batches 1..k-1 committed, aborts the run, and names
//! the failed batch. There is no automatic retry.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqlx::PgPool;
use tracing::debug;

use crate::dimensions::weighted_pick;
use crate::error::{MartSeedError, Result};
use crate::load::{build_batched_insert, truncate_sql, DimensionKeys, INSERT_BATCH_SIZE};
use crate::money::{format_cents, line_amounts};

/// Fact table name.
pub const FACT_TABLE: &str = "sales_transactions";

/// Insert column list for the fact table.
const FACT_COLUMNS: &str =
    "customer_id, product_id, date_id, quantity, unit_price, total_amount, discount_amount";

/// Default rows generated and committed per batch.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Sampling knobs for fact generation. The defaults are the production
/// distributions; tests pin quantity or discount to isolate the money math.
#[derive(Debug, Clone)]
pub struct SamplerProfile {
    /// Inclusive quantity bounds.
    pub quantity_range: (u32, u32),
    /// Discount fractions and their draw weights.
    pub discounts: Vec<(f64, f64)>,
}

impl Default for SamplerProfile {
    fn default() -> Self {
        Self {
            quantity_range: (1, 5),
            discounts: vec![(0.0, 0.70), (0.05, 0.15), (0.10, 0.10), (0.15, 0.05)],
        }
    }
}

impl SamplerProfile {
    /// Fixed quantity=1, discount=0: every total equals the sampled price.
    pub fn fixed() -> Self {
        Self {
            quantity_range: (1, 1),
            discounts: vec![(0.0, 1.0)],
        }
    }
}

/// One generated fact row, ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct FactRow {
    pub customer_id: i32,
    pub product_id: i32,
    pub date_id: i32,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_amount: f64,
    pub discount_amount: f64,
}

impl FactRow {
    fn sql_tuple(&self) -> String {
        format!(
            "({}, {}, {}, {}, {}, {}, {})",
            self.customer_id,
            self.product_id,
            self.date_id,
            self.quantity,
            format_cents(self.unit_price),
            format_cents(self.total_amount),
            format_cents(self.discount_amount),
        )
    }
}

/// Generate one batch of fact rows from the key sets.
///
/// Pure over the RNG, so the batching and insertion logic can be tested
/// without a database. Keys must be non-empty; `TransactionSynthesizer`
/// checks that precondition before calling.
pub fn generate_batch(
    rng: &mut StdRng,
    keys: &DimensionKeys,
    profile: &SamplerProfile,
    count: usize,
) -> Vec<FactRow> {
    let mut rows = Vec::with_capacity(count);
    for _ in 0..count {
        let customer_id = keys.customer_ids[rng.random_range(0..keys.customer_ids.len())];
        let product = keys.products[rng.random_range(0..keys.products.len())];
        let date_id = keys.date_ids[rng.random_range(0..keys.date_ids.len())];

        let quantity = rng.random_range(profile.quantity_range.0..=profile.quantity_range.1);
        let discount_pct = *weighted_pick(&profile.discounts, rng);

        let amounts = line_amounts(product.price, quantity, discount_pct);
        rows.push(FactRow {
            customer_id,
            product_id: product.product_id,
            date_id,
            quantity,
            unit_price: product.price,
            total_amount: amounts.total_amount,
            discount_amount: amounts.discount_amount,
        });
    }
    rows
}

pub struct TransactionSynthesizer<'a> {
    pool: &'a PgPool,
    keys: &'a DimensionKeys,
    profile: SamplerProfile,
    batch_size: usize,
    seed: u64,
}

impl<'a> TransactionSynthesizer<'a> {
    pub fn new(pool: &'a PgPool, keys: &'a DimensionKeys, seed: u64) -> Self {
        Self {
            pool,
            keys,
            profile: SamplerProfile::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            seed,
        }
    }

    pub fn with_profile(mut self, profile: SamplerProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        self.batch_size = batch_size;
        self
    }

    /// Generate and load exactly `num_transactions` fact rows.
    ///
    /// `progress` receives (rows_committed, total) after each batch commits.
    /// Returns the number of rows committed, which on success equals
    /// `num_transactions`.
    pub async fn run(
        &self,
        num_transactions: usize,
        progress: Option<&(dyn Fn(usize, usize) + Send + Sync)>,
    ) -> Result<usize> {
        if num_transactions == 0 {
            return Ok(0);
        }
        self.check_preconditions()?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut committed = 0usize;
        let mut batch_index = 0usize;

        while committed < num_transactions {
            let count = self.batch_size.min(num_transactions - committed);
            let rows = generate_batch(&mut rng, self.keys, &self.profile, count);
            self.insert_batch(&rows, batch_index).await?;

            committed += count;
            batch_index += 1;
            debug!(batch = batch_index, committed, total = num_transactions, "fact batch committed");
            if let Some(cb) = progress {
                cb(committed, num_transactions);
            }
        }

        Ok(committed)
    }

    /// All three key sets must be non-empty before any row is generated.
    fn check_preconditions(&self) -> Result<()> {
        if self.keys.customer_ids.is_empty() {
            return Err(MartSeedError::EmptyDimension {
                table: "customers".to_string(),
            });
        }
        if self.keys.products.is_empty() {
            return Err(MartSeedError::EmptyDimension {
                table: "products".to_string(),
            });
        }
        if self.keys.date_ids.is_empty() {
            return Err(MartSeedError::EmptyDimension {
                table: "date_dimension".to_string(),
            });
        }
        Ok(())
    }

    /// Insert one batch inside its own transaction and commit it.
    ///
    /// Exposed so the batch-commit persistence property can be exercised
    /// directly in integration tests.
    pub async fn insert_batch(&self, rows: &[FactRow], batch_index: usize) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(|e| MartSeedError::InsertFailed {
            table: FACT_TABLE.to_string(),
            batch: batch_index,
            message: "Failed to begin transaction".to_string(),
            sql_preview: "BEGIN".to_string(),
            source: e,
        })?;

        for chunk in rows.chunks(INSERT_BATCH_SIZE) {
            let sql = build_batched_insert(
                FACT_TABLE,
                FACT_COLUMNS,
                chunk.iter().map(FactRow::sql_tuple),
            );
            sqlx::query(&sql).execute(&mut *tx).await.map_err(|e| {
                MartSeedError::InsertFailed {
                    table: FACT_TABLE.to_string(),
                    batch: batch_index,
                    message: "Batched INSERT failed".to_string(),
                    sql_preview: truncate_sql(&sql, 200),
                    source: e,
                }
            })?;
        }

        tx.commit().await.map_err(|e| MartSeedError::InsertFailed {
            table: FACT_TABLE.to_string(),
            batch: batch_index,
            message: "Failed to commit transaction".to_string(),
            sql_preview: "COMMIT".to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::ProductKey;
    use crate::money::round_cents;

    fn tiny_keys() -> DimensionKeys {
        DimensionKeys {
            customer_ids: vec![1, 2, 3],
            products: vec![
                ProductKey { product_id: 10, price: 10.0 },
                ProductKey { product_id: 20, price: 20.0 },
            ],
            date_ids: vec![100, 101, 102],
        }
    }

    #[test]
    fn test_referential_integrity_by_construction() {
        let keys = tiny_keys();
        let mut rng = StdRng::seed_from_u64(42);
        let rows = generate_batch(&mut rng, &keys, &SamplerProfile::default(), 500);

        assert_eq!(rows.len(), 500);
        for row in &rows {
            assert!(keys.customer_ids.contains(&row.customer_id));
            assert!(keys.products.iter().any(|p| p.product_id == row.product_id));
            assert!(keys.date_ids.contains(&row.date_id));
        }
    }

    #[test]
    fn test_money_identities() {
        let keys = tiny_keys();
        let mut rng = StdRng::seed_from_u64(7);
        let rows = generate_batch(&mut rng, &keys, &SamplerProfile::default(), 1000);

        for row in &rows {
            let gross = round_cents(row.unit_price * f64::from(row.quantity));
            let recon = round_cents(row.total_amount + row.discount_amount);
            assert!(
                (recon - gross).abs() < 0.005,
                "{:?}: {} + {} != {}",
                row,
                row.total_amount,
                row.discount_amount,
                gross
            );
            assert!((1..=5).contains(&row.quantity));
        }
    }

    #[test]
    fn test_fixed_profile_total_equals_price() {
        let keys = tiny_keys();
        let mut rng = StdRng::seed_from_u64(11);
        let rows = generate_batch(&mut rng, &keys, &SamplerProfile::fixed(), 100);

        for row in &rows {
            assert_eq!(row.quantity, 1);
            assert_eq!(row.discount_amount, 0.0);
            let price = keys
                .products
                .iter()
                .find(|p| p.product_id == row.product_id)
                .unwrap()
                .price;
            assert_eq!(row.total_amount, price);
        }
    }

    #[test]
    fn test_price_snapshot_copied() {
        let keys = tiny_keys();
        let mut rng = StdRng::seed_from_u64(5);
        let rows = generate_batch(&mut rng, &keys, &SamplerProfile::default(), 50);
        for row in &rows {
            let price = keys
                .products
                .iter()
                .find(|p| p.product_id == row.product_id)
                .unwrap()
                .price;
            assert_eq!(row.unit_price, price);
        }
    }

    #[test]
    fn test_discount_distribution_dominated_by_zero() {
        let keys = tiny_keys();
        let mut rng = StdRng::seed_from_u64(13);
        let rows = generate_batch(&mut rng, &keys, &SamplerProfile::default(), 2000);
        let zero = rows.iter().filter(|r| r.discount_amount == 0.0).count();
        // 0.70 weight on the zero tier.
        assert!(zero > 1200, "zero-discount rows: {}", zero);
    }

    #[test]
    fn test_same_seed_same_batch() {
        let keys = tiny_keys();
        let mut a = StdRng::seed_from_u64(21);
        let mut b = StdRng::seed_from_u64(21);
        let rows_a = generate_batch(&mut a, &keys, &SamplerProfile::default(), 200);
        let rows_b = generate_batch(&mut b, &keys, &SamplerProfile::default(), 200);
        assert_eq!(rows_a, rows_b);
    }

    #[test]
    fn test_fact_sql_tuple() {
        let row = FactRow {
            customer_id: 1,
            product_id: 2,
            date_id: 3,
            quantity: 4,
            unit_price: 19.99,
            total_amount: 75.96,
            discount_amount: 4.0,
        };
        assert_eq!(row.sql_tuple(), "(1, 2, 3, 4, 19.99, 75.96, 4.00)");
    }
}
