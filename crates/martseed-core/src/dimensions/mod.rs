//! # Dimension Generators
//!
//! One submodule per dimension of the star schema: calendar dates,
//! customers, products. Each record type implements [`DimensionRecord`],
//! which fixes the table name, flat-file name, and field order shared with
//! the bulk loader, plus the CSV and SQL renderings of one row.
//!
//! Generation is seeded (`StdRng`), so a fixed seed reproduces the files
//! byte for byte, and proceeds in bounded batches so peak memory stays flat
//! regardless of row count.

pub mod customer;
pub mod date;
pub mod product;

use rand::Rng;

/// Rows generated per batch before they are flushed to the CSV writer.
pub const GEN_BATCH_SIZE: usize = 1000;

/// One record of a dimension table.
///
/// `HEADER` is the de facto schema of the flat file; it doubles as the
/// column list for the loader's INSERT statements, so the two can never
/// drift apart.
pub trait DimensionRecord: Sized {
    /// Warehouse table name.
    const TABLE: &'static str;
    /// Flat file name under the data directory.
    const FILE_NAME: &'static str;
    /// Field names, in file and insert order.
    const HEADER: &'static [&'static str];

    fn to_csv_row(&self) -> Vec<String>;

    /// Parse one CSV data row. Errors are plain messages; the caller adds
    /// file and line context.
    fn from_csv_row(fields: &[String]) -> std::result::Result<Self, String>;

    /// Render the row as a parenthesized SQL VALUES tuple.
    fn sql_tuple(&self) -> String;
}

/// Quote a string as a SQL literal (single quotes doubled).
pub(crate) fn sql_str(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Weighted random selection by cumulative distribution.
///
/// Weights must be positive; they need not sum to 1. Floating-point
/// accumulation edge cases fall through to the last choice.
pub(crate) fn weighted_pick<'a, T>(choices: &'a [(T, f64)], rng: &mut impl Rng) -> &'a T {
    let total: f64 = choices.iter().map(|(_, w)| w).sum();
    let roll: f64 = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (value, weight) in choices {
        cumulative += weight;
        if roll < cumulative {
            return value;
        }
    }
    &choices.last().expect("choices must be non-empty").0
}
