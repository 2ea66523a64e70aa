use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};

use martseed_core::dimensions::customer::{self, CustomerGenConfig};
use martseed_core::dimensions::{date, product};
use martseed_core::facts::TransactionSynthesizer;
use martseed_core::load::BulkLoader;
use martseed_core::{verify, WarehouseConfig};

use crate::args::SeedArgs;

pub async fn run(args: &SeedArgs) -> Result<()> {
    let config = WarehouseConfig::from_env()?;
    let seed = args.seed.unwrap_or_else(rand_seed);
    let data_dir = Path::new(&args.data_dir);
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;

    // Phase 1: Generate dimension files
    let pb = spinner("1/4", "Generating dimension files...");
    let dates = date::generate_file(data_dir)?;
    let customers = customer::generate_file(
        data_dir,
        &CustomerGenConfig {
            count: args.customers,
            seed,
            anchor_date: Utc::now().date_naive(),
        },
        None,
    )?;
    let products = product::generate_file(
        data_dir,
        &product::ProductGenConfig {
            count: args.products,
            // Offset so customers and products don't share a stream.
            seed: seed.wrapping_add(1),
        },
        None,
    )?;
    pb.finish_with_message(format!(
        "Generating dimension files... ✓ {} dates, {} customers, {} products",
        dates, customers, products
    ));

    // Phase 2: Load dimensions
    let pb = spinner("2/4", "Loading dimensions...");
    let pool = config.connect().await?;
    let loader = BulkLoader::new(&pool, data_dir);
    let summary = loader.load_all(None).await?;
    let keys = loader.fetch_keys().await?;
    tracing::debug!(
        customers = keys.customer_ids.len(),
        products = keys.products.len(),
        dates = keys.date_ids.len(),
        "fetched dimension keys"
    );
    pb.finish_with_message(format!(
        "Loading dimensions... ✓ {} dates, {} customers, {} products",
        summary.dates, summary.customers, summary.products
    ));

    // Phase 3: Synthesize transactions
    let bar = ProgressBar::new(args.transactions as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [3/4] Synthesizing transactions {bar:30.cyan} {pos}/{len}")
            .unwrap(),
    );
    let synthesizer = TransactionSynthesizer::new(&pool, &keys, seed.wrapping_add(2))
        .with_batch_size(args.batch_size);
    let committed = synthesizer
        .run(
            args.transactions,
            Some(&|done, _total| bar.set_position(done as u64)),
        )
        .await?;
    bar.finish();

    // Phase 4: Verify
    let pb = spinner("4/4", "Verifying...");
    let counts = verify::row_counts(&pool).await?;
    let samples = verify::sample_transactions(&pool, 5).await?;
    pb.finish_with_message("Verifying... ✓".to_string());

    println!("\nWarehouse contents:");
    for count in &counts {
        println!("  {:<20} {:>8} rows", count.table, count.rows);
    }
    if !samples.is_empty() {
        println!("\nSample transactions:");
        for sample in &samples {
            println!("  {}", sample.sentence());
        }
    }
    println!(
        "\nSeed complete: {} transactions committed (seed {})",
        committed, seed
    );

    Ok(())
}

fn spinner(prefix: &str, message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{prefix}] {msg}")
            .unwrap(),
    );
    pb.set_prefix(prefix.to_string());
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn rand_seed() -> u64 {
    rand::random()
}
