//! Product dimension: fixed category/subcategory taxonomy, a small brand
//! set, uniform cost in [10, 200] and price = cost × uniform markup in
//! [1.5, 2.5], both rounded to cents.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dimensions::{sql_str, DimensionRecord, GEN_BATCH_SIZE};
use crate::error::Result;
use crate::money::{format_cents, round_cents};
use crate::output::csv::DimensionWriter;

/// Category taxonomy: each category carries exactly three subcategories.
pub const TAXONOMY: [(&str, [&str; 3]); 5] = [
    ("Electronics", ["Smartphones", "Laptops", "Headphones"]),
    ("Clothing", ["Shirts", "Pants", "Shoes"]),
    ("Home", ["Furniture", "Appliances", "Decor"]),
    ("Books", ["Fiction", "Non-Fiction", "Educational"]),
    ("Sports", ["Equipment", "Apparel", "Accessories"]),
];

pub const BRANDS: [&str; 4] = ["BrandA", "BrandB", "BrandC", "Generic"];

pub const COST_RANGE: (f64, f64) = (10.0, 200.0);
pub const MARKUP_RANGE: (f64, f64) = (1.5, 2.5);

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub product_name: String,
    pub category: String,
    pub subcategory: String,
    pub brand: String,
    pub price: f64,
    pub cost: f64,
}

impl DimensionRecord for ProductRecord {
    const TABLE: &'static str = "products";
    const FILE_NAME: &'static str = "products.csv";
    const HEADER: &'static [&'static str] = &[
        "product_name",
        "category",
        "subcategory",
        "brand",
        "price",
        "cost",
    ];

    fn to_csv_row(&self) -> Vec<String> {
        vec![
            self.product_name.clone(),
            self.category.clone(),
            self.subcategory.clone(),
            self.brand.clone(),
            format_cents(self.price),
            format_cents(self.cost),
        ]
    }

    fn from_csv_row(fields: &[String]) -> std::result::Result<Self, String> {
        let price: f64 = fields[4]
            .parse()
            .map_err(|_| format!("bad price '{}'", fields[4]))?;
        let cost: f64 = fields[5]
            .parse()
            .map_err(|_| format!("bad cost '{}'", fields[5]))?;
        Ok(Self {
            product_name: fields[0].clone(),
            category: fields[1].clone(),
            subcategory: fields[2].clone(),
            brand: fields[3].clone(),
            price,
            cost,
        })
    }

    fn sql_tuple(&self) -> String {
        format!(
            "({}, {}, {}, {}, {}, {})",
            sql_str(&self.product_name),
            sql_str(&self.category),
            sql_str(&self.subcategory),
            sql_str(&self.brand),
            format_cents(self.price),
            format_cents(self.cost),
        )
    }
}

/// Generation parameters for the product dimension.
#[derive(Debug, Clone)]
pub struct ProductGenConfig {
    pub count: usize,
    pub seed: u64,
}

fn generate_one(rng: &mut StdRng, row_index: usize) -> ProductRecord {
    let (category, subcategories) = &TAXONOMY[rng.random_range(0..TAXONOMY.len())];
    let subcategory = subcategories[rng.random_range(0..subcategories.len())];
    let brand = BRANDS[rng.random_range(0..BRANDS.len())];

    let cost = round_cents(rng.random_range(COST_RANGE.0..=COST_RANGE.1));
    let price = round_cents(cost * rng.random_range(MARKUP_RANGE.0..=MARKUP_RANGE.1));

    ProductRecord {
        product_name: format!("{} {} {}", brand, subcategory, row_index + 1),
        category: category.to_string(),
        subcategory: subcategory.to_string(),
        brand: brand.to_string(),
        price,
        cost,
    }
}

/// Generate all products in memory.
pub fn generate(config: &ProductGenConfig) -> Vec<ProductRecord> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    (0..config.count)
        .map(|i| generate_one(&mut rng, i))
        .collect()
}

/// Generate the product dimension file in bounded batches.
pub fn generate_file(
    data_dir: &Path,
    config: &ProductGenConfig,
    progress: Option<&dyn Fn(usize, usize)>,
) -> Result<usize> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut writer = DimensionWriter::create(
        &data_dir.join(ProductRecord::FILE_NAME),
        ProductRecord::HEADER,
    )?;

    let mut written = 0usize;
    while written < config.count {
        let batch_end = (written + GEN_BATCH_SIZE).min(config.count);
        for i in written..batch_end {
            let record = generate_one(&mut rng, i);
            writer.write_row(record.to_csv_row())?;
        }
        written = batch_end;
        if let Some(cb) = progress {
            cb(written, config.count);
        }
    }

    writer.finish()
}
