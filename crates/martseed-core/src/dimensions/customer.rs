//! Customer dimension: identity and address fields from `fake` providers,
//! a weighted segment, and a registration date within the year before a
//! pinned anchor date. The anchor is pinned (rather than read from the
//! wall clock inside the generator) so a fixed seed reproduces the file
//! byte for byte.

use std::path::Path;

use chrono::{Days, NaiveDate};
use fake::faker::address::en::{CityName, StateAbbr};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dimensions::{sql_str, weighted_pick, DimensionRecord, GEN_BATCH_SIZE};
use crate::error::Result;
use crate::output::csv::DimensionWriter;

/// Customer segments and their draw weights.
pub const SEGMENTS: [(&str, f64); 4] = [
    ("Premium", 0.10),
    ("Standard", 0.40),
    ("Basic", 0.40),
    ("VIP", 0.10),
];

/// Phone numbers are truncated to the warehouse column width.
const PHONE_MAX_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub customer_segment: String,
    pub registration_date: NaiveDate,
}

impl DimensionRecord for CustomerRecord {
    const TABLE: &'static str = "customers";
    const FILE_NAME: &'static str = "customers.csv";
    const HEADER: &'static [&'static str] = &[
        "first_name",
        "last_name",
        "email",
        "phone",
        "city",
        "state",
        "country",
        "customer_segment",
        "registration_date",
    ];

    fn to_csv_row(&self) -> Vec<String> {
        vec![
            self.first_name.clone(),
            self.last_name.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.city.clone(),
            self.state.clone(),
            self.country.clone(),
            self.customer_segment.clone(),
            self.registration_date.format("%Y-%m-%d").to_string(),
        ]
    }

    fn from_csv_row(fields: &[String]) -> std::result::Result<Self, String> {
        let registration_date = NaiveDate::parse_from_str(&fields[8], "%Y-%m-%d")
            .map_err(|e| format!("bad registration_date '{}': {}", fields[8], e))?;
        Ok(Self {
            first_name: fields[0].clone(),
            last_name: fields[1].clone(),
            email: fields[2].clone(),
            phone: fields[3].clone(),
            city: fields[4].clone(),
            state: fields[5].clone(),
            country: fields[6].clone(),
            customer_segment: fields[7].clone(),
            registration_date,
        })
    }

    fn sql_tuple(&self) -> String {
        format!(
            "({}, {}, {}, {}, {}, {}, {}, {}, {})",
            sql_str(&self.first_name),
            sql_str(&self.last_name),
            sql_str(&self.email),
            sql_str(&self.phone),
            sql_str(&self.city),
            sql_str(&self.state),
            sql_str(&self.country),
            sql_str(&self.customer_segment),
            sql_str(&self.registration_date.format("%Y-%m-%d").to_string()),
        )
    }
}

/// Generation parameters for the customer dimension.
#[derive(Debug, Clone)]
pub struct CustomerGenConfig {
    pub count: usize,
    pub seed: u64,
    /// Registration dates fall within the 365 days before this date.
    pub anchor_date: NaiveDate,
}

/// Generate one customer.
///
/// `row_index` is appended to the email local part so that emails stay
/// distinct without a uniqueness tracker.
fn generate_one(rng: &mut StdRng, row_index: usize, anchor_date: NaiveDate) -> CustomerRecord {
    let email: String = SafeEmail().fake_with_rng(rng);
    let email = match email.split_once('@') {
        Some((local, domain)) => format!("{}.{}@{}", local, row_index, domain),
        None => format!("customer{}@example.com", row_index),
    };

    let mut phone: String = PhoneNumber().fake_with_rng(rng);
    phone.truncate(PHONE_MAX_LEN);

    let days_ago = rng.random_range(0..=365u64);
    let registration_date = anchor_date
        .checked_sub_days(Days::new(days_ago))
        .unwrap_or(anchor_date);

    CustomerRecord {
        first_name: FirstName().fake_with_rng(rng),
        last_name: LastName().fake_with_rng(rng),
        email,
        phone,
        city: CityName().fake_with_rng(rng),
        state: StateAbbr().fake_with_rng(rng),
        country: "USA".to_string(),
        customer_segment: weighted_pick(&SEGMENTS, rng).to_string(),
        registration_date,
    }
}

/// Generate all customers in memory. Test and preview convenience; the
/// pipeline streams through `generate_file` instead.
pub fn generate(config: &CustomerGenConfig) -> Vec<CustomerRecord> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    (0..config.count)
        .map(|i| generate_one(&mut rng, i, config.anchor_date))
        .collect()
}

/// Generate the customer dimension file in bounded batches.
///
/// `progress` receives (rows_written, total) after each batch.
pub fn generate_file(
    data_dir: &Path,
    config: &CustomerGenConfig,
    progress: Option<&dyn Fn(usize, usize)>,
) -> Result<usize> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut writer = DimensionWriter::create(
        &data_dir.join(CustomerRecord::FILE_NAME),
        CustomerRecord::HEADER,
    )?;

    let mut written = 0usize;
    while written < config.count {
        let batch_end = (written + GEN_BATCH_SIZE).min(config.count);
        for i in written..batch_end {
            let record = generate_one(&mut rng, i, config.anchor_date);
            writer.write_row(record.to_csv_row())?;
        }
        written = batch_end;
        if let Some(cb) = progress {
            cb(written, config.count);
        }
    }

    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(count: usize, seed: u64) -> CustomerGenConfig {
        CustomerGenConfig {
            count,
            seed,
            anchor_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    #[test]
    fn test_generate_count_and_fields() {
        let customers = generate(&config(50, 42));
        assert_eq!(customers.len(), 50);

        for c in &customers {
            assert!(c.email.contains('@'));
            assert!(c.phone.len() <= PHONE_MAX_LEN);
            assert_eq!(c.country, "USA");
            assert!(SEGMENTS.iter().any(|(s, _)| *s == c.customer_segment));
            assert!(c.registration_date <= NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        }
    }

    #[test]
    fn test_emails_distinct() {
        let customers = generate(&config(200, 1));
        let mut emails: Vec<&str> = customers.iter().map(|c| c.email.as_str()).collect();
        emails.sort_unstable();
        emails.dedup();
        assert_eq!(emails.len(), 200);
    }

    #[test]
    fn test_fixed_seed_reproduces_file_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(120, 99);

        generate_file(dir.path(), &cfg, None).unwrap();
        let first = std::fs::read(dir.path().join(CustomerRecord::FILE_NAME)).unwrap();

        generate_file(dir.path(), &cfg, None).unwrap();
        let second = std::fs::read(dir.path().join(CustomerRecord::FILE_NAME)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_file_matches_in_memory_generation() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(30, 7);

        generate_file(dir.path(), &cfg, None).unwrap();
        let rows = crate::output::csv::read_dimension_file(
            &dir.path().join(CustomerRecord::FILE_NAME),
            CustomerRecord::HEADER,
        )
        .unwrap();

        let expected = generate(&cfg);
        assert_eq!(rows.len(), expected.len());
        for (row, record) in rows.iter().zip(&expected) {
            assert_eq!(CustomerRecord::from_csv_row(row).unwrap(), *record);
        }
    }

    #[test]
    fn test_segment_distribution_roughly_weighted() {
        let customers = generate(&config(2000, 3));
        let standard = customers
            .iter()
            .filter(|c| c.customer_segment == "Standard")
            .count();
        let vip = customers
            .iter()
            .filter(|c| c.customer_segment == "VIP")
            .count();
        // 0.40 vs 0.10 weights; allow generous slack.
        assert!(standard > 600, "Standard: {}", standard);
        assert!(vip < 350, "VIP: {}", vip);
    }
}
