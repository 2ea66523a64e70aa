//! Date dimension: one row per calendar day over a fixed contiguous range,
//! with derived calendar attributes. Day-of-week numbering is Monday=1
//! through Sunday=7; week numbers are ISO weeks.

use std::path::Path;

use chrono::{Datelike, NaiveDate};

use crate::dimensions::{sql_str, DimensionRecord};
use crate::error::Result;
use crate::output::csv::DimensionWriter;

/// Default range: two full calendar years.
pub const DEFAULT_START: NaiveDate = match NaiveDate::from_ymd_opt(2023, 1, 1) {
    Some(d) => d,
    None => unreachable!(),
};
pub const DEFAULT_END: NaiveDate = match NaiveDate::from_ymd_opt(2024, 12, 31) {
    Some(d) => d,
    None => unreachable!(),
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRecord {
    pub date_value: NaiveDate,
    pub year: i32,
    pub quarter: u32,
    pub month: u32,
    pub day: u32,
    /// Monday=1 .. Sunday=7.
    pub day_of_week: u32,
    /// ISO week number.
    pub week_of_year: u32,
    pub is_weekend: bool,
}

impl DateRecord {
    /// Derive all calendar attributes for one day.
    pub fn for_date(date: NaiveDate) -> Self {
        let day_of_week = date.weekday().number_from_monday();
        Self {
            date_value: date,
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
            month: date.month(),
            day: date.day(),
            day_of_week,
            week_of_year: date.iso_week().week(),
            is_weekend: day_of_week >= 6,
        }
    }
}

impl DimensionRecord for DateRecord {
    const TABLE: &'static str = "date_dimension";
    const FILE_NAME: &'static str = "date_dimension.csv";
    const HEADER: &'static [&'static str] = &[
        "date_value",
        "year",
        "quarter",
        "month",
        "day",
        "day_of_week",
        "week_of_year",
        "is_weekend",
    ];

    fn to_csv_row(&self) -> Vec<String> {
        vec![
            self.date_value.format("%Y-%m-%d").to_string(),
            self.year.to_string(),
            self.quarter.to_string(),
            self.month.to_string(),
            self.day.to_string(),
            self.day_of_week.to_string(),
            self.week_of_year.to_string(),
            self.is_weekend.to_string(),
        ]
    }

    fn from_csv_row(fields: &[String]) -> std::result::Result<Self, String> {
        let date_value = NaiveDate::parse_from_str(&fields[0], "%Y-%m-%d")
            .map_err(|e| format!("bad date_value '{}': {}", fields[0], e))?;
        Ok(Self {
            date_value,
            year: parse(&fields[1], "year")?,
            quarter: parse(&fields[2], "quarter")?,
            month: parse(&fields[3], "month")?,
            day: parse(&fields[4], "day")?,
            day_of_week: parse(&fields[5], "day_of_week")?,
            week_of_year: parse(&fields[6], "week_of_year")?,
            is_weekend: parse_bool(&fields[7])?,
        })
    }

    fn sql_tuple(&self) -> String {
        format!(
            "({}, {}, {}, {}, {}, {}, {}, {})",
            sql_str(&self.date_value.format("%Y-%m-%d").to_string()),
            self.year,
            self.quarter,
            self.month,
            self.day,
            self.day_of_week,
            self.week_of_year,
            if self.is_weekend { "TRUE" } else { "FALSE" },
        )
    }
}

fn parse<T: std::str::FromStr>(raw: &str, field: &str) -> std::result::Result<T, String> {
    raw.parse()
        .map_err(|_| format!("bad {} '{}'", field, raw))
}

fn parse_bool(raw: &str) -> std::result::Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("bad is_weekend '{}'", raw)),
    }
}

/// Generate every calendar day in `[start, end]` inclusive, in order.
pub fn generate_range(start: NaiveDate, end: NaiveDate) -> Vec<DateRecord> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(DateRecord::for_date)
        .collect()
}

/// Generate the default two-year range and write it to the data directory.
pub fn generate_file(data_dir: &Path) -> Result<usize> {
    let records = generate_range(DEFAULT_START, DEFAULT_END);
    let mut writer =
        DimensionWriter::create(&data_dir.join(DateRecord::FILE_NAME), DateRecord::HEADER)?;
    for record in &records {
        writer.write_row(record.to_csv_row())?;
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_ten_day_scenario() {
        let records = generate_range(d(2023, 1, 1), d(2023, 1, 10));
        assert_eq!(records.len(), 10);

        let weekend_days: Vec<NaiveDate> = records
            .iter()
            .filter(|r| r.is_weekend)
            .map(|r| r.date_value)
            .collect();
        // 2023-01-01 is a Sunday; the 7th and 8th are the following weekend.
        assert_eq!(weekend_days, vec![d(2023, 1, 1), d(2023, 1, 7), d(2023, 1, 8)]);
    }

    #[test]
    fn test_default_range_complete_no_gaps() {
        let records = generate_range(DEFAULT_START, DEFAULT_END);
        // 2024 is a leap year: 365 + 366.
        assert_eq!(records.len(), 731);

        for pair in records.windows(2) {
            assert_eq!(
                pair[1].date_value,
                pair[0].date_value.succ_opt().unwrap(),
                "gap or duplicate after {}",
                pair[0].date_value
            );
        }
    }

    #[test]
    fn test_calendar_attributes() {
        let r = DateRecord::for_date(d(2023, 1, 2)); // a Monday
        assert_eq!(r.year, 2023);
        assert_eq!(r.quarter, 1);
        assert_eq!(r.month, 1);
        assert_eq!(r.day, 2);
        assert_eq!(r.day_of_week, 1);
        assert_eq!(r.week_of_year, 1);
        assert!(!r.is_weekend);

        let r = DateRecord::for_date(d(2024, 11, 30)); // a Saturday
        assert_eq!(r.quarter, 4);
        assert_eq!(r.day_of_week, 6);
        assert!(r.is_weekend);
    }

    #[test]
    fn test_csv_round_trip() {
        let original = DateRecord::for_date(d(2023, 6, 15));
        let parsed = DateRecord::from_csv_row(&original.to_csv_row()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_sql_tuple() {
        let r = DateRecord::for_date(d(2023, 1, 7));
        assert_eq!(r.sql_tuple(), "('2023-01-07', 2023, 1, 1, 7, 6, 1, TRUE)");
    }
}
