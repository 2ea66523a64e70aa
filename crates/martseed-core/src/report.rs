//! # Canned Analytics Reports
//!
//! Six fixed aggregate queries over the fact table joined to its
//! dimensions. Every output column is cast to text in SQL so results decode
//! uniformly into string grids; monetary aggregates are rounded to 2dp by
//! the store. Reports are independent: `run_all` attempts every report and
//! records failures per report instead of aborting the run.

use serde::Serialize;
use sqlx::{PgPool, Row};
use tracing::warn;

use crate::error::{MartSeedError, Result};

/// Default row limit for the top-N reports.
pub const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportKind {
    MonthlySales,
    TopCustomers,
    TopProducts,
    CategoryMix,
    SegmentMix,
    WeekendVsWeekday,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::MonthlySales,
        ReportKind::TopCustomers,
        ReportKind::TopProducts,
        ReportKind::CategoryMix,
        ReportKind::SegmentMix,
        ReportKind::WeekendVsWeekday,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::MonthlySales => "Monthly Sales Analysis",
            ReportKind::TopCustomers => "Top Customers by Revenue",
            ReportKind::TopProducts => "Top Products by Revenue",
            ReportKind::CategoryMix => "Sales by Product Category",
            ReportKind::SegmentMix => "Customer Segment Analysis",
            ReportKind::WeekendVsWeekday => "Weekend vs Weekday Sales",
        }
    }

    /// Whether the report takes a row limit (`$1`).
    pub fn takes_limit(&self) -> bool {
        matches!(self, ReportKind::TopCustomers | ReportKind::TopProducts)
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            ReportKind::MonthlySales => &[
                "year",
                "month",
                "total_transactions",
                "total_revenue",
                "avg_order_value",
                "total_items_sold",
            ],
            ReportKind::TopCustomers => &[
                "customer_name",
                "customer_segment",
                "city",
                "total_orders",
                "total_spent",
                "avg_order_value",
            ],
            ReportKind::TopProducts => &[
                "product_name",
                "category",
                "brand",
                "times_sold",
                "total_quantity_sold",
                "total_revenue",
                "avg_sale_value",
            ],
            ReportKind::CategoryMix => &[
                "category",
                "total_transactions",
                "total_items_sold",
                "total_revenue",
                "avg_transaction_value",
                "revenue_percentage",
            ],
            ReportKind::SegmentMix => &[
                "customer_segment",
                "total_customers",
                "total_transactions",
                "total_revenue",
                "avg_order_value",
                "revenue_per_customer",
            ],
            ReportKind::WeekendVsWeekday => &[
                "day_type",
                "total_transactions",
                "total_revenue",
                "avg_transaction_value",
            ],
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            ReportKind::MonthlySales => {
                "SELECT
                    d.year::text,
                    d.month::text,
                    COUNT(*)::text AS total_transactions,
                    ROUND(SUM(st.total_amount), 2)::text AS total_revenue,
                    ROUND(AVG(st.total_amount), 2)::text AS avg_order_value,
                    SUM(st.quantity)::text AS total_items_sold
                 FROM sales_transactions st
                 JOIN date_dimension d ON st.date_id = d.date_id
                 GROUP BY d.year, d.month
                 ORDER BY d.year, d.month"
            }
            ReportKind::TopCustomers => {
                "SELECT
                    c.first_name || ' ' || c.last_name AS customer_name,
                    c.customer_segment,
                    c.city,
                    COUNT(*)::text AS total_orders,
                    ROUND(SUM(st.total_amount), 2)::text AS total_spent,
                    ROUND(AVG(st.total_amount), 2)::text AS avg_order_value
                 FROM sales_transactions st
                 JOIN customers c ON st.customer_id = c.customer_id
                 GROUP BY c.customer_id, c.first_name, c.last_name, c.customer_segment, c.city
                 ORDER BY SUM(st.total_amount) DESC
                 LIMIT $1"
            }
            ReportKind::TopProducts => {
                "SELECT
                    p.product_name,
                    p.category,
                    p.brand,
                    COUNT(*)::text AS times_sold,
                    SUM(st.quantity)::text AS total_quantity_sold,
                    ROUND(SUM(st.total_amount), 2)::text AS total_revenue,
                    ROUND(AVG(st.total_amount), 2)::text AS avg_sale_value
                 FROM sales_transactions st
                 JOIN products p ON st.product_id = p.product_id
                 GROUP BY p.product_id, p.product_name, p.category, p.brand
                 ORDER BY SUM(st.total_amount) DESC
                 LIMIT $1"
            }
            ReportKind::CategoryMix => {
                "SELECT
                    p.category,
                    COUNT(*)::text AS total_transactions,
                    SUM(st.quantity)::text AS total_items_sold,
                    ROUND(SUM(st.total_amount), 2)::text AS total_revenue,
                    ROUND(AVG(st.total_amount), 2)::text AS avg_transaction_value,
                    ROUND(SUM(st.total_amount) * 100.0 / SUM(SUM(st.total_amount)) OVER (), 2)::text AS revenue_percentage
                 FROM sales_transactions st
                 JOIN products p ON st.product_id = p.product_id
                 GROUP BY p.category
                 ORDER BY SUM(st.total_amount) DESC"
            }
            ReportKind::SegmentMix => {
                "SELECT
                    c.customer_segment,
                    COUNT(DISTINCT c.customer_id)::text AS total_customers,
                    COUNT(*)::text AS total_transactions,
                    ROUND(SUM(st.total_amount), 2)::text AS total_revenue,
                    ROUND(AVG(st.total_amount), 2)::text AS avg_order_value,
                    ROUND(SUM(st.total_amount) / COUNT(DISTINCT c.customer_id), 2)::text AS revenue_per_customer
                 FROM sales_transactions st
                 JOIN customers c ON st.customer_id = c.customer_id
                 GROUP BY c.customer_segment
                 ORDER BY SUM(st.total_amount) DESC"
            }
            ReportKind::WeekendVsWeekday => {
                "SELECT
                    CASE WHEN d.is_weekend THEN 'Weekend' ELSE 'Weekday' END AS day_type,
                    COUNT(*)::text AS total_transactions,
                    ROUND(SUM(st.total_amount), 2)::text AS total_revenue,
                    ROUND(AVG(st.total_amount), 2)::text AS avg_transaction_value
                 FROM sales_transactions st
                 JOIN date_dimension d ON st.date_id = d.date_id
                 GROUP BY d.is_weekend
                 ORDER BY SUM(st.total_amount) DESC"
            }
        }
    }
}

/// The decoded result of one report: a string grid under fixed columns.
#[derive(Debug, Clone, Serialize)]
pub struct ReportResult {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Run a single report.
pub async fn run_report(pool: &PgPool, kind: ReportKind, limit: i64) -> Result<ReportResult> {
    let query = if kind.takes_limit() {
        sqlx::query(kind.sql()).bind(limit)
    } else {
        sqlx::query(kind.sql())
    };

    let db_rows = query
        .fetch_all(pool)
        .await
        .map_err(|e| MartSeedError::ReportFailed {
            report: kind.title().to_string(),
            source: e,
        })?;

    let columns = kind.columns();
    let mut rows = Vec::with_capacity(db_rows.len());
    for db_row in db_rows {
        let mut row = Vec::with_capacity(columns.len());
        for (i, _) in columns.iter().enumerate() {
            let value: Option<String> =
                db_row.try_get(i).map_err(|e| MartSeedError::ReportFailed {
                    report: kind.title().to_string(),
                    source: e,
                })?;
            row.push(value.unwrap_or_default());
        }
        rows.push(row);
    }

    Ok(ReportResult {
        title: kind.title().to_string(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows,
    })
}

/// Run every report. A failure in one is recorded and does not prevent
/// the rest from running.
pub async fn run_all(
    pool: &PgPool,
    limit: i64,
) -> Vec<(ReportKind, Result<ReportResult>)> {
    let mut outcomes = Vec::with_capacity(ReportKind::ALL.len());
    for kind in ReportKind::ALL {
        let outcome = run_report(pool, kind, limit).await;
        if let Err(ref e) = outcome {
            warn!(report = kind.title(), error = %e, "report failed");
        }
        outcomes.push((kind, outcome));
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_report_selects_its_columns() {
        for kind in ReportKind::ALL {
            let sql = kind.sql();
            for col in kind.columns() {
                assert!(
                    sql.contains(col),
                    "{:?} SQL does not mention column {}",
                    kind,
                    col
                );
            }
        }
    }

    #[test]
    fn test_only_top_n_reports_take_limit() {
        for kind in ReportKind::ALL {
            assert_eq!(kind.takes_limit(), kind.sql().contains("$1"), "{:?}", kind);
        }
    }

    #[test]
    fn test_reports_are_read_only() {
        for kind in ReportKind::ALL {
            let sql = kind.sql().to_uppercase();
            assert!(sql.trim_start().starts_with("SELECT"), "{:?}", kind);
            for verb in ["INSERT ", "UPDATE ", "DELETE ", "DROP "] {
                assert!(!sql.contains(verb), "{:?} contains {}", kind, verb);
            }
        }
    }
}
