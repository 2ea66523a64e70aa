//! Test utilities for MartSeed: the warehouse DDL (the store schema is
//! pre-created in production, so it lives here for integration tests only)
//! and the test-database gate.

use sqlx::PgPool;

/// Star schema DDL: three dimensions plus the fact table, with serial
/// surrogate keys and foreign keys from the fact table to each dimension.
pub const SCHEMA_SQL: &str = r#"
DROP TABLE IF EXISTS sales_transactions;
DROP TABLE IF EXISTS customers;
DROP TABLE IF EXISTS products;
DROP TABLE IF EXISTS date_dimension;

CREATE TABLE date_dimension (
    date_id SERIAL PRIMARY KEY,
    date_value DATE NOT NULL,
    year INT NOT NULL,
    quarter INT NOT NULL,
    month INT NOT NULL,
    day INT NOT NULL,
    day_of_week INT NOT NULL,
    week_of_year INT NOT NULL,
    is_weekend BOOLEAN NOT NULL
);

CREATE TABLE customers (
    customer_id SERIAL PRIMARY KEY,
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    email VARCHAR(255) NOT NULL,
    phone VARCHAR(20),
    city VARCHAR(100),
    state VARCHAR(2),
    country VARCHAR(50),
    customer_segment VARCHAR(20) NOT NULL,
    registration_date DATE NOT NULL
);

CREATE TABLE products (
    product_id SERIAL PRIMARY KEY,
    product_name VARCHAR(200) NOT NULL,
    category VARCHAR(50) NOT NULL,
    subcategory VARCHAR(50) NOT NULL,
    brand VARCHAR(50) NOT NULL,
    price NUMERIC(10, 2) NOT NULL,
    cost NUMERIC(10, 2) NOT NULL
);

CREATE TABLE sales_transactions (
    transaction_id SERIAL PRIMARY KEY,
    customer_id INT NOT NULL REFERENCES customers (customer_id),
    product_id INT NOT NULL REFERENCES products (product_id),
    date_id INT NOT NULL REFERENCES date_dimension (date_id),
    quantity INT NOT NULL,
    unit_price NUMERIC(10, 2) NOT NULL,
    total_amount NUMERIC(10, 2) NOT NULL,
    discount_amount NUMERIC(10, 2) NOT NULL
);
"#;

/// Drop and recreate the warehouse schema.
pub async fn reset_schema(pool: &PgPool) -> sqlx::Result<()> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

/// Connection URL for integration tests, taken from `TEST_POSTGRES_URL`.
/// Tests skip themselves when it is unset.
pub fn test_pg_url() -> Option<String> {
    std::env::var("TEST_POSTGRES_URL").ok()
}
