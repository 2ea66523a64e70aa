//! # Error Types
//!
//! Defines `MartSeedError`, the unified error enum for every failure mode in
//! the seeding pipeline. Every variant carries enough context (table name,
//! batch index, SQL snippet, file path) to diagnose a failed run without
//! re-running it under a debugger.

use thiserror::Error;

/// All errors that can occur in MartSeed operations.
#[derive(Error, Debug)]
pub enum MartSeedError {
    #[error("Configuration error: {message}\n  MartSeed reads the connection from DATABASE_URL, or from DB_HOST/DB_PORT/DB_NAME/DB_USER/DB_PASSWORD (a .env file is honored)")]
    Config { message: String },

    #[error("Database connection failed: {message}\n  Connection: {connection_hint}\n  Cause: {source}")]
    Connection {
        message: String,
        connection_hint: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Flat file error in {path} at line {line}: {message}")]
    FlatFile {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Output error: {message}: {source}")]
    Output {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot synthesize transactions: dimension '{table}' has no rows\n  Load the dimensions before generating facts")]
    EmptyDimension { table: String },

    #[error("Insert failed on {table} (batch {batch}): {message}\n  SQL: {sql_preview}\n  DB error: {source}")]
    InsertFailed {
        table: String,
        batch: usize,
        message: String,
        sql_preview: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Report '{report}' failed: {source}")]
    ReportFailed {
        report: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Query failed: {message}: {source}")]
    Query {
        message: String,
        #[source]
        source: sqlx::Error,
    },
}

pub type Result<T> = std::result::Result<T, MartSeedError>;
