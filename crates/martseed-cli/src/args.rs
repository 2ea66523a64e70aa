use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "martseed",
    about = "Populate a star-schema sales warehouse with synthetic data and run canned analytics",
    version,
    after_help = "Examples:\n  martseed seed                              # 5000 customers, 500 products, 85000 transactions\n  martseed seed --transactions 10000 --seed 42\n  martseed report                            # all reports, top-10\n  martseed report --limit 25 --format json\n\nThe warehouse connection comes from DATABASE_URL or DB_HOST/DB_PORT/DB_NAME/DB_USER/DB_PASSWORD (a .env file is honored)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate dimension files, load the warehouse, and synthesize transactions
    Seed(SeedArgs),

    /// Run the canned analytics reports against a loaded warehouse
    Report(ReportArgs),
}

#[derive(Parser, Debug)]
pub struct SeedArgs {
    /// Number of customers to generate
    #[arg(long, default_value = "5000")]
    pub customers: usize,

    /// Number of products to generate
    #[arg(long, default_value = "500")]
    pub products: usize,

    /// Number of sales transactions to synthesize
    #[arg(long, default_value = "85000")]
    pub transactions: usize,

    /// Transactions generated and committed per batch
    #[arg(long, default_value = "5000")]
    pub batch_size: usize,

    /// Random seed for deterministic generation (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for the dimension flat files
    #[arg(long, default_value = "data")]
    pub data_dir: String,
}

#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Row limit for the top-N reports
    #[arg(long, default_value = "10")]
    pub limit: i64,

    /// Output format
    #[arg(long, default_value = "table")]
    pub format: ReportFormat,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ReportFormat {
    Table,
    Json,
}
