use anyhow::Result;
use comfy_table::Table as ComfyTable;
use serde_json::json;

use martseed_core::report::{self, ReportResult};
use martseed_core::WarehouseConfig;

use crate::args::{ReportArgs, ReportFormat};

pub async fn run(args: &ReportArgs) -> Result<()> {
    let config = WarehouseConfig::from_env()?;
    let pool = config.connect().await?;

    let outcomes = report::run_all(&pool, args.limit).await;

    match args.format {
        ReportFormat::Table => print_tables(&outcomes),
        ReportFormat::Json => print_json(&outcomes)?,
    }

    let failed = outcomes.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} reports failed", failed, outcomes.len());
    }
    Ok(())
}

fn print_tables(outcomes: &[(report::ReportKind, martseed_core::Result<ReportResult>)]) {
    for (kind, outcome) in outcomes {
        println!("\n{}", kind.title());
        println!("{}", "=".repeat(50));
        match outcome {
            Ok(result) => {
                if result.rows.is_empty() {
                    println!("(no rows)");
                    continue;
                }
                let mut table = ComfyTable::new();
                table.set_header(result.columns.clone());
                for row in &result.rows {
                    table.add_row(row.clone());
                }
                println!("{}", table);
            }
            Err(e) => println!("FAILED: {:#}", e),
        }
    }
}

fn print_json(
    outcomes: &[(report::ReportKind, martseed_core::Result<ReportResult>)],
) -> Result<()> {
    let entries: Vec<serde_json::Value> = outcomes
        .iter()
        .map(|(kind, outcome)| match outcome {
            Ok(result) => json!({
                "title": result.title,
                "columns": result.columns,
                "rows": result.rows,
            }),
            Err(e) => json!({
                "title": kind.title(),
                "error": format!("{:#}", e),
            }),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
