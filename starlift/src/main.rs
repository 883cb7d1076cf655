// starlift/src/main.rs

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use comfy_table::Table;

// Infrastructure (Config & Adapters)
use starlift_core::infrastructure::adapters::duckdb::DuckDbExecutor;
use starlift_core::infrastructure::config::{build_graph, load_pipeline_config};

// Application (Use Cases)
use starlift_core::application::{PipelineRunResult, run_pipeline};
use starlift_core::domain::context::RunContext;
use starlift_core::domain::quality::RunReport;
use starlift_core::ports::executor::QueryExecutor;

#[derive(Parser)]
#[command(name = "starlift")]
#[command(about = "Batch star-schema ETL engine with a data-quality gate", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 🚀 Runs the pipeline graph (stage -> load -> quality gate)
    Run {
        /// Project directory (holds starlift.yml)
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Warehouse database file
        #[arg(long, default_value = "starlift.duckdb")]
        db_path: String,

        /// Scheduled date of the run (YYYY-MM-DD), for backfills.
        /// Defaults to now.
        #[arg(long)]
        date: Option<String>,

        /// Extra template parameters (key=value), repeatable
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// 🔎 Loads the configuration and builds the graph without executing it
    Validate {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// ⚡ Executes a raw SQL query (Ad-hoc)
    Query {
        query: String,
        #[arg(long, default_value = "starlift.duckdb")]
        db_path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug starlift run ... for the details
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        // --- USE CASE: RUN PIPELINE ---
        Commands::Run {
            project_dir,
            db_path,
            date,
            params,
        } => {
            let start = std::time::Instant::now();

            println!("⚙️  Loading configuration...");
            let config = load_pipeline_config(&project_dir)?;
            println!("   Pipeline: {}", config.name);

            let tasks = build_graph(&config, &project_dir)?;
            let executor = DuckDbExecutor::new(&db_path)?;

            let mut ctx = RunContext::new(scheduled_at(date.as_deref())?);
            ctx.params = parse_params(&params)?;

            let result = run_pipeline(
                &tasks,
                &ctx,
                &executor,
                &config.retry.policy(),
                &config.auth_ref,
                config.max_parallelism,
            )
            .await;

            match result {
                Ok(run_res) => {
                    if let Some(report) = &run_res.report {
                        print_report_table(report);
                    }
                    save_run_results(&project_dir.join(&config.target_path), &run_res)?;

                    if run_res.success {
                        println!("\n✨ SUCCESS! Pipeline finished in {:.2?}", start.elapsed());
                    } else {
                        eprintln!("\n❌ FAILURE. Run marked failed; see the summaries above.");
                        // Exit with error code for the surrounding scheduler
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    eprintln!("\n💥 CRITICAL PIPELINE ERROR: {}", e);
                    std::process::exit(1);
                }
            }
        }

        // --- USE CASE: VALIDATE CONFIG ---
        Commands::Validate { project_dir } => {
            let config = load_pipeline_config(&project_dir)?;
            match build_graph(&config, &project_dir) {
                Ok(tasks) => {
                    println!("✅ Configuration valid: {} tasks in the graph.", tasks.len());
                }
                Err(e) => {
                    eprintln!("❌ Invalid configuration: {}", e);
                    std::process::exit(1);
                }
            }
        }

        // --- USE CASE: AD-HOC QUERY ---
        Commands::Query { query, db_path } => {
            let executor = DuckDbExecutor::new(&db_path)?;
            match executor.query(&query).await {
                Ok(rows) => {
                    for row in rows {
                        println!("{row:?}");
                    }
                }
                Err(e) => {
                    eprintln!("❌ Query failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

// --- HELPER FUNCTIONS ---

fn scheduled_at(date: Option<&str>) -> anyhow::Result<chrono::DateTime<Utc>> {
    match date {
        Some(d) => {
            let day = NaiveDate::parse_from_str(d, "%Y-%m-%d")?;
            Ok(Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN)))
        }
        None => Ok(Utc::now()),
    }
}

fn parse_params(raw: &[String]) -> anyhow::Result<HashMap<String, String>> {
    let mut params = HashMap::new();
    for entry in raw {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid --param '{entry}', expected KEY=VALUE"))?;
        params.insert(key.to_string(), value.to_string());
    }
    Ok(params)
}

fn print_report_table(report: &RunReport) {
    let mut table = Table::new();
    table.set_header(vec!["Check", "Table", "Column", "Status", "Metric"]);
    for result in report.results() {
        table.add_row(vec![
            result.check.to_string(),
            result.table.clone(),
            result.column.clone().unwrap_or_default(),
            if result.passed { "PASS" } else { "FAIL" }.to_string(),
            result
                .metric
                .map(|m| format!("{m:.2}"))
                .unwrap_or_default(),
        ]);
    }
    println!("{table}");
}

fn save_run_results(target_dir: &PathBuf, result: &PipelineRunResult) -> anyhow::Result<()> {
    fs::create_dir_all(target_dir)?;
    let content = serde_json::to_string_pretty(result)?;
    fs::write(target_dir.join("run_results.json"), content)?;
    Ok(())
}
