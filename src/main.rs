mod db;
mod index;
mod parser;
mod settings;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "problem_ingest",
    about = "Load the problem notebook (markdown + category config) into the problem database"
)]
struct Cli {
    /// YAML config with the `problem` category map
    #[arg(short, long, default_value = settings::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Markdown notebook (overrides `input` in the config)
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// SQLite database file (overrides `database` in the config)
    #[arg(short, long)]
    database: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    // Setup: any failure here ends the run.
    let settings = settings::load(
        &cli.config,
        &settings::Overrides {
            input: cli.input,
            database: cli.database,
        },
    )?;
    let file = File::open(&settings.input)
        .with_context(|| format!("Failed to open {:?}", settings.input))?;
    let conn = db::connect(&settings.database)?;

    let index = index::build_index(&settings.catalog);
    info!("Loaded {} problems from config", index.len());

    // `scan` consumes the reader, so the file is closed once it returns.
    let (index, report) = parser::scan(BufReader::new(file), index);
    info!(
        headers = report.headers,
        unknown = report.unknown.len(),
        "Scanned notebook, {} problems in index",
        index.len()
    );

    db::init_schema(&conn)?;
    let stats = db::insert_problems(&conn, &index)?;

    println!("Config:    {} problems", settings.catalog.problem_count());
    println!("Headers:   {}", report.headers);
    println!("Unknown:   {}", report.unknown.len());
    if report.orphan_markers > 0 {
        println!("Orphans:   {}", report.orphan_markers);
    }
    if report.read_errors > 0 {
        println!("Bad lines: {}", report.read_errors);
    }
    println!(
        "Inserted:  {} of {} ({} errors)",
        stats.ok, stats.total, stats.errors
    );
    println!("In table:  {}", db::count_problems(&conn)?);

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
