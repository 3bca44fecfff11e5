//! Askdb CLI: ask natural language questions over a SQLite database file.

use askdb::config::Config;
use askdb::executor;
use askdb::llm::LlmClient;
use askdb::{CorrectionOutcome, Pipeline, QueryOutcome, Session};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "askdb")]
#[command(about = "Natural language to SQL over uploaded SQLite databases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show schema overview: tables, columns, preview rows
    Overview {
        /// Path to the SQLite database file
        db: PathBuf,
    },

    /// Ask a natural language question and execute the generated SQL
    Ask {
        /// Path to the SQLite database file
        db: PathBuf,

        /// Natural language question
        question: String,

        /// Model name (overrides config and ASKDB_MODEL)
        #[arg(long)]
        model: Option<String>,

        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Execute a read-only SQL query directly
    Query {
        /// Path to the SQLite database file
        db: PathBuf,

        /// SQL query string (must start with SELECT)
        sql: String,

        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the current configuration
    Show,

    /// Set the default model
    SetModel {
        /// Model name (e.g., "gemini-1.5-flash", "gpt-4-turbo")
        model: String,
    },

    /// Set the region-explanation trigger terms
    SetRegionKeywords {
        /// Comma-separated terms (e.g., "region,country,india")
        keywords: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Overview { db } => cmd_overview(&db),
        Commands::Ask {
            db,
            question,
            model,
            format,
        } => cmd_ask(&db, &question, model, &format).await,
        Commands::Query { db, sql, format } => cmd_query(&db, &sql, &format),
        Commands::Config { command } => cmd_config(command),
    }
}

/// Open a session over a database path, expanding `~`.
fn open_session(db: &Path) -> anyhow::Result<Session> {
    let expanded = shellexpand::tilde(&db.to_string_lossy()).to_string();
    Ok(Session::open(Path::new(&expanded))?)
}

fn cmd_overview(db: &Path) -> anyhow::Result<()> {
    let session = open_session(db)?;
    println!(
        "{} Database: {}",
        "✓".green(),
        session.source_name().bright_white()
    );

    let overview = session.overview()?;

    for table in &overview.tables {
        println!("\n{} Table: {}", "•".green(), table.name.bright_white().bold());
        println!("  Columns: {}", table.columns.join(", ").dimmed());

        match overview.previews.iter().find(|p| p.table == table.name) {
            Some(preview) if !preview.rows.is_empty() => {
                print_table(&preview.columns, &preview.rows);
            }
            Some(_) => println!("  {}", "(no rows)".dimmed()),
            None => println!("  {}", "(preview unavailable)".yellow()),
        }
    }

    Ok(())
}

async fn cmd_ask(
    db: &Path,
    question: &str,
    model_override: Option<String>,
    format: &str,
) -> anyhow::Result<()> {
    println!("{} Question: \"{}\"", "→".cyan(), question.bright_white());

    let session = open_session(db)?;
    let config = Config::load()?;
    let model = model_override.unwrap_or_else(|| config.resolve_model());
    let client = LlmClient::for_model(model)?;
    println!("   {} Model: {}", "→".dimmed(), client.model().dimmed());

    let pipeline = Pipeline::new(client).with_region_keywords(config.region_keywords.clone());
    let report = pipeline.ask(&session, question).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{} Generated SQL:", "✓".green());
    println!("  {}", report.query.cyan());

    match &report.outcome {
        QueryOutcome::Rejected => {
            println!("\n{} Only SELECT queries are executed.", "✗".yellow());
            println!("  Try a different data question, like: 'Show top 5 products in 2024'.");
        }
        QueryOutcome::Empty => {
            println!("\n{} Query ran but returned no results.", "✓".green());
            println!(
                "  {}",
                "No data matched. Try rephrasing or making the question more specific.".yellow()
            );
        }
        QueryOutcome::Results(table) => {
            println!("\n{} {} row(s):\n", "✓".green(), table.rows.len());
            print_table(&table.columns, &table.rows);
        }
        QueryOutcome::Failed { error, correction } => {
            println!("\n{} Query failed: {}", "✗".red(), error);
            println!(
                "  {}",
                "This might be due to an unclear question or schema mismatch.".yellow()
            );
            println!("  Tip: reword the question, e.g. 'List all orders from sellers in India'.");

            match correction {
                CorrectionOutcome::Suggested(sql) => {
                    println!("\n{} Suggested fix (not executed):", "→".cyan());
                    println!("  {}", sql.cyan());
                }
                CorrectionOutcome::Failed(_) => {
                    println!(
                        "\n{} Could not suggest a fix. Try rephrasing the question.",
                        "✗".yellow()
                    );
                }
            }
        }
    }

    if let Some(note) = &report.explanation {
        println!("\n{} {}", "Note:".cyan().bold(), note);
    }

    Ok(())
}

fn cmd_query(db: &Path, sql: &str, format: &str) -> anyhow::Result<()> {
    let session = open_session(db)?;

    if !executor::is_read_query(sql) {
        println!("{} Only SELECT queries are executed.", "✗".yellow());
        return Ok(());
    }

    let table = executor::run_query(session.connection(), sql)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    if table.is_empty() {
        println!("{} Query ran but returned no results.", "✓".green());
    } else {
        println!("{} {} row(s):\n", "✓".green(), table.rows.len());
        print_table(&table.columns, &table.rows);
    }

    Ok(())
}

fn cmd_config(command: ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::SetModel { model } => {
            let mut config = Config::load()?;
            config.model = Some(model.clone());
            config.save()?;
            println!("{} Default model set to {}", "✓".green(), model.bright_white());
        }
        ConfigCommands::SetRegionKeywords { keywords } => {
            let mut config = Config::load()?;
            config.region_keywords = keywords
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            config.save()?;
            println!(
                "{} Region keywords set to [{}]",
                "✓".green(),
                config.region_keywords.join(", ").bright_white()
            );
        }
    }
    Ok(())
}

/// Print a result table with padded columns.
fn print_table(columns: &[String], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() && cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    let header = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect::<Vec<_>>()
        .join("  ");
    println!("  {}", header.bold());

    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ");
        println!("  {}", line);
    }
}
