use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};

use field_tracker::backup::{self, ImportMode};
use field_tracker::completion::CompletionApplicator;
use field_tracker::config::TrackerConfig;
use field_tracker::model::NewWorkRecord;
use field_tracker::parse_table_completion_patterns;
use field_tracker::store::{Database, LibSqlBackend};

#[derive(Parser)]
#[command(name = "field-tracker")]
#[command(about = "Solar-field installation tracking: work logs, table completion, backups")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the table ids a work note reports as finished
    Parse {
        /// Free-text note, e.g. "hotový stůl 28.1"
        text: String,
    },
    /// Manage workers
    Worker {
        #[command(subcommand)]
        action: WorkerAction,
    },
    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Register a field table in a project
    Table {
        #[arg(long)]
        project: i64,
        /// On-site table number
        number: String,
        #[arg(long)]
        size: Option<String>,
    },
    /// List the field tables of a project
    Tables { project: i64 },
    /// Log work and apply any table completions it reports
    Log {
        #[arg(long)]
        worker: i64,
        #[arg(long)]
        project: i64,
        /// Work note; scanned for completed tables unless --tables is given
        #[arg(long, default_value = "")]
        description: String,
        /// Explicit table numbers, comma separated
        #[arg(long, value_delimiter = ',')]
        tables: Vec<String>,
        /// Start time (RFC 3339); defaults to now minus the duration
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        #[arg(long, default_value_t = 60)]
        minutes: i64,
    },
    /// Export or import a backup
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
}

#[derive(Subcommand)]
enum WorkerAction {
    Add {
        name: String,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        initials: Option<String>,
    },
    List,
}

#[derive(Subcommand)]
enum ProjectAction {
    Add {
        name: String,
        #[arg(long)]
        location: Option<String>,
    },
    List,
}

#[derive(Subcommand)]
enum BackupAction {
    /// Write a backup file into the backup directory
    Export,
    /// Restore from a backup file
    Import {
        path: PathBuf,
        /// Keep existing rows not present in the backup
        #[arg(long)]
        merge: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = TrackerConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Parsing needs no database.
    if let Commands::Parse { text } = &cli.command {
        let ids = parse_table_completion_patterns(text);
        println!("{}", serde_json::to_string(&ids)?);
        return Ok(());
    }

    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .with_context(|| format!("opening database at {}", config.db_path.display()))?,
    );

    match cli.command {
        Commands::Parse { .. } => {}
        Commands::Worker { action } => match action {
            WorkerAction::Add {
                name,
                color,
                initials,
            } => {
                let worker = db
                    .create_worker(&name, color.as_deref(), initials.as_deref())
                    .await?;
                println!("{}", serde_json::to_string_pretty(&worker)?);
            }
            WorkerAction::List => {
                println!("{}", serde_json::to_string_pretty(&db.list_workers().await?)?);
            }
        },
        Commands::Project { action } => match action {
            ProjectAction::Add { name, location } => {
                let project = db.create_project(&name, location.as_deref()).await?;
                println!("{}", serde_json::to_string_pretty(&project)?);
            }
            ProjectAction::List => {
                println!("{}", serde_json::to_string_pretty(&db.list_projects().await?)?);
            }
        },
        Commands::Table {
            project,
            number,
            size,
        } => {
            let table = db
                .create_field_table(project, &number, size.as_deref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
        Commands::Tables { project } => {
            let tables = db.list_field_tables(project).await?;
            println!("{}", serde_json::to_string_pretty(&tables)?);
        }
        Commands::Log {
            worker,
            project,
            description,
            tables,
            start,
            minutes,
        } => {
            let duration = Duration::minutes(minutes);
            let start_time = start.unwrap_or_else(|| Utc::now() - duration);
            let applicator = CompletionApplicator::new(Arc::clone(&db))
                .with_max_assigned(config.max_assigned_workers);

            let (record, report) = applicator
                .log_work(NewWorkRecord {
                    worker_id: worker,
                    project_id: project,
                    description,
                    tables,
                    start_time,
                    end_time: start_time + duration,
                })
                .await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "record": record,
                    "completions": report,
                }))?
            );
        }
        Commands::Backup { action } => match action {
            BackupAction::Export => {
                let path = backup::export_to_file(db.as_ref(), &config.backup_dir).await?;
                println!("{}", path.display());
            }
            BackupAction::Import { path, merge } => {
                let mode = if merge {
                    ImportMode::Merge
                } else {
                    ImportMode::Replace
                };
                let summary = backup::import_from_file(db.as_ref(), &path, mode).await?;
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
        },
    }

    Ok(())
}
