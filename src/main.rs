//! blogdb CLI - create, inspect and audit a blog platform database

use blogdb::config::{self, BlogdbConfig};
use blogdb::storage::schema;
use blogdb::ui::{self, Icons};
use blogdb::{OnDelete, SqliteStore};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "blogdb")]
#[command(version)]
#[command(about = "Storage schema for a multi-tenant blogging platform")]
#[command(long_about = r#"
blogdb creates and inspects the SQLite database behind a blogging platform:
users, fans, blogs, categories, tags, articles and article bodies.

Example usage:
  blogdb init --database ./blog.db
  blogdb stats
  blogdb audit --json
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database with its schema
    Init {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Delete policy for owning references (cascade, restrict)
        #[arg(long)]
        owner_on_delete: Option<String>,

        /// Delete policy for an article's category (set_null, cascade, restrict)
        #[arg(long)]
        category_on_delete: Option<String>,

        /// Allow users to follow themselves
        #[arg(long)]
        allow_self_follow: bool,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the DDL for the configured schema options
    Schema,

    /// Show row counts for every table
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check invariants the storage layer does not enforce
    Audit {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Emit JSON instead of a report
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let loaded = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init {
            database,
            owner_on_delete,
            category_on_delete,
            allow_self_follow,
            force,
        } => {
            let mut cfg = loaded.unwrap_or_default();
            if let Some(database) = database {
                cfg.database = Some(database.to_string_lossy().to_string());
            }
            if let Some(policy) = owner_on_delete {
                cfg.schema.owner_on_delete = policy.parse::<OnDelete>().map_err(anyhow::Error::msg)?;
            }
            if let Some(policy) = category_on_delete {
                cfg.schema.category_on_delete = policy.parse::<OnDelete>().map_err(anyhow::Error::msg)?;
            }
            if allow_self_follow {
                cfg.schema.forbid_self_follow = false;
            }
            cfg.schema.validate()?;

            let config_path = cli.config.unwrap_or_else(config::default_config_path);
            let db_path = cfg.database_path(Path::new("."));
            let store = match config::init_database(&config_path, &cfg, Path::new("."), force) {
                Ok(store) => store,
                Err(err) => {
                    ui::error(&format!("Could not initialize {}", db_path.display()));
                    return Err(err);
                }
            };

            ui::header("Initialized blog database");
            ui::info("Config", &config_path.display().to_string());
            ui::info("Database", &db_path.display().to_string());
            ui::summary_row("owner on delete:", store.options().owner_on_delete.as_sql());
            ui::summary_row("category on delete:", store.options().category_on_delete.as_sql());
            ui::summary_row(
                "self follow:",
                if store.options().forbid_self_follow { "forbidden" } else { "allowed" },
            );
            ui::success("Schema ready");
        }

        Commands::Schema => {
            let cfg = loaded.unwrap_or_default();
            cfg.schema.validate()?;
            for stmt in schema::all_schema_statements(&cfg.schema) {
                println!("{};", stmt.trim());
                println!();
            }
        }

        Commands::Stats { database, json } => {
            let store = open_store(database, loaded)?;
            let stats = store.stats()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                ui::header("Database statistics");
                println!("{}", ui::stats_table(&stats));
            }
        }

        Commands::Audit { database, json } => {
            let store = open_store(database, loaded)?;
            let report = store.audit()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                ui::header("Schema audit");
                println!("{}", ui::audit_table(&report));

                if !report.self_follows.is_empty() {
                    ui::section("Self follows");
                    for fan in &report.self_follows {
                        ui::finding(Icons::PERSON, &format!("user {} follows themselves (row {})", fan.user_id, fan.id));
                    }
                }
                if !report.cross_blog_categories.is_empty() {
                    ui::section("Cross-blog categories");
                    for article in &report.cross_blog_categories {
                        ui::finding(Icons::FILE, &format!("article {} uses a category of another blog", article));
                    }
                }
                if !report.cross_blog_tags.is_empty() {
                    ui::section("Cross-blog tags");
                    for (article, tag) in &report.cross_blog_tags {
                        ui::finding(Icons::LINK, &format!("article {} is tagged with tag {} of another blog", article, tag));
                    }
                }
                if !report.articles_without_detail.is_empty() {
                    ui::section("Articles without detail");
                    for article in &report.articles_without_detail {
                        ui::finding(Icons::SEARCH, &format!("article {} has no body", article));
                    }
                }
            }

            if report.is_clean() {
                ui::success("No invariant violations");
            } else {
                ui::warn(&format!("{} finding(s)", report.finding_count()));
                anyhow::bail!("audit failed with {} finding(s)", report.finding_count());
            }
        }
    }

    Ok(())
}

/// Open an existing database, resolving its path from flag, config, then default
fn open_store(database: Option<PathBuf>, loaded: Option<BlogdbConfig>) -> anyhow::Result<SqliteStore> {
    let cfg = loaded.unwrap_or_default();
    let db_path = database.unwrap_or_else(|| cfg.database_path(Path::new(".")));
    if !db_path.exists() {
        ui::error(&format!("No database at {}", db_path.display()));
        anyhow::bail!("database not found (run `blogdb init` first)");
    }
    tracing::debug!("Using database {}", db_path.display());
    Ok(SqliteStore::open_with(&db_path, cfg.schema)?)
}
