//! tasklist - terminal front end for the tasklist item service

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "tasklist")]
#[command(about = "Task list backed by a remote item service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Item service base URL (overrides config)
    #[arg(long, global = true, env = "TASKLIST_API_URL")]
    api_url: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List items
    List {
        /// Only this priority (1=low, 2=medium, 3=high; 0=all)
        #[arg(short, long, default_value_t = 0)]
        priority: i64,

        /// Only this exact category
        #[arg(short, long, default_value = "")]
        category: String,
    },

    /// Add an item
    Add {
        /// Item name
        name: String,

        /// Priority (low, medium, high or 1-3)
        #[arg(short, long)]
        priority: Option<String>,

        /// Category
        #[arg(short, long, default_value = "")]
        category: String,

        /// Due date (YYYY-MM-DD)
        #[arg(short, long)]
        due: Option<String>,
    },

    /// Mark an item complete or incomplete
    Toggle {
        /// Item ID
        id: String,
    },

    /// Update an item
    Update {
        /// Item ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New priority
        #[arg(short, long)]
        priority: Option<String>,

        /// New category (empty string clears it)
        #[arg(short, long)]
        category: Option<String>,

        /// New due date (YYYY-MM-DD, empty string clears it)
        #[arg(short, long)]
        due: Option<String>,

        /// Set completion state
        #[arg(long)]
        completed: Option<bool>,
    },

    /// Remove an item
    Rm {
        /// Item ID
        id: String,
    },

    /// Show or create configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Write a commented default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path
    Path,
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let ctx = commands::Context::load(cli.config, cli.api_url, cli.json)?;

    match cli.command {
        Commands::List { priority, category } => commands::list(&ctx, priority, category).await,
        Commands::Add {
            name,
            priority,
            category,
            due,
        } => commands::add(&ctx, name, priority, category, due).await,
        Commands::Toggle { id } => commands::toggle(&ctx, &id).await,
        Commands::Update {
            id,
            name,
            priority,
            category,
            due,
            completed,
        } => {
            let changes = commands::Changes {
                name,
                priority,
                category,
                due,
                completed,
            };
            commands::update(&ctx, &id, changes).await
        }
        Commands::Rm { id } => commands::rm(&ctx, &id).await,
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => commands::config_show(&ctx),
            Some(ConfigCommands::Init { force }) => commands::config_init(&ctx, force),
            Some(ConfigCommands::Path) => commands::config_path(&ctx),
        },
    }
}
