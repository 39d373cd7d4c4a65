use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docfs_config::{find_config, DocfsConfig};
use docfs_remote::DocVfs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "docfs", version, about = "Browse document databases as a filesystem")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List directory contents
    Ls {
        /// Path to list (defaults to /)
        path: Option<String>,
    },
    /// Print a document as JSON
    Cat {
        /// Path to the document
        path: String,
        /// Output encoding: utf8, latin1 or base64
        #[arg(short, long)]
        encoding: Option<String>,
    },
    /// Create or replace a document
    Write {
        /// Path to the document
        path: String,
        /// JSON content (reads from stdin if not provided)
        content: Option<String>,
    },
    /// Delete a document
    Rm {
        /// Path to the document
        path: String,
    },
    /// Drop a database or collection
    Rmdir {
        /// Path to drop
        path: String,
    },
    /// Create a database or collection
    Mkdir {
        /// Path to create
        path: String,
    },
    /// Show file or directory metadata
    Stat {
        /// Path to inspect
        path: String,
        /// Also print the mount's counters
        #[arg(short, long)]
        verbose: bool,
    },
    /// Check if a path exists (exit code 0 if exists, 1 if not)
    Exists {
        /// Path to check
        path: String,
    },
    /// List the image URLs of a document
    Images {
        /// Path to the document
        path: String,
    },
    /// Add comma-separated labels to the category of documents
    Tag {
        /// Collection path, e.g. /Local/shop/items
        collection: String,
        /// Document file names inside the collection
        #[arg(required = true)]
        entries: Vec<String>,
        /// Labels to merge; prints the shared category when omitted
        #[arg(short, long)]
        labels: Option<String>,
    },
    /// Mark documents as dismissed
    Dismiss {
        /// Collection path
        collection: String,
        /// Document file names inside the collection
        #[arg(required = true)]
        entries: Vec<String>,
    },
    /// List a collection with categorized or dismissed documents hidden
    Hide {
        /// Collection path
        collection: String,
        #[arg(long)]
        categorized: bool,
        #[arg(long)]
        dismissed: bool,
    },
    /// Check every mount's connection
    Ping,
    /// Show the effective configuration
    Config,
}

fn load_config(explicit: Option<PathBuf>) -> Result<DocfsConfig, Box<dyn std::error::Error>> {
    match find_config(explicit.as_deref(), dirs_next::config_dir()) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            Ok(DocfsConfig::from_file(&path)?)
        }
        None => Ok(DocfsConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = load_config(cli.config)?;
    let vfs = DocVfs::from_config(config)?;

    match cli.command {
        Commands::Ls { path } => {
            commands::ls::run(&vfs, path).await?;
        }
        Commands::Cat { path, encoding } => {
            commands::cat::run(&vfs, &path, encoding).await?;
        }
        Commands::Write { path, content } => {
            commands::write::run(&vfs, &path, content).await?;
        }
        Commands::Rm { path } => {
            commands::rm::run(&vfs, &path).await?;
        }
        Commands::Rmdir { path } => {
            commands::rm::run_dir(&vfs, &path).await?;
        }
        Commands::Mkdir { path } => {
            commands::mkdir::run(&vfs, &path).await?;
        }
        Commands::Stat { path, verbose } => {
            commands::stat::run(&vfs, &path, verbose).await?;
        }
        Commands::Exists { path } => {
            commands::exists::run(&vfs, &path).await?;
        }
        Commands::Images { path } => {
            commands::images::run(&vfs, &path).await?;
        }
        Commands::Tag {
            collection,
            entries,
            labels,
        } => {
            commands::filter::tag(&vfs, &collection, &entries, labels).await?;
        }
        Commands::Dismiss {
            collection,
            entries,
        } => {
            commands::filter::dismiss(&vfs, &collection, &entries).await?;
        }
        Commands::Hide {
            collection,
            categorized,
            dismissed,
        } => {
            commands::filter::hide(&vfs, &collection, categorized, dismissed).await?;
        }
        Commands::Ping => {
            commands::ping::run(&vfs).await?;
        }
        Commands::Config => {
            commands::config::run(&vfs).await?;
        }
    }

    Ok(())
}
