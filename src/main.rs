//! CLI entry point for blog-index

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "blog-index")]
#[command(version)]
#[command(about = "A headless content index for Jekyll-style blogs", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List site information
    #[command(alias = "ls")]
    List {
        /// Type of content to list (post, page, tag, category)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Print one post or page as JSON
    Show {
        /// Slug of the post or page
        slug: String,
    },

    /// Export the whole index as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report load failures, duplicate slugs and titles, and dangling links
    Check,

    /// Create a new post or page
    New {
        /// Layout to use (post, page)
        #[arg(short, long, default_value = "post")]
        layout: String,

        /// Title of the new post
        title: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "blog_index=debug,info"
    } else {
        "blog_index=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let blog = blog_index::Blog::new(&base_dir)?;

    match cli.command {
        Commands::List { r#type } => {
            blog_index::commands::list::run(&blog, &r#type)?;
        }

        Commands::Show { slug } => {
            blog_index::commands::show::run(&blog, &slug)?;
        }

        Commands::Export { output } => {
            blog_index::commands::export::run(&blog, output.as_deref())?;
        }

        Commands::Check => {
            let summary = blog_index::commands::check::run(&blog)?;
            if !summary.is_ok() {
                std::process::exit(1);
            }
        }

        Commands::New { layout, title } => {
            tracing::info!("Creating new {} with title: {}", layout, title);
            let path = blog_index::commands::new::run(&blog, &title, &layout)?;
            println!("Created: {:?}", path);
        }
    }

    Ok(())
}
