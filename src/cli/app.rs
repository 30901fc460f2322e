//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{compact, nomenclature, plan, product, stock};
use crate::storage::Project;

#[derive(Parser)]
#[command(name = "fabrik")]
#[command(author, version, about = "Local-first MRP: products, stock and bills of materials")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new fabrik project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage products
    #[command(subcommand)]
    Product(product::ProductCommands),

    /// Manage nomenclatures (bills of materials)
    #[command(subcommand)]
    Nom(nomenclature::NomCommands),

    /// Manage stock movements and levels
    #[command(subcommand)]
    Stock(stock::StockCommands),

    /// Explode a product into leaf requirements for a build quantity
    Plan {
        /// Product (id or reference)
        product: String,

        /// Quantity to build
        quantity: String,
    },

    /// Show catalog overview
    Status,

    /// Rewrite the stores, dropping superseded records
    Compact,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    output.verbose("fabrik starting");

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.success(&format!(
                "Initialized fabrik project at {}",
                project.root().display()
            ));
        }

        Commands::Product(cmd) => product::run(cmd, &output)?,
        Commands::Nom(cmd) => nomenclature::run(cmd, &output)?,
        Commands::Stock(cmd) => stock::run(cmd, &output)?,

        Commands::Plan { product, quantity } => {
            output.verbose_ctx(
                "plan",
                &format!("Planning {} x {}", quantity, product),
            );
            plan::plan(&output, &product, &quantity)?
        }
        Commands::Status => {
            output.verbose("Gathering catalog status");
            plan::status(&output)?
        }
        Commands::Compact => compact::run(&output)?,
    }

    Ok(())
}
