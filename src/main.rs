//! Lineage CLI entry point

use clap::{Parser, Subcommand, ValueEnum};
use lineage_core::Gender;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "lineage")]
#[command(about = "Edit family trees stored as checksummed tree files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file (defaults to lineage.toml in the current directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum GenderArg {
    Male,
    Female,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Male => Gender::Male,
            GenderArg::Female => Gender::Female,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a tree file holding a single family head
    New {
        file: PathBuf,
        /// Tree name (defaults to the configured one)
        #[arg(short, long)]
        name: Option<String>,
        /// Gender of the family head
        #[arg(short, long, value_enum)]
        gender: Option<GenderArg>,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the tree as an outline
    Show { file: PathBuf },
    /// Marry a new spouse to a root or child
    AddSpouse { file: PathBuf, partner: String },
    /// Add a child borne by a spouse
    AddChild {
        file: PathBuf,
        spouse: String,
        #[arg(short, long, value_enum)]
        gender: GenderArg,
    },
    /// Draw a connection from spouse to child or from child to spouse
    Connect {
        file: PathBuf,
        source: String,
        target: String,
    },
    /// Delete a person; their descendants are kept, unconnected
    Delete { file: PathBuf, id: String },
    /// Add a generation above the current family head
    NewRoot {
        file: PathBuf,
        #[arg(short, long, value_enum)]
        gender: Option<GenderArg>,
    },
    /// Change display attributes or sibling/spouse rank
    Update {
        file: PathBuf,
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        child_order: Option<u32>,
        #[arg(long)]
        spouse_order: Option<u32>,
    },
    /// Find people by name (case-insensitive substring)
    Search { file: PathBuf, query: String },
    /// Print computed positions as JSON
    Layout { file: PathBuf },
    /// Check the file checksum and tree invariants
    Verify { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "lineage={log_level},lineage_core={log_level}"
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Lineage v{}", env!("CARGO_PKG_VERSION"));
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::New {
            file,
            name,
            gender,
            force,
        } => commands::new_tree(&config, &file, name, gender.map(Gender::from), force).await,
        Commands::Show { file } => commands::show(&config, &file).await,
        Commands::AddSpouse { file, partner } => commands::add_spouse(&config, &file, &partner).await,
        Commands::AddChild { file, spouse, gender } => {
            commands::add_child(&config, &file, &spouse, gender.into()).await
        }
        Commands::Connect { file, source, target } => {
            commands::connect(&config, &file, &source, &target).await
        }
        Commands::Delete { file, id } => commands::delete(&config, &file, &id).await,
        Commands::NewRoot { file, gender } => {
            commands::new_root(&config, &file, gender.map(Gender::from)).await
        }
        Commands::Update {
            file,
            id,
            name,
            image,
            child_order,
            spouse_order,
        } => {
            let update = lineage_core::AttributeUpdate {
                name,
                image_reference: image,
                child_order,
                spouse_order,
            };
            commands::update(&config, &file, &id, update).await
        }
        Commands::Search { file, query } => commands::search(&config, &file, &query).await,
        Commands::Layout { file } => commands::layout(&config, &file).await,
        Commands::Verify { file } => commands::verify(&file).await,
    }
}
