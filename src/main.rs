use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{
    ConfigCommand, Context, ExportCommand, ItemCommand, ListCommand, LoginCommand, OpenCommand,
    RegisterCommand, ScanCommand,
};
use scanlist::config::Config;

#[derive(Parser)]
#[command(name = "scanlist")]
#[command(version)]
#[command(about = "Scan documents into synced, editable checklists", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and log in
    Register(RegisterCommand),

    /// Log in to an existing account
    Login(LoginCommand),

    /// Forget the stored session
    Logout,

    /// Show the logged-in user and server status
    Whoami,

    /// Manage lists
    List(ListCommand),

    /// Manage items of a list
    Item(ItemCommand),

    /// Scan an image into a list
    Scan(ScanCommand),

    /// Export a list as plain text
    Export(ExportCommand),

    /// Edit a list interactively
    Open(OpenCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    // Initialize tracing on stderr so command output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scanlist=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    let Some(command) = cli.command else {
        println!("Use --help to see available commands");
        return Ok(());
    };

    let ctx = Context::new(config)?;
    match command {
        Commands::Register(cmd) => cmd.run(&ctx).await,
        Commands::Login(cmd) => cmd.run(&ctx).await,
        Commands::Logout => commands::logout(&ctx),
        Commands::Whoami => commands::whoami(&ctx).await,
        Commands::List(cmd) => cmd.run(&ctx).await,
        Commands::Item(cmd) => cmd.run(&ctx).await,
        Commands::Scan(cmd) => cmd.run(&ctx).await,
        Commands::Export(cmd) => cmd.run(&ctx).await,
        Commands::Open(cmd) => cmd.run(&ctx).await,
        Commands::Config(cmd) => cmd.run(&ctx.config),
    }
}
