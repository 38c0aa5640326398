use clap::{Parser, Subcommand};
use tasklist_client::{ConsoleNotifier, HttpTaskApi, SyncController, render};
use tasklist_core::TaskId;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Keep a shared to-do list")]
struct Cli {
    /// Base URL of the task server
    #[arg(long, env = "TASKLIST_URL", default_value = "http://127.0.0.1:8080")]
    url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// Show the list
    List,
    /// Add a task
    Add {
        text: String,
        /// Mark the task as a priority
        #[arg(long)]
        priority: bool,
    },
    /// Mark a task done, or not done again
    Toggle { id: String },
    /// Flip the priority flag of a task
    Prioritize { id: String },
    /// Delete one task
    Delete { id: String },
    /// Delete every task
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let args = Cli::parse();

    let mut controller = SyncController::new(HttpTaskApi::new(&args.url)?, ConsoleNotifier);
    controller.load().await;

    let applied = match args.command.unwrap_or(Commands::List) {
        Commands::List => true,
        Commands::Add { text, priority } => controller.add(&text, priority).await,
        Commands::Toggle { id } => controller.toggle(&TaskId::from(id)).await,
        Commands::Prioritize { id } => controller.toggle_priority(&TaskId::from(id)).await,
        Commands::Delete { id } => controller.delete(&TaskId::from(id)).await,
        Commands::Clear => controller.delete_all().await,
    };

    print!("{}", render(&controller.view()));

    if !applied {
        std::process::exit(1);
    }
    Ok(())
}
