use crate::demo::{
    run_create, run_demo, run_list, run_notices, run_residents, run_stats, CreateArgs, ListArgs,
    ResidentsArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use society_desk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Society Desk",
    about = "Run the society desk service or work with maintenance requests from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List, summarise or file maintenance requests
    Maintenance {
        #[command(subcommand)]
        command: MaintenanceCommand,
    },
    /// Print the society notice board
    Notices,
    /// Print or search the residents directory
    Residents(ResidentsArgs),
    /// Walk through the maintenance tracker against the in-memory backend
    Demo,
}

#[derive(Subcommand, Debug)]
enum MaintenanceCommand {
    /// List requests matching the given filters, newest first
    List(ListArgs),
    /// Show request counts per status
    Stats,
    /// File a new request as the signed-in resident
    Create(CreateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Maintenance {
            command: MaintenanceCommand::List(args),
        } => run_list(args).await,
        Command::Maintenance {
            command: MaintenanceCommand::Stats,
        } => run_stats().await,
        Command::Maintenance {
            command: MaintenanceCommand::Create(args),
        } => run_create(args).await,
        Command::Notices => {
            run_notices();
            Ok(())
        }
        Command::Residents(args) => {
            run_residents(args);
            Ok(())
        }
        Command::Demo => run_demo().await,
    }
}
