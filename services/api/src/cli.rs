use crate::demo::{run_demo, run_import_check, DemoArgs, ImportCheckArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use competency_review::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Competency Review",
    about = "Validate, import, and classify employee competency assessments",
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
    /// Work with bulk assessment uploads offline
    Import {
        #[command(subcommand)]
        command: ImportCommand,
    },
    /// Stage, confirm, and classify an upload against an in-memory store
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ImportCommand {
    /// Validate a CSV upload and print accepted and rejected rows
    Check(ImportCheckArgs),
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
        Command::Import {
            command: ImportCommand::Check(args),
        } => run_import_check(args),
        Command::Demo(args) => run_demo(args),
    }
}
