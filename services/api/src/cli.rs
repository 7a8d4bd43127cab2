use crate::demo::{
    run_demo, run_import, run_report, run_score, DemoArgs, ImportArgs, ReportArgs, ScoreArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use intel_audit::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Intelligence Audit",
    about = "Score intelligence waste audits and learn market patterns across them",
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
    /// Score a JSON answers file without recording it
    Score(ScoreArgs),
    /// Import historical audits from CSV into the configured pattern store
    Import(ImportArgs),
    /// Print the market intelligence report from the configured pattern store
    Report(ReportArgs),
    /// Seed an in-memory store with sample audits and print the resulting intelligence
    Demo(DemoArgs),
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
        Command::Score(args) => run_score(args),
        Command::Import(args) => run_import(args),
        Command::Report(args) => run_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
