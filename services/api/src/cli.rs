use crate::evaluate::{
    run_accept, run_evaluate, run_reset_settings, run_set_settings, run_show_settings, OfferArgs,
    SettingsArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use offer_decider::config::AppConfig;
use offer_decider::error::AppError;
use offer_decider::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "Offer Decider",
    about = "Decide whether a delivery offer keeps your shift at your target hourly rate",
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
    /// Evaluate an offer against the stored shift settings
    Evaluate(OfferArgs),
    /// Record an offer as taken, crediting its net payout to today's earnings
    Accept(OfferArgs),
    /// Inspect or change the stored shift settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// Print the stored settings and the defaults used for missing values
    Show,
    /// Update one or more stored settings
    Set(SettingsArgs),
    /// Forget all stored settings
    Reset,
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

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match command {
        Command::Serve(args) => server::run(config, args).await,
        Command::Evaluate(args) => run_evaluate(&config, args),
        Command::Accept(args) => run_accept(&config, args),
        Command::Settings { command } => match command {
            SettingsCommand::Show => run_show_settings(&config),
            SettingsCommand::Set(args) => run_set_settings(&config, args),
            SettingsCommand::Reset => run_reset_settings(&config),
        },
    }
}
