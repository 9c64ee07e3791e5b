pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "voicecart",
    about = "Voicecart fulfillment operator CLI",
    long_about = "Inspect configuration, check readiness, and play scripted transactions against the fulfillment handlers without a platform connection.",
    after_help = "Examples:\n  voicecart doctor --json\n  voicecart config\n  voicecart simulate --google-pay\n  voicecart smoke"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, intent registration, and payment settings")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Play the demo transaction turn by turn and print each response as JSON")]
    Simulate {
        #[arg(long, help = "Pay through Google Pay instead of the merchant card")]
        google_pay: bool,
        #[arg(long, help = "Decline the delivery address request")]
        decline_address: bool,
        #[arg(
            long,
            default_value = "projects/voicecart/agent/sessions/cli",
            help = "Session id to simulate under"
        )]
        session: String,
    },
    #[command(about = "Run both scripted payment paths with per-check timing details")]
    Smoke,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::CommandResult::report(commands::config::run()),
        Command::Doctor { json } => commands::CommandResult::report(commands::doctor::run(json)),
        Command::Simulate { google_pay, decline_address, session } => {
            commands::simulate::run(commands::simulate::SimulateOptions {
                google_pay,
                decline_address,
                session,
            })
        }
        Command::Smoke => commands::smoke::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
