mod commands;
mod display;
mod offline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pactum", version, about = "Contract analysis and negotiation planning")]
struct Cli {
    /// Base URL of an OpenAI-compatible generation service. When absent,
    /// the built-in offline generator is used.
    #[arg(long, env = "PACTUM_GENERATOR_URL", global = true)]
    generator_url: Option<String>,

    /// Model name passed to the generation service.
    #[arg(long, env = "PACTUM_MODEL", default_value = "default", global = true)]
    model: String,

    /// API key for the generation service.
    #[arg(long, env = "PACTUM_API_KEY", global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a contract text file and print its risk report.
    Analyze {
        /// Path to the contract text file.
        file: PathBuf,
        #[arg(long, default_value = "General")]
        industry: String,
        #[arg(long, default_value = "Small")]
        company_size: String,
        #[arg(long, default_value = "Moderate")]
        risk_tolerance: String,
    },
    /// Analyze a contract and plan a three-round negotiation.
    Plan {
        file: PathBuf,
        /// Non-negotiable priorities, repeatable.
        #[arg(long = "must-have")]
        must_haves: Vec<String>,
        /// Desirable-but-droppable priorities, repeatable.
        #[arg(long = "nice-to-have")]
        nice_to_haves: Vec<String>,
        #[arg(long, default_value = "General")]
        industry: String,
    },
    /// Run the full loop: analyze, plan, then process a counterparty
    /// response read from a file.
    Respond {
        file: PathBuf,
        /// Path to a file with the counterparty's response text.
        #[arg(long)]
        response: PathBuf,
        #[arg(long, default_value = "General")]
        industry: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let generator = commands::build_generator(
        cli.generator_url.as_deref(),
        &cli.model,
        cli.api_key.as_deref(),
    );

    match cli.command {
        Command::Analyze {
            file,
            industry,
            company_size,
            risk_tolerance,
        } => {
            let ctx = pactum_core::UserContext {
                industry,
                company_size,
                risk_tolerance,
            };
            let report = commands::analyze_file(generator, &file, ctx).await?;
            display::print_report(&report);
        }
        Command::Plan {
            file,
            must_haves,
            nice_to_haves,
            industry,
        } => {
            let ctx = pactum_core::UserContext {
                industry,
                ..Default::default()
            };
            let priorities = pactum_core::UserPriorities {
                must_haves,
                nice_to_haves,
            };
            let session = commands::plan_file(generator, &file, ctx, priorities).await?;
            display::print_session(&session);
        }
        Command::Respond {
            file,
            response,
            industry,
        } => {
            let ctx = pactum_core::UserContext {
                industry,
                ..Default::default()
            };
            let response_text = std::fs::read_to_string(&response)?;
            let outcome = commands::respond_file(generator, &file, ctx, &response_text).await?;
            display::print_outcome(&outcome);
        }
    }
    Ok(())
}
