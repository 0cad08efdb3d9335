use clap::{Parser, Subcommand};
use std::path::PathBuf;
use toolgate_core::config::LogLevel;

mod commands;
mod hooks;
mod output;
mod prompt;

#[derive(Parser)]
#[command(name = "toolgate")]
#[command(author, version, about = "Chat agent for remote tools with human approval", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file; defaults to the first of ./toolgate.toml, ~/.toolgate/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, env = "OPENAI_MODEL")]
    model: Option<String>,

    #[arg(short, long, global = true, env = "ARCADE_USER_ID")]
    user_id: Option<String>,

    /// Approve every gated tool call without asking
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat {
        /// System prompt for the agent
        #[arg(short, long)]
        system: Option<String>,
    },
    /// Run a single message and exit
    Run {
        /// The message to send
        message: String,
        /// System prompt for the agent
        #[arg(short, long)]
        system: Option<String>,
    },
    /// List the remote tools the agent would load
    Tools,
}

fn init_tracing(verbose: u8, configured: LogLevel) {
    let level = match verbose {
        0 => configured.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let overrides = commands::Overrides {
        model: cli.model,
        user_id: cli.user_id,
        auto_approve: cli.yes,
    };
    let config = commands::load_config(cli.config.as_deref(), &overrides)?;
    init_tracing(cli.verbose, config.general.log_level);

    match cli.command.unwrap_or(Commands::Chat { system: None }) {
        Commands::Chat { system } => {
            commands::chat::run(config, system).await?;
        }
        Commands::Run { message, system } => {
            commands::run::run(config, system, &message).await?;
        }
        Commands::Tools => {
            commands::tools::run(config).await?;
        }
    }

    Ok(())
}
