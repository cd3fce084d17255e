use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use confassist_app_server::{AppConfig, AppState, serve};
use confassist_chatbot::{Answerer, ChatBot, Credentials, Flavor, build_index};
use confassist_retrieval::load_sessions;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "confassist", about = "Nebraska.Code() session assistant")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Provider pair: openai or huggingface.
    #[arg(long, global = true, env = "CONFASSIST_FLAVOR")]
    flavor: Option<Flavor>,

    /// Configuration file (defaults to ./confassist.toml when present).
    #[arg(long, global = true, env = "CONFASSIST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Start the chat web page.
    Serve {
        /// Listen address, overriding `[ui] bind`.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Embed a sessions file and save the index for the active flavor.
    BuildIndex {
        /// JSON array of sessions.
        #[arg(long)]
        sessions: PathBuf,
    },
    /// Answer one question and exit.
    Ask { question: String },
}

fn init_telemetry(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref()).await?;
    if let Some(flavor) = cli.flavor {
        config.chatbot.flavor = flavor;
    }
    let credentials = Credentials::from_env();
    info!("Using the {} flavor", config.chatbot.flavor);

    match cli.command {
        Command::Serve { bind } => {
            let bot = ChatBot::from_config(&config.chatbot, &credentials).await?;
            let bind = bind.unwrap_or_else(|| config.ui.bind.clone());
            serve(&bind, AppState::new(Arc::new(bot), config.ui)).await
        }
        Command::BuildIndex { sessions } => {
            let records = load_sessions(&sessions).await?;
            let store = build_index(&config.chatbot, &credentials, records).await?;
            println!(
                "Indexed {} sessions into {}",
                store.len(),
                config
                    .chatbot
                    .index
                    .index_path(config.chatbot.flavor.as_str())
                    .display()
            );
            Ok(())
        }
        Command::Ask { question } => {
            let bot = ChatBot::from_config(&config.chatbot, &credentials).await?;
            let answer = bot.answer(&question).await?;
            println!("{answer}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "confassist starting");

    let result = run(cli).await;
    if let Err(err) = &result {
        error!("{err:#}");
    }
    result
}
