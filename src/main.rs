mod cache;
mod cli;
mod config;
mod gemini_client;
mod llm;
mod prompts;
mod search;
#[cfg(test)]
mod testing;
mod workflow;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::{Result, WrapErr};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::cli::chat::favorites::Favorites;
use crate::cli::chat::{render, ChatContext};
use crate::config::AppConfig;
use crate::gemini_client::GeminiClient;
use crate::search::TavilyClient;
use crate::workflow::RecipeWorkflow;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Recipe request to search for, then exit
    #[arg(short, long)]
    input: Option<String>,

    /// Gemini model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum times a single turn may loop back after rejected suggestions
    #[arg(long)]
    max_loops: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a recipe chat session
    Chat {
        /// Recipe request to search for, then exit
        #[arg(short, long)]
        input: Option<String>,
    },
    /// List saved favorite recipes
    Favorites,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .wrap_err("Failed to set tracing subscriber")?;

    let input = match cli.command {
        Some(Commands::Favorites) => {
            let favorites = Favorites::load(config::favorites_path_from_env())?;
            render::favorites(&mut io::stdout(), favorites.entries())?;
            return Ok(ExitCode::SUCCESS);
        }
        Some(Commands::Chat { input }) => input,
        None => cli.input,
    };

    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(max_loops) = cli.max_loops {
        config.workflow.max_feedback_loops = max_loops;
    }

    let favorites = Favorites::load(config.favorites_path.clone())
        .wrap_err("Failed to load favorite recipes")?;

    info!("Starting recipe chat with model {}", config.model);

    let model = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.model.clone(),
        config.temperature,
    ));
    let search = Arc::new(TavilyClient::new(config.tavily_api_key.clone()));
    let workflow = RecipeWorkflow::new(model, search, &config.workflow);

    let interactive = input.is_none();
    let mut chat_context = ChatContext::new(
        Box::new(io::stdout()),
        input,
        interactive,
        workflow,
        favorites,
    );
    chat_context.run().await
}
