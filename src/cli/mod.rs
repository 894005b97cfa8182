//! Command-line interface parsing and dispatch.

use std::error::Error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::core::chat::{run_chat, ChatOptions};
use crate::core::config::Config;
use crate::core::constants::DEFAULT_METRICS_FILE;
use crate::core::metrics::{summarize, MetricsLog};

#[derive(Parser)]
#[command(name = "moderato")]
#[command(about = "A terminal chatbot client with safety gates and usage metrics")]
#[command(
    long_about = "Moderato is a terminal chatbot client that connects to OpenAI-compatible APIs. \
Every query is screened before it leaves the machine: flagged queries are rejected, \
detected PII is redacted, and every answer is screened again before display. \
Each turn's latency, token usage, and dollar cost land in a JSON metrics log.\n\n\
Environment Variables:\n\
  OPENAI_API_KEY    Your API key (required)\n\
  OPENAI_BASE_URL   Custom API base URL (optional, defaults to https://api.openai.com/v1)\n\n\
Type 'exit' or 'quit' at the prompt to end a session."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for chat
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// System prompt file read once at startup
    #[arg(long, global = true, value_name = "FILE")]
    pub prompt_file: Option<String>,

    /// Metrics log file
    #[arg(long, global = true, value_name = "FILE")]
    pub metrics_file: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive chat loop (default)
    Chat,
    /// Summarize the recorded usage metrics
    Stats,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    // A local .env is honored before anything reads the environment.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            run_chat(ChatOptions {
                model: args.model,
                prompt_file: args.prompt_file,
                metrics_file: args.metrics_file,
            })
            .await
        }
        Commands::Stats => print_stats(args.metrics_file),
    }
}

fn print_stats(metrics_file: Option<String>) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let path = metrics_file
        .or(config.metrics_file)
        .unwrap_or_else(|| DEFAULT_METRICS_FILE.to_string());

    let records = MetricsLog::new(&path).read_all();
    if records.is_empty() {
        println!("No metrics recorded yet ({path}).");
        return Ok(());
    }

    let summary = summarize(&records);
    println!("Metrics from {path}:");
    println!("  turns:               {}", summary.turns);
    println!("  total tokens:        {}", summary.total_tokens);
    println!("  total cost:          ${:.6}", summary.total_cost);
    println!("  mean latency:        {:.2} ms", summary.mean_latency_ms);
    println!("  withheld responses:  {}", summary.blocked_outputs);
    Ok(())
}
