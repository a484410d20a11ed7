//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the
//! appropriate commands.

pub mod ask;
pub mod chat;
pub mod health;
pub mod kb;
pub mod service_list;

use std::error::Error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;

#[derive(Parser)]
#[command(name = "askdocs")]
#[command(about = "A terminal chat client for documentation Q&A backends")]
#[command(
    long_about = "Askdocs is a terminal chat client for documentation question-answering \
backends. It keeps several independent conversations in one session, marks \
sensitive spans in answers before display, and exposes the backend's \
knowledge base over a small set of subcommands.\n\n\
Environment Variables:\n\
  DOCS_QA_BASE_URL  Backend base URL (optional, defaults to http://localhost:8000)\n\n\
Chat commands:\n\
  /new              Start a new conversation\n\
  /list             List conversations\n\
  /switch <id>      Switch to a conversation\n\
  /delete <id>      Delete a conversation\n\
  /export <file>    Export the active conversation as Markdown\n\
  /quit             Leave the chat"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Include pipeline step labels with each answer
    #[arg(long, global = true)]
    pub pipeline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive chat session (default)
    Chat,
    /// Ask a single question and print the answer
    Ask {
        /// The question to send
        #[arg(trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// List the documentation services the backend covers
    Services,
    /// Probe the backend's health endpoint
    Health,
    /// Manage knowledge-base entries
    Kb {
        #[command(subcommand)]
        command: kb::KbCommands,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::load()?;
    if args.pipeline {
        config.show_pipeline = Some(true);
    }

    match args.command {
        None | Some(Commands::Chat) => chat::run_chat(&config).await,
        Some(Commands::Ask { question }) => ask::run_ask(question, &config).await,
        Some(Commands::Services) => service_list::run_services(&config).await,
        Some(Commands::Health) => health::run_health(&config).await,
        Some(Commands::Kb { command }) => kb::run_kb(command, &config).await,
    }
}
