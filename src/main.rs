//! Claude Stream - streams Claude CLI responses to the terminal.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use claude_stream::client::ConversationClient;
use claude_stream::config::ConfigLoader;
use claude_stream::display::{self, MessagePrinter};
use claude_stream::prompt::{ChatMessage, Conversation};
use claude_stream::stream::{RunOutcome, StreamItem};

#[derive(Parser)]
#[command(
    name = "claude-stream",
    about = "Stream Claude CLI responses as they are generated",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a config file (defaults to the standard search paths).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a prompt (or a saved conversation) and stream the response.
    Run {
        /// The prompt to send; appended to the conversation if one is given.
        prompt: Option<String>,
        /// JSON file holding a conversation history.
        #[arg(long)]
        conversation: Option<PathBuf>,
        /// Model to use (overrides the config file).
        #[arg(short, long)]
        model: Option<String>,
        /// Claude CLI binary to launch (overrides the config file).
        #[arg(long)]
        binary: Option<String>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_conversation(
    path: Option<&Path>,
    prompt: Option<String>,
) -> Result<Conversation, String> {
    let mut conversation = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
            serde_json::from_str(&content)
                .map_err(|e| format!("Failed to parse {}: {e}", path.display()))?
        }
        None => Conversation::new(),
    };

    if let Some(prompt) = prompt {
        conversation.push(ChatMessage::user(prompt));
    }
    if conversation.is_empty() {
        return Err("Nothing to send: provide a prompt or a conversation file".to_string());
    }
    Ok(conversation)
}

fn exit_code_for(outcome: &RunOutcome) -> ExitCode {
    match outcome {
        RunOutcome::Completed => ExitCode::SUCCESS,
        RunOutcome::Failed { .. } => ExitCode::from(1),
        RunOutcome::Cancelled => ExitCode::from(130),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loader = cli.config.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let mut config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            display::print_error(&e.to_string());
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Commands::Run {
            prompt,
            conversation,
            model,
            binary,
        } => {
            if model.is_some() {
                config.model = model;
            }
            if let Some(binary) = binary {
                config.binary = binary;
            }

            let conversation = match load_conversation(conversation.as_deref(), prompt) {
                Ok(conversation) => conversation,
                Err(e) => {
                    display::print_error(&e);
                    return ExitCode::from(2);
                }
            };

            let preview = conversation
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            display::print_run_start(config.model_name(), &preview);

            let mut client = ConversationClient::new(config);
            let mut subscription = client.subscribe();

            let cancel = client.cancellation_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupt received, cancelling run");
                    cancel.cancel();
                }
            });

            let printer = tokio::spawn(async move {
                let mut printer = MessagePrinter::new();
                while let Some(item) = subscription.recv().await {
                    match item {
                        StreamItem::Message(message) => printer.print(&message),
                        StreamItem::Finished(_) => break,
                    }
                }
            });

            let outcome = client.run(&conversation).await;
            if let Err(e) = printer.await {
                tracing::warn!(error = %e, "Printer task failed");
            }

            display::print_outcome(&outcome);
            exit_code_for(&outcome)
        }
    }
}
