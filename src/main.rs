use anyhow::{bail, Context, Result};
use citechat::client::HttpAnswerClient;
use citechat::config::Config;
use citechat::controller::ConversationController;
use citechat::storage::FileSessionStore;
use citechat::ui;
use citechat::ui::conversation::ConversationManager;
use clap::{Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "citechat")]
#[command(version)]
#[command(
    about = "Ask questions about reference documents and see the pages behind each answer",
    long_about = None
)]
struct Cli {
    /// Answering service base URL (overrides the config file and CITECHAT_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Config file to use instead of ~/.citechat/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// List the reference documents
    Docs,
    /// Show or clear the stored session token
    Session {
        /// Forget the stored token; the next answer starts a new session
        #[arg(long)]
        clear: bool,
    },
}

fn init_tracing(config: &Config, verbose: bool) -> Result<()> {
    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let filter = if verbose {
        EnvFilter::new("citechat=debug")
    } else {
        EnvFilter::try_from_env("CITECHAT_LOG")
            .unwrap_or_else(|_| EnvFilter::new("citechat=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(log_file))
                .with_ansi(false),
        )
        .init();

    Ok(())
}

fn build_controller(config: &Config) -> Result<ConversationController> {
    let client = HttpAnswerClient::new(config)?;
    let sessions = FileSessionStore::new(config.session_path());
    Ok(ConversationController::new(Arc::new(client), Arc::new(sessions)))
}

async fn run_chat(config: Config) -> Result<()> {
    let controller = build_controller(&config)?;
    let mut manager = ConversationManager::new(controller, config);
    ui::run(&mut manager).await
}

async fn ask(config: &Config, question: String) -> Result<()> {
    let mut controller = build_controller(config)?;

    let Some(exchange) = controller.submit(&question).await else {
        bail!("Question is empty");
    };

    println!("{}", exchange.answer.answer);

    let groups = exchange.answer.grouped_citations();
    if !groups.is_empty() {
        println!("\n📚 References:");
        for group in groups {
            println!("  • {} - Pages {}", group.document_id, group.pages_label());
            println!("    {}", config.document_url(&group.document_id));
        }
    }

    Ok(())
}

fn list_documents(config: &Config) {
    if config.documents.is_empty() {
        println!("📭 No reference documents configured.");
        return;
    }

    println!("📋 Reference documents:\n");
    for document in &config.documents {
        println!("  • {}", document);
        println!("    {}", config.document_url(document));
    }
}

fn session(config: &Config, clear: bool) -> Result<()> {
    use citechat::storage::SessionStore;

    let store = FileSessionStore::new(config.session_path());

    if clear {
        if store.clear()? {
            println!("🧹 Session token removed.");
        } else {
            println!("No session token stored.");
        }
        return Ok(());
    }

    match store.get() {
        Some(session_id) => println!("{}", session_id),
        None => println!("No session token stored."),
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }

    init_tracing(&config, cli.verbose)?;
    tracing::debug!(endpoint = %config.endpoint, "configuration loaded");

    match cli.command {
        None => run_chat(config).await,
        Some(Commands::Ask { question }) => ask(&config, question.join(" ")).await,
        Some(Commands::Docs) => {
            list_documents(&config);
            Ok(())
        }
        Some(Commands::Session { clear }) => session(&config, clear),
    }
}
