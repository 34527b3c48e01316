//! # Dashboard Harness CLI (`dash`)
//!
//! Terminal front-end for the email, analytics, and ecom-agent dashboards.
//!
//! ## Usage
//!
//! ```bash
//! dash --config ./config/dash.toml <command>
//! dash --base-url http://localhost:8000/api <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dash emails` | Inbox with sentiment filter and detail view |
//! | `dash stats` | Email statistics |
//! | `dash connectors` | Connector status for the bot, ecom agent, or analytics |
//! | `dash dashboard` | Analytics overview and dashboard sections |
//! | `dash doc show <doc>` | Print a knowledge base or instruction set |
//! | `dash doc save <doc>` | Replace and save a document |
//! | `dash chat` | Chat with the support bot or the ecom agent |
//! | `dash completions <shell>` | Generate shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Urgent emails only, with the detail of one of them
//! dash emails --filter urgent --select email_004
//!
//! # Advertising connectors from the analytics screen
//! dash connectors --source qualitative --filter advertising
//!
//! # Replace the bot's instructions from a file
//! dash doc save instructions --file ./instructions.txt
//!
//! # Ask the ecom agent a single question
//! dash chat --agent ecom "Which campaign has the best ROAS?"
//! ```

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use dashboard_harness::chat::ChatEndpoint;
use dashboard_harness::config::{self, Config};
use dashboard_harness::console::{self, ConnectorSource};
use dashboard_harness::document::DocumentKind;

/// Dashboard Harness CLI: terminal front-end for the email, analytics, and
/// ecom-agent dashboards.
#[derive(Parser)]
#[command(
    name = "dash",
    about = "Dashboard Harness: terminal front-end for the email, analytics, and ecom-agent dashboards",
    version,
    long_about = "Dashboard Harness fetches inbox, connector, and analytics data from the dashboard \
    backend, saves knowledge-base and instruction edits, and chats with the support bot and the \
    e-commerce agent."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/dash.toml`. Ignored when `--base-url` is given.
    #[arg(long, global = true, default_value = "./config/dash.toml")]
    config: PathBuf,

    /// Backend base URL. Overrides the config file; all other settings use
    /// their defaults.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List inbox emails.
    ///
    /// Shows sender, sentiment, relative receive time and subject for every
    /// email matching the filter, followed by per-sentiment counts.
    Emails {
        /// Sentiment to filter by (`all`, `normal`, `urgent`, `angry`, `spam`, `handover`).
        #[arg(long)]
        filter: Option<String>,

        /// Show the full body and AI reply of the email with this id.
        #[arg(long)]
        select: Option<String>,
    },

    /// Show email statistics.
    Stats,

    /// List connectors and their status.
    Connectors {
        /// Which dashboard's connectors to list.
        #[arg(long, value_enum, default_value = "bot")]
        source: SourceArg,

        /// Connector type to filter by.
        #[arg(long)]
        filter: Option<String>,
    },

    /// Print the analytics overview, followed by the remaining dashboard sections.
    Dashboard,

    /// Show or save an editable document.
    Doc {
        #[command(subcommand)]
        action: DocAction,
    },

    /// Chat with the support bot or the ecom agent.
    ///
    /// With a MESSAGE, sends it and prints the reply. Without one, reads
    /// messages from stdin line by line until EOF or `/quit`.
    Chat {
        #[arg(long, value_enum, default_value = "bot")]
        agent: AgentArg,

        message: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum DocAction {
    /// Print the current document text.
    Show { doc: DocArg },

    /// Replace the document and save it.
    Save {
        doc: DocArg,

        /// Read the new text from this file.
        #[arg(long, conflicts_with = "text", required_unless_present = "text")]
        file: Option<PathBuf>,

        /// Use this text as the new document.
        #[arg(long)]
        text: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DocArg {
    /// Support bot knowledge base.
    Kb,
    /// Support bot instructions.
    Instructions,
    /// Ecom agent knowledge base.
    EcomKb,
}

impl From<DocArg> for DocumentKind {
    fn from(arg: DocArg) -> Self {
        match arg {
            DocArg::Kb => DocumentKind::BotKnowledgeBase,
            DocArg::Instructions => DocumentKind::BotInstructions,
            DocArg::EcomKb => DocumentKind::EcomKnowledgeBase,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Bot,
    Ecom,
    Qualitative,
}

impl From<SourceArg> for ConnectorSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Bot => ConnectorSource::Bot,
            SourceArg::Ecom => ConnectorSource::Ecom,
            SourceArg::Qualitative => ConnectorSource::Qualitative,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum AgentArg {
    Bot,
    Ecom,
}

impl From<AgentArg> for ChatEndpoint {
    fn from(arg: AgentArg) -> Self {
        match arg {
            AgentArg::Bot => ChatEndpoint::Bot,
            AgentArg::Ecom => ChatEndpoint::EcomAgent,
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "dashboard_harness=debug,dash=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.base_url {
        Some(url) => {
            let cfg = Config::with_base_url(url.clone());
            cfg.validate()?;
            Ok(cfg)
        }
        None => config::load_config(&cli.config),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "dash", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = load(&cli)?;

    match cli.command {
        Commands::Emails { filter, select } => {
            console::run_emails(&cfg, filter, select).await?;
        }
        Commands::Stats => {
            console::run_stats(&cfg).await?;
        }
        Commands::Connectors { source, filter } => {
            console::run_connectors(&cfg, source.into(), filter).await?;
        }
        Commands::Dashboard => {
            console::run_dashboard(&cfg).await?;
        }
        Commands::Doc { action } => match action {
            DocAction::Show { doc } => {
                console::run_doc_show(&cfg, doc.into()).await?;
            }
            DocAction::Save { doc, file, text } => {
                let text = match (file, text) {
                    (Some(path), _) => std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                    (None, Some(text)) => text,
                    (None, None) => anyhow::bail!("either --file or --text is required"),
                };
                console::run_doc_save(&cfg, doc.into(), text).await?;
            }
        },
        Commands::Chat { agent, message } => {
            console::run_chat(&cfg, agent.into(), message).await?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
