//! Command-line interface parsing and handling
//!
//! This module parses arguments, loads configuration, builds the shared chat
//! services and dispatches to the chat loop or the config printer.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::core::client::ModelClient;
use crate::core::config::data::Config;
use crate::core::credential::{EnvironmentCredential, TokenCredential};
use crate::core::error::ConfigurationError;
use crate::core::session::ChatServices;
use crate::mcp::registration::McpToolRegistration;
use crate::ui::repl::run_chat;

/// Filter directives for diagnostics on stderr, e.g. `todochat=debug`.
pub const LOG_ENV: &str = "TODOCHAT_LOG";

#[derive(Parser)]
#[command(name = "todochat")]
#[command(about = "Chat with a model that manages your to-do list through an MCP server")]
#[command(
    long_about = "todochat streams replies from a hosted model that can call the tools of a \
remote MCP to-do server on your behalf. After each reply it offers up to three follow-up \
questions you can send with /1, /2 or /3.\n\n\
Environment Variables (override the config file):\n\
  OPENAI_CONNECTION_STRING  Endpoint=...;Key=...;Deployment=...\n\
  OPENAI_ENDPOINT           Model endpoint (managed endpoints may omit the key)\n\
  OPENAI_API_KEY            Model API key\n\
  OPENAI_DEPLOYMENT_NAME    Deployment or model name (default gpt-5-mini)\n\
  MCP_SERVER_URL            Base URL of the to-do MCP server (required)\n\
  MCP_BEARER_TOKEN          Token the MCP server accepts (required)\n\
  MCP_SERVER_LABEL          Tool label shown to the model (default todo-list)\n\
  AZURE_OPENAI_AD_TOKEN     Token for managed endpoints without a key\n\
  TODOCHAT_LOG              Diagnostic filter, e.g. todochat=debug\n\n\
Commands:\n\
  /1 /2 /3          Send the numbered suggestion\n\
  /stop             Stop the reply in progress\n\
  /reset            Start a new conversation\n\
  /help             Show this help\n\
  /quit             Leave todochat"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Read settings from this file instead of the default location
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Deployment or model name to use, overriding configuration
    #[arg(short = 'd', long, global = true, value_name = "NAME")]
    pub deployment: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Print the effective configuration with secrets masked
    Config,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = load_config(&args)?;

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Config => {
            config.print_all();
            Ok(())
        }
        Commands::Chat => {
            let services = match build_services(&config) {
                Ok(services) => services,
                Err(err) => {
                    report_configuration_error(&err);
                    std::process::exit(err.exit_code());
                }
            };
            run_chat(services).await
        }
    }
}

fn load_config(args: &Args) -> Result<Config, Box<dyn Error>> {
    let mut config = Config::load_layered(args.config.as_deref())?;
    if let Some(deployment) = &args.deployment {
        config.model.deployment = Some(deployment.clone());
    }
    Ok(config)
}

/// Resolve the model client and tool registration into the services every
/// session shares.
pub fn build_services(config: &Config) -> Result<Arc<ChatServices>, ConfigurationError> {
    let credential: Arc<dyn TokenCredential> = Arc::new(EnvironmentCredential::default());
    let client = ModelClient::from_settings(&config.model, Some(credential))?;
    let tool = McpToolRegistration::from_config(config)?;
    let model = client.deployment().to_string();

    Ok(Arc::new(ChatServices::new(
        Arc::new(client),
        model,
        tool,
        config.system_prompt(),
    )))
}

fn report_configuration_error(err: &ConfigurationError) {
    eprintln!("❌ {err}");
    eprintln!();
    eprintln!("🔧 Quick fixes:");
    for fix in err.quick_fixes() {
        eprintln!("  {fix}");
    }
}
