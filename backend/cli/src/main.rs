mod app;
mod config_cmd;
mod explain_cmd;
mod status_cmd;
mod study_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "diagramlens")]
#[command(about = "DiagramLens: explanations, quizzes and Q&A for technical diagrams")]
#[command(version)]
struct Cli {
    /// Config file (default: $DIAGRAMLENS_CONFIG_DIR/config.yaml or ~/.diagramlens/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web UI and JSON API
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind to
        #[arg(long)]
        bind: Option<String>,
    },
    /// Study a diagram in the terminal: explanation, quiz, then Q&A
    Study {
        image: PathBuf,
        /// Number of quiz questions
        #[arg(short, long)]
        questions: Option<u32>,
    },
    /// Print the explanation of a diagram
    Explain {
        image: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Ansi)]
        format: OutputFormat,
    },
    /// Query a running server's health endpoint
    Status {
        /// Server URL (default: from config)
        #[arg(long)]
        url: Option<String>,
    },
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration with secrets masked
    Show,
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Ansi,
    Plain,
    Html,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(app::default_config_path);

    match cli.command {
        Commands::Config {
            action: ConfigAction::Init { force },
        } => config_cmd::init(&config_path, force).await,
        command => {
            let config = app::load(&config_path).await?;
            match command {
                Commands::Serve { port, bind } => app::serve(config, port, bind).await,
                Commands::Study { image, questions } => {
                    study_cmd::run(&config, &image, questions).await
                }
                Commands::Explain { image, format } => {
                    explain_cmd::run(&config, &image, format).await
                }
                Commands::Status { url } => status_cmd::run(&config, url).await,
                Commands::Config {
                    action: ConfigAction::Show,
                } => config_cmd::show(&config, &config_path),
                Commands::Config { .. } => Ok(()),
            }
        }
    }
}
