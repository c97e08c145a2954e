use clap::{Parser, Subcommand};
use pdf_rag_chat::Result;
use pdf_rag_chat::commands::{AskOptions, ask, check, serve};
use pdf_rag_chat::config::{run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdf-rag-chat")]
#[command(about = "Chat with a language model grounded in an uploaded PDF")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure embedding, chat and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Start the HTTP API
    Serve {
        /// Address to bind, overrides the configured host
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overrides the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Index a local document and ask one question about it
    Ask {
        /// PDF or plain-text document to index
        file: PathBuf,
        /// Question to answer from the document
        question: String,
        /// Chat provider, "openai" or "together"
        #[arg(long)]
        provider: Option<String>,
        /// Chat model identifier
        #[arg(long)]
        model: Option<String>,
        /// API key, defaults to the provider's environment variable
        #[arg(long)]
        api_key: Option<String>,
        /// System instruction sent before the question
        #[arg(long)]
        system: Option<String>,
        /// Wait for the full answer instead of streaming it
        #[arg(long)]
        no_stream: bool,
    },
    /// Smoke test a running server
    Check {
        /// Base URL of the server
        #[arg(long)]
        url: Option<String>,
        /// API key for the chat check, defaults to OPENAI_API_KEY
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Serve { host, port } => {
            serve(host, port).await?;
        }
        Commands::Ask {
            file,
            question,
            provider,
            model,
            api_key,
            system,
            no_stream,
        } => {
            ask(AskOptions {
                file,
                question,
                provider,
                model,
                api_key,
                system,
                no_stream,
            })
            .await?;
        }
        Commands::Check { url, api_key } => {
            check(url, api_key).await?;
        }
    }

    Ok(())
}
