use clap::{Parser, Subcommand};
use rag_chat::Result;
use rag_chat::commands::{ask, chat, serve};
use rag_chat::config::{run_interactive_config, show_config};
use url::Url;

#[derive(Parser)]
#[command(name = "rag-chat")]
#[command(about = "Retrieval-augmented chat server and terminal client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the server and upstream services
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Start the chat API server
    Serve {
        /// Address to bind, overriding the configuration
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overriding the configuration
        #[arg(long)]
        port: Option<u16>,
    },
    /// Chat with a running server in the terminal
    Chat {
        /// Server base URL, e.g. "http://127.0.0.1:3000"
        #[arg(long)]
        server: Option<Url>,
    },
    /// Ask a single question and print the answer
    Ask {
        /// The question to send
        question: String,
        /// Server base URL, e.g. "http://127.0.0.1:3000"
        #[arg(long)]
        server: Option<Url>,
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
        Commands::Chat { server } => {
            chat(server).await?;
        }
        Commands::Ask { question, server } => {
            ask(question, server).await?;
        }
    }

    Ok(())
}
