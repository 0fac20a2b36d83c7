use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mcp_weather::{
    chat::{ChatBackend, OpenAiChat},
    config::ClientConfig,
    constants,
    logging,
    relay::{Relay, ToolHost},
    session::{McpSession, ServerTarget},
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Chat with a model that can call the tools of an MCP server
#[derive(Parser, Debug)]
#[command(name = "weather-client", version)]
struct Cli {
    /// Path to a server executable or script, or an http(s) URL
    server: String,

    /// Arguments passed to a local server, after `--`
    #[arg(last = true)]
    server_args: Vec<String>,

    /// Directory for daily-rotated log files
    #[arg(long, default_value = constants::LOG_DIR)]
    log_dir: PathBuf,

    /// Only log to stderr
    #[arg(long)]
    no_log_file: bool,
}

fn prompt() -> Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "\nQuery: ")?;
    stdout.flush()?;
    Ok(())
}

/// The line printed for a model answer, exactly as the model sent it
fn printable_answer(answer: &str) -> &str {
    if answer.is_empty() {
        "(No response returned)"
    } else {
        answer
    }
}

async fn chat_loop<C: ChatBackend, T: ToolHost>(relay: &Relay<C, T>) -> Result<()> {
    tracing::info!("MCP Client Started! Type your queries or 'quit' to exit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            tracing::info!("Received EOF; exiting chat loop.");
            break;
        };

        let query = line.trim();
        if query.eq_ignore_ascii_case("quit") || query.eq_ignore_ascii_case("exit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        match relay.process_query(query).await {
            Ok(outcome) => {
                for invocation in &outcome.invocations {
                    tracing::info!(
                        "[Tool {} called with args {}]",
                        invocation.name,
                        serde_json::Value::Object(invocation.arguments.clone())
                    );
                }
                println!("{}", printable_answer(&outcome.answer));
            }
            Err(e) => tracing::error!("Error while processing query: {e:#}"),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = (!cli.no_log_file).then_some(cli.log_dir.as_path());
    let _guard = logging::init(env!("CARGO_CRATE_NAME"), "weather_client", log_dir)?;

    tracing::info!("Starting MCP client with server {}", cli.server);
    let config = ClientConfig::from_env().context("invalid client configuration")?;
    tracing::info!("Initializing MCP client targeting {}", config.model);

    let chat = OpenAiChat::new(&config)?;
    let target = ServerTarget::parse(&cli.server).with_args(cli.server_args)?;
    let session = McpSession::connect(&target, &config.http_headers).await?;
    let relay = Relay::new(chat, session, config.model.clone());

    let result = chat_loop(&relay).await;

    relay.into_host().close().await?;
    tracing::info!("Client shutdown complete");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_print_verbatim() {
        assert_eq!(printable_answer("It is sunny."), "It is sunny.");
        assert_eq!(printable_answer("\nLeading newline kept"), "\nLeading newline kept");
        assert_eq!(printable_answer(""), "(No response returned)");
    }
}
