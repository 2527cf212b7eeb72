//! Console menu for the replicated echo service. Finds the leader through the
//! registry and keeps retrying a pending request across failovers.

use std::time::Duration;

use clap::Parser;
use echo_cluster::client::EchoClient;
use echo_cluster::config::ClientConfig;
use echo_cluster::directory::client::HttpDirectory;
use echo_cluster::directory::types::Endpoint;
use echo_cluster::node::peer::HttpPeerClient;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "echo-shell", about = "Interactive client for echo-cluster")]
struct Cli {
    #[arg(long, env = "ECHO_CLUSTER_REGISTRY", default_value = "http://127.0.0.1:1099")]
    registry: String,

    #[arg(long, env = "ECHO_CLUSTER_RECONNECT_DELAY_MS", default_value_t = 500)]
    reconnect_delay_ms: u64,

    /// Log at DEBUG instead of WARN.
    #[arg(short, long, env = "ECHO_CLUSTER_VERBOSE")]
    verbose: bool,
}

enum Choice {
    Send,
    History,
    Quit,
}

impl Choice {
    fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Send),
            "2" => Some(Self::History),
            "3" => Some(Self::Quit),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Keep reconnect chatter off the menu unless asked for.
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = ClientConfig {
        reconnect_delay: Duration::from_millis(cli.reconnect_delay_ms),
        ..ClientConfig::default()
    };
    let directory = Arc::new(HttpDirectory::new(
        Endpoint::new(cli.registry),
        config.rpc_timeout,
    ));
    let peers = Arc::new(HttpPeerClient::new(config.rpc_timeout));

    let mut client = EchoClient::new(directory, peers, config);
    let leader = client.connect().await;
    println!("Connected to leader at {}", leader);

    let mut editor = DefaultEditor::new()?;

    loop {
        println!();
        println!("1 - Send message");
        println!("2 - View history");
        println!("3 - Quit");

        let input = match read_line(&mut editor, "Choice: ") {
            Ok(input) => input,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(error) => return Err(error.into()),
        };

        match Choice::parse(&input) {
            Some(Choice::Send) => {
                let message = match read_line(&mut editor, "Message: ") {
                    Ok(message) => message,
                    Err(ReadlineError::Interrupted) => continue,
                    Err(ReadlineError::Eof) => break,
                    Err(error) => return Err(error.into()),
                };
                let reply = client.echo(&message).await;
                println!("Reply: {}", reply);
            }
            Some(Choice::History) => {
                let messages = client.history().await;
                println!("History:");
                for message in messages {
                    println!("- {}", message);
                }
            }
            Some(Choice::Quit) => break,
            None => println!("Invalid option."),
        }
    }

    Ok(())
}

/// Reads one line without stalling the runtime's other workers.
fn read_line(editor: &mut DefaultEditor, prompt: &str) -> rustyline::Result<String> {
    tokio::task::block_in_place(|| editor.readline(prompt)).map(|line| line.trim_end().to_string())
}
