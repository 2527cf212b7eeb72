use clap::{Args, Parser, Subcommand};
use echo_cluster::config::NodeConfig;
use echo_cluster::directory::client::HttpDirectory;
use echo_cluster::directory::memory::InMemoryDirectory;
use echo_cluster::directory::types::Endpoint;
use echo_cluster::node::peer::HttpPeerClient;
use echo_cluster::node::service::EchoNode;
use echo_cluster::replication::broker::Broker;
use echo_cluster::replication::http::HttpChannel;
use echo_cluster::server::{node_router, registry_router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "echo-cluster", about = "Replicated echo service")]
struct Cli {
    /// Log at DEBUG instead of INFO.
    #[arg(short, long, global = true, env = "ECHO_CLUSTER_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hosts the directory and the replication broker.
    Registry(RegistryArgs),
    /// Runs one node of the cluster.
    Node(NodeArgs),
}

#[derive(Args)]
struct RegistryArgs {
    #[arg(long, env = "ECHO_CLUSTER_BIND", default_value = "127.0.0.1:1099")]
    bind: SocketAddr,
}

#[derive(Args)]
struct NodeArgs {
    #[arg(long, env = "ECHO_CLUSTER_BIND", default_value = "127.0.0.1:7001")]
    bind: SocketAddr,

    /// Endpoint registered in the directory. Defaults to `http://<bind>`.
    #[arg(long, env = "ECHO_CLUSTER_ADVERTISE")]
    advertise: Option<String>,

    #[arg(long, env = "ECHO_CLUSTER_REGISTRY", default_value = "http://127.0.0.1:1099")]
    registry: String,

    #[arg(long, env = "ECHO_CLUSTER_POLL_INTERVAL_MS", default_value_t = 100)]
    poll_interval_ms: u64,

    #[arg(long, env = "ECHO_CLUSTER_ELECTION_BACKOFF_MS", default_value_t = 500)]
    election_backoff_ms: u64,

    #[arg(long, env = "ECHO_CLUSTER_RPC_TIMEOUT_MS", default_value_t = 1000)]
    rpc_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Command::Registry(args) => run_registry(args).await,
        Command::Node(args) => run_node(args).await,
    }
}

async fn run_registry(args: RegistryArgs) -> anyhow::Result<()> {
    let directory = Arc::new(InMemoryDirectory::new());
    let broker = Arc::new(Broker::new());
    let app = registry_router(directory, broker);

    tracing::info!("Registry listening on {}", args.bind);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_node(args: NodeArgs) -> anyhow::Result<()> {
    let config = NodeConfig {
        poll_interval: Duration::from_millis(args.poll_interval_ms),
        election_backoff: Duration::from_millis(args.election_backoff_ms),
        rpc_timeout: Duration::from_millis(args.rpc_timeout_ms),
    };

    let endpoint = Endpoint::new(
        args.advertise
            .unwrap_or_else(|| format!("http://{}", args.bind)),
    );
    let registry = Endpoint::new(args.registry);

    let directory = Arc::new(HttpDirectory::new(registry.clone(), config.rpc_timeout));
    let channel = Arc::new(HttpChannel::new(
        registry.clone(),
        endpoint.clone(),
        config.rpc_timeout,
    ));
    let peers = Arc::new(HttpPeerClient::new(config.rpc_timeout));

    let node = EchoNode::new(endpoint, config, directory, channel.clone(), peers);

    // Serve before discovery so broker deliveries have somewhere to land.
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    let app = node_router(node.clone(), channel);
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    tracing::info!("Node HTTP surface listening on {}", args.bind);
    tracing::info!("Using registry at {}", registry);

    let role = node.start().await?;
    tracing::info!("Node active. Id: {} / Role: {}", node.id, role);
    tracing::info!("Press Ctrl+C to shutdown");

    tokio::select! {
        served = server => {
            served??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            node.shutdown().await;
        }
    }

    Ok(())
}
