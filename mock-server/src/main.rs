use clap::Parser;
use tokio::net::TcpListener;

/// In-memory posts API for local development and tests.
#[derive(Debug, Parser)]
#[command(name = "mock-server", version)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Start with this many sample posts.
    #[arg(long, default_value_t = 0)]
    seed: usize,
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, seed = args.seed, "mock server listening");
    mock_server::run_with(listener, mock_server::sample_posts(args.seed)).await
}
