use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// In-memory catalog backend for local development and tests.
#[derive(Debug, Parser)]
#[command(name = "mock-server", version)]
struct Args {
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 3030)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mock_server=debug,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    mock_server::run(listener).await
}
