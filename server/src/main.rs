use anyhow::Context;
use casedrop_engine::RngSecret;
use casedrop_server::{starter_catalog, Api, Storefront};
use clap::Parser;
use commonware_codec::DecodeExt;
use commonware_cryptography::ed25519::PublicKey;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Hex-encoded 32-byte draw secret
    #[arg(short, long)]
    secret: String,

    /// Hex-encoded ed25519 public key of the operator account
    #[arg(short, long)]
    admin: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();

    // Create logger
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Parse draw secret
    let bytes = commonware_utils::from_hex(&args.secret).context("invalid secret hex format")?;
    let secret: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("secret must be exactly 32 bytes"))?;
    let secret = RngSecret::new(secret);

    // Parse operator key
    let bytes = commonware_utils::from_hex(&args.admin).context("invalid admin hex format")?;
    let admin: PublicKey =
        PublicKey::decode(&mut bytes.as_slice()).context("failed to decode admin public key")?;

    let storefront = Storefront::new(secret);
    storefront.bootstrap(admin, starter_catalog()).await;
    let api = Api::new(Arc::new(storefront));
    let app = api.router();

    // Start server
    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("axum server error")?;

    Ok(())
}
