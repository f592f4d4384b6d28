// HTTP API server binary for gobble-cube
// Serves CSV uploads and sales / category-share analytics

use anyhow::Result;
use clap::Parser;
use gobble_cube::api::ApiServer;
use gobble_cube::database_ops::db::Db;
use gobble_cube::telemetry;
use gobble_cube::util::env as env_util;

#[derive(Parser, Debug)]
#[command(name = "api_server", about = "gobble-cube CSV ingestion and analytics API")]
struct Args {
    /// Bind host (overrides API_HOST)
    #[arg(long)]
    host: Option<String>,
    /// Bind port (overrides API_PORT)
    #[arg(long)]
    port: Option<u16>,
    /// SQLite DSN (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load dotenv/env once (safe to call multiple times)
    env_util::init_env();
    telemetry::init_tracing(telemetry::DEFAULT_FILTER)?;

    tracing::info!("Initializing gobble-cube API server");
    env_util::preflight_check(
        "api_server",
        &[],
        &[
            "API_HOST",
            "API_PORT",
            "ALLOWED_ORIGINS",
            "UPLOAD_MAX_BYTES",
            "API_WORKERS",
            "DATABASE_URL",
            "DB_MAX_CONNS",
            "AUTO_MIGRATE",
        ],
    )?;

    let mut server = ApiServer::from_env()?;
    if let Some(host) = args.host {
        server.host = host;
    }
    if let Some(port) = args.port {
        server.port = port;
    }

    let database_url = args.database_url.unwrap_or_else(env_util::db_url);
    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNS", 5u32);
    let db = Db::connect(&database_url, max_connections).await?;

    tracing::info!("Database connected successfully");

    server.run(db).await?;

    Ok(())
}
