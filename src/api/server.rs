// API server implementation using actix-web

use crate::api::{middleware, models::ApiSettings, routes};
use crate::database_ops::db::Db;
use crate::util::env::{env_opt, env_parse};
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};

pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 50 * 1024 * 1024;

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
    pub upload_max_bytes: usize,
    /// actix worker threads; `None` keeps actix's per-core default.
    pub workers: Option<usize>,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        crate::util::env::init_env();

        let host = env_opt("API_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match env_opt("API_PORT") {
            Some(raw) => raw.trim().parse().context("Invalid API_PORT")?,
            None => 8000,
        };
        let allowed_origins = env_opt("ALLOWED_ORIGINS").unwrap_or_else(|| "*".to_string());
        let upload_max_bytes = env_parse("UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES);
        let workers = env_opt("API_WORKERS")
            .map(|raw| raw.trim().parse::<usize>())
            .transpose()
            .context("Invalid API_WORKERS")?
            .filter(|n| *n > 0);

        Ok(Self {
            host,
            port,
            allowed_origins,
            upload_max_bytes,
            workers,
        })
    }

    /// Start the HTTP server
    pub async fn run(self, db: Db) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            upload_max_bytes = self.upload_max_bytes,
            "Starting gobble-cube API server"
        );

        let db_data = web::Data::new(db);
        let settings = web::Data::new(ApiSettings::new(self.upload_max_bytes));
        let allowed_origins = self.allowed_origins.clone();

        let mut server = HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(db_data.clone())
                .app_data(settings.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes)
        });
        if let Some(workers) = self.workers {
            server = server.workers(workers);
        }

        server
            .bind(&bind_addr)
            .with_context(|| format!("Failed to bind to {}", bind_addr))?
            .run()
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}
