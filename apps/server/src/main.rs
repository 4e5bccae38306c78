//! Model conversion server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use model_convert_lib::api;
use model_convert_lib::config::Config;
use model_convert_lib::middleware::{self, request_logger::REQUEST_ID_HEADER};
use model_convert_lib::services::{self, ConversionGateway, FileRepository};

/// Perform health check (for Docker healthcheck).
async fn health_check() -> bool {
    match Config::from_env() {
        Ok(config) => {
            tokio::fs::metadata(&config.storage.models_dir).await.is_ok()
                && tokio::fs::metadata(&config.storage.images_dir).await.is_ok()
        }
        Err(_) => false,
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Check for --health-check flag (used by Docker HEALTHCHECK)
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(if health_check().await { 0 } else { 1 });
    }

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| std::io::Error::other(format!("Failed to set tracing subscriber: {}", e)))?;

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be 'development' or 'production' (default: development)");
            error!("  - In production, MODELS_DIR_PATH, IMAGES_DIR_PATH and PUBLIC_HOST must be set");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Model Conversion Service");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    // Scratch directories are per-process; anything left over is from a crash
    for dir in [&config.upload_dir, &config.output_dir] {
        services::prepare_scratch_dir(dir).await.map_err(|e| {
            std::io::Error::other(format!("Failed to prepare {}: {}", dir.display(), e))
        })?;
    }

    let repository = Arc::new(FileRepository::new(&config.storage));
    repository
        .ensure_roots()
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let gateway = ConversionGateway::new(
        config.converter.clone(),
        &config.output_dir,
        repository.clone(),
    );

    info!(
        "Converter: {} {} <input> <output> (-> .{})",
        config.converter.program,
        config.converter.args.join(" "),
        config.converter.target_extension
    );
    info!(
        "Upload limit: {}MB per model",
        config.max_upload_size / 1024 / 1024
    );

    let bind_address = config.bind_address();
    let is_development = config.is_development();

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    let config = web::Data::new(config);
    let gateway = web::Data::new(gateway);
    let repository = web::Data::from(repository);

    let server = HttpServer::new(move || {
        let cors = if is_development {
            // Permissive CORS for development
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .expose_headers(vec![REQUEST_ID_HEADER])
                .max_age(3600)
        } else {
            // Restrictive CORS for production (same-origin only)
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            .wrap(middleware::RequestLogger)
            .app_data(config.clone())
            .app_data(gateway.clone())
            .app_data(repository.clone())
            .configure(api::configure_app)
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
