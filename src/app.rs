use std::sync::Arc;
use std::time::Instant;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{debug, info};

use crate::{
    config::{Config, Environment},
    db::Database,
    errors::AppError,
    hashid::HashidCodec,
    middleware::RequestLogger,
    routes, services,
    types::AppState,
};

// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;

// Setup logging with custom format and configuration
fn setup_logging(config: &Config) -> AppResult<()> {
    let log_level = match config.app.environment {
        Environment::Development => config.app.log_level.clone(),
        Environment::Testing => "debug,actix_web=info,sqlx=warn".to_string(),
        Environment::Production => "info,actix_web=warn,sqlx=warn".to_string(),
    };

    let env = Env::default()
        .filter_or("RUST_LOG", log_level)
        .write_style_or("RUST_LOG_STYLE", "always");

    env_logger::try_init_from_env(env)
        .map_err(|e| AppError::Logger(format!("Failed to initialize logger: {}", e)))
}

pub async fn server() -> AppResult<()> {
    let config = Config::load()?;
    setup_logging(&config)?;

    let start_time = Instant::now();

    info!("Starting {} v{}", config.app.name, config.app.version);
    info!("Environment: {:?}", config.app.environment);
    info!(
        "Binding to {}:{} with {} workers",
        config.server.host, config.server.port, config.server.workers
    );

    if config.app.environment == Environment::Development {
        debug!("Debug logging enabled");
        debug!("Full configuration: {:?}", config);
    }

    // One codec per configuration, shared by every worker
    let codec = Arc::new(HashidCodec::new(&config.hashid)?);
    info!(
        "Hashids stored in column '{}', at least {} characters long",
        config.hashid.field,
        codec.min_length()
    );

    let db = Database::connect(&config.db).await?;

    let verbose = config.app.environment != Environment::Production;
    let app_config = config.clone();
    let app_db = db.clone();

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .max_age(3600);

        let db = app_db.clone();
        let codec = codec.clone();
        let field = app_config.hashid.field.clone();

        App::new()
            .app_data(web::Data::new(AppState {
                start_time,
                db: db.clone(),
                version: app_config.app.version.clone(),
            }))
            .app_data(web::Data::new(app_config.clone()))
            .wrap(RequestLogger::new(verbose))
            .wrap(cors)
            .configure(move |cfg| services::register(db, codec, &field, cfg))
            .configure(routes::configure_routes)
    })
    .workers(config.server.workers)
    .bind((config.server.host.to_string(), config.server.port))?
    .run()
    .await?;

    db.shutdown().await;

    Ok(())
}
