use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;

mod config;
mod controllers;
mod db;
mod embedding;
mod models;
mod ocr;
mod orchestrator;
mod tools;
mod verify;

use config::Config;
use db::Database;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    /// Shared HTTP client for all outbound API calls
    pub http: reqwest::Client,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).expect("Failed to initialize database");
    let db = Arc::new(db);

    let http = reqwest::Client::builder()
        .user_agent(tools::USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to build HTTP client");

    log::info!("Starting AgentHub server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config.clone(),
                http: http.clone(),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::agents::config)
            .configure(controllers::capabilities::config)
            .configure(controllers::api_keys::config)
            .configure(controllers::knowledge::config)
            .configure(controllers::chat::config)
            .configure(controllers::admin::config)
            .configure(controllers::verify::config)
            .configure(tools::coingecko::config)
            .configure(tools::helius::config)
            .configure(tools::serper::config)
            .configure(tools::jina::config)
            .configure(tools::together::config)
            .configure(tools::fetchai::config)
            .configure(tools::elevenlabs::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
