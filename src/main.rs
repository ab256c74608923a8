use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use nurse_match::config::{LoggingSettings, Settings};
use nurse_match::core::TrigCache;
use nurse_match::routes::{self, AppState};
use nurse_match::services::Roster;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings.logging);

    info!("Starting nurse matching service...");

    // Load roster
    let roster = match &settings.roster.path {
        Some(path) => Roster::load(path),
        None => Roster::demo(),
    }
    .map_err(|e| startup_error("Failed to load roster", e))?;

    info!("Roster loaded ({} nurses)", roster.len());

    // Initialize engines with configured defaults
    let engines = settings
        .matching
        .engine_registry()
        .map_err(|e| startup_error("Invalid matching configuration", e))?;

    info!("Engines initialized: {:?}", engines);

    let trig_cache = TrigCache::new(settings.matching.trig_cache_capacity);
    let app_state = AppState::new(roster, engines, trig_cache, settings.server.match_timeout());

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
