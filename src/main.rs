use seedream_gateway::{
    logger::{self, LoggerConfig},
    server, Config,
};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file first
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = Config::from_env();
    logger::init_with_config(LoggerConfig::from_config(&config))?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), &config);

    if !config.fal.has_credentials() {
        log::warn!("⚠️  FAL_API_KEY is not set; generation endpoints will answer 500");
    }

    if let Err(e) = server::run(config).await {
        log::error!("❌ Server stopped: {}", e);
        return Err(e.into());
    }

    Ok(())
}
