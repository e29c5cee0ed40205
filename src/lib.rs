use actix_cors::Cors;
use actix_web::{dev::Server, http, middleware, web, App, HttpServer};
pub(crate) use sqlx::types::BigDecimal;

pub mod chain;
pub mod config;
pub mod db_helpers;
pub mod errors;
pub mod market;
mod modules;
pub mod types;

pub const LOGGER_MSG: &str = "eth_market_api";

pub type Result<T> = std::result::Result<T, errors::Error>;

fn cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default();
    if allowed_origins.iter().any(|origin| origin == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allowed_methods(vec!["GET"])
        .allowed_headers(vec![http::header::AUTHORIZATION, http::header::ACCEPT])
        .allowed_header(http::header::CONTENT_TYPE)
        .max_age(3600)
}

/// Binds the HTTP server; the caller drives the returned [`Server`].
pub fn start(
    config: config::Config,
    chain: chain::ChainClient,
    market: market::MarketClient,
    pool: sqlx::Pool<sqlx::Postgres>,
) -> std::io::Result<Server> {
    let prometheus = actix_web_prom::PrometheusMetricsBuilder::new("eth_market_api")
        .endpoint("/metrics")
        .build()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let chain = web::Data::new(chain);
    let market = web::Data::new(market);
    let pool = web::Data::new(pool);
    let cors_allowed_origins = config.cors_allowed_origins.clone();

    tracing::info!(target: LOGGER_MSG, "Starting HTTP server on {}", config.addr);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(modules::query_config())
            .app_data(chain.clone())
            .app_data(market.clone())
            .app_data(pool.clone())
            .wrap(cors(&cors_allowed_origins))
            .wrap(prometheus.clone())
            .wrap(middleware::Logger::default())
            .configure(modules::health::register_services)
            .configure(modules::eth::register_services)
            .configure(modules::market::register_services)
    })
    .bind(&config.addr)?
    .shutdown_timeout(5)
    .run();

    Ok(server)
}
