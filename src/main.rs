use std::sync::Arc;

use eth_market_api::{chain, config, db_helpers, market, start, LOGGER_MSG};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = config::Config::from_env().expect("failed to read the configuration");

    let rpc = chain::RpcChainApi::connect(&config.eth_rpc_url, config.upstream_timeout)
        .expect("failed to configure the Ethereum client");
    let chain = chain::ChainClient::new(Arc::new(rpc)).with_token_fanout(config.token_fanout);

    let binance = market::BinanceApi::new(
        &config.binance_base_url,
        &config.binance_api_key,
        config.upstream_timeout,
    )
    .expect("failed to configure the market client");
    let market = market::MarketClient::new(Arc::new(binance));

    let pool = db_helpers::connect_lazy(&config).expect("failed to build the database pool");
    if let Err(err) = db_helpers::ensure_schema(&pool).await {
        tracing::warn!(
            target: LOGGER_MSG,
            "Could not prepare the database schema, storage routes will fail until it is reachable: {}",
            err
        );
    }

    start(config, chain, market, pool)?.await
}
