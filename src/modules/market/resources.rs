use actix_web::web::{self, Json};
use actix_web_validator::Query;
use chrono::NaiveDate;

use crate::market::{self, PriceData};
use crate::types::query_params::{self, HistoricalPriceParams, PriceParams};
use crate::{errors, types};

/// Get the current price of a trading pair
///
/// With `convert_usd=true`, pairs not quoted in a USD stablecoin also get a `usd` value
/// derived from the quote asset's USDT price. A failed conversion leaves `usd` out.
/// A symbol the exchange does not list answers 404.
pub async fn get_current_price(
    market: web::Data<market::MarketClient>,
    params: Query<PriceParams>,
) -> crate::Result<Json<types::ApiResponse<PriceData>>> {
    let symbol = query_params::required(&params.symbol, "symbol")?;
    tracing::info!(target: crate::LOGGER_MSG, "Current price request for {}", symbol);

    let mut price = market.get_current_price(symbol).await?;
    if query_params::is_enabled(&params.convert_usd) {
        add_usd_price(&market, &mut price, None).await;
    }

    Ok(Json(types::ApiResponse::ok(
        "Current price retrieved successfully",
        price,
    )))
}

/// Get the daily close of a trading pair
///
/// `date` is a UTC day in `YYYY-MM-DD` form. A day without a candle answers 404.
pub async fn get_historical_price(
    market: web::Data<market::MarketClient>,
    params: Query<HistoricalPriceParams>,
) -> crate::Result<Json<types::ApiResponse<PriceData>>> {
    let symbol = query_params::required(&params.symbol, "symbol")?;
    let date = query_params::parse_date(query_params::required(&params.date, "date")?)
        .ok_or_else(|| {
            errors::ErrorKind::InvalidInput("Invalid date format. Use YYYY-MM-DD".to_string())
        })?;
    tracing::info!(
        target: crate::LOGGER_MSG,
        "Historical price request for {} on {}",
        symbol,
        date
    );

    let mut price = market.get_historical_price(symbol, date).await?;
    if query_params::is_enabled(&params.convert_usd) {
        add_usd_price(&market, &mut price, Some(date)).await;
    }

    Ok(Json(types::ApiResponse::ok(
        "Historical price retrieved successfully",
        price,
    )))
}

async fn add_usd_price(
    market: &market::MarketClient,
    price: &mut PriceData,
    date: Option<NaiveDate>,
) {
    if market::is_usd_quoted(&price.symbol) {
        return;
    }
    match market.convert_to_usd(&price.symbol, price.price, date).await {
        Ok(usd) => price.usd = Some(usd),
        Err(err) => tracing::warn!(
            target: crate::LOGGER_MSG,
            "Failed to convert {} price to USD: {}",
            price.symbol,
            err
        ),
    }
}
