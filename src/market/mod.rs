use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use strum::IntoEnumIterator;

use crate::errors;

mod binance;

pub use binance::BinanceApi;

const DAILY_INTERVAL: &str = "1d";
const MIN_CONVERTIBLE_SYMBOL_LEN: usize = 6;

/// Quote assets that are already worth one US dollar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter, strum::AsRefStr)]
pub enum UsdStablecoin {
    USDT,
    USDC,
    BUSD,
    DAI,
    TUSD,
    USDP,
}

/// Quote assets we know how to price through their USDT pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter, strum::AsRefStr)]
pub enum QuoteAsset {
    BTC,
    ETH,
    BNB,
}

impl QuoteAsset {
    fn usdt_symbol(&self) -> String {
        let quote: &str = self.as_ref();
        let usdt: &str = UsdStablecoin::USDT.as_ref();
        format!("{}{}", quote, usdt)
    }
}

pub fn is_usd_quoted(symbol: &str) -> bool {
    UsdStablecoin::iter().any(|coin| symbol.ends_with::<&str>(coin.as_ref()))
}

pub(crate) fn quote_asset(symbol: &str) -> Option<QuoteAsset> {
    QuoteAsset::iter().find(|quote| symbol.ends_with::<&str>(quote.as_ref()))
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Ticker24h {
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    pub number_trades: u64,
}

/// One candlestick.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Kline {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: DateTime<Utc>,
    pub number_trades: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceData {
    pub symbol: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    /// Price in USD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_trades: Option<u64>,
}

impl PriceData {
    fn spot(symbol: &str, price: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            price,
            timestamp: Utc::now(),
            usd: is_usd_quoted(symbol).then_some(price),
            open_time: None,
            close_time: None,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
            number_trades: None,
        }
    }

    fn from_kline(symbol: &str, kline: Kline) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: kline.close,
            timestamp: kline.close_time,
            usd: is_usd_quoted(symbol).then_some(kline.close),
            open_time: Some(kline.open_time),
            close_time: Some(kline.close_time),
            open: Some(kline.open),
            high: Some(kline.high),
            low: Some(kline.low),
            close: Some(kline.close),
            volume: Some(kline.volume),
            number_trades: Some(kline.number_trades),
        }
    }
}

/// Raw market-data surface of the exchange.
#[async_trait::async_trait]
pub trait MarketApi: Send + Sync {
    /// Latest traded price, `None` when the exchange has no price for the symbol.
    async fn ticker_price(&self, symbol: &str) -> crate::Result<Option<f64>>;

    async fn ticker_24h(&self, symbol: &str) -> crate::Result<Ticker24h>;

    async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u16,
    ) -> crate::Result<Vec<Kline>>;
}

#[derive(Clone)]
pub struct MarketClient {
    api: Arc<dyn MarketApi>,
}

impl MarketClient {
    pub fn new(api: Arc<dyn MarketApi>) -> Self {
        Self { api }
    }

    pub async fn get_current_price(&self, symbol: &str) -> crate::Result<PriceData> {
        tracing::debug!(target: crate::LOGGER_MSG, "Getting current price for {}", symbol);
        let price = self.api.ticker_price(symbol).await?.ok_or_else(|| {
            errors::ErrorKind::NotFound(format!("no price data found for symbol {}", symbol))
        })?;

        let mut price_data = PriceData::spot(symbol, price);
        match self.api.ticker_24h(symbol).await {
            Ok(ticker) => {
                price_data.high = Some(ticker.high);
                price_data.low = Some(ticker.low);
                price_data.volume = Some(ticker.volume);
                price_data.number_trades = Some(ticker.number_trades);
            }
            Err(err) => tracing::warn!(
                target: crate::LOGGER_MSG,
                "Failed to get 24h ticker data for {}: {}",
                symbol,
                err
            ),
        }

        tracing::info!(
            target: crate::LOGGER_MSG,
            "Retrieved current price for {}: {}",
            symbol,
            price
        );
        Ok(price_data)
    }

    /// Close of the daily candle covering `[date 00:00 UTC, date + 24h)`.
    pub async fn get_historical_price(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> crate::Result<PriceData> {
        let start = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).ok_or_else(|| {
            errors::ErrorKind::InternalError(format!("Could not build midnight of {}", date))
        })?);
        let end = start.checked_add_signed(Duration::hours(24)).ok_or_else(|| {
            errors::ErrorKind::InvalidInput(format!("Date out of range: {}", date))
        })?;

        let kline = self
            .api
            .klines(symbol, DAILY_INTERVAL, start, end, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                tracing::warn!(
                    target: crate::LOGGER_MSG,
                    "No historical data found for {} on {}",
                    symbol,
                    date
                );
                errors::ErrorKind::NotFound(format!(
                    "no historical data found for {} on {}",
                    symbol, date
                ))
            })?;

        tracing::info!(
            target: crate::LOGGER_MSG,
            "Retrieved historical price for {} on {}: {}",
            symbol,
            date,
            kline.close
        );
        Ok(PriceData::from_kline(symbol, kline))
    }

    /// Prices `price` (quoted in the quote asset of `symbol`) in USD.
    /// Stablecoin-quoted symbols pass through untouched; BTC/ETH/BNB quotes are
    /// multiplied by that asset's USDT price, at `date` when one is given.
    pub async fn convert_to_usd(
        &self,
        symbol: &str,
        price: f64,
        date: Option<NaiveDate>,
    ) -> crate::Result<f64> {
        if is_usd_quoted(symbol) {
            return Ok(price);
        }
        if symbol.len() < MIN_CONVERTIBLE_SYMBOL_LEN {
            return Err(errors::ErrorKind::UnrecognizedSymbol(symbol.to_string()).into());
        }
        let quote = quote_asset(symbol)
            .ok_or_else(|| errors::ErrorKind::UnrecognizedSymbol(symbol.to_string()))?;

        let quote_symbol = quote.usdt_symbol();
        let quote_price = match date {
            Some(date) => self.get_historical_price(&quote_symbol, date).await?,
            None => self.get_current_price(&quote_symbol).await?,
        };
        let usd = price * quote_price.price;

        tracing::info!(
            target: crate::LOGGER_MSG,
            "Converted {} {} to {} USD via {} at {}",
            price,
            symbol,
            usd,
            quote_symbol,
            quote_price.price
        );
        Ok(usd)
    }
}
