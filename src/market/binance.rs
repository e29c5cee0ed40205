use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::IgnoredAny;

use super::{Kline, Ticker24h};
use crate::errors;

const API_KEY_HEADER: &str = "X-MBX-APIKEY";
const INVALID_SYMBOL_CODE: i64 = -1121;

/// [`super::MarketApi`] backed by the Binance spot REST API.
#[derive(Clone)]
pub struct BinanceApi {
    client: reqwest::Client,
    base_url: String,
}

impl BinanceApi {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> crate::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if !api_key.is_empty() {
            let value = reqwest::header::HeaderValue::from_str(api_key).map_err(|e| {
                errors::ErrorKind::InvalidInput(format!(
                    "Binance API key is not a valid header: {}",
                    e
                ))
            })?;
            headers.insert(API_KEY_HEADER, value);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                errors::ErrorKind::InternalError(format!("Could not build HTTP client: {}", e))
            })?;

        tracing::info!(
            target: crate::LOGGER_MSG,
            "Market price client initialized for {}",
            base_url
        );
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> crate::Result<T> {
        tracing::info!(target: crate::LOGGER_MSG, "Market request: {} {:?}", path, query);
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(target: crate::LOGGER_MSG, "Market request {} failed: {}", path, e);
                errors::ErrorKind::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                target: crate::LOGGER_MSG,
                "Market request {} returned {}: {}",
                path,
                status,
                body
            );
            return Err(api_error(status, &body).into());
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait::async_trait]
impl super::MarketApi for BinanceApi {
    async fn ticker_price(&self, symbol: &str) -> crate::Result<Option<f64>> {
        let query = [("symbol", symbol.to_string())];
        match self.get::<TickerPrice>("/api/v3/ticker/price", &query).await {
            Ok(ticker) => Ok(Some(ticker.price.value("price")?)),
            Err(err) if err.code == 404 => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn ticker_24h(&self, symbol: &str) -> crate::Result<Ticker24h> {
        let query = [("symbol", symbol.to_string())];
        self.get::<RawTicker24h>("/api/v3/ticker/24hr", &query)
            .await?
            .try_into()
    }

    async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u16,
    ) -> crate::Result<Vec<Kline>> {
        let query = [
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("startTime", start.timestamp_millis().to_string()),
            ("endTime", end.timestamp_millis().to_string()),
            ("limit", limit.to_string()),
        ];
        self.get::<Vec<RawKline>>("/api/v3/klines", &query)
            .await?
            .into_iter()
            .map(Kline::try_from)
            .collect()
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    code: i64,
    msg: String,
}

fn api_error(status: reqwest::StatusCode, body: &str) -> errors::ErrorKind {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(error) if error.code == INVALID_SYMBOL_CODE => errors::ErrorKind::NotFound(error.msg),
        Ok(error) => errors::ErrorKind::MarketError(format!(
            "{} (code {}): {}",
            status, error.code, error.msg
        )),
        Err(_) => errors::ErrorKind::MarketError(format!("{}: {}", status, body)),
    }
}

/// Binance sends most numbers as strings.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum FlexibleF64 {
    Float(f64),
    Text(String),
}

impl FlexibleF64 {
    fn value(&self, field: &str) -> crate::Result<f64> {
        match self {
            Self::Float(value) => Ok(*value),
            Self::Text(text) => text.parse::<f64>().map_err(|e| {
                errors::ErrorKind::MarketError(format!(
                    "Failed to parse {} {:?}: {}",
                    field, text, e
                ))
                .into()
            }),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct TickerPrice {
    price: FlexibleF64,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTicker24h {
    high_price: FlexibleF64,
    low_price: FlexibleF64,
    volume: FlexibleF64,
    count: u64,
}

impl TryFrom<RawTicker24h> for Ticker24h {
    type Error = errors::Error;

    fn try_from(ticker: RawTicker24h) -> crate::Result<Self> {
        Ok(Self {
            high: ticker.high_price.value("highPrice")?,
            low: ticker.low_price.value("lowPrice")?,
            volume: ticker.volume.value("volume")?,
            number_trades: ticker.count,
        })
    }
}

// [openTime, open, high, low, close, volume, closeTime, quoteVolume, trades, takerBase, takerQuote, ignore]
#[derive(Debug, serde::Deserialize)]
struct RawKline(
    i64,
    FlexibleF64,
    FlexibleF64,
    FlexibleF64,
    FlexibleF64,
    FlexibleF64,
    i64,
    IgnoredAny,
    u64,
    IgnoredAny,
    IgnoredAny,
    IgnoredAny,
);

fn from_millis(millis: i64) -> crate::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
        errors::ErrorKind::MarketError(format!("Timestamp {} is out of range", millis)).into()
    })
}

impl TryFrom<RawKline> for Kline {
    type Error = errors::Error;

    fn try_from(kline: RawKline) -> crate::Result<Self> {
        Ok(Self {
            open_time: from_millis(kline.0)?,
            open: kline.1.value("open")?,
            high: kline.2.value("high")?,
            low: kline.3.value("low")?,
            close: kline.4.value("close")?,
            volume: kline.5.value("volume")?,
            close_time: from_millis(kline.6)?,
            number_trades: kline.8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketApi;

    const KLINES: &str = r#"[
        [1705276800000, "2531.10000000", "2590.00000000", "2500.05000000", "2510.44000000",
         "312345.67890000", 1705363199999, "789456123.12", 1020304, "150000.1", "375000000.2", "0"]
    ]"#;

    const TICKER_24H: &str = r#"{
        "symbol": "ETHUSDT", "priceChange": "-12.5", "highPrice": "2600.01",
        "lowPrice": "2450.00", "volume": "401234.5", "count": 987654
    }"#;

    #[test]
    fn test_parse_klines() {
        let klines: Vec<Kline> = serde_json::from_str::<Vec<RawKline>>(KLINES)
            .unwrap()
            .into_iter()
            .map(Kline::try_from)
            .collect::<crate::Result<_>>()
            .unwrap();
        assert_eq!(klines.len(), 1);
        let kline = &klines[0];
        assert_eq!(kline.open_time.to_rfc3339(), "2024-01-15T00:00:00+00:00");
        assert_eq!(kline.close, 2510.44);
        assert_eq!(kline.high, 2590.0);
        assert_eq!(kline.number_trades, 1020304);
        insta::assert_snapshot!(kline.close_time.to_rfc3339(), @"2024-01-15T23:59:59.999+00:00");
    }

    #[test]
    fn test_parse_ticker_24h() {
        let ticker: Ticker24h = serde_json::from_str::<RawTicker24h>(TICKER_24H)
            .unwrap()
            .try_into()
            .unwrap();
        assert_eq!(ticker.high, 2600.01);
        assert_eq!(ticker.low, 2450.0);
        assert_eq!(ticker.number_trades, 987654);
    }

    #[test]
    fn test_unparseable_price() {
        let ticker =
            serde_json::from_str::<TickerPrice>(r#"{"symbol":"X","price":"n/a"}"#).unwrap();
        let error = ticker.price.value("price").unwrap_err();
        assert_eq!(error.code, 500);
    }

    #[test]
    fn test_api_error_mapping() {
        let invalid_symbol = api_error(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"code":-1121,"msg":"Invalid symbol."}"#,
        );
        assert_eq!(errors::Error::from(invalid_symbol).code, 404);

        let rate_limited = errors::Error::from(api_error(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            r#"{"code":-1003,"msg":"Too many requests."}"#,
        ));
        assert_eq!(rate_limited.code, 500);
        assert!(rate_limited.message.contains("-1003"));

        let gateway = errors::Error::from(api_error(reqwest::StatusCode::BAD_GATEWAY, "<html>"));
        assert!(gateway.message.starts_with("Market API error"));
    }

    #[tokio::test]
    async fn test_unreachable_exchange_is_market_error() {
        let api = BinanceApi::new("http://127.0.0.1:1/", "", Duration::from_secs(2)).unwrap();
        let error = api.ticker_price("ETHUSDT").await.unwrap_err();
        assert_eq!(error.code, 500);
        assert!(error.message.starts_with("Market API error"));
    }
}
