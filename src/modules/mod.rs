use actix_web::{error, HttpResponse};
use actix_web_validator::{Error, QueryConfig};

use crate::types;

pub(crate) mod eth;
pub(crate) mod health;
pub(crate) mod market;

/// Turns query validation failures into the usual 400 envelope.
pub(crate) fn query_config() -> QueryConfig {
    QueryConfig::default().error_handler(|err, _| {
        let message = match &err {
            Error::Validate(errors) => validation_message(errors),
            _ => err.to_string(),
        };
        tracing::debug!(target: crate::LOGGER_MSG, "Rejected query: {}", message);
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(types::ApiResponse::<()>::failure("Bad Request", message)),
        )
        .into()
    })
}

fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);
    fields
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match (&*error.code, &error.message) {
                ("required", _) => format!("{} parameter is required", field),
                (_, Some(message)) => message.to_string(),
                (code, None) => format!("{} is invalid: {}", field, code),
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
pub(crate) mod tests {
    use std::str::FromStr;
    use std::sync::Arc;
    use std::time::Duration;

    use alloy::primitives::U256;
    use chrono::{DateTime, NaiveDate, Utc};

    use crate::chain::{ChainApi, ChainClient};
    use crate::errors::ErrorKind;
    use crate::market::{Kline, MarketApi, MarketClient, Ticker24h};
    use crate::types;

    pub(crate) const FAKE_BLOCK_NUMBER: u64 = 19_000_000;
    pub(crate) const OWNER: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
    pub(crate) const USDT: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
    /// Answers `balanceOf` but has neither `symbol` nor `decimals`.
    pub(crate) const BARE_TOKEN: &str = "0x1111111111111111111111111111111111111111";
    /// Reverts on every call.
    pub(crate) const NOT_A_TOKEN: &str = "0x2222222222222222222222222222222222222222";

    pub(crate) const ETH_USDT: f64 = 2500.0;
    pub(crate) const ETH_BTC: f64 = 0.05;
    pub(crate) const BTC_USDT: f64 = 50000.0;
    pub(crate) const ETH_USDT_HISTORICAL: f64 = 2510.44;
    pub(crate) const ETH_BTC_HISTORICAL: f64 = 0.0502;
    pub(crate) const BTC_USDT_HISTORICAL: f64 = 42000.0;

    pub(crate) fn history_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn is(address: types::Address, expected: &str) -> bool {
        address == types::Address::from_str(expected).unwrap()
    }

    #[derive(Default)]
    pub(crate) struct FakeChain {
        pub down: bool,
    }

    impl FakeChain {
        pub(crate) fn unreachable() -> Self {
            Self { down: true }
        }

        fn check_up(&self) -> crate::Result<()> {
            if self.down {
                Err(ErrorKind::RPCError("connection refused".to_string()).into())
            } else {
                Ok(())
            }
        }
    }

    #[async_trait::async_trait]
    impl ChainApi for FakeChain {
        async fn block_number(&self) -> crate::Result<u64> {
            self.check_up()?;
            Ok(FAKE_BLOCK_NUMBER)
        }

        async fn balance(&self, address: types::Address) -> crate::Result<U256> {
            self.check_up()?;
            if is(address, OWNER) {
                Ok(U256::from(1_500_000_000_000_000_000u128))
            } else {
                Ok(U256::ZERO)
            }
        }

        async fn erc20_balance_of(
            &self,
            token: types::Address,
            owner: types::Address,
        ) -> crate::Result<U256> {
            self.check_up()?;
            if is(token, USDT) {
                Ok(if is(owner, OWNER) {
                    U256::from(2_500_000u64)
                } else {
                    U256::ZERO
                })
            } else if is(token, BARE_TOKEN) {
                Ok(U256::from(42u64))
            } else {
                Err(ErrorKind::ContractError("execution reverted".to_string()).into())
            }
        }

        async fn erc20_decimals(&self, token: types::Address) -> crate::Result<u8> {
            self.check_up()?;
            if is(token, USDT) {
                Ok(6)
            } else {
                Err(ErrorKind::ContractError("execution reverted".to_string()).into())
            }
        }

        async fn erc20_symbol(&self, token: types::Address) -> crate::Result<String> {
            self.check_up()?;
            if is(token, USDT) {
                Ok("USDT".to_string())
            } else {
                Err(ErrorKind::ContractError("execution reverted".to_string()).into())
            }
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeMarket {
        pub ticker_24h_down: bool,
    }

    fn listed_price(symbol: &str) -> Option<f64> {
        match symbol {
            "ETHUSDT" => Some(ETH_USDT),
            "ETHBTC" => Some(ETH_BTC),
            "BTCUSDT" => Some(BTC_USDT),
            _ => None,
        }
    }

    fn historical_close(symbol: &str) -> Option<f64> {
        match symbol {
            "ETHUSDT" => Some(ETH_USDT_HISTORICAL),
            "ETHBTC" => Some(ETH_BTC_HISTORICAL),
            "BTCUSDT" => Some(BTC_USDT_HISTORICAL),
            _ => None,
        }
    }

    #[async_trait::async_trait]
    impl MarketApi for FakeMarket {
        async fn ticker_price(&self, symbol: &str) -> crate::Result<Option<f64>> {
            Ok(listed_price(symbol))
        }

        async fn ticker_24h(&self, symbol: &str) -> crate::Result<Ticker24h> {
            if self.ticker_24h_down {
                return Err(ErrorKind::MarketError("503 Service Unavailable".to_string()).into());
            }
            let price = listed_price(symbol)
                .ok_or_else(|| ErrorKind::NotFound("Invalid symbol.".to_string()))?;
            Ok(Ticker24h {
                high: price * 1.1,
                low: price * 0.9,
                volume: 12345.0,
                number_trades: 1000,
            })
        }

        async fn klines(
            &self,
            symbol: &str,
            _interval: &str,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
            _limit: u16,
        ) -> crate::Result<Vec<Kline>> {
            if start.date_naive() != history_date() {
                return Ok(vec![]);
            }
            Ok(historical_close(symbol)
                .map(|close| Kline {
                    open_time: start,
                    open: close * 0.99,
                    high: close * 1.02,
                    low: close * 0.97,
                    close,
                    volume: 5000.0,
                    close_time: end - chrono::Duration::milliseconds(1),
                    number_trades: 777,
                })
                .into_iter()
                .collect())
        }
    }

    pub(crate) fn fake_chain() -> ChainClient {
        ChainClient::new(Arc::new(FakeChain::default()))
    }

    pub(crate) fn fake_market() -> MarketClient {
        MarketClient::new(Arc::new(FakeMarket::default()))
    }

    /// Lazy pool pointing at a closed port; every acquire fails fast.
    pub(crate) fn unreachable_pool() -> sqlx::Pool<sqlx::Postgres> {
        sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(500))
            .connect_lazy("postgres://app:pw@127.0.0.1:1/appdb")
            .unwrap()
    }

    pub(crate) fn live_pool() -> sqlx::Pool<sqlx::Postgres> {
        dotenv::dotenv().ok();
        let db_url = &std::env::var("DATABASE_URL").expect("failed to get database url");
        sqlx::PgPool::connect_lazy(db_url).expect("failed to build the database pool")
    }

    #[test]
    fn test_validation_message() {
        use validator::Validate;

        let params = types::query_params::HistoricalPriceParams {
            symbol: None,
            date: Some("yesterday".to_string()),
            convert_usd: None,
        };
        let errors = params.validate().unwrap_err();
        insta::assert_snapshot!(
            super::validation_message(&errors),
            @"Invalid date format. Use YYYY-MM-DD; symbol parameter is required"
        );
    }
}
