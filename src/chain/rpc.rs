use std::fmt::Display;
use std::future::{Future, IntoFuture};
use std::time::Duration;

use alloy::primitives::U256;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;

use crate::{errors, types};

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
    }
}

/// [`super::ChainApi`] backed by an HTTP JSON-RPC endpoint.
#[derive(Clone)]
pub struct RpcChainApi {
    provider: DynProvider,
    timeout: Duration,
}

impl RpcChainApi {
    pub fn connect(rpc_url: &str, timeout: Duration) -> crate::Result<Self> {
        let url = rpc_url.parse::<reqwest::Url>().map_err(|e| {
            errors::ErrorKind::InvalidInput(format!("Could not parse RPC url: {}", e))
        })?;
        let provider = ProviderBuilder::new().connect_http(url).erased();
        tracing::info!(
            target: crate::LOGGER_MSG,
            "Ethereum provider configured for {}",
            redact_url(rpc_url)
        );
        Ok(Self { provider, timeout })
    }

    fn erc20(&self, token: types::Address) -> IERC20::IERC20Instance<DynProvider> {
        IERC20::new(token.0, self.provider.clone())
    }

    async fn call<T, E, F>(&self, method: &str, target: &str, request: F) -> Result<T, String>
    where
        E: Display,
        F: Future<Output = Result<T, E>>,
    {
        tracing::info!(target: crate::LOGGER_MSG, "RPC request: {} for {}", method, target);
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => {
                tracing::warn!(
                    target: crate::LOGGER_MSG,
                    "RPC {} for {} failed: {}",
                    method,
                    target,
                    err
                );
                Err(err.to_string())
            }
            Err(_) => {
                tracing::warn!(
                    target: crate::LOGGER_MSG,
                    "RPC {} for {} timed out after {:?}",
                    method,
                    target,
                    self.timeout
                );
                Err(format!("{} timed out after {:?}", method, self.timeout))
            }
        }
    }
}

#[async_trait::async_trait]
impl super::ChainApi for RpcChainApi {
    async fn block_number(&self) -> crate::Result<u64> {
        let request = self.provider.get_block_number().into_future();
        self.call("eth_blockNumber", "latest", request)
            .await
            .map_err(|e| errors::ErrorKind::RPCError(e).into())
    }

    async fn balance(&self, address: types::Address) -> crate::Result<U256> {
        let request = self.provider.get_balance(address.0).into_future();
        self.call("eth_getBalance", &address.to_string(), request)
            .await
            .map_err(|e| errors::ErrorKind::RPCError(e).into())
    }

    async fn erc20_balance_of(
        &self,
        token: types::Address,
        owner: types::Address,
    ) -> crate::Result<U256> {
        let contract = self.erc20(token);
        let builder = contract.balanceOf(owner.0);
        let result = self
            .call("balanceOf", &token.to_string(), builder.call().into_future())
            .await;
        result.map_err(|e| {
            errors::ErrorKind::ContractError(format!("balanceOf({}) on {}: {}", owner, token, e))
                .into()
        })
    }

    async fn erc20_decimals(&self, token: types::Address) -> crate::Result<u8> {
        let contract = self.erc20(token);
        let builder = contract.decimals();
        let result = self
            .call("decimals", &token.to_string(), builder.call().into_future())
            .await;
        result.map_err(|e| errors::ErrorKind::ContractError(e).into())
    }

    async fn erc20_symbol(&self, token: types::Address) -> crate::Result<String> {
        let contract = self.erc20(token);
        let builder = contract.symbol();
        let result = self
            .call("symbol", &token.to_string(), builder.call().into_future())
            .await;
        result.map_err(|e| errors::ErrorKind::ContractError(e).into())
    }
}

// Infura style URLs carry the API key in the last path segment
fn redact_url(rpc_url: &str) -> String {
    match rpc_url.rsplit_once('/') {
        Some((base, key)) if key.len() >= 16 && key.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!("{}/***", base)
        }
        _ => rpc_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("https://mainnet.infura.io/v3/0123456789abcdef0123456789abcdef"),
            "https://mainnet.infura.io/v3/***"
        );
        assert_eq!(redact_url("http://localhost:8545"), "http://localhost:8545");
        assert_eq!(
            redact_url("https://eth.llamarpc.com"),
            "https://eth.llamarpc.com"
        );
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let error = RpcChainApi::connect("not a url", Duration::from_secs(1))
            .err()
            .unwrap();
        assert_eq!(error.code, 400);
    }

    #[tokio::test]
    async fn test_unreachable_node_is_rpc_error() {
        use crate::chain::ChainApi;

        let api = RpcChainApi::connect("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let error = api.block_number().await.unwrap_err();
        assert_eq!(error.code, 500);
        assert!(error.message.starts_with("RPC error"));
    }
}
