use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::U256;
use futures::StreamExt;

use crate::types::{self, numeric};

mod rpc;

pub use rpc::RpcChainApi;

/// Well-known mainnet ERC20 contracts used when the caller gives no token list.
pub const COMMON_TOKENS: [(&str, &str); 4] = [
    ("USDT", "0xdAC17F958D2ee523a2206206994597C13D831ec7"),
    ("USDC", "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
    ("DAI", "0x6B175474E89094C44Da98b954EedeAC495271d0F"),
    ("LINK", "0x514910771AF9Ca656af840dff83E8264EcF986CA"),
];

pub(crate) const DEFAULT_TOKEN_FANOUT: usize = 4;

/// Raw JSON-RPC surface of an Ethereum node.
#[async_trait::async_trait]
pub trait ChainApi: Send + Sync {
    async fn block_number(&self) -> crate::Result<u64>;

    async fn balance(&self, address: types::Address) -> crate::Result<U256>;

    /// ERC20 `balanceOf(owner)`
    async fn erc20_balance_of(
        &self,
        token: types::Address,
        owner: types::Address,
    ) -> crate::Result<U256>;

    async fn erc20_decimals(&self, token: types::Address) -> crate::Result<u8>;

    async fn erc20_symbol(&self, token: types::Address) -> crate::Result<String>;
}

#[derive(Clone, Debug)]
pub struct NativeBalance {
    pub wei: U256,
    pub eth: String,
}

/// Validates user input, talks to the node through [`ChainApi`]
/// and normalizes what comes back.
#[derive(Clone)]
pub struct ChainClient {
    api: Arc<dyn ChainApi>,
    token_fanout: usize,
}

impl ChainClient {
    pub fn new(api: Arc<dyn ChainApi>) -> Self {
        Self {
            api,
            token_fanout: DEFAULT_TOKEN_FANOUT,
        }
    }

    pub fn with_token_fanout(mut self, token_fanout: usize) -> Self {
        self.token_fanout = token_fanout.max(1);
        self
    }

    pub async fn check_connection(&self) -> crate::Result<()> {
        self.get_block_number().await.map(|_| ())
    }

    pub async fn get_block_number(&self) -> crate::Result<u64> {
        let block_number = self.api.block_number().await?;
        tracing::info!(
            target: crate::LOGGER_MSG,
            "Fetched latest block number {}",
            block_number
        );
        Ok(block_number)
    }

    pub async fn get_balance(&self, address: &str) -> crate::Result<U256> {
        let account = types::Address::from_str(address)?;
        self.api.balance(account).await
    }

    pub async fn get_balance_in_eth(&self, address: &str) -> crate::Result<NativeBalance> {
        let wei = self.get_balance(address).await?;
        Ok(NativeBalance {
            eth: numeric::wei_to_eth(&wei)?,
            wei,
        })
    }

    pub async fn create_balance_record(
        &self,
        address: &str,
    ) -> crate::Result<types::NewBalanceRecord> {
        let account = types::Address::from_str(address)?;
        let balance = self.get_balance_in_eth(address).await?;
        Ok(types::NewBalanceRecord {
            address: account.to_string(),
            token_address: None,
            balance: balance.wei.to_string(),
            balance_eth: balance.eth,
            fetched_at: chrono::Utc::now(),
        })
    }

    /// Symbol and decimals are read independently; each one that fails keeps its default.
    pub async fn get_token_info(&self, token_address: &str) -> crate::Result<types::TokenInfo> {
        let token = types::Address::from_str(token_address)?;
        let mut info = types::TokenInfo::unknown(token.to_string());

        match self.api.erc20_symbol(token).await {
            Ok(symbol) if !symbol.is_empty() => info.symbol = symbol,
            Ok(_) => {}
            Err(err) => tracing::debug!(
                target: crate::LOGGER_MSG,
                "symbol() failed for {}, using {}: {}",
                token,
                info.symbol,
                err
            ),
        }
        match self.api.erc20_decimals(token).await {
            Ok(decimals) => info.decimals = decimals,
            Err(err) => tracing::debug!(
                target: crate::LOGGER_MSG,
                "decimals() failed for {}, using {}: {}",
                token,
                info.decimals,
                err
            ),
        }
        Ok(info)
    }

    pub async fn get_token_balance(
        &self,
        token_address: &str,
        owner_address: &str,
    ) -> crate::Result<types::TokenBalance> {
        let token = types::Address::from_str(token_address)?;
        let owner = types::Address::from_str(owner_address)?;

        let raw = self.api.erc20_balance_of(token, owner).await?;
        let info = self.get_token_info(token_address).await?;

        Ok(types::TokenBalance {
            owner: owner.to_string(),
            balance: raw.to_string(),
            formatted_balance: numeric::normalize_balance(&raw, info.decimals)?,
            token: info,
        })
    }

    /// Looks up every token with at most `token_fanout` calls in flight.
    /// Tokens that fail are logged and left out; the order of the rest is kept.
    pub async fn get_multiple_token_balances(
        &self,
        address: &str,
        token_addresses: &[String],
    ) -> crate::Result<Vec<types::TokenBalance>> {
        types::Address::from_str(address)?;

        let lookups: Vec<_> = futures::stream::iter(token_addresses)
            .map(|token_address| async move {
                (
                    token_address,
                    self.get_token_balance(token_address, address).await,
                )
            })
            .buffered(self.token_fanout)
            .collect()
            .await;

        let mut balances = Vec::with_capacity(lookups.len());
        for (token_address, lookup) in lookups {
            match lookup {
                Ok(balance) => balances.push(balance),
                Err(err) => tracing::warn!(
                    target: crate::LOGGER_MSG,
                    "Skipping token {} for {}: {}",
                    token_address,
                    address,
                    err
                ),
            }
        }
        tracing::info!(
            target: crate::LOGGER_MSG,
            "Fetched {} of {} token balances for {}",
            balances.len(),
            token_addresses.len(),
            address
        );
        Ok(balances)
    }

    pub async fn get_common_token_balances(
        &self,
        address: &str,
    ) -> crate::Result<Vec<types::TokenBalance>> {
        self.get_multiple_token_balances(address, &common_token_addresses())
            .await
    }
}

pub(crate) fn common_token_addresses() -> Vec<String> {
    COMMON_TOKENS
        .iter()
        .map(|(_, address)| address.to_string())
        .collect()
}
