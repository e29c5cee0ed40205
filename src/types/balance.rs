use chrono::{DateTime, Utc};

pub(crate) const UNKNOWN_SYMBOL: &str = "UNKNOWN";
pub(crate) const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// A balance snapshot as stored in `balance_records`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BalanceRecord {
    pub id: i32,
    pub address: String,
    pub token_address: Option<String>,
    /// Base units as a decimal integer string
    pub balance: String,
    /// `balance` scaled by the asset decimals
    pub balance_eth: String,
    pub fetched_at: DateTime<Utc>,
}

/// A balance snapshot before the storage assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBalanceRecord {
    pub address: String,
    pub token_address: Option<String>,
    pub balance: String,
    pub balance_eth: String,
    pub fetched_at: DateTime<Utc>,
}

impl NewBalanceRecord {
    pub(crate) fn with_id(self, id: i32) -> BalanceRecord {
        BalanceRecord {
            id,
            address: self.address,
            token_address: self.token_address,
            balance: self.balance,
            balance_eth: self.balance_eth,
            fetched_at: self.fetched_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenInfo {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenInfo {
    pub(crate) fn unknown(address: String) -> Self {
        Self {
            address,
            symbol: UNKNOWN_SYMBOL.to_string(),
            decimals: DEFAULT_TOKEN_DECIMALS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenBalance {
    pub token: TokenInfo,
    pub owner: String,
    pub balance: String,
    pub formatted_balance: String,
}

impl TokenBalance {
    pub(crate) fn into_record(self, fetched_at: DateTime<Utc>) -> NewBalanceRecord {
        NewBalanceRecord {
            address: self.owner,
            token_address: Some(self.token.address),
            balance: self.balance,
            balance_eth: self.formatted_balance,
            fetched_at,
        }
    }
}
