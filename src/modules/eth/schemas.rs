use chrono::{DateTime, Utc};

// *** Responses ***

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BalanceResponse {
    /// Balance in wei, as a decimal integer string
    pub wei: String,
    /// Balance in ETH with 18 fractional digits
    pub eth: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoredBalanceResponse {
    pub id: i32,
    pub address: String,
    pub wei: String,
    pub eth: String,
    pub timestamp: DateTime<Utc>,
}

impl From<crate::types::BalanceRecord> for StoredBalanceResponse {
    fn from(record: crate::types::BalanceRecord) -> Self {
        Self {
            id: record.id,
            address: record.address,
            wei: record.balance,
            eth: record.balance_eth,
            timestamp: record.fetched_at,
        }
    }
}
