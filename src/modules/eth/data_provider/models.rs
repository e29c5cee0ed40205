use chrono::{NaiveDateTime, TimeZone, Utc};

use crate::types;

#[derive(sqlx::FromRow)]
pub(crate) struct BalanceRecordRow {
    pub id: i32,
    pub address: String,
    pub token_address: Option<String>,
    pub balance: String,
    pub balance_eth: String,
    // TIMESTAMP without time zone, always written as UTC
    pub fetched_at: NaiveDateTime,
}

impl From<BalanceRecordRow> for types::BalanceRecord {
    fn from(row: BalanceRecordRow) -> Self {
        Self {
            id: row.id,
            address: row.address,
            token_address: row.token_address,
            balance: row.balance,
            balance_eth: row.balance_eth,
            fetched_at: Utc.from_utc_datetime(&row.fetched_at),
        }
    }
}
