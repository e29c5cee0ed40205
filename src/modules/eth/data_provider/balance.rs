use crate::modules::eth::data_provider::models;
use crate::{db_helpers, errors, types};

pub(crate) async fn store_balance(
    conn: &mut sqlx::PgConnection,
    record: &types::NewBalanceRecord,
) -> crate::Result<i32> {
    tracing::info!(
        target: crate::LOGGER_MSG,
        "DB insert: balance of {} (token {:?}) fetched at {}",
        record.address,
        record.token_address,
        record.fetched_at
    );
    sqlx::query_scalar::<_, i32>(
        r"INSERT INTO balance_records (address, token_address, balance, balance_eth, fetched_at)
          VALUES ($1, $2, $3, $4, $5)
          RETURNING id",
    )
    .bind(record.address.as_str())
    .bind(record.token_address.as_deref())
    .bind(record.balance.as_str())
    .bind(record.balance_eth.as_str())
    .bind(record.fetched_at.naive_utc())
    .fetch_one(conn)
    .await
    .map_err(|e| {
        tracing::warn!(
            target: crate::LOGGER_MSG,
            "Failed to store balance for {}: {}",
            record.address,
            e
        );
        errors::ErrorKind::DBError(format!("Failed to store balance in database: {}", e)).into()
    })
}

/// Every stored record whose owner column equals `address`, oldest first.
pub(crate) async fn get_token_balances(
    conn: &mut sqlx::PgConnection,
    address: &types::Address,
) -> crate::Result<Vec<types::BalanceRecord>> {
    let rows = db_helpers::select::<models::BalanceRecordRow>(
        conn,
        r"SELECT id, address, token_address, balance, balance_eth, fetched_at
          FROM balance_records
          WHERE address = $1
          ORDER BY id",
        &[address.to_string()],
    )
    .await?;
    Ok(rows.into_iter().map(types::BalanceRecord::from).collect())
}

/// The newest record per token held by `address`; the native balance is the `NULL` token.
pub(crate) async fn get_latest_token_balances(
    conn: &mut sqlx::PgConnection,
    address: &types::Address,
) -> crate::Result<Vec<types::BalanceRecord>> {
    let rows = db_helpers::select::<models::BalanceRecordRow>(
        conn,
        r"SELECT DISTINCT ON (token_address)
              id, address, token_address, balance, balance_eth, fetched_at
          FROM balance_records
          WHERE address = $1
          ORDER BY token_address NULLS FIRST, fetched_at DESC, id DESC",
        &[address.to_string()],
    )
    .await?;
    Ok(rows.into_iter().map(types::BalanceRecord::from).collect())
}
