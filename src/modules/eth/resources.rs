use std::str::FromStr;

use actix_web::web::{self, Json};
use actix_web_validator::Query;

use super::{data_provider, schemas};
use crate::types::query_params::{self, AddressParams, TokenAddressParams, TokenListParams};
use crate::{chain, db_helpers, types};

/// Get the latest block number
pub async fn get_block_number(
    chain: web::Data<chain::ChainClient>,
) -> crate::Result<Json<types::ApiResponse<u64>>> {
    Ok(Json(types::ApiResponse::ok(
        "Current Ethereum block number",
        chain.get_block_number().await?,
    )))
}

/// Get the ETH balance of an account
///
/// Returns the balance in wei and in ETH (18 fractional digits) at the latest block.
pub async fn get_balance(
    chain: web::Data<chain::ChainClient>,
    params: Query<AddressParams>,
) -> crate::Result<Json<types::ApiResponse<schemas::BalanceResponse>>> {
    let address = query_params::required(&params.address, "address")?;
    let balance = chain.get_balance_in_eth(address).await?;

    Ok(Json(types::ApiResponse::ok(
        "Account balance retrieved",
        schemas::BalanceResponse {
            wei: balance.wei.to_string(),
            eth: balance.eth,
        },
    )))
}

/// Get the ETH balance of an account and keep a snapshot of it
///
/// The address is stored in its checksummed form.
pub async fn store_balance(
    chain: web::Data<chain::ChainClient>,
    pool: web::Data<sqlx::Pool<sqlx::Postgres>>,
    params: Query<AddressParams>,
) -> crate::Result<Json<types::ApiResponse<schemas::StoredBalanceResponse>>> {
    let address = query_params::required(&params.address, "address")?;
    let record = chain.create_balance_record(address).await?;

    let mut conn = db_helpers::acquire(&pool).await?;
    let id = data_provider::store_balance(&mut conn, &record).await?;

    Ok(Json(types::ApiResponse::ok(
        "Account balance retrieved and stored",
        record.with_id(id).into(),
    )))
}

/// Get stored balance snapshots
///
/// Returns every stored snapshot whose owner address equals `token_address`, oldest first.
/// An empty list is not an error.
pub async fn get_token_balances(
    pool: web::Data<sqlx::Pool<sqlx::Postgres>>,
    params: Query<TokenAddressParams>,
) -> crate::Result<Json<types::ApiResponse<Vec<types::BalanceRecord>>>> {
    let address =
        types::Address::from_str(query_params::required(&params.token_address, "token_address")?)?;

    let mut conn = db_helpers::acquire(&pool).await?;
    let records = data_provider::get_token_balances(&mut conn, &address).await?;

    let message = if records.is_empty() {
        "No token balance records found for this token"
    } else {
        "Token balance records retrieved"
    };
    Ok(Json(types::ApiResponse::ok(message, records)))
}

/// Get live ERC20 balances of an account
///
/// `tokens` is a comma separated list of contract addresses, the well-known tokens when omitted.
/// Tokens that cannot be read are left out of the list.
pub async fn get_live_token_balances(
    chain: web::Data<chain::ChainClient>,
    params: Query<TokenListParams>,
) -> crate::Result<Json<types::ApiResponse<Vec<types::TokenBalance>>>> {
    let balances = fetch_token_balances(&chain, &params).await?;
    Ok(Json(types::ApiResponse::ok("Token balances retrieved", balances)))
}

/// Get live ERC20 balances of an account and keep a snapshot of each
pub async fn store_token_balances(
    chain: web::Data<chain::ChainClient>,
    pool: web::Data<sqlx::Pool<sqlx::Postgres>>,
    params: Query<TokenListParams>,
) -> crate::Result<Json<types::ApiResponse<Vec<types::BalanceRecord>>>> {
    let balances = fetch_token_balances(&chain, &params).await?;
    let fetched_at = chrono::Utc::now();

    let mut conn = db_helpers::acquire(&pool).await?;
    let mut tx = sqlx::Connection::begin(&mut *conn).await?;
    let mut records = Vec::with_capacity(balances.len());
    for balance in balances {
        let record = balance.into_record(fetched_at);
        let id = data_provider::store_balance(&mut tx, &record).await?;
        records.push(record.with_id(id));
    }
    tx.commit().await?;

    Ok(Json(types::ApiResponse::ok(
        "Token balances retrieved and stored",
        records,
    )))
}

/// Get the newest stored snapshot per token of an account
pub async fn get_latest_token_balances(
    pool: web::Data<sqlx::Pool<sqlx::Postgres>>,
    params: Query<AddressParams>,
) -> crate::Result<Json<types::ApiResponse<Vec<types::BalanceRecord>>>> {
    let address = types::Address::from_str(query_params::required(&params.address, "address")?)?;

    let mut conn = db_helpers::acquire(&pool).await?;
    let records = data_provider::get_latest_token_balances(&mut conn, &address).await?;

    Ok(Json(types::ApiResponse::ok(
        "Latest token balance records retrieved",
        records,
    )))
}

async fn fetch_token_balances(
    chain: &chain::ChainClient,
    params: &TokenListParams,
) -> crate::Result<Vec<types::TokenBalance>> {
    let address = query_params::required(&params.address, "address")?;
    match params.tokens.as_deref().map(query_params::split_token_list) {
        Some(tokens) if !tokens.is_empty() => {
            chain.get_multiple_token_balances(address, &tokens).await
        }
        _ => chain.get_common_token_balances(address).await,
    }
}
