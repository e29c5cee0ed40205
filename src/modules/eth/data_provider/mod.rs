mod balance;
mod models;

pub(crate) use balance::{get_latest_token_balances, get_token_balances, store_balance};
