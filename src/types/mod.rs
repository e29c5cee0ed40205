pub mod address;
pub(crate) mod balance;
pub(crate) mod numeric;
pub mod query_params;
pub(crate) mod response;

pub use address::Address;
pub use balance::{BalanceRecord, NewBalanceRecord, TokenBalance, TokenInfo};
pub use response::ApiResponse;
