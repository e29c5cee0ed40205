use std::borrow::Cow;

use crate::types;

#[derive(Debug)]
pub enum ErrorKind {
    InvalidAddress(String),
    InvalidInput(String),
    UnrecognizedSymbol(String),
    NotFound(String),
    ContractError(String),
    RPCError(String),
    MarketError(String),
    DBError(String),
    InternalError(String),
}

/// Every fallible operation in the service ends up here.
/// `code` doubles as the HTTP status of the response.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Error {
    pub code: u16,

    pub message: String,

    /// An error is retriable if the same request may succeed if submitted
    /// again.
    pub retriable: bool,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let retriable = if self.retriable { " (retriable)" } else { "" };
        write!(f, "Error #{}{}: {}", self.code, retriable, self.message)
    }
}

impl Error {
    pub fn from_error_kind(err: ErrorKind) -> Self {
        match err {
            ErrorKind::InvalidAddress(address) => Self {
                code: 400,
                message: format!("Invalid Ethereum address format: {}", address),
                retriable: false,
            },
            ErrorKind::InvalidInput(message) => Self {
                code: 400,
                message: format!("Invalid Input: {}", message),
                retriable: false,
            },
            ErrorKind::UnrecognizedSymbol(symbol) => Self {
                code: 400,
                message: format!("Unrecognized symbol for USD conversion: {}", symbol),
                retriable: false,
            },
            ErrorKind::NotFound(message) => Self {
                code: 404,
                message: format!("Not Found: {}", message),
                retriable: false,
            },
            ErrorKind::ContractError(message) => Self {
                code: 500,
                message: format!("Token contract error: {}", message),
                retriable: true,
            },
            ErrorKind::RPCError(message) => Self {
                code: 500,
                message: format!("RPC error: {}", message),
                retriable: true,
            },
            ErrorKind::MarketError(message) => Self {
                code: 500,
                message: format!("Market API error: {}", message),
                retriable: true,
            },
            ErrorKind::DBError(message) => Self {
                code: 500,
                message: format!("DB Error: {}", message),
                retriable: true,
            },
            ErrorKind::InternalError(message) => Self {
                code: 500,
                message: format!("Internal Error: {}", message),
                retriable: true,
            },
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.code)
    }
}

impl<T> From<T> for Error
where
    T: Into<ErrorKind>,
{
    fn from(err: T) -> Self {
        Self::from_error_kind(err.into())
    }
}

impl actix_web::ResponseError for Error {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::from_u16(self.code)
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        if !self.is_client_error() {
            tracing::error!(target: crate::LOGGER_MSG, "Request failed: {}", self);
        }
        let status = self.status_code();
        let reason = status.canonical_reason().unwrap_or("Error");
        actix_web::HttpResponse::build(status).json(types::ApiResponse::<()>::failure(
            reason,
            self.message.clone(),
        ))
    }
}

impl From<sqlx::Error> for ErrorKind {
    fn from(error: sqlx::Error) -> Self {
        Self::DBError(error.to_string())
    }
}

impl From<reqwest::Error> for ErrorKind {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::MarketError(format!("request timed out: {}", error))
        } else if error.is_decode() {
            Self::MarketError(format!("unexpected response body: {}", error))
        } else {
            Self::MarketError(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ErrorKind {
    fn from(error: serde_json::Error) -> Self {
        Self::InternalError(format!("Serialization failure: {:#?}", error))
    }
}

fn validation_error(code: &'static str, message: &'static str) -> validator::ValidationError {
    let mut error = validator::ValidationError::new(code);
    error.message = Some(Cow::from(message));
    error
}

pub(crate) fn validate_address(address: &str) -> Result<(), validator::ValidationError> {
    if types::address::is_hex_address(address) {
        Ok(())
    } else {
        Err(validation_error(
            "invalid_address",
            "Invalid Ethereum address format",
        ))
    }
}

pub(crate) fn validate_symbol(symbol: &str) -> Result<(), validator::ValidationError> {
    if !symbol.is_empty() && symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(validation_error(
            "invalid_symbol",
            "Symbol must be a non-empty alphanumeric trading pair (e.g. BTCUSDT)",
        ))
    }
}

pub(crate) fn validate_date(date: &str) -> Result<(), validator::ValidationError> {
    match types::query_params::parse_date(date) {
        Some(_) => Ok(()),
        None => Err(validation_error(
            "invalid_date",
            "Invalid date format. Use YYYY-MM-DD",
        )),
    }
}

pub(crate) fn validate_token_list(tokens: &str) -> Result<(), validator::ValidationError> {
    if types::query_params::split_token_list(tokens).len() > types::query_params::MAX_TOKENS {
        Err(validation_error(
            "too_many_tokens",
            "Too many token addresses, at most 50 are allowed",
        ))
    } else {
        Ok(())
    }
}
