use validator::Validate;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const MAX_TOKENS: usize = 50;

#[derive(Validate, Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AddressParams {
    #[validate(required, custom = "crate::errors::validate_address")]
    pub address: Option<String>,
}

#[derive(Validate, Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenAddressParams {
    #[validate(required, custom = "crate::errors::validate_address")]
    pub token_address: Option<String>,
}

#[derive(Validate, Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenListParams {
    #[validate(required, custom = "crate::errors::validate_address")]
    pub address: Option<String>,
    /// Comma separated contract addresses. Defaults to the well-known tokens.
    #[validate(custom = "crate::errors::validate_token_list")]
    pub tokens: Option<String>,
}

#[derive(Validate, Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PriceParams {
    #[validate(required, custom = "crate::errors::validate_symbol")]
    pub symbol: Option<String>,
    pub convert_usd: Option<String>,
}

#[derive(Validate, Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistoricalPriceParams {
    #[validate(required, custom = "crate::errors::validate_symbol")]
    pub symbol: Option<String>,
    #[validate(required, custom = "crate::errors::validate_date")]
    pub date: Option<String>,
    pub convert_usd: Option<String>,
}

// Extractors run `validate()` before the handler, so required fields are present there
pub(crate) fn required<'a>(value: &'a Option<String>, name: &str) -> crate::Result<&'a str> {
    value.as_deref().ok_or_else(|| {
        crate::errors::ErrorKind::InvalidInput(format!("{} parameter is required", name)).into()
    })
}

/// Strict `YYYY-MM-DD`: four digit year, zero padded month and day.
pub(crate) fn parse_date(date: &str) -> Option<chrono::NaiveDate> {
    let shape_ok = date.len() == 10
        && date.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return None;
    }
    chrono::NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

pub(crate) fn is_enabled(flag: &Option<String>) -> bool {
    flag.as_deref() == Some("true")
}

pub(crate) fn split_token_list(tokens: &str) -> Vec<String> {
    tokens
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
