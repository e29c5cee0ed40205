use std::fmt;
use std::str::FromStr;

use derive_more::{AsRef, Deref, Display, From, Into};

use crate::errors;

const ADDRESS_HEX_LEN: usize = 40;

/// 20-byte account or contract address.
/// Parsing only accepts the `0x`-prefixed 40-hex-digit form; `Display`
/// renders the EIP-55 checksum form, which is also what gets persisted.
#[derive(Eq, Hash, Clone, Copy, PartialEq, From, Into, AsRef, Deref, Display)]
pub struct Address(pub(crate) alloy::primitives::Address);

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Address {
    type Err = errors::Error;

    fn from_str(address: &str) -> crate::Result<Self> {
        if !is_hex_address(address) {
            return Err(errors::ErrorKind::InvalidAddress(address.to_string()).into());
        }
        let bytes = hex::decode(&address[2..])
            .map_err(|_| errors::ErrorKind::InvalidAddress(address.to_string()))?;
        Ok(Self(alloy::primitives::Address::from_slice(&bytes)))
    }
}

pub(crate) fn is_hex_address(address: &str) -> bool {
    address.len() == ADDRESS_HEX_LEN + 2
        && address.starts_with("0x")
        && address[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        for address in [
            "0x742d35Cc6634C0532925a3b844Bc454e4438f44e",
            "0x742d35cc6634c0532925a3b844bc454e4438f44e",
            "0x0000000000000000000000000000000000000000",
            "0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF",
        ] {
            assert!(is_hex_address(address), "{}", address);
            assert!(Address::from_str(address).is_ok(), "{}", address);
        }
    }

    #[test]
    fn test_invalid_addresses() {
        for address in [
            "",
            "0x",
            "742d35Cc6634C0532925a3b844Bc454e4438f44e",
            "0X742d35Cc6634C0532925a3b844Bc454e4438f44e",
            "0x742d35Cc6634C0532925a3b844Bc454e4438f44",
            "0x742d35Cc6634C0532925a3b844Bc454e4438f44e0",
            "0x742d35Cc6634C0532925a3b844Bc454e4438f4zz",
            "0x742d35Cc6634C0532925a3b844Bc454e4438f4é",
            "vitalik.eth",
        ] {
            assert!(!is_hex_address(address), "{}", address);
            let error = Address::from_str(address).unwrap_err();
            assert_eq!(error.code, 400);
        }
    }

    #[test]
    fn test_display_is_checksummed() {
        let address = Address::from_str("0x742d35cc6634c0532925a3b844bc454e4438f44e").unwrap();
        insta::assert_snapshot!(address.to_string(), @"0x742d35Cc6634C0532925a3b844Bc454e4438f44e");
    }
}
