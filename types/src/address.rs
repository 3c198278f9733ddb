use serde::{Deserialize, Serialize};
use thiserror::Error;

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Base58 form of a 32-byte ledger public key.
const MIN_LEN: usize = 32;
const MAX_LEN: usize = 44;

/// The ledger's default (all-zero) key, used as the "no last buyer yet"
/// marker in round snapshots.
const SYSTEM_ADDRESS: &str = "11111111111111111111111111111111";

/// Error type for address parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address must be {MIN_LEN}..={MAX_LEN} base58 characters, got {0}")]
    Length(usize),
    #[error("invalid base58 character: {0:?}")]
    Character(char),
}

/// A ledger account address in base58 form, validated on construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and validate an address string.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        if raw.len() < MIN_LEN || raw.len() > MAX_LEN {
            return Err(AddressError::Length(raw.len()));
        }
        if let Some(bad) = raw.chars().find(|c| !BASE58_ALPHABET.contains(*c)) {
            return Err(AddressError::Character(bad));
        }
        Ok(Self(raw.to_string()))
    }

    /// The system (default) address the ledger uses before any buyer exists.
    pub fn system() -> Self {
        Self(SYSTEM_ADDRESS.to_string())
    }

    pub fn is_system(&self) -> bool {
        self.0 == SYSTEM_ADDRESS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}
