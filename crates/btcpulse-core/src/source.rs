use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical upstream provider identifiers used in metadata and health maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Coingecko,
    Coincap,
    Coinpaprika,
    AlternativeMe,
    BitcoinData,
}

impl ProviderId {
    pub const ALL: [Self; 5] = [
        Self::Coingecko,
        Self::Coincap,
        Self::Coinpaprika,
        Self::AlternativeMe,
        Self::BitcoinData,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coingecko => "coingecko",
            Self::Coincap => "coincap",
            Self::Coinpaprika => "coinpaprika",
            Self::AlternativeMe => "alternative_me",
            Self::BitcoinData => "bitcoin_data",
        }
    }

    /// Parses a comma-separated provider list, preserving order.
    pub fn parse_list(value: &str) -> Result<Vec<Self>, ValidationError> {
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(Self::from_str)
            .collect()
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "coingecko" => Ok(Self::Coingecko),
            "coincap" => Ok(Self::Coincap),
            "coinpaprika" => Ok(Self::Coinpaprika),
            "alternative_me" | "alternative" => Ok(Self::AlternativeMe),
            "bitcoin_data" => Ok(Self::BitcoinData),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}
