use std::time::Duration;

use crate::ProviderId;

/// Upstream request budget published by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub quota_window: Duration,
    pub quota_limit: u32,
}

impl ProviderPolicy {
    pub fn coingecko_default() -> Self {
        Self {
            provider_id: ProviderId::Coingecko,
            quota_window: Duration::from_secs(60),
            quota_limit: 30,
        }
    }

    pub fn coincap_default() -> Self {
        Self {
            provider_id: ProviderId::Coincap,
            quota_window: Duration::from_secs(60),
            quota_limit: 200,
        }
    }

    pub fn coinpaprika_default() -> Self {
        Self {
            provider_id: ProviderId::Coinpaprika,
            quota_window: Duration::from_secs(60),
            quota_limit: 60,
        }
    }

    pub fn alternative_me_default() -> Self {
        Self {
            provider_id: ProviderId::AlternativeMe,
            quota_window: Duration::from_secs(60),
            quota_limit: 60,
        }
    }

    pub fn bitcoin_data_default() -> Self {
        Self {
            provider_id: ProviderId::BitcoinData,
            quota_window: Duration::from_secs(3_600),
            quota_limit: 10,
        }
    }

    /// Requests the quota allows per hour.
    pub fn hourly_quota(&self) -> u64 {
        let window = self.quota_window.as_secs().max(1);
        u64::from(self.quota_limit) * 3_600 / window
    }

    pub fn default_for(provider_id: ProviderId) -> Self {
        match provider_id {
            ProviderId::Coingecko => Self::coingecko_default(),
            ProviderId::Coincap => Self::coincap_default(),
            ProviderId::Coinpaprika => Self::coinpaprika_default(),
            ProviderId::AlternativeMe => Self::alternative_me_default(),
            ProviderId::BitcoinData => Self::bitcoin_data_default(),
        }
    }
}
