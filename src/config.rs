// 5.0 config.rs: all settings in one place. per-exchange AMM parameters plus
// the generator-level registry. constructed once at simulation setup from a
// mapping of exchange -> config, read-only thereafter.

use crate::types::{CryptoAsset, ExchangeId, Fiat, Stable, UnknownExchangeTag};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// 5.1: per-exchange configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    // Reserve currency backing the stable
    pub reserve_asset: CryptoAsset,
    pub stable: Stable,
    // Fiat the stable tracks, used to value the reserve bucket
    pub reference_fiat: Fiat,
    // Target share of reserve value held as reserve asset in the AMM bucket
    pub reserve_fraction: Decimal,
    // Fractional trading fee subtracted from the sell amount
    pub spread: Decimal,
    pub bucket_update_frequency_seconds: u64,
    // Order size guard for strategies; the core settlement path does not clamp
    pub max_sell_fraction_of_float: Decimal,
}

impl ExchangeConfig {
    pub fn cusd_celo() -> Self {
        Self {
            reserve_asset: CryptoAsset::Celo,
            stable: Stable::Cusd,
            reference_fiat: Fiat::Usd,
            reserve_fraction: dec!(0.1),
            spread: dec!(0.0025),
            bucket_update_frequency_seconds: 5 * 60,
            max_sell_fraction_of_float: dec!(0.0001),
        }
    }

    pub fn ceur_celo() -> Self {
        Self {
            stable: Stable::Ceur,
            reference_fiat: Fiat::Eur,
            ..Self::cusd_celo()
        }
    }

    pub fn creal_celo() -> Self {
        Self {
            stable: Stable::Creal,
            reference_fiat: Fiat::Brl,
            ..Self::cusd_celo()
        }
    }

    pub fn preset(exchange: ExchangeId) -> Self {
        match exchange {
            ExchangeId::CusdCelo => Self::cusd_celo(),
            ExchangeId::CeurCelo => Self::ceur_celo(),
            ExchangeId::CrealCelo => Self::creal_celo(),
        }
    }

    // Check the parameters for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reserve_fraction <= Decimal::ZERO || self.reserve_fraction > Decimal::ONE {
            return Err(ConfigError::InvalidExchange {
                reason: "reserve fraction must be in (0, 1]".to_string(),
            });
        }

        if self.spread < Decimal::ZERO || self.spread >= Decimal::ONE {
            return Err(ConfigError::InvalidExchange {
                reason: "spread must be in [0, 1)".to_string(),
            });
        }

        if self.bucket_update_frequency_seconds == 0 {
            return Err(ConfigError::InvalidExchange {
                reason: "bucket update frequency must be nonzero".to_string(),
            });
        }

        if self.max_sell_fraction_of_float <= Decimal::ZERO
            || self.max_sell_fraction_of_float > Decimal::ONE
        {
            return Err(ConfigError::InvalidExchange {
                reason: "max sell fraction must be in (0, 1]".to_string(),
            });
        }

        Ok(())
    }
}

// 5.2: generator-level configuration. exchange registry, active set, and the
// chain blocktime driving the bucket reset schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentoConfig {
    pub exchanges: HashMap<ExchangeId, ExchangeConfig>,
    pub active: HashSet<ExchangeId>,
    pub blocktime_seconds: u64,
}

impl Default for MentoConfig {
    fn default() -> Self {
        let exchanges = ExchangeId::all()
            .into_iter()
            .map(|exchange| (exchange, ExchangeConfig::preset(exchange)))
            .collect();

        Self {
            exchanges,
            active: ExchangeId::all().into_iter().collect(),
            blocktime_seconds: 5,
        }
    }
}

impl MentoConfig {
    // One configured and active exchange, for focused setups and tests
    pub fn single(exchange: ExchangeId, config: ExchangeConfig) -> Self {
        Self {
            exchanges: HashMap::from([(exchange, config)]),
            active: HashSet::from([exchange]),
            blocktime_seconds: 5,
        }
    }

    /// Resolve an active set from string tags at load time. Unknown tags fail
    /// fast instead of being carried as dead configuration.
    pub fn with_active_tags(mut self, tags: &[&str]) -> Result<Self, UnknownExchangeTag> {
        let mut active = HashSet::new();
        for tag in tags {
            active.insert(tag.parse::<ExchangeId>()?);
        }
        self.active = active;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blocktime_seconds == 0 {
            return Err(ConfigError::InvalidChain {
                reason: "blocktime must be nonzero".to_string(),
            });
        }

        for exchange in &self.active {
            if !self.exchanges.contains_key(exchange) {
                return Err(ConfigError::InvalidChain {
                    reason: format!("active exchange {exchange} has no configuration"),
                });
            }
        }

        for config in self.exchanges.values() {
            config.validate()?;
        }

        Ok(())
    }
}

// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidExchange { reason: String },
    InvalidChain { reason: String },
}
