// 3.0 state.rs: the global simulation snapshot and the per-exchange records
// living inside it. every operation takes the snapshot explicitly and returns
// derived values; no hidden state survives between calls.

use crate::balance::Balance;
use crate::types::{ExchangeId, Pair};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// 3.1: virtual AMM inventories used for constant-product pricing. reset
// periodically from the reserve; between resets only the exchange routine
// moves them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MentoBuckets {
    pub stable: Decimal,
    pub reserve_asset: Decimal,
}

impl MentoBuckets {
    pub fn new(stable: Decimal, reserve_asset: Decimal) -> Self {
        Self {
            stable,
            reserve_asset,
        }
    }
}

// 3.2: pooled two-asset position that backstops trades, plus the outstanding
// supply of claim tokens. an empty pool has no claims: minted_cp_tokens == 0
// iff both buckets are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CollateralProviderState {
    pub stable_bucket: Decimal,
    pub reserve_asset_bucket: Decimal,
    pub minted_cp_tokens: Decimal,
}

impl CollateralProviderState {
    pub fn new(
        stable_bucket: Decimal,
        reserve_asset_bucket: Decimal,
        minted_cp_tokens: Decimal,
    ) -> Self {
        Self {
            stable_bucket,
            reserve_asset_bucket,
            minted_cp_tokens,
        }
    }
}

// 3.3: oracle rate lookup keyed by asset pair. a missing rate is a hard,
// descriptive error at the point of use, never a silent default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OracleRateMap {
    rates: HashMap<Pair, Decimal>,
}

impl OracleRateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, pair: Pair, rate: Decimal) {
        self.rates.insert(pair, rate);
    }

    pub fn with(mut self, pair: Pair, rate: Decimal) -> Self {
        self.set(pair, rate);
        self
    }

    pub fn get(&self, pair: Pair) -> Option<Decimal> {
        self.rates.get(&pair).copied()
    }
}

// 3.4: the full state snapshot threaded through every call. the outer engine
// owns the authoritative copy and merges diffs between steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub timestep: u64,
    pub mento_buckets: HashMap<ExchangeId, MentoBuckets>,
    pub collateral_provider: HashMap<ExchangeId, CollateralProviderState>,
    pub oracle_rate: OracleRateMap,
    pub reserve_balance: Balance,
    pub floating_supply: Balance,
}

impl SimulationState {
    pub fn buckets(&self, exchange: ExchangeId) -> Option<&MentoBuckets> {
        self.mento_buckets.get(&exchange)
    }

    /// Provider sub-state for an exchange. Absent entries read as a zeroed
    /// pool, matching the first-deposit bootstrap path.
    pub fn provider_state(&self, exchange: ExchangeId) -> CollateralProviderState {
        self.collateral_provider
            .get(&exchange)
            .copied()
            .unwrap_or_default()
    }
}
