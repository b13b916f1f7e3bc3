// 7.0 exchange.rs: the Mento exchange generator. a constant-product AMM
// between a virtual stable bucket and a reserve-asset bucket, one instance of
// bucket state per configured exchange. owns the bucket reset schedule,
// prices trades, and splits settled flow between the AMM bucket and the
// collateral provider backstop so the same flow is never counted twice.

use crate::balance::Balance;
use crate::config::{ExchangeConfig, MentoConfig};
use crate::mutation::{StateMutation, StateWrite};
use crate::state::{CollateralProviderState, MentoBuckets, SimulationState};
use crate::types::{ExchangeId, Pair};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExchangeError {
    #[error("exchange {0} is not configured")]
    UnknownExchange(ExchangeId),

    #[error("no buckets in state for exchange {0}")]
    MissingBuckets(ExchangeId),

    #[error("no oracle rate for pair {0}")]
    MissingOracleRate(Pair),

    #[error("numeric failure in bucket math: {0}")]
    Numeric(&'static str),
}

// 7.1: settlement outcome. deltas for the trading account and the protocol
// reserve, plus the pending writes for bucket and provider sub-state.
#[derive(Debug, Clone)]
pub struct TradeSettlement {
    pub sell_amount: Decimal,
    pub buy_amount: Decimal,
    pub sell_reserve_asset: bool,
    /// Asset flow against the trading account, full trade size.
    pub account_delta: Balance,
    /// Asset flow against the protocol reserve, net of the provider-absorbed
    /// portion.
    pub reserve_delta: Balance,
    pub mutation: StateMutation,
}

#[derive(Debug, Clone)]
pub struct MentoExchangeGenerator {
    configs: HashMap<ExchangeId, ExchangeConfig>,
    active: HashSet<ExchangeId>,
    blocktime_seconds: u64,
}

impl MentoExchangeGenerator {
    pub fn new(config: MentoConfig) -> Self {
        Self {
            configs: config.exchanges,
            active: config.active,
            blocktime_seconds: config.blocktime_seconds,
        }
    }

    pub fn config(&self, exchange: ExchangeId) -> Result<&ExchangeConfig, ExchangeError> {
        self.configs
            .get(&exchange)
            .ok_or(ExchangeError::UnknownExchange(exchange))
    }

    pub fn active_exchanges(&self) -> impl Iterator<Item = ExchangeId> + '_ {
        self.active.iter().copied()
    }

    // 7.2: bucket reset schedule. due when a whole number of update periods
    // fits the elapsed chain time, and unconditionally at the bootstrap step.
    pub fn buckets_should_be_reset(
        &self,
        exchange: ExchangeId,
        state: &SimulationState,
    ) -> Result<bool, ExchangeError> {
        let config = self.config(exchange)?;
        let elapsed_seconds = self.blocktime_seconds * state.timestep;
        Ok(elapsed_seconds % config.bucket_update_frequency_seconds == 0 || state.timestep == 1)
    }

    /// Recalculate bucket sizes from the protocol reserve and the oracle rate
    /// against the reference fiat.
    pub fn recalculate_buckets(
        &self,
        exchange: ExchangeId,
        state: &SimulationState,
    ) -> Result<MentoBuckets, ExchangeError> {
        let config = self.config(exchange)?;
        let reserve_asset_bucket =
            config.reserve_fraction * state.reserve_balance.get(config.reserve_asset);

        let rate_pair = Pair::new(config.reserve_asset, config.reference_fiat);
        let rate = state
            .oracle_rate
            .get(rate_pair)
            .ok_or(ExchangeError::MissingOracleRate(rate_pair))?;

        Ok(MentoBuckets::new(
            rate * reserve_asset_bucket,
            reserve_asset_bucket,
        ))
    }

    /// Next bucket sizes for one exchange: recalculated when due, otherwise
    /// the prior values pass through unchanged.
    pub fn next_buckets(
        &self,
        exchange: ExchangeId,
        state: &SimulationState,
    ) -> Result<MentoBuckets, ExchangeError> {
        if self.buckets_should_be_reset(exchange, state)? {
            return self.recalculate_buckets(exchange, state);
        }
        state
            .buckets(exchange)
            .copied()
            .ok_or(ExchangeError::MissingBuckets(exchange))
    }

    /// Once-per-step bucket policy over every active exchange, independent of
    /// trade execution.
    pub fn bucket_update(&self, state: &SimulationState) -> Result<StateMutation, ExchangeError> {
        let mut mutation = StateMutation::new();
        for exchange in self.active.iter().copied() {
            let buckets = self.next_buckets(exchange, state)?;
            mutation = mutation.add(StateWrite::MentoBuckets(exchange, buckets));
        }
        Ok(mutation)
    }

    // constant-product quote with the spread haircut applied to the sell side
    fn price_trade(
        &self,
        exchange: ExchangeId,
        sell_amount: Decimal,
        sell_reserve_asset: bool,
        state: &SimulationState,
    ) -> Result<Decimal, ExchangeError> {
        let config = self.config(exchange)?;
        let buckets = state
            .buckets(exchange)
            .ok_or(ExchangeError::MissingBuckets(exchange))?;

        let reduced_sell_amount = sell_amount * (Decimal::ONE - config.spread);
        let (buy_bucket, sell_bucket) = if sell_reserve_asset {
            (buckets.stable, buckets.reserve_asset)
        } else {
            (buckets.reserve_asset, buckets.stable)
        };

        (reduced_sell_amount * buy_bucket)
            .checked_div(sell_bucket + reduced_sell_amount)
            .ok_or(ExchangeError::Numeric("empty sell bucket"))
    }

    /// Amount of the opposite currency a sell buys against the current
    /// buckets. `Ok(None)` means no executable price at the caller's minimum;
    /// an expected outcome the caller branches on, not an error.
    pub fn get_buy_amount(
        &self,
        exchange: ExchangeId,
        sell_amount: Decimal,
        sell_reserve_asset: bool,
        state: &SimulationState,
        min_buy_amount: Decimal,
    ) -> Result<Option<Decimal>, ExchangeError> {
        let buy_amount = self.price_trade(exchange, sell_amount, sell_reserve_asset, state)?;
        if buy_amount < min_buy_amount {
            return Ok(None);
        }
        Ok(Some(buy_amount))
    }

    /// Settle a trade between the reserve currency and the stable.
    ///
    /// The provider backstop absorbs as much of the buy-side amount as its
    /// bucket covers, with its sell-side leg scaled by the trade ratio; the
    /// absorbed portion is subtracted from the reserve-facing delta so the
    /// two bucket systems never double-count the same flow. No minimum buy
    /// amount is enforced here; that is the caller's responsibility.
    pub fn exchange(
        &self,
        exchange: ExchangeId,
        sell_amount: Decimal,
        sell_reserve_asset: bool,
        state: &SimulationState,
    ) -> Result<TradeSettlement, ExchangeError> {
        let config = self.config(exchange)?;
        let buy_amount = self.price_trade(exchange, sell_amount, sell_reserve_asset, state)?;

        let (delta_stable, delta_reserve_asset) = if sell_reserve_asset {
            (-buy_amount, sell_amount)
        } else {
            (sell_amount, -buy_amount)
        };

        let prev_buckets = state
            .buckets(exchange)
            .ok_or(ExchangeError::MissingBuckets(exchange))?;
        let next_buckets = MentoBuckets::new(
            prev_buckets.stable + delta_stable,
            prev_buckets.reserve_asset + delta_reserve_asset,
        );

        let provider = state.provider_state(exchange);
        // a trade that prices to nothing leaves the backstop untouched
        // instead of dividing by the zero buy amount
        let (delta_cp_stable, delta_cp_reserve_asset) = if buy_amount.is_zero() {
            (Decimal::ZERO, Decimal::ZERO)
        } else if sell_reserve_asset {
            let absorbed = buy_amount.min(provider.stable_bucket);
            let scaled = absorbed
                .checked_div(buy_amount)
                .ok_or(ExchangeError::Numeric("absorption ratio"))?
                * sell_amount;
            (-absorbed, scaled)
        } else {
            let absorbed = buy_amount.min(provider.reserve_asset_bucket);
            let scaled = absorbed
                .checked_div(buy_amount)
                .ok_or(ExchangeError::Numeric("absorption ratio"))?
                * sell_amount;
            (scaled, -absorbed)
        };

        // claim token supply is only moved by deposits and withdrawals
        let next_provider = CollateralProviderState::new(
            provider.stable_bucket + delta_cp_stable,
            provider.reserve_asset_bucket + delta_cp_reserve_asset,
            provider.minted_cp_tokens,
        );

        let reserve_delta = Balance::zero()
            .with(
                config.reserve_asset,
                -(delta_reserve_asset - delta_cp_reserve_asset),
            )
            .with(config.stable, -(delta_stable - delta_cp_stable));

        let account_delta = Balance::zero()
            .with(config.reserve_asset, -delta_reserve_asset)
            .with(config.stable, -delta_stable);

        let mutation = StateMutation::new()
            .add(StateWrite::MentoBuckets(exchange, next_buckets))
            .add(StateWrite::CollateralProvider(exchange, next_provider));

        Ok(TradeSettlement {
            sell_amount,
            buy_amount,
            sell_reserve_asset,
            account_delta,
            reserve_delta,
            mutation,
        })
    }
}
