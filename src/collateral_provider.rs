// 6.0 collateral_provider.rs: LP-style backstop position, one pool per
// exchange. deposits mint proportional claim tokens, withdrawals burn them.
// both are pure functions of (state, amount): they return the would-be next
// sub-state and a balance delta, leaving persistence to a StateMutation.

use crate::balance::Balance;
use crate::config::ExchangeConfig;
use crate::state::{CollateralProviderState, SimulationState};
use crate::types::{AssetId, ExchangeId, Pair};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollateralProviderError {
    #[error("no oracle rate for pair {0}")]
    MissingOracleRate(Pair),

    #[error("withdrawal amount too large: requested {requested}, minted {minted}")]
    WithdrawalTooLarge { requested: Decimal, minted: Decimal },

    #[error("numeric failure in pool math: {0}")]
    Numeric(&'static str),
}

// 6.1: the contract. stateless between calls; the working position is derived
// from the snapshot passed to every operation.
#[derive(Debug, Clone)]
pub struct CollateralProviderContract {
    exchange: ExchangeId,
    config: ExchangeConfig,
}

impl CollateralProviderContract {
    pub fn new(exchange: ExchangeId, config: ExchangeConfig) -> Self {
        Self { exchange, config }
    }

    pub fn exchange(&self) -> ExchangeId {
        self.exchange
    }

    // Oracle key for this pool's reserve/stable pair
    pub fn pair(&self) -> Pair {
        Pair::new(self.config.reserve_asset, self.config.stable)
    }

    /// Resolve the working view from a snapshot: the pool sub-state (zeroed
    /// when absent) plus the oracle rate for the pool's pair.
    pub fn view(&self, state: &SimulationState) -> Result<PoolView, CollateralProviderError> {
        let reserve_to_stable = state
            .oracle_rate
            .get(self.pair())
            .ok_or(CollateralProviderError::MissingOracleRate(self.pair()))?;

        Ok(PoolView {
            position: state.provider_state(self.exchange),
            reserve_to_stable,
        })
    }

    /// Effect of depositing `total_to_deposit_in_reserve_asset` (denominated
    /// in reserve asset) into the pool.
    ///
    /// The deposit is split between the two buckets so the pool's current
    /// asset mix is preserved; the first deposit into an empty pool is 100%
    /// reserve asset and mints claim tokens 1:1. The returned delta is from
    /// the depositor's perspective.
    pub fn deposit(
        &self,
        state: &SimulationState,
        total_to_deposit_in_reserve_asset: Decimal,
    ) -> Result<(CollateralProviderState, Balance), CollateralProviderError> {
        let view = self.view(state)?;
        let fraction = view.required_reserve_asset_fraction()?;

        let reserve_asset_to_deposit = total_to_deposit_in_reserve_asset * fraction;
        let stable_asset_to_deposit = total_to_deposit_in_reserve_asset
            * (Decimal::ONE - fraction)
            * view.reserve_to_stable;

        let cp_tokens_to_mint = if view.position.minted_cp_tokens.is_zero() {
            total_to_deposit_in_reserve_asset
        } else {
            view.cp_tokens_per_reserve_asset()? * total_to_deposit_in_reserve_asset
        };

        let next_state = CollateralProviderState::new(
            view.position.stable_bucket + stable_asset_to_deposit,
            view.position.reserve_asset_bucket + reserve_asset_to_deposit,
            view.position.minted_cp_tokens + cp_tokens_to_mint,
        );

        let account_delta = Balance::zero()
            .with(self.config.stable, -stable_asset_to_deposit)
            .with(self.config.reserve_asset, -reserve_asset_to_deposit)
            .with(AssetId::CpToken, cp_tokens_to_mint);

        Ok((next_state, account_delta))
    }

    /// Effect of burning `cp_tokens_to_withdraw` claim tokens against the
    /// pool. Withdrawing more tokens than are minted is an invalid request
    /// and leaves everything unchanged.
    pub fn withdraw(
        &self,
        state: &SimulationState,
        cp_tokens_to_withdraw: Decimal,
    ) -> Result<(CollateralProviderState, Balance), CollateralProviderError> {
        let view = self.view(state)?;
        if cp_tokens_to_withdraw > view.position.minted_cp_tokens {
            return Err(CollateralProviderError::WithdrawalTooLarge {
                requested: cp_tokens_to_withdraw,
                minted: view.position.minted_cp_tokens,
            });
        }

        let fraction = view.required_reserve_asset_fraction()?;
        let total_to_withdraw_in_reserve_asset = cp_tokens_to_withdraw
            .checked_div(view.cp_tokens_per_reserve_asset()?)
            .ok_or(CollateralProviderError::Numeric(
                "zero claim token ratio on withdrawal",
            ))?;

        let reserve_assets_to_withdraw = fraction * total_to_withdraw_in_reserve_asset;
        let stable_assets_to_withdraw = (total_to_withdraw_in_reserve_asset
            - reserve_assets_to_withdraw)
            * view.reserve_to_stable;

        let next_state = CollateralProviderState::new(
            view.position.stable_bucket - stable_assets_to_withdraw,
            view.position.reserve_asset_bucket - reserve_assets_to_withdraw,
            view.position.minted_cp_tokens - cp_tokens_to_withdraw,
        );

        let account_delta = Balance::zero()
            .with(self.config.stable, stable_assets_to_withdraw)
            .with(self.config.reserve_asset, reserve_assets_to_withdraw)
            .with(AssetId::CpToken, -cp_tokens_to_withdraw);

        Ok((next_state, account_delta))
    }
}

// 6.2: snapshot-derived working view. a plain value instead of the scoped
// enter/exit state injection the on-chain contract equivalent would use.
#[derive(Debug, Clone, Copy)]
pub struct PoolView {
    pub position: CollateralProviderState,
    // Amount of stable one unit of reserve asset buys
    pub reserve_to_stable: Decimal,
}

impl PoolView {
    pub fn stable_to_reserve(&self) -> Result<Decimal, CollateralProviderError> {
        Decimal::ONE
            .checked_div(self.reserve_to_stable)
            .ok_or(CollateralProviderError::Numeric("zero oracle rate"))
    }

    /// Pool value with the stable bucket converted into reserve asset.
    pub fn total_value_in_reserve_asset(&self) -> Result<Decimal, CollateralProviderError> {
        Ok(self.position.reserve_asset_bucket
            + self.position.stable_bucket * self.stable_to_reserve()?)
    }

    /// Share of pool value held as reserve asset. 1 for an empty pool, so the
    /// bootstrap deposit is entirely reserve asset.
    pub fn required_reserve_asset_fraction(&self) -> Result<Decimal, CollateralProviderError> {
        if self.position.minted_cp_tokens.is_zero() {
            return Ok(Decimal::ONE);
        }
        self.position
            .reserve_asset_bucket
            .checked_div(self.total_value_in_reserve_asset()?)
            .ok_or(CollateralProviderError::Numeric(
                "claims outstanding against an empty pool",
            ))
    }

    pub fn cp_tokens_per_reserve_asset(&self) -> Result<Decimal, CollateralProviderError> {
        self.position
            .minted_cp_tokens
            .checked_div(self.total_value_in_reserve_asset()?)
            .ok_or(CollateralProviderError::Numeric(
                "claims outstanding against an empty pool",
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExchangeConfig;
    use crate::types::{CryptoAsset, Stable};
    use rust_decimal_macros::dec;

    fn contract() -> CollateralProviderContract {
        CollateralProviderContract::new(ExchangeId::CusdCelo, ExchangeConfig::cusd_celo())
    }

    fn state_with_pool(pool: Option<CollateralProviderState>) -> SimulationState {
        let mut state = SimulationState::default();
        state
            .oracle_rate
            .set(Pair::new(CryptoAsset::Celo, Stable::Cusd), dec!(2));
        if let Some(pool) = pool {
            state.collateral_provider.insert(ExchangeId::CusdCelo, pool);
        }
        state
    }

    #[test]
    fn first_deposit_bootstraps_one_to_one() {
        let state = state_with_pool(None);

        let (next, delta) = contract().deposit(&state, dec!(1000)).unwrap();
        assert_eq!(next.minted_cp_tokens, dec!(1000));
        assert_eq!(next.reserve_asset_bucket, dec!(1000));
        assert_eq!(next.stable_bucket, dec!(0));
        assert_eq!(delta.get(AssetId::CpToken), dec!(1000));
        assert_eq!(delta.get(CryptoAsset::Celo), dec!(-1000));
    }

    #[test]
    fn deposit_when_only_reserve_asset_in_pool() {
        let state = state_with_pool(Some(CollateralProviderState::new(
            dec!(0),
            dec!(1000),
            dec!(1000),
        )));

        let (next, delta) = contract().deposit(&state, dec!(500)).unwrap();
        assert_eq!(next.minted_cp_tokens, dec!(1500));
        assert_eq!(next.reserve_asset_bucket, dec!(1500));
        assert_eq!(next.stable_bucket, dec!(0));
        assert_eq!(delta.get(AssetId::CpToken), dec!(500));
        assert_eq!(delta.get(CryptoAsset::Celo), dec!(-500));
    }

    #[test]
    fn deposit_when_only_stable_asset_in_pool() {
        let state = state_with_pool(Some(CollateralProviderState::new(
            dec!(2000),
            dec!(0),
            dec!(1000),
        )));

        let (next, delta) = contract().deposit(&state, dec!(500)).unwrap();
        assert_eq!(next.minted_cp_tokens, dec!(1500));
        assert_eq!(next.reserve_asset_bucket, dec!(0));
        assert_eq!(next.stable_bucket, dec!(3000));
        assert_eq!(delta.get(AssetId::CpToken), dec!(500));
        assert_eq!(delta.get(Stable::Cusd), dec!(-1000));
    }

    #[test]
    fn deposit_into_mixed_pool_preserves_asset_mix() {
        let state = state_with_pool(Some(CollateralProviderState::new(
            dec!(1500),
            dec!(500),
            dec!(1500),
        )));

        let (next, delta) = contract().deposit(&state, dec!(1000)).unwrap();
        assert_eq!(next.minted_cp_tokens, dec!(2700));
        assert_eq!(next.reserve_asset_bucket, dec!(900));
        assert_eq!(next.stable_bucket, dec!(2700));
        assert_eq!(delta.get(AssetId::CpToken), dec!(1200));
        assert_eq!(delta.get(Stable::Cusd), dec!(-1200));
        assert_eq!(delta.get(CryptoAsset::Celo), dec!(-400));
    }

    #[test]
    fn over_withdrawal_is_rejected_without_state_change() {
        let state = state_with_pool(Some(CollateralProviderState::new(
            dec!(1500),
            dec!(500),
            dec!(1500),
        )));

        let result = contract().withdraw(&state, dec!(2000));
        assert_eq!(
            result,
            Err(CollateralProviderError::WithdrawalTooLarge {
                requested: dec!(2000),
                minted: dec!(1500),
            })
        );
        assert_eq!(
            state.provider_state(ExchangeId::CusdCelo),
            CollateralProviderState::new(dec!(1500), dec!(500), dec!(1500))
        );
    }

    #[test]
    fn withdraw_when_only_reserve_asset_in_pool() {
        let state = state_with_pool(Some(CollateralProviderState::new(
            dec!(0),
            dec!(3000),
            dec!(2000),
        )));

        let (next, delta) = contract().withdraw(&state, dec!(1000)).unwrap();
        assert_eq!(next.minted_cp_tokens, dec!(1000));
        assert_eq!(next.stable_bucket, dec!(0));
        assert_eq!(next.reserve_asset_bucket, dec!(1500));
        assert_eq!(delta.get(CryptoAsset::Celo), dec!(1500));
        assert_eq!(delta.get(Stable::Cusd), dec!(0));
        assert_eq!(delta.get(AssetId::CpToken), dec!(-1000));
    }

    #[test]
    fn withdraw_when_only_stable_asset_in_pool() {
        let state = state_with_pool(Some(CollateralProviderState::new(
            dec!(3000),
            dec!(0),
            dec!(2000),
        )));

        let (next, delta) = contract().withdraw(&state, dec!(1000)).unwrap();
        assert_eq!(next.minted_cp_tokens, dec!(1000));
        assert_eq!(next.stable_bucket, dec!(1500));
        assert_eq!(next.reserve_asset_bucket, dec!(0));
        assert_eq!(delta.get(CryptoAsset::Celo), dec!(0));
        assert_eq!(delta.get(Stable::Cusd), dec!(1500));
        assert_eq!(delta.get(AssetId::CpToken), dec!(-1000));
    }

    #[test]
    fn withdraw_from_mixed_pool() {
        let state = state_with_pool(Some(CollateralProviderState::new(
            dec!(3000),
            dec!(1000),
            dec!(2000),
        )));

        let (next, delta) = contract().withdraw(&state, dec!(1000)).unwrap();
        assert_eq!(next.minted_cp_tokens, dec!(1000));
        assert_eq!(next.stable_bucket, dec!(1500));
        assert_eq!(next.reserve_asset_bucket, dec!(500));
        assert_eq!(delta.get(CryptoAsset::Celo), dec!(500));
        assert_eq!(delta.get(Stable::Cusd), dec!(1500));
        assert_eq!(delta.get(AssetId::CpToken), dec!(-1000));
    }

    #[test]
    fn missing_oracle_rate_is_a_hard_error() {
        let state = SimulationState::default();
        let result = contract().deposit(&state, dec!(100));
        assert!(matches!(
            result,
            Err(CollateralProviderError::MissingOracleRate(_))
        ));
    }

    #[test]
    fn deposit_then_withdraw_round_trips() {
        let initial = CollateralProviderState::new(dec!(1500), dec!(500), dec!(1500));
        let state = state_with_pool(Some(initial));

        let (after_deposit, deposit_delta) = contract().deposit(&state, dec!(1000)).unwrap();
        let minted = after_deposit.minted_cp_tokens - initial.minted_cp_tokens;

        let mut next_state = state.clone();
        next_state
            .collateral_provider
            .insert(ExchangeId::CusdCelo, after_deposit);

        let (after_withdraw, withdraw_delta) =
            contract().withdraw(&next_state, minted).unwrap();

        let tolerance = dec!(0.0000001);
        assert!((after_withdraw.stable_bucket - initial.stable_bucket).abs() < tolerance);
        assert!(
            (after_withdraw.reserve_asset_bucket - initial.reserve_asset_bucket).abs()
                < tolerance
        );
        assert!(
            (after_withdraw.minted_cp_tokens - initial.minted_cp_tokens).abs() < tolerance
        );

        let net = deposit_delta + withdraw_delta;
        for (_, amount) in net.iter() {
            assert!(amount.abs() < tolerance);
        }
    }
}
