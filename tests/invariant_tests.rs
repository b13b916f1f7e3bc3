//! Property-based tests for the core bucket and pool math.
//!
//! These tests verify invariants hold under random inputs.

use mento_core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Strategies for generating test data
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|x| Decimal::new(x, 2)) // 0.01 to 100,000
}

fn bucket_strategy() -> impl Strategy<Value = Decimal> {
    (1_000i64..1_000_000_000i64).prop_map(|x| Decimal::new(x, 2)) // 10 to 10M
}

fn rate_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100_000i64).prop_map(|x| Decimal::new(x, 3)) // 0.001 to 100
}

fn no_spread_generator() -> MentoExchangeGenerator {
    let mut config = ExchangeConfig::cusd_celo();
    config.spread = Decimal::ZERO;
    MentoExchangeGenerator::new(MentoConfig::single(ExchangeId::CusdCelo, config))
}

fn generator() -> MentoExchangeGenerator {
    MentoExchangeGenerator::new(MentoConfig::single(
        ExchangeId::CusdCelo,
        ExchangeConfig::cusd_celo(),
    ))
}

fn contract() -> CollateralProviderContract {
    CollateralProviderContract::new(ExchangeId::CusdCelo, ExchangeConfig::cusd_celo())
}

fn state_with(
    buckets: Option<MentoBuckets>,
    pool: Option<CollateralProviderState>,
    rate: Decimal,
) -> SimulationState {
    let mut state = SimulationState::default();
    state
        .oracle_rate
        .set(Pair::new(CryptoAsset::Celo, Stable::Cusd), rate);
    if let Some(buckets) = buckets {
        state.mento_buckets.insert(ExchangeId::CusdCelo, buckets);
    }
    if let Some(pool) = pool {
        state.collateral_provider.insert(ExchangeId::CusdCelo, pool);
    }
    state
}

proptest! {
    /// Net flow is conserved across account, reserve, and provider:
    /// account_delta == reserve_delta - provider_delta, componentwise.
    #[test]
    fn trade_flow_is_conserved(
        stable_bucket in bucket_strategy(),
        reserve_bucket in bucket_strategy(),
        pool_stable in amount_strategy(),
        pool_reserve in amount_strategy(),
        sell_amount in amount_strategy(),
        sell_reserve_asset in any::<bool>(),
    ) {
        let before = CollateralProviderState::new(pool_stable, pool_reserve, pool_stable + pool_reserve);
        let state = state_with(
            Some(MentoBuckets::new(stable_bucket, reserve_bucket)),
            Some(before),
            dec!(2),
        );

        let settlement = generator()
            .exchange(ExchangeId::CusdCelo, sell_amount, sell_reserve_asset, &state)
            .unwrap();

        let diff = settlement.mutation.to_diff(&state).unwrap();
        let after = diff.collateral_provider.unwrap()[&ExchangeId::CusdCelo];
        let provider_delta = Balance::zero()
            .with(Stable::Cusd, after.stable_bucket - before.stable_bucket)
            .with(
                CryptoAsset::Celo,
                after.reserve_asset_bucket - before.reserve_asset_bucket,
            );

        let net = settlement.reserve_delta - provider_delta - settlement.account_delta;
        prop_assert!(net.is_zero(), "unbalanced flow: {net:?}");
    }

    /// The provider absorbs at most the buy amount and at most its own
    /// bucket, and its buckets never go negative from a trade.
    #[test]
    fn absorption_is_bounded(
        stable_bucket in bucket_strategy(),
        reserve_bucket in bucket_strategy(),
        pool_stable in amount_strategy(),
        pool_reserve in amount_strategy(),
        sell_amount in amount_strategy(),
        sell_reserve_asset in any::<bool>(),
    ) {
        let before = CollateralProviderState::new(pool_stable, pool_reserve, pool_stable + pool_reserve);
        let state = state_with(
            Some(MentoBuckets::new(stable_bucket, reserve_bucket)),
            Some(before),
            dec!(2),
        );

        let settlement = generator()
            .exchange(ExchangeId::CusdCelo, sell_amount, sell_reserve_asset, &state)
            .unwrap();
        let diff = settlement.mutation.to_diff(&state).unwrap();
        let after = diff.collateral_provider.unwrap()[&ExchangeId::CusdCelo];

        prop_assert!(after.stable_bucket >= Decimal::ZERO);
        prop_assert!(after.reserve_asset_bucket >= Decimal::ZERO);

        let absorbed = if sell_reserve_asset {
            before.stable_bucket - after.stable_bucket
        } else {
            before.reserve_asset_bucket - after.reserve_asset_bucket
        };
        prop_assert!(absorbed >= Decimal::ZERO);
        prop_assert!(absorbed <= settlement.buy_amount);
    }

    /// Trades never move the claim token supply.
    #[test]
    fn trades_leave_claim_supply_unchanged(
        stable_bucket in bucket_strategy(),
        reserve_bucket in bucket_strategy(),
        minted in amount_strategy(),
        sell_amount in amount_strategy(),
        sell_reserve_asset in any::<bool>(),
    ) {
        let before = CollateralProviderState::new(minted, minted, minted);
        let state = state_with(
            Some(MentoBuckets::new(stable_bucket, reserve_bucket)),
            Some(before),
            dec!(2),
        );

        let settlement = generator()
            .exchange(ExchangeId::CusdCelo, sell_amount, sell_reserve_asset, &state)
            .unwrap();
        let diff = settlement.mutation.to_diff(&state).unwrap();
        let after = diff.collateral_provider.unwrap()[&ExchangeId::CusdCelo];
        prop_assert_eq!(after.minted_cp_tokens, minted);
    }

    /// The quote is the sentinel `None` exactly when it lands below the
    /// caller's minimum.
    #[test]
    fn quote_sentinel_matches_minimum(
        stable_bucket in bucket_strategy(),
        reserve_bucket in bucket_strategy(),
        sell_amount in amount_strategy(),
        min_buy in amount_strategy(),
        sell_reserve_asset in any::<bool>(),
    ) {
        let state = state_with(
            Some(MentoBuckets::new(stable_bucket, reserve_bucket)),
            None,
            dec!(2),
        );

        let gen = no_spread_generator();
        let unconstrained = gen
            .get_buy_amount(ExchangeId::CusdCelo, sell_amount, sell_reserve_asset, &state, Decimal::ZERO)
            .unwrap()
            .unwrap();
        let constrained = gen
            .get_buy_amount(ExchangeId::CusdCelo, sell_amount, sell_reserve_asset, &state, min_buy)
            .unwrap();

        if unconstrained < min_buy {
            prop_assert_eq!(constrained, None);
        } else {
            prop_assert_eq!(constrained, Some(unconstrained));
        }
    }

    /// First deposit into an empty pool bootstraps 1:1.
    #[test]
    fn first_deposit_bootstraps(amount in amount_strategy()) {
        let state = state_with(None, None, dec!(2));

        let (next, delta) = contract().deposit(&state, amount).unwrap();
        prop_assert_eq!(next.minted_cp_tokens, amount);
        prop_assert_eq!(next.reserve_asset_bucket, amount);
        prop_assert_eq!(next.stable_bucket, Decimal::ZERO);
        prop_assert_eq!(delta.get(AssetId::CpToken), amount);
        prop_assert_eq!(delta.get(CryptoAsset::Celo), -amount);
    }

    /// Depositing then withdrawing the newly minted claims restores the pool
    /// and nets the depositor to zero, up to floating-point tolerance.
    #[test]
    fn deposit_withdraw_round_trips(
        pool_stable in amount_strategy(),
        pool_reserve in amount_strategy(),
        deposit in amount_strategy(),
        rate in rate_strategy(),
    ) {
        let initial = CollateralProviderState::new(
            pool_stable,
            pool_reserve,
            pool_stable + pool_reserve,
        );
        let state = state_with(None, Some(initial), rate);

        let (after_deposit, deposit_delta) = contract().deposit(&state, deposit).unwrap();
        let minted = after_deposit.minted_cp_tokens - initial.minted_cp_tokens;

        let mut mid_state = state.clone();
        mid_state
            .collateral_provider
            .insert(ExchangeId::CusdCelo, after_deposit);

        let (restored, withdraw_delta) = contract().withdraw(&mid_state, minted).unwrap();

        let tolerance = dec!(0.000001);
        prop_assert!((restored.stable_bucket - initial.stable_bucket).abs() < tolerance);
        prop_assert!(
            (restored.reserve_asset_bucket - initial.reserve_asset_bucket).abs() < tolerance
        );
        prop_assert!((restored.minted_cp_tokens - initial.minted_cp_tokens).abs() < tolerance);

        let net = deposit_delta + withdraw_delta;
        for (asset, amount) in net.iter() {
            prop_assert!(amount.abs() < tolerance, "residual {amount} in {asset}");
        }
    }

    /// Withdrawing more claims than exist always fails and changes nothing.
    #[test]
    fn over_withdraw_always_fails(
        pool_stable in amount_strategy(),
        pool_reserve in amount_strategy(),
        excess in amount_strategy(),
    ) {
        let minted = pool_stable + pool_reserve;
        let pool = CollateralProviderState::new(pool_stable, pool_reserve, minted);
        let state = state_with(None, Some(pool), dec!(2));

        let result = contract().withdraw(&state, minted + excess);
        prop_assert!(
            matches!(
                result,
                Err(CollateralProviderError::WithdrawalTooLarge { .. })
            ),
            "expected WithdrawalTooLarge error"
        );
        prop_assert_eq!(state.provider_state(ExchangeId::CusdCelo), pool);
    }

    /// Buckets reset exactly when a whole number of update periods fits the
    /// elapsed chain time, and always at the bootstrap step.
    #[test]
    fn bucket_reset_boundary(
        blocktime in 1u64..=60,
        frequency in 1u64..=10_000,
        timestep in 0u64..=100_000,
    ) {
        let mut config = MentoConfig::single(ExchangeId::CusdCelo, ExchangeConfig::cusd_celo());
        config.blocktime_seconds = blocktime;
        config
            .exchanges
            .get_mut(&ExchangeId::CusdCelo)
            .unwrap()
            .bucket_update_frequency_seconds = frequency;
        let gen = MentoExchangeGenerator::new(config);

        let mut state = SimulationState::default();
        state.timestep = timestep;

        let expected = (blocktime * timestep) % frequency == 0 || timestep == 1;
        prop_assert_eq!(
            gen.buckets_should_be_reset(ExchangeId::CusdCelo, &state).unwrap(),
            expected
        );
    }

    /// Two writes to the same path are rejected at materialization time,
    /// regardless of order and regardless of the values written.
    #[test]
    fn duplicate_paths_always_rejected(
        a_stable in amount_strategy(),
        b_stable in amount_strategy(),
        flip in any::<bool>(),
    ) {
        let state = SimulationState::default();
        let first = StateMutation::new().add(StateWrite::CollateralProvider(
            ExchangeId::CusdCelo,
            CollateralProviderState::new(a_stable, a_stable, a_stable),
        ));
        let second = StateMutation::new().add(StateWrite::CollateralProvider(
            ExchangeId::CusdCelo,
            CollateralProviderState::new(b_stable, b_stable, b_stable),
        ));

        let combined = if flip { second + first } else { first + second };
        prop_assert_eq!(
            combined.to_diff(&state),
            Err(MutationError::DuplicatePath(StatePath::CollateralProvider(
                ExchangeId::CusdCelo
            )))
        );
    }
}
