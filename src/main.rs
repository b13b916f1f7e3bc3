//! Mento AMM Core Simulation.
//!
//! Walks the core mechanics end to end: bucket bootstrap and periodic resets,
//! trades split between the AMM buckets and the collateral provider backstop,
//! pool deposits and withdrawals, and conflict-checked mutation composition.

use mento_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn main() {
    println!("Mento Stablecoin AMM Core Simulation");
    println!("Dual-Bucket Exchange with Collateral Provider Backstop\n");

    scenario_1_bucket_bootstrap();
    scenario_2_trading_both_directions();
    scenario_3_collateral_provider_lifecycle();
    scenario_4_mutation_composition();

    println!("\nAll simulations completed successfully.");
}

fn base_state() -> SimulationState {
    let mut state = SimulationState::default();
    state.reserve_balance.set(CryptoAsset::Celo, dec!(1_000_000));
    state
        .oracle_rate
        .set(Pair::new(CryptoAsset::Celo, Fiat::Usd), dec!(2));
    state
        .oracle_rate
        .set(Pair::new(CryptoAsset::Celo, Stable::Cusd), dec!(2));
    state
}

fn cusd_engine() -> SimulationEngine {
    let config = MentoConfig::single(ExchangeId::CusdCelo, ExchangeConfig::cusd_celo());
    config.validate().unwrap();
    SimulationEngine::new(config, base_state())
}

/// Bucket bootstrap at the first step and the periodic reset schedule.
fn scenario_1_bucket_bootstrap() {
    println!("Scenario 1: Bucket Bootstrap and Reset Schedule\n");

    let mut engine = cusd_engine();
    engine.step().unwrap();

    let buckets = engine.state().buckets(ExchangeId::CusdCelo).unwrap();
    println!("  Reserve holds 1,000,000 CELO, oracle CELO/USD = 2");
    println!(
        "  After bootstrap: stable bucket {}, reserve bucket {}",
        buckets.stable, buckets.reserve_asset
    );

    // blocktime 5s, update frequency 300s: reset due every 60th step
    for _ in 0..60 {
        engine.step().unwrap();
    }
    let resets = engine
        .events()
        .iter()
        .filter(|e| matches!(e.payload, EventPayload::BucketsReset(_)))
        .count();
    println!("  Resets over 61 steps: {resets} (bootstrap + one period)\n");
}

/// Trades in both directions, plus a skipped quote below the minimum.
fn scenario_2_trading_both_directions() {
    println!("Scenario 2: Trading Both Directions\n");

    let mut engine = cusd_engine();
    let alice = engine.create_account(
        "alice",
        Balance::zero()
            .with(CryptoAsset::Celo, dec!(5000))
            .with(Stable::Cusd, dec!(5000)),
    );
    engine.step().unwrap();

    let receipt = engine
        .execute_trade(alice, ExchangeId::CusdCelo, dec!(1000), true, Decimal::ZERO)
        .unwrap()
        .unwrap();
    println!(
        "  Alice sells {} CELO, receives {} cUSD",
        receipt.sell_amount, receipt.buy_amount
    );

    let receipt = engine
        .execute_trade(alice, ExchangeId::CusdCelo, dec!(500), false, Decimal::ZERO)
        .unwrap()
        .unwrap();
    println!(
        "  Alice sells {} cUSD, receives {} CELO",
        receipt.sell_amount, receipt.buy_amount
    );

    let skipped = engine
        .execute_trade(alice, ExchangeId::CusdCelo, dec!(10), true, dec!(1_000_000))
        .unwrap();
    println!(
        "  Quote below minimum is skipped, no fill: {}",
        skipped.is_none()
    );

    let balance = &engine.account(alice).unwrap().balance;
    println!(
        "  Alice ends with {} CELO, {} cUSD",
        balance.get(CryptoAsset::Celo),
        balance.get(Stable::Cusd)
    );
    println!(
        "  Floating supply of cUSD: {}\n",
        engine.state().floating_supply.get(Stable::Cusd)
    );
}

/// Collateral pool lifecycle: deposit, backstop a trade, withdraw.
fn scenario_3_collateral_provider_lifecycle() {
    println!("Scenario 3: Collateral Provider Lifecycle\n");

    let mut engine = cusd_engine();
    let bob = engine.create_account(
        "bob",
        Balance::zero()
            .with(CryptoAsset::Celo, dec!(10000))
            .with(Stable::Cusd, dec!(10000)),
    );
    let carol = engine.create_account(
        "carol",
        Balance::zero().with(Stable::Cusd, dec!(10000)),
    );
    engine.step().unwrap();

    let minted = engine
        .deposit_collateral(bob, ExchangeId::CusdCelo, dec!(1000))
        .unwrap();
    println!("  Bob deposits 1000 CELO-equivalent, mints {minted} CP tokens");

    let pool = engine.state().provider_state(ExchangeId::CusdCelo);
    println!(
        "  Pool: stable {}, reserve {}, claims {}",
        pool.stable_bucket, pool.reserve_asset_bucket, pool.minted_cp_tokens
    );

    let receipt = engine
        .execute_trade(carol, ExchangeId::CusdCelo, dec!(200), false, Decimal::ZERO)
        .unwrap()
        .unwrap();
    println!(
        "  Carol sells {} cUSD for {} CELO; the pool absorbs the CELO leg",
        receipt.sell_amount, receipt.buy_amount
    );

    let pool = engine.state().provider_state(ExchangeId::CusdCelo);
    println!(
        "  Pool after trade: stable {}, reserve {}, claims {}",
        pool.stable_bucket, pool.reserve_asset_bucket, pool.minted_cp_tokens
    );

    let too_large = engine.withdraw_collateral(bob, ExchangeId::CusdCelo, minted + dec!(1));
    println!(
        "  Withdrawing more claims than minted fails: {}",
        too_large.unwrap_err()
    );

    let credited = engine
        .withdraw_collateral(bob, ExchangeId::CusdCelo, minted)
        .unwrap();
    println!(
        "  Bob burns all claims, receives {} CELO and {} cUSD\n",
        credited.get(CryptoAsset::Celo),
        credited.get(Stable::Cusd)
    );
}

/// Composable mutations: independent writes merge, colliding writes fail.
fn scenario_4_mutation_composition() {
    println!("Scenario 4: Mutation Composition\n");

    let mut state = base_state();
    state
        .mento_buckets
        .insert(ExchangeId::CusdCelo, MentoBuckets::new(dec!(200), dec!(100)));

    let bucket_write = StateMutation::new().add(StateWrite::MentoBuckets(
        ExchangeId::CusdCelo,
        MentoBuckets::new(dec!(180), dec!(110)),
    ));
    let provider_write = StateMutation::new().add(StateWrite::CollateralProvider(
        ExchangeId::CusdCelo,
        CollateralProviderState::new(dec!(50), dec!(25), dec!(100)),
    ));

    let next = (bucket_write.clone() + provider_write)
        .to_diff(&state)
        .unwrap()
        .apply(&state);
    println!(
        "  Independent writes compose: buckets {:?}, pool claims {}",
        next.buckets(ExchangeId::CusdCelo).unwrap(),
        next.provider_state(ExchangeId::CusdCelo).minted_cp_tokens
    );

    let conflicting = bucket_write.clone() + bucket_write;
    let error = conflicting.to_diff(&state).unwrap_err();
    println!("  Colliding writes are rejected: {error}");
}
