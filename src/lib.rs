// mento-core: stablecoin AMM simulation core.
// snapshot-in, diff-out architecture: every operation is a pure function of an
// explicitly passed state snapshot and returns deltas plus pending writes.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: asset families, Pair, ExchangeId, Timestamp
//   2.x  balance.rs: multi-asset ledger values and delta arithmetic
//   3.x  state.rs: simulation snapshot, AMM buckets, provider sub-state
//   4.x  mutation.rs: conflict-checked state writes and diff materialization
//   5.x  config.rs: per-exchange AMM parameters and the generator registry
//   6.x  collateral_provider.rs: LP-style backstop pool, claim token mint/burn
//   7.x  exchange.rs: bucket resets, constant-product pricing, trade settlement
//   8.x  account.rs: balance holders and the negativity boundary
//   9.x  engine.rs: step harness composing diffs and emitting events
//   10.x events.rs: state transition events for audit

// core model modules
pub mod balance;
pub mod collateral_provider;
pub mod exchange;
pub mod mutation;
pub mod state;
pub mod types;

// integration modules
pub mod account;
pub mod config;
pub mod engine;
pub mod events;

// re exports for convenience
pub use account::{Account, AccountError};
pub use balance::Balance;
pub use collateral_provider::{CollateralProviderContract, CollateralProviderError, PoolView};
pub use config::{ConfigError, ExchangeConfig, MentoConfig};
pub use engine::{EngineError, SimulationEngine, TradeReceipt};
pub use events::*;
pub use exchange::{ExchangeError, MentoExchangeGenerator, TradeSettlement};
pub use mutation::{MutationError, StateDiff, StateMutation, StatePath, StateWrite};
pub use state::{CollateralProviderState, MentoBuckets, OracleRateMap, SimulationState};
pub use types::*;
