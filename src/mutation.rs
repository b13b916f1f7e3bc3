// 4.0 mutation.rs: composable, conflict-checked description of pending writes
// to the simulation state. independent computations each return a mutation;
// the step concatenates them and materializes one diff at the end.
//
// duplicate paths are detected at materialization time, not accumulation time.
// two writers owning the same state cell in one step is a composition bug in
// the calling layer and is never resolved by last-write-wins.

use crate::balance::Balance;
use crate::state::{CollateralProviderState, MentoBuckets, OracleRateMap, SimulationState};
use crate::types::{ExchangeId, Pair};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Add;

// 4.1: one addressable write. a closed variant set instead of a dynamic
// path-walk: each variant names the state cell it owns and carries the
// replacement value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateWrite {
    MentoBuckets(ExchangeId, MentoBuckets),
    CollateralProvider(ExchangeId, CollateralProviderState),
    OracleRate(Pair, Decimal),
    ReserveBalance(Balance),
    FloatingSupply(Balance),
}

impl StateWrite {
    pub fn path(&self) -> StatePath {
        match self {
            StateWrite::MentoBuckets(exchange, _) => StatePath::MentoBuckets(*exchange),
            StateWrite::CollateralProvider(exchange, _) => {
                StatePath::CollateralProvider(*exchange)
            }
            StateWrite::OracleRate(pair, _) => StatePath::OracleRate(*pair),
            StateWrite::ReserveBalance(_) => StatePath::ReserveBalance,
            StateWrite::FloatingSupply(_) => StatePath::FloatingSupply,
        }
    }
}

// 4.2: the address of a write. conflict detection compares paths by
// structural equality, never values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatePath {
    MentoBuckets(ExchangeId),
    CollateralProvider(ExchangeId),
    OracleRate(Pair),
    ReserveBalance,
    FloatingSupply,
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatePath::MentoBuckets(exchange) => write!(f, "mento_buckets.{exchange}"),
            StatePath::CollateralProvider(exchange) => {
                write!(f, "collateral_provider.{exchange}")
            }
            StatePath::OracleRate(pair) => write!(f, "oracle_rate.{pair}"),
            StatePath::ReserveBalance => f.write_str("reserve_balance"),
            StatePath::FloatingSupply => f.write_str("floating_supply"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MutationError {
    #[error("state mutation contains two entries for the same path: {0}")]
    DuplicatePath(StatePath),
}

// 4.3: an ordered list of writes. chainable, and `+` concatenates two
// mutations so a step's diff can be built from independent sub-computations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateMutation {
    writes: Vec<StateWrite>,
}

impl StateMutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, write: StateWrite) -> Self {
        self.writes.push(write);
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Materialize the accumulated writes into a diff against `state`.
    ///
    /// Each touched top-level section starts from a clone of that section in
    /// `state`, so untouched siblings under the same section are preserved.
    /// Sections never written stay absent from the diff.
    pub fn to_diff(&self, state: &SimulationState) -> Result<StateDiff, MutationError> {
        let mut seen: HashSet<StatePath> = HashSet::new();
        let mut diff = StateDiff::default();

        for write in &self.writes {
            let path = write.path();
            if !seen.insert(path) {
                return Err(MutationError::DuplicatePath(path));
            }

            match write {
                StateWrite::MentoBuckets(exchange, buckets) => {
                    diff.mento_buckets
                        .get_or_insert_with(|| state.mento_buckets.clone())
                        .insert(*exchange, *buckets);
                }
                StateWrite::CollateralProvider(exchange, provider) => {
                    diff.collateral_provider
                        .get_or_insert_with(|| state.collateral_provider.clone())
                        .insert(*exchange, *provider);
                }
                StateWrite::OracleRate(pair, rate) => {
                    diff.oracle_rate
                        .get_or_insert_with(|| state.oracle_rate.clone())
                        .set(*pair, *rate);
                }
                StateWrite::ReserveBalance(balance) => {
                    diff.reserve_balance = Some(balance.clone());
                }
                StateWrite::FloatingSupply(balance) => {
                    diff.floating_supply = Some(balance.clone());
                }
            }
        }

        Ok(diff)
    }
}

impl Add for StateMutation {
    type Output = StateMutation;

    fn add(mut self, other: StateMutation) -> StateMutation {
        self.writes.extend(other.writes);
        self
    }
}

// 4.4: materialized diff restricted to the touched top-level sections.
// absent sections mean "unchanged" when the outer engine merges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDiff {
    pub mento_buckets: Option<HashMap<ExchangeId, MentoBuckets>>,
    pub collateral_provider: Option<HashMap<ExchangeId, CollateralProviderState>>,
    pub oracle_rate: Option<OracleRateMap>,
    pub reserve_balance: Option<Balance>,
    pub floating_supply: Option<Balance>,
}

impl StateDiff {
    /// Merge into a prior snapshot. Touched sections replace their prior
    /// value wholesale; everything else carries over, including the timestep.
    pub fn apply(&self, state: &SimulationState) -> SimulationState {
        let mut next = state.clone();
        if let Some(buckets) = &self.mento_buckets {
            next.mento_buckets = buckets.clone();
        }
        if let Some(provider) = &self.collateral_provider {
            next.collateral_provider = provider.clone();
        }
        if let Some(rates) = &self.oracle_rate {
            next.oracle_rate = rates.clone();
        }
        if let Some(reserve) = &self.reserve_balance {
            next.reserve_balance = reserve.clone();
        }
        if let Some(supply) = &self.floating_supply {
            next.floating_supply = supply.clone();
        }
        next
    }
}
