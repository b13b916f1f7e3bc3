//! Multi-asset ledger values.
//!
//! A `Balance` maps assets to signed quantities and supports the additive
//! arithmetic the simulation composes deltas with. Zero entries are allowed.
//! Negativity is not policed here; the account boundary rejects deltas that
//! would overdraw a real account.

use crate::types::AssetId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    amounts: HashMap<AssetId, Decimal>,
}

impl Balance {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Amount held of an asset, zero when absent.
    pub fn get(&self, asset: impl Into<AssetId>) -> Decimal {
        self.amounts
            .get(&asset.into())
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn set(&mut self, asset: impl Into<AssetId>, amount: Decimal) {
        self.amounts.insert(asset.into(), amount);
    }

    /// Builder form of `set`, handy for balance literals.
    pub fn with(mut self, asset: impl Into<AssetId>, amount: Decimal) -> Self {
        self.set(asset, amount);
        self
    }

    pub fn any_negative(&self) -> bool {
        self.amounts.values().any(|v| *v < Decimal::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.amounts.values().all(|v| v.is_zero())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, &Decimal)> {
        self.amounts.iter()
    }
}

impl FromIterator<(AssetId, Decimal)> for Balance {
    fn from_iter<I: IntoIterator<Item = (AssetId, Decimal)>>(iter: I) -> Self {
        Self {
            amounts: iter.into_iter().collect(),
        }
    }
}

impl Add for Balance {
    type Output = Balance;

    fn add(mut self, other: Balance) -> Balance {
        self += other;
        self
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, other: Balance) {
        for (asset, amount) in other.amounts {
            *self.amounts.entry(asset).or_insert(Decimal::ZERO) += amount;
        }
    }
}

impl Sub for Balance {
    type Output = Balance;

    fn sub(mut self, other: Balance) -> Balance {
        self -= other;
        self
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, other: Balance) {
        for (asset, amount) in other.amounts {
            *self.amounts.entry(asset).or_insert(Decimal::ZERO) -= amount;
        }
    }
}

impl Neg for Balance {
    type Output = Balance;

    fn neg(mut self) -> Balance {
        for amount in self.amounts.values_mut() {
            *amount = -*amount;
        }
        self
    }
}
