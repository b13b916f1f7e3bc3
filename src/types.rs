// 1.0: all the primitives live here. nothing in the model works without these types.
// asset families, rate pairs, exchange ids, timestamps. closed enums instead of
// free-form strings so the compiler catches mixups between asset classes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Stable assets pegged to a reference fiat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stable {
    Cusd,
    Creal,
    Ceur,
}

impl Stable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stable::Cusd => "cusd",
            Stable::Creal => "creal",
            Stable::Ceur => "ceur",
        }
    }
}

impl fmt::Display for Stable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Reserve-eligible crypto assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CryptoAsset {
    Celo,
    Eth,
    Btc,
    Dai,
}

impl CryptoAsset {
    pub fn as_str(&self) -> &'static str {
        match self {
            CryptoAsset::Celo => "celo",
            CryptoAsset::Eth => "eth",
            CryptoAsset::Btc => "btc",
            CryptoAsset::Dai => "dai",
        }
    }
}

impl fmt::Display for CryptoAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fiat {
    Usd,
    Eur,
    Brl,
}

impl Fiat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Fiat::Usd => "usd",
            Fiat::Eur => "eur",
            Fiat::Brl => "brl",
        }
    }
}

impl fmt::Display for Fiat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// 1.1: ledger key. any asset a balance can hold, including the collateral
// provider claim token. serialized by tag so balances stay plain JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetId {
    Stable(Stable),
    Crypto(CryptoAsset),
    Fiat(Fiat),
    CpToken,
}

impl AssetId {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetId::Stable(s) => s.as_str(),
            AssetId::Crypto(c) => c.as_str(),
            AssetId::Fiat(x) => x.as_str(),
            AssetId::CpToken => "cp",
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown asset tag: {0}")]
pub struct UnknownAssetTag(pub String);

impl FromStr for AssetId {
    type Err = UnknownAssetTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let asset = match s {
            "cusd" => AssetId::Stable(Stable::Cusd),
            "creal" => AssetId::Stable(Stable::Creal),
            "ceur" => AssetId::Stable(Stable::Ceur),
            "celo" => AssetId::Crypto(CryptoAsset::Celo),
            "eth" => AssetId::Crypto(CryptoAsset::Eth),
            "btc" => AssetId::Crypto(CryptoAsset::Btc),
            "dai" => AssetId::Crypto(CryptoAsset::Dai),
            "usd" => AssetId::Fiat(Fiat::Usd),
            "eur" => AssetId::Fiat(Fiat::Eur),
            "brl" => AssetId::Fiat(Fiat::Brl),
            "cp" => AssetId::CpToken,
            other => return Err(UnknownAssetTag(other.to_string())),
        };
        Ok(asset)
    }
}

impl Serialize for AssetId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

impl From<Stable> for AssetId {
    fn from(s: Stable) -> Self {
        AssetId::Stable(s)
    }
}

impl From<CryptoAsset> for AssetId {
    fn from(c: CryptoAsset) -> Self {
        AssetId::Crypto(c)
    }
}

impl From<Fiat> for AssetId {
    fn from(x: Fiat) -> Self {
        AssetId::Fiat(x)
    }
}

// 1.2: ordered asset pair used as an oracle rate key. a rate keyed by
// Pair(celo, cusd) is the amount of cusd one celo buys. serialized in the
// "celo/cusd" form so rate maps stay plain JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pair {
    pub base: AssetId,
    pub quote: AssetId,
}

impl Pair {
    pub fn new(base: impl Into<AssetId>, quote: impl Into<AssetId>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed pair tag: {0}")]
pub struct MalformedPairTag(pub String);

impl FromStr for Pair {
    type Err = MalformedPairTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .split_once('/')
            .ok_or_else(|| MalformedPairTag(s.to_string()))?;
        Ok(Pair {
            base: base
                .parse()
                .map_err(|_| MalformedPairTag(s.to_string()))?,
            quote: quote
                .parse()
                .map_err(|_| MalformedPairTag(s.to_string()))?,
        })
    }
}

impl Serialize for Pair {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pair {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

// 1.3: the stable/reserve exchanges the generator can run. closed set,
// resolved from config tags at load time. unknown tags fail fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeId {
    CusdCelo,
    CrealCelo,
    CeurCelo,
}

impl ExchangeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::CusdCelo => "cusd_celo",
            ExchangeId::CrealCelo => "creal_celo",
            ExchangeId::CeurCelo => "ceur_celo",
        }
    }

    pub fn all() -> [ExchangeId; 3] {
        [
            ExchangeId::CusdCelo,
            ExchangeId::CrealCelo,
            ExchangeId::CeurCelo,
        ]
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown exchange tag: {0}")]
pub struct UnknownExchangeTag(pub String);

impl FromStr for ExchangeId {
    type Err = UnknownExchangeTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cusd_celo" => Ok(ExchangeId::CusdCelo),
            "creal_celo" => Ok(ExchangeId::CrealCelo),
            "ceur_celo" => Ok(ExchangeId::CeurCelo),
            other => Err(UnknownExchangeTag(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub u64);

// 1.4: millisecond timestamp. simulation time is derived from the timestep
// counter, wall-clock only stamps engine construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn from_timestep(timestep: u64, blocktime_seconds: u64) -> Self {
        Self((timestep * blocktime_seconds * 1000) as i64)
    }
}
