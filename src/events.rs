// 10.0: every state change the engine applies produces an event. used for
// audit trails and for reconstructing what a run did. the EventPayload enum
// lists all event types.

use crate::balance::Balance;
use crate::state::MentoBuckets;
use crate::types::{AccountId, ExchangeId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Account events
    AccountFunded(AccountFundedEvent),

    // Trade events
    TradeExecuted(TradeExecutedEvent),
    TradeSkipped(TradeSkippedEvent),

    // Bucket events
    BucketsReset(BucketsResetEvent),

    // Collateral provider events
    ProviderDeposit(ProviderDepositEvent),
    ProviderWithdrawal(ProviderWithdrawalEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountFundedEvent {
    pub account_id: AccountId,
    pub funded: Balance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeExecutedEvent {
    pub account_id: AccountId,
    pub exchange: ExchangeId,
    pub sell_amount: Decimal,
    pub buy_amount: Decimal,
    pub sell_reserve_asset: bool,
}

// a quote below the caller's minimum is an expected outcome, recorded rather
// than raised
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSkippedEvent {
    pub account_id: AccountId,
    pub exchange: ExchangeId,
    pub sell_amount: Decimal,
    pub min_buy_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketsResetEvent {
    pub exchange: ExchangeId,
    pub buckets: MentoBuckets,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDepositEvent {
    pub account_id: AccountId,
    pub exchange: ExchangeId,
    pub deposited_in_reserve_asset: Decimal,
    pub cp_tokens_minted: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderWithdrawalEvent {
    pub account_id: AccountId,
    pub exchange: ExchangeId,
    pub cp_tokens_burned: Decimal,
}
