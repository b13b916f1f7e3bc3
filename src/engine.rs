// 9.0 engine.rs: thin step harness around the pure core. owns the
// authoritative state snapshot, the accounts, and the event log. every
// operation computes its writes against the current snapshot, materializes
// them through the conflict-checked diff, and only then commits. single
// threaded by construction; the duplicate-path check is the only concurrency
// guard and it detects conflicts, it does not resolve them.

use crate::account::{Account, AccountError};
use crate::balance::Balance;
use crate::collateral_provider::{CollateralProviderContract, CollateralProviderError};
use crate::config::MentoConfig;
use crate::events::{
    AccountFundedEvent, BucketsResetEvent, Event, EventId, EventPayload, ProviderDepositEvent,
    ProviderWithdrawalEvent, TradeExecutedEvent, TradeSkippedEvent,
};
use crate::exchange::{ExchangeError, MentoExchangeGenerator};
use crate::mutation::{MutationError, StateMutation, StateWrite};
use crate::state::SimulationState;
use crate::types::{AccountId, AssetId, ExchangeId, Timestamp};
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("account {0:?} not found")]
    AccountNotFound(AccountId),

    #[error("account error: {0}")]
    Account(#[from] AccountError),

    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("collateral provider error: {0}")]
    CollateralProvider(#[from] CollateralProviderError),

    #[error("mutation error: {0}")]
    Mutation(#[from] MutationError),
}

// 9.1: what a caller gets back from a filled trade.
#[derive(Debug, Clone)]
pub struct TradeReceipt {
    pub sell_amount: Decimal,
    pub buy_amount: Decimal,
    pub sell_reserve_asset: bool,
    pub account_delta: Balance,
    pub reserve_delta: Balance,
}

#[derive(Debug)]
pub struct SimulationEngine {
    generator: MentoExchangeGenerator,
    contracts: HashMap<ExchangeId, CollateralProviderContract>,
    state: SimulationState,
    accounts: HashMap<AccountId, Account>,
    events: Vec<Event>,
    next_event_id: u64,
    next_account_id: u64,
    blocktime_seconds: u64,
    // wall-clock construction time, metadata only
    started_at: Timestamp,
}

impl SimulationEngine {
    pub fn new(config: MentoConfig, initial_state: SimulationState) -> Self {
        let blocktime_seconds = config.blocktime_seconds;
        let contracts = config
            .exchanges
            .iter()
            .map(|(exchange, exchange_config)| {
                (
                    *exchange,
                    CollateralProviderContract::new(*exchange, exchange_config.clone()),
                )
            })
            .collect();

        Self {
            generator: MentoExchangeGenerator::new(config),
            contracts,
            state: initial_state,
            accounts: HashMap::new(),
            events: Vec::new(),
            next_event_id: 1,
            next_account_id: 1,
            blocktime_seconds,
            started_at: Timestamp::now(),
        }
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn account(&self, account_id: AccountId) -> Option<&Account> {
        self.accounts.get(&account_id)
    }

    pub fn accounts_iter(&self) -> impl Iterator<Item = (&AccountId, &Account)> {
        self.accounts.iter()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn generator(&self) -> &MentoExchangeGenerator {
        &self.generator
    }

    // simulation clock derived from the timestep counter
    pub fn now(&self) -> Timestamp {
        Timestamp::from_timestep(self.state.timestep, self.blocktime_seconds)
    }

    pub fn create_account(&mut self, name: impl Into<String>, balance: Balance) -> AccountId {
        let id = AccountId(self.next_account_id);
        self.next_account_id += 1;

        let account = Account::new(id, name, balance.clone(), self.now());
        self.accounts.insert(id, account);

        self.emit(EventPayload::AccountFunded(AccountFundedEvent {
            account_id: id,
            funded: balance,
        }));
        id
    }

    /// Advance one timestep and run the bucket policy for every active
    /// exchange. Runs exactly once per step, independent of trades.
    pub fn step(&mut self) -> Result<(), EngineError> {
        self.state.timestep += 1;

        let mutation = self.generator.bucket_update(&self.state)?;
        let diff = mutation.to_diff(&self.state)?;
        self.state = diff.apply(&self.state);

        let resets: Vec<ExchangeId> = self
            .generator
            .active_exchanges()
            .filter(|exchange| {
                self.generator
                    .buckets_should_be_reset(*exchange, &self.state)
                    .unwrap_or(false)
            })
            .collect();
        for exchange in resets {
            if let Some(buckets) = self.state.buckets(exchange) {
                self.emit(EventPayload::BucketsReset(BucketsResetEvent {
                    exchange,
                    buckets: *buckets,
                }));
            }
        }

        Ok(())
    }

    /// Execute a sell against an exchange for an account.
    ///
    /// Returns `Ok(None)` when the quote lands below `min_buy_amount`; the
    /// trade is skipped and recorded, nothing changes. On a fill the account
    /// delta, reserve delta, and state writes all commit together.
    pub fn execute_trade(
        &mut self,
        account_id: AccountId,
        exchange: ExchangeId,
        sell_amount: Decimal,
        sell_reserve_asset: bool,
        min_buy_amount: Decimal,
    ) -> Result<Option<TradeReceipt>, EngineError> {
        if !self.accounts.contains_key(&account_id) {
            return Err(EngineError::AccountNotFound(account_id));
        }

        let quote = self.generator.get_buy_amount(
            exchange,
            sell_amount,
            sell_reserve_asset,
            &self.state,
            min_buy_amount,
        )?;
        if quote.is_none() {
            self.emit(EventPayload::TradeSkipped(TradeSkippedEvent {
                account_id,
                exchange,
                sell_amount,
                min_buy_amount,
            }));
            return Ok(None);
        }

        let settlement =
            self.generator
                .exchange(exchange, sell_amount, sell_reserve_asset, &self.state)?;

        let next_reserve = self.state.reserve_balance.clone() + settlement.reserve_delta.clone();
        let next_supply =
            self.state.floating_supply.clone() + stable_flow(&settlement.account_delta);

        let mutation = settlement.mutation
            + StateMutation::new()
                .add(StateWrite::ReserveBalance(next_reserve))
                .add(StateWrite::FloatingSupply(next_supply));
        let diff = mutation.to_diff(&self.state)?;

        // the account check runs before anything commits, so a rejected
        // trade leaves no partial state behind
        let account = self
            .accounts
            .get_mut(&account_id)
            .ok_or(EngineError::AccountNotFound(account_id))?;
        account.apply_delta(settlement.account_delta.clone())?;

        self.state = diff.apply(&self.state);

        self.emit(EventPayload::TradeExecuted(TradeExecutedEvent {
            account_id,
            exchange,
            sell_amount,
            buy_amount: settlement.buy_amount,
            sell_reserve_asset,
        }));

        Ok(Some(TradeReceipt {
            sell_amount,
            buy_amount: settlement.buy_amount,
            sell_reserve_asset,
            account_delta: settlement.account_delta,
            reserve_delta: settlement.reserve_delta,
        }))
    }

    /// Deposit into an exchange's collateral pool. Returns the claim tokens
    /// minted to the depositor.
    pub fn deposit_collateral(
        &mut self,
        account_id: AccountId,
        exchange: ExchangeId,
        total_in_reserve_asset: Decimal,
    ) -> Result<Decimal, EngineError> {
        let contract = self
            .contracts
            .get(&exchange)
            .ok_or(EngineError::Exchange(ExchangeError::UnknownExchange(
                exchange,
            )))?;

        let (next_provider, account_delta) =
            contract.deposit(&self.state, total_in_reserve_asset)?;
        let minted = account_delta.get(AssetId::CpToken);

        let mutation = StateMutation::new().add(StateWrite::CollateralProvider(
            exchange,
            next_provider,
        ));
        let diff = mutation.to_diff(&self.state)?;

        let account = self
            .accounts
            .get_mut(&account_id)
            .ok_or(EngineError::AccountNotFound(account_id))?;
        account.apply_delta(account_delta)?;

        self.state = diff.apply(&self.state);

        self.emit(EventPayload::ProviderDeposit(ProviderDepositEvent {
            account_id,
            exchange,
            deposited_in_reserve_asset: total_in_reserve_asset,
            cp_tokens_minted: minted,
        }));

        Ok(minted)
    }

    /// Burn claim tokens against an exchange's collateral pool. Returns the
    /// assets credited back to the account.
    pub fn withdraw_collateral(
        &mut self,
        account_id: AccountId,
        exchange: ExchangeId,
        cp_tokens: Decimal,
    ) -> Result<Balance, EngineError> {
        let contract = self
            .contracts
            .get(&exchange)
            .ok_or(EngineError::Exchange(ExchangeError::UnknownExchange(
                exchange,
            )))?;

        let (next_provider, account_delta) = contract.withdraw(&self.state, cp_tokens)?;

        let mutation = StateMutation::new().add(StateWrite::CollateralProvider(
            exchange,
            next_provider,
        ));
        let diff = mutation.to_diff(&self.state)?;

        let account = self
            .accounts
            .get_mut(&account_id)
            .ok_or(EngineError::AccountNotFound(account_id))?;
        account.apply_delta(account_delta.clone())?;

        self.state = diff.apply(&self.state);

        self.emit(EventPayload::ProviderWithdrawal(ProviderWithdrawalEvent {
            account_id,
            exchange,
            cp_tokens_burned: cp_tokens,
        }));

        Ok(account_delta)
    }

    fn emit(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.now(), payload);
        self.next_event_id += 1;
        self.events.push(event);
    }
}

// stable-denominated entries of a delta; the part that moves floating supply
fn stable_flow(delta: &Balance) -> Balance {
    delta
        .iter()
        .filter_map(|(asset, amount)| match asset {
            AssetId::Stable(_) => Some((*asset, *amount)),
            _ => None,
        })
        .collect()
}
