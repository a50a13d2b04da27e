//! The staking module: the public surface tying ledger, gate, plugins,
//! token and roles together.
//!
//! Every mutating call follows the same order: validate everything (roles,
//! withdrawal gate, amounts, aux data, the pending balance change), run
//! plugin claims, move tokens, commit the ledger, notify plugins, queue
//! events. A call that returns `Err` changes neither the ledger nor the
//! event queue. Payouts plugins already made before a failing token
//! transfer stay paid.

use crate::access::AccessControl;
use crate::config::StakingConfig;
use crate::error::StakingError;
use crate::event::StakingEvent;
use crate::ledger::{BalanceUpdate, Ledger};
use crate::token::Token;
use crate::withdrawal::{WithdrawalBounds, WithdrawalGate, WithdrawalPolicy, WithdrawalState};
use serde::{Deserialize, Serialize};
use stakemod_plugins::{parse_aux_data, ClaimReport, Plugin, PluginRegistry};
use stakemod_types::{Address, BlockHeight, CallContext, Role, Timestamp};
use std::sync::Arc;
use tracing::{debug, info};

/// What a combined claim-and-exit call paid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitReceipt {
    /// Yield paid by plugins.
    pub claimed: u128,
    /// Stake returned from the module.
    pub unstaked: u128,
}

pub struct StakingModule {
    address: Address,
    token: Arc<dyn Token>,
    access: Arc<dyn AccessControl>,
    ledger: Ledger,
    gate: WithdrawalGate,
    plugins: PluginRegistry,
    pending_events: Vec<StakingEvent>,
}

impl StakingModule {
    /// Create a module holding its stake at `address`.
    pub fn new(
        address: Address,
        token: Arc<dyn Token>,
        access: Arc<dyn AccessControl>,
        config: &StakingConfig,
    ) -> Result<Self, StakingError> {
        config.validate()?;
        let mut gate = WithdrawalGate::new(config.bounds());
        let policy = config.initial_policy();
        if !policy.is_disabled() {
            gate.set_policy(policy.delay, policy.window)?;
        }
        info!(
            module = %address,
            token = %token.address(),
            delay = policy.delay,
            window = policy.window,
            "staking module created"
        );
        Ok(Self {
            address,
            token,
            access,
            ledger: Ledger::new(),
            gate,
            plugins: PluginRegistry::new(),
            pending_events: Vec::new(),
        })
    }

    // ── Staking ────────────────────────────────────────────────────────

    /// Lock `amount` of the caller's tokens.
    pub fn stake(&mut self, ctx: &CallContext, amount: u128) -> Result<(), StakingError> {
        self.stake_into(ctx, ctx.caller, amount)
    }

    /// Lock `amount` of the caller's tokens on behalf of `beneficiary`.
    pub fn stake_for(
        &mut self,
        ctx: &CallContext,
        beneficiary: Address,
        amount: u128,
    ) -> Result<(), StakingError> {
        self.access.check_role(Role::Migrator, &ctx.caller)?;
        self.stake_into(ctx, beneficiary, amount)
    }

    /// Start the withdrawal delay for the caller, replacing any earlier request.
    pub fn request_withdrawal(&mut self, ctx: &CallContext) {
        self.gate.request(ctx.caller, ctx.timestamp);
        debug!(account = %ctx.caller, at = %ctx.timestamp, "withdrawal requested");
        self.pending_events.push(StakingEvent::WithdrawalRequested {
            account: ctx.caller,
            requested_at: ctx.timestamp.as_secs(),
        });
    }

    /// Withdraw the caller's whole stake. Returns the amount withdrawn.
    pub fn exit(&mut self, ctx: &CallContext) -> Result<u128, StakingError> {
        let amount = self.ledger.staked_by(&ctx.caller);
        self.gated_exit(ctx, amount, false, &[]).map(|r| r.unstaked)
    }

    /// Withdraw part of the caller's stake.
    pub fn partial_exit(&mut self, ctx: &CallContext, amount: u128) -> Result<(), StakingError> {
        self.ensure_covered(&ctx.caller, amount)?;
        self.gated_exit(ctx, amount, false, &[]).map(|_| ())
    }

    /// Claim yield from every plugin. Returns the total paid.
    pub fn claim(&mut self, ctx: &CallContext, aux: &[u8]) -> Result<u128, StakingError> {
        self.gate.ensure_ready(&ctx.caller, ctx.timestamp)?;
        let slices = self.parse_aux_data(aux)?;
        let report = self.run_claims(&ctx.caller, &ctx.caller, &slices);
        let claimed = self.record_claims(&ctx.caller, report);
        self.gate.consume(&ctx.caller);
        Ok(claimed)
    }

    /// Claim from every plugin, then withdraw the whole stake.
    pub fn full_claim_and_exit(
        &mut self,
        ctx: &CallContext,
        aux: &[u8],
    ) -> Result<ExitReceipt, StakingError> {
        let amount = self.ledger.staked_by(&ctx.caller);
        self.gated_exit(ctx, amount, true, aux)
    }

    /// Claim from every plugin, then withdraw `amount` of the stake.
    pub fn partial_claim_and_exit(
        &mut self,
        ctx: &CallContext,
        amount: u128,
        aux: &[u8],
    ) -> Result<ExitReceipt, StakingError> {
        self.ensure_covered(&ctx.caller, amount)?;
        self.gated_exit(ctx, amount, true, aux)
    }

    /// Claim from one registered plugin. `aux` goes to it unparsed.
    pub fn claim_from_individual_plugin(
        &mut self,
        ctx: &CallContext,
        plugin: &Address,
        aux: &[u8],
    ) -> Result<u128, StakingError> {
        self.gate.ensure_ready(&ctx.caller, ctx.timestamp)?;
        let report = self
            .plugins
            .claim_from(plugin, &ctx.caller, &ctx.caller, aux)?;
        let claimed = self.record_claims(&ctx.caller, report);
        self.gate.consume(&ctx.caller);
        Ok(claimed)
    }

    /// Claim and withdraw everything `account` has, paying both to `recipient`.
    pub fn claim_and_exit_for(
        &mut self,
        ctx: &CallContext,
        account: Address,
        recipient: Address,
        aux: &[u8],
    ) -> Result<ExitReceipt, StakingError> {
        self.access.check_role(Role::Migrator, &ctx.caller)?;
        let slices = self.parse_aux_data(aux)?;
        let amount = self.ledger.staked_by(&account);
        let update = self.prepare_unstake(ctx, &account, amount)?;
        let report = self.run_claims(&account, &recipient, &slices);
        if let Some(update) = update {
            self.commit_unstake(&update, &recipient)?;
        }
        let claimed = self.record_claims(&account, report);
        Ok(ExitReceipt {
            claimed,
            unstaked: amount,
        })
    }

    // ── Slashing ───────────────────────────────────────────────────────

    /// Confiscate `amount` of `account`'s stake and send it to `collector`.
    ///
    /// Outstanding yield is claimed for the account first, so the reduced
    /// balance does not cost it rewards it had already earned.
    pub fn slash(
        &mut self,
        ctx: &CallContext,
        account: Address,
        amount: u128,
        collector: Address,
        aux: &[u8],
    ) -> Result<(), StakingError> {
        self.access.check_role(Role::Slasher, &ctx.caller)?;
        let slices = self.parse_aux_data(aux)?;
        let update = self.prepare_unstake(ctx, &account, amount)?;
        let report = self.run_claims(&account, &account, &slices);
        if let Some(update) = update {
            self.commit_unstake(&update, &collector)?;
        }
        self.record_claims(&account, report);
        info!(%account, amount, %collector, "stake slashed");
        self.pending_events.push(StakingEvent::Slashed {
            account,
            amount,
            collector,
        });
        Ok(())
    }

    pub fn set_withdraw_delay_and_window(
        &mut self,
        ctx: &CallContext,
        delay: u64,
        window: u64,
    ) -> Result<(), StakingError> {
        self.access.check_role(Role::Slasher, &ctx.caller)?;
        self.gate.set_policy(delay, window)?;
        info!(delay, window, "withdrawal delay and window changed");
        self.pending_events
            .push(StakingEvent::WithdrawDelayAndWindowChanged { delay, window });
        Ok(())
    }

    // ── Plugins ────────────────────────────────────────────────────────

    /// Register a plugin. Returns its index.
    pub fn add_plugin(
        &mut self,
        ctx: &CallContext,
        plugin: Box<dyn Plugin>,
    ) -> Result<usize, StakingError> {
        self.access.check_role(Role::PluginEditor, &ctx.caller)?;
        let address = plugin.address();
        let index = self.plugins.add(plugin)?;
        info!(plugin = %address, index, "plugin added");
        self.pending_events.push(StakingEvent::PluginAdded {
            plugin: address,
            index,
        });
        Ok(index)
    }

    /// Unregister the deactivated plugin at `index` and hand it back.
    ///
    /// The last plugin takes over the freed index.
    pub fn remove_plugin(
        &mut self,
        ctx: &CallContext,
        index: usize,
    ) -> Result<Box<dyn Plugin>, StakingError> {
        self.access.check_role(Role::PluginEditor, &ctx.caller)?;
        let removed = self.plugins.remove(index)?;
        let address = removed.address();
        info!(plugin = %address, index, "plugin removed");
        self.pending_events
            .push(StakingEvent::PluginRemoved { plugin: address });
        Ok(removed)
    }

    /// Split an aux-data blob into one slice per registered plugin.
    pub fn parse_aux_data(&self, raw: &[u8]) -> Result<Vec<Vec<u8>>, StakingError> {
        Ok(parse_aux_data(&self.plugins, raw)?)
    }

    // ── Recovery ───────────────────────────────────────────────────────

    /// Send tokens held by the module that nobody staked to `recipient`.
    ///
    /// For the staking token only the surplus over the total stake moves.
    /// Returns the amount sent.
    pub fn rescue_tokens(
        &mut self,
        ctx: &CallContext,
        token: &dyn Token,
        recipient: Address,
    ) -> Result<u128, StakingError> {
        self.access.check_role(Role::Recovery, &ctx.caller)?;
        let held = token.balance_of(&self.address);
        let amount = if token.address() == self.token.address() {
            held.saturating_sub(self.ledger.total_staked())
        } else {
            held
        };
        if amount == 0 {
            return Ok(0);
        }
        token.transfer(&self.address, &recipient, amount)?;
        info!(token = %token.address(), %recipient, amount, "tokens rescued");
        self.pending_events.push(StakingEvent::TokensRescued {
            token: token.address(),
            recipient,
            amount,
        });
        Ok(amount)
    }

    // ── Events ─────────────────────────────────────────────────────────

    /// Take all events queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<StakingEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ── Views ──────────────────────────────────────────────────────────

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn token_address(&self) -> Address {
        self.token.address()
    }

    pub fn staked_by(&self, account: &Address) -> u128 {
        self.ledger.staked_by(account)
    }

    /// Stake held by `account` at the end of `block`, which must be before `current`.
    pub fn staked_by_at(
        &self,
        account: &Address,
        block: BlockHeight,
        current: BlockHeight,
    ) -> Result<u128, StakingError> {
        self.ledger.staked_by_at(account, block, current)
    }

    pub fn balance_of(&self, account: &Address) -> u128 {
        self.staked_by(account)
    }

    pub fn balance_of_at(
        &self,
        account: &Address,
        block: BlockHeight,
        current: BlockHeight,
    ) -> Result<u128, StakingError> {
        self.staked_by_at(account, block, current)
    }

    pub fn total_staked(&self) -> u128 {
        self.ledger.total_staked()
    }

    pub fn total_supply(&self) -> u128 {
        self.ledger.total_staked()
    }

    pub fn total_supply_at(
        &self,
        block: BlockHeight,
        current: BlockHeight,
    ) -> Result<u128, StakingError> {
        self.ledger.total_staked_at(block, current)
    }

    /// Yield `account` could claim now. Plugins that fail count as zero.
    pub fn claimable(&self, account: &Address, aux: &[u8]) -> Result<u128, StakingError> {
        let slices = self.parse_aux_data(aux)?;
        Ok(self.plugins.claimable(account, &slices))
    }

    pub fn n_plugins(&self) -> usize {
        self.plugins.len()
    }

    pub fn plugin_at(&self, index: usize) -> Option<Address> {
        self.plugins.address_at(index)
    }

    pub fn plugin_index(&self, plugin: &Address) -> Option<usize> {
        self.plugins.index_of(plugin)
    }

    pub fn has_plugin(&self, plugin: &Address) -> bool {
        self.plugins.contains(plugin)
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn withdrawal_state(&self, account: &Address, now: Timestamp) -> WithdrawalState {
        self.gate.state(account, now)
    }

    pub fn withdrawal_policy(&self) -> WithdrawalPolicy {
        *self.gate.policy()
    }

    pub fn withdrawal_delay(&self) -> u64 {
        self.gate.policy().delay
    }

    pub fn withdrawal_window(&self) -> u64 {
        self.gate.policy().window
    }

    pub fn withdrawal_bounds(&self) -> WithdrawalBounds {
        *self.gate.bounds()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn stake_into(
        &mut self,
        ctx: &CallContext,
        beneficiary: Address,
        amount: u128,
    ) -> Result<(), StakingError> {
        if amount == 0 {
            return Err(StakingError::ZeroAmount);
        }
        let update = self
            .ledger
            .prepare_increase(&beneficiary, amount, ctx.block)?;
        self.token
            .transfer_from(&self.address, &ctx.caller, &self.address, amount)?;
        self.ledger.apply(&update)?;
        self.after_balance_change(&update);
        Ok(())
    }

    /// Withdraw `amount` of the caller's stake, claiming first if `with_claims`.
    fn gated_exit(
        &mut self,
        ctx: &CallContext,
        amount: u128,
        with_claims: bool,
        aux: &[u8],
    ) -> Result<ExitReceipt, StakingError> {
        let account = ctx.caller;
        self.gate.ensure_ready(&account, ctx.timestamp)?;
        let slices = self.parse_aux_data(aux)?;
        let update = self.prepare_unstake(ctx, &account, amount)?;
        let report = with_claims.then(|| self.run_claims(&account, &account, &slices));
        if let Some(update) = update {
            self.commit_unstake(&update, &account)?;
        }
        let claimed = report
            .map(|report| self.record_claims(&account, report))
            .unwrap_or(0);
        self.gate.consume(&account);
        Ok(ExitReceipt {
            claimed,
            unstaked: amount,
        })
    }

    fn ensure_covered(&self, account: &Address, amount: u128) -> Result<(), StakingError> {
        let available = self.ledger.staked_by(account);
        if amount > available {
            return Err(StakingError::InsufficientFunds {
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    /// Validate a withdrawal of `amount` from `account`. `None` for a zero amount.
    fn prepare_unstake(
        &self,
        ctx: &CallContext,
        account: &Address,
        amount: u128,
    ) -> Result<Option<BalanceUpdate>, StakingError> {
        if amount == 0 {
            return Ok(None);
        }
        if self.ledger.last_mutation_block(account) == Some(ctx.block) {
            return Err(StakingError::SameUnitExit {
                account: *account,
                block: ctx.block,
            });
        }
        self.ledger
            .prepare_decrease(account, amount, ctx.block)
            .map(Some)
    }

    fn commit_unstake(
        &mut self,
        update: &BalanceUpdate,
        recipient: &Address,
    ) -> Result<(), StakingError> {
        let amount = update.before.saturating_sub(update.after);
        self.token.transfer(&self.address, recipient, amount)?;
        self.ledger.apply(update)?;
        self.after_balance_change(update);
        Ok(())
    }

    fn after_balance_change(&mut self, update: &BalanceUpdate) {
        let report = self.plugins.notify_stake_change(&update.as_stake_change());
        for failure in report.failures {
            self.pending_events
                .push(StakingEvent::StakeChangeNotificationFailed {
                    plugin: failure.plugin,
                });
        }
        self.pending_events.push(StakingEvent::StakeChanged {
            account: update.account,
            old_stake: update.before,
            new_stake: update.after,
        });
    }

    /// Claim fan-out. Its events are queued by [`Self::record_claims`] once
    /// the rest of the call has succeeded.
    fn run_claims(&mut self, account: &Address, to: &Address, slices: &[Vec<u8>]) -> ClaimReport {
        self.plugins.claim_all(account, to, slices)
    }

    fn record_claims(&mut self, account: &Address, report: ClaimReport) -> u128 {
        for failure in report.failures {
            self.pending_events.push(StakingEvent::PluginClaimFailed {
                plugin: failure.plugin,
            });
        }
        if report.total > 0 {
            self.pending_events.push(StakingEvent::Claimed {
                account: *account,
                amount: report.total,
            });
        }
        report.total
    }
}
