//! Executes scenario steps against a module wired to nullable collaborators.

use crate::scenario::{Scenario, Step};
use serde::Serialize;
use stakemod_nullables::{NullClock, NullPlugin, NullPluginHandle, NullToken};
use stakemod_staking::{
    RoleTable, StakingConfig, StakingError, StakingEvent, StakingModule, Token, TokenError,
};
use stakemod_types::{Address, Role};
use stakemod_utils::format_window;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Staking(#[from] StakingError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("plugin {0} was not added by this scenario")]
    UnknownPlugin(Address),
}

/// The outcome of one step, printed as one JSON line.
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub op: &'static str,
    pub block: u64,
    pub time: u64,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Amount moved or paid, for steps that report one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u128>,
    pub events: Vec<StakingEvent>,
}

/// Final ledger state, printed after the last step.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub steps: usize,
    pub failed: usize,
    pub total_staked: u128,
    pub module_balance: u128,
    pub plugins: usize,
    pub stakes: HashMap<Address, u128>,
}

pub struct Simulator {
    clock: NullClock,
    token: Arc<NullToken>,
    roles: Arc<RoleTable>,
    module: StakingModule,
    plugins: HashMap<Address, NullPluginHandle>,
    admin: Address,
}

impl Simulator {
    /// A fresh module where `scenario.admin` holds every role.
    pub fn new(scenario: &Scenario, config: &StakingConfig) -> Result<Self, SimError> {
        let admin = scenario.admin;
        let token = Arc::new(NullToken::new(scenario.token));
        let roles = Arc::new(RoleTable::new(admin));
        for role in Role::ALL {
            roles.grant_role(&admin, role, admin)?;
        }
        let module = StakingModule::new(scenario.module, token.clone(), roles.clone(), config)?;
        info!(
            module = %scenario.module,
            %admin,
            gate = %format_window(config.withdrawal_delay, config.withdrawal_window),
            "simulator ready"
        );
        Ok(Self {
            clock: NullClock::new(scenario.start_block, scenario.start_time),
            token,
            roles,
            module,
            plugins: HashMap::new(),
            admin,
        })
    }

    /// Run every step. With `fail_fast`, stop after the first failure.
    pub fn run(&mut self, steps: &[Step], fail_fast: bool) -> Vec<StepReport> {
        let mut reports = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let report = self.step(index, step);
            let failed = !report.ok;
            reports.push(report);
            if failed && fail_fast {
                break;
            }
        }
        reports
    }

    pub fn step(&mut self, index: usize, step: &Step) -> StepReport {
        let block = self.clock.block().as_u64();
        let time = self.clock.now().as_secs();
        let result = self.apply(step);
        let events = self.module.drain_events();
        let (ok, error, amount) = match result {
            Ok(amount) => (true, None, amount),
            Err(e) => {
                warn!(step = index, op = step.name(), error = %e, "step failed");
                (false, Some(e.to_string()), None)
            }
        };
        debug!(step = index, op = step.name(), ok, events = events.len(), "step done");
        StepReport {
            step: index,
            op: step.name(),
            block,
            time,
            ok,
            error,
            amount,
            events,
        }
    }

    pub fn summary(&self, reports: &[StepReport]) -> Summary {
        Summary {
            steps: reports.len(),
            failed: reports.iter().filter(|r| !r.ok).count(),
            total_staked: self.module.total_staked(),
            module_balance: self.token.balance_of(&self.module.address()),
            plugins: self.module.n_plugins(),
            stakes: self
                .module
                .ledger()
                .stakers()
                .map(|(a, v)| (*a, *v))
                .collect(),
        }
    }

    #[cfg(test)]
    pub fn module(&self) -> &StakingModule {
        &self.module
    }

    #[cfg(test)]
    pub fn token(&self) -> &NullToken {
        &self.token
    }

    fn plugin(&self, address: &Address) -> Result<&NullPluginHandle, SimError> {
        self.plugins
            .get(address)
            .ok_or(SimError::UnknownPlugin(*address))
    }

    fn apply(&mut self, step: &Step) -> Result<Option<u128>, SimError> {
        let clock = &self.clock;
        let module = &mut self.module;
        match step {
            Step::Mint { to, amount } => {
                self.token.mint(to, *amount);
                Ok(Some(*amount))
            }
            Step::Approve { owner } => {
                self.token.approve(owner, &module.address(), u128::MAX)?;
                Ok(None)
            }
            Step::Grant { role, account } => {
                self.roles.grant_role(&self.admin, *role, *account)?;
                Ok(None)
            }
            Step::Revoke { role, account } => {
                self.roles.revoke_role(&self.admin, *role, account)?;
                Ok(None)
            }
            Step::Mine { blocks } => {
                clock.mine(*blocks);
                Ok(None)
            }
            Step::Advance { secs } => {
                clock.advance(*secs);
                Ok(None)
            }
            Step::Stake { account, amount } => {
                module.stake(&clock.ctx(*account), *amount)?;
                Ok(Some(*amount))
            }
            Step::StakeFor {
                caller,
                beneficiary,
                amount,
            } => {
                module.stake_for(&clock.ctx(*caller), *beneficiary, *amount)?;
                Ok(Some(*amount))
            }
            Step::RequestWithdrawal { account } => {
                module.request_withdrawal(&clock.ctx(*account));
                Ok(None)
            }
            Step::Exit { account } => Ok(Some(module.exit(&clock.ctx(*account))?)),
            Step::PartialExit { account, amount } => {
                module.partial_exit(&clock.ctx(*account), *amount)?;
                Ok(Some(*amount))
            }
            Step::Claim { account } => Ok(Some(module.claim(&clock.ctx(*account), &[])?)),
            Step::FullClaimAndExit { account } => {
                let receipt = module.full_claim_and_exit(&clock.ctx(*account), &[])?;
                Ok(Some(receipt.claimed + receipt.unstaked))
            }
            Step::PartialClaimAndExit { account, amount } => {
                let receipt = module.partial_claim_and_exit(&clock.ctx(*account), *amount, &[])?;
                Ok(Some(receipt.claimed + receipt.unstaked))
            }
            Step::ClaimFromPlugin { account, plugin } => Ok(Some(
                module.claim_from_individual_plugin(&clock.ctx(*account), plugin, &[])?,
            )),
            Step::ClaimAndExitFor {
                caller,
                account,
                recipient,
            } => {
                let receipt =
                    module.claim_and_exit_for(&clock.ctx(*caller), *account, *recipient, &[])?;
                Ok(Some(receipt.claimed + receipt.unstaked))
            }
            Step::Slash {
                caller,
                account,
                amount,
                collector,
            } => {
                module.slash(&clock.ctx(*caller), *account, *amount, *collector, &[])?;
                Ok(Some(*amount))
            }
            Step::SetWithdrawDelayAndWindow {
                caller,
                delay,
                window,
            } => {
                module.set_withdraw_delay_and_window(&clock.ctx(*caller), *delay, *window)?;
                info!(gate = %format_window(*delay, *window), "withdrawal gate updated");
                Ok(None)
            }
            Step::AddPlugin { caller, plugin } => {
                let (boxed, handle) = NullPlugin::new(*plugin)
                    .with_funding(self.token.clone())
                    .boxed();
                let index = module.add_plugin(&clock.ctx(*caller), boxed)?;
                self.plugins.insert(*plugin, handle);
                Ok(Some(index as u128))
            }
            Step::SetYield {
                plugin,
                account,
                amount,
            } => {
                self.plugin(plugin)?.set_yield(account, *amount);
                Ok(Some(*amount))
            }
            Step::SetPluginFailing { plugin, failing } => {
                self.plugin(plugin)?.set_reverting(*failing);
                Ok(None)
            }
            Step::DeactivatePlugin { plugin } => {
                self.plugin(plugin)?.set_deactivated(true);
                Ok(None)
            }
            Step::RemovePlugin { caller, index } => {
                let removed = module.remove_plugin(&clock.ctx(*caller), *index)?;
                self.plugins.remove(&removed.address());
                Ok(None)
            }
            Step::Rescue { caller, recipient } => {
                let token: &NullToken = &self.token;
                Ok(Some(module.rescue_tokens(&clock.ctx(*caller), token, *recipient)?))
            }
        }
    }
}
