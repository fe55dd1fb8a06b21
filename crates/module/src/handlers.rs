//! Call handlers for the escrow module.
//!
//! These functions implement the business logic for each call type. A
//! handler either applies all of its changes or returns an error having
//! changed nothing. Payments are never executed here: handlers return them
//! and [`execute`] hands them to the value-transfer sink after the state
//! change is committed.

use escrow_types::{
    AccountId, DbId, Height, Manifest, Money, Payment, PaymentReason, QueryId, QueryKey, ResultId,
    MAX_BIPS,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::call::EscrowCall;
use crate::collaborators::{DatabaseRegistry, HostListing, ValueTransfer};
use crate::error::EscrowError;
use crate::settlement::{self, FinalizedQuery};
use crate::state::EscrowState;

/// Context provided by the runtime for each call.
#[derive(Clone, Debug)]
pub struct CallContext {
    /// Sender of the transaction
    pub sender: AccountId,
    /// Current block height
    pub block_height: Height,
    /// Value attached to the call (deposits, fees, storage)
    pub value: Money,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, EscrowError>;

/// What a successful call produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutput {
    Deployed(DbId),
    ApiRegistered,
    Staked { balance: Money },
    Withdrawn { amount: Money },
    FeeEscrowed { total: Money },
    ResultSubmitted { deadline: Height },
    Claimed { amount: Money, settled: Vec<FinalizedQuery> },
    Finalized(Vec<FinalizedQuery>),
    Recovered { amount: Money },
}

/// Output of a committed call plus the payments it scheduled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallReceipt {
    pub output: CallOutput,
    pub payments: Vec<Payment>,
}

impl CallReceipt {
    fn new(output: CallOutput) -> Self {
        Self {
            output,
            payments: Vec::new(),
        }
    }

    fn with_payment(output: CallOutput, payment: Option<Payment>) -> Self {
        Self {
            output,
            payments: payment.into_iter().collect(),
        }
    }
}

fn require_database(state: &EscrowState, db: DbId) -> HandlerResult<()> {
    if !state.registry.exists(db) {
        return Err(EscrowError::DatabaseNotFound(db));
    }
    Ok(())
}

fn require_min_stake(state: &EscrowState, db: DbId, account: &AccountId) -> HandlerResult<()> {
    let deposit = state.deposit_of(db, account);
    if deposit < state.config.min_stake {
        return Err(EscrowError::InsufficientStake {
            required: state.config.min_stake,
            got: deposit,
        });
    }
    Ok(())
}

/// Handle Deploy call.
pub fn handle_deploy(
    state: &mut EscrowState,
    ctx: &CallContext,
    mut manifest: Manifest,
) -> HandlerResult<DbId> {
    if ctx.value < state.config.storage_cost {
        return Err(EscrowError::InsufficientStorageFee {
            required: state.config.storage_cost,
            got: ctx.value,
        });
    }
    if manifest.royalty_bips > MAX_BIPS {
        return Err(EscrowError::InvalidRoyalty(manifest.royalty_bips));
    }
    if manifest.code_cid.is_empty() {
        return Err(EscrowError::EmptyCodeCid);
    }

    if manifest.author.is_empty() {
        manifest.author = ctx.sender.clone();
    }

    let db = state
        .registry
        .register(ctx.sender.clone(), manifest, ctx.value);
    info!("Deployed database {} for {}", db, ctx.sender);
    Ok(db)
}

/// Handle RegisterApi call.
pub fn handle_register_api(
    state: &mut EscrowState,
    ctx: &CallContext,
    db: DbId,
    uri: String,
) -> HandlerResult<()> {
    require_database(state, db)?;
    require_min_stake(state, db, &ctx.sender)?;

    if uri.is_empty() {
        state.registry.remove_listing(db, &ctx.sender);
    } else {
        state.registry.set_listing(db, ctx.sender.clone(), uri);
    }
    Ok(())
}

/// Handle Stake call.
///
/// A deposit below the minimum is accepted; the minimum is only enforced
/// when the stake is used.
pub fn handle_stake(state: &mut EscrowState, ctx: &CallContext, db: DbId) -> HandlerResult<Money> {
    require_database(state, db)?;
    if ctx.value == 0 {
        return Err(EscrowError::ZeroAmount);
    }

    let balance = state.add_stake(db, &ctx.sender, ctx.value)?;
    debug!("Deposit of {} on database {} is now {}", ctx.sender, db, balance);
    Ok(balance)
}

/// Handle WithdrawStake call.
pub fn handle_withdraw_stake(
    state: &mut EscrowState,
    ctx: &CallContext,
    db: DbId,
) -> HandlerResult<Payment> {
    require_database(state, db)?;
    if state.deposit_of(db, &ctx.sender) == 0 {
        return Err(EscrowError::NoDeposit);
    }

    let amount = state.take_deposit(db, &ctx.sender);
    state.registry.remove_listing(db, &ctx.sender);

    info!("Returning deposit of {} to {} on database {}", amount, ctx.sender, db);
    Ok(Payment {
        to: ctx.sender.clone(),
        amount,
        reason: PaymentReason::StakeWithdrawal,
    })
}

/// Handle EscrowFee call.
pub fn handle_escrow_fee(
    state: &mut EscrowState,
    ctx: &CallContext,
    db: DbId,
    qid: QueryId,
    deadline: Height,
) -> HandlerResult<Money> {
    require_database(state, db)?;
    if ctx.value == 0 {
        return Err(EscrowError::ZeroAmount);
    }
    if deadline <= ctx.block_height {
        return Err(EscrowError::FeeExpired {
            deadline,
            height: ctx.block_height,
        });
    }

    let key = QueryKey { db, qid };
    let total = state.escrow_fee(&key, ctx.value, deadline)?;
    debug!(
        "Escrowed {} for query {} (total {}, deadline {})",
        ctx.value, key, total, deadline
    );
    Ok(total)
}

/// Handle SubmitResult call.
///
/// Returns the query's deadline. The first submission for a query without
/// a fee opens it with the default settlement window.
pub fn handle_submit_result(
    state: &mut EscrowState,
    ctx: &CallContext,
    db: DbId,
    qid: QueryId,
    result: ResultId,
) -> HandlerResult<Height> {
    require_database(state, db)?;
    require_min_stake(state, db, &ctx.sender)?;

    let key = QueryKey { db, qid };
    if let Some(query) = state.pending_query(&key) {
        if query.is_expired(ctx.block_height) {
            return Err(EscrowError::SettlementTimedOut {
                deadline: query.deadline,
                height: ctx.block_height,
            });
        }
    }

    let window = state.config.settle_window;
    let deadline = state.ensure_deadline(&key, ctx.block_height, window)?;
    debug!("{} voted {} on query {}", ctx.sender, result, key);
    state.record_vote(&key, ctx.sender.clone(), result);
    Ok(deadline)
}

/// Handle Claim call.
///
/// Settles every expired query first, so the caller's balance includes
/// anything that became final since the last sweep.
pub fn handle_claim(
    state: &mut EscrowState,
    ctx: &CallContext,
) -> HandlerResult<(Vec<FinalizedQuery>, Option<Payment>)> {
    state.atomically(|staged| {
        let settled = settlement::sweep(staged, ctx.block_height)?;
        let amount = staged.take_settled(&ctx.sender)?;
        let payment = (amount > 0).then(|| Payment {
            to: ctx.sender.clone(),
            amount,
            reason: PaymentReason::Claim,
        });
        if amount > 0 {
            info!("{} claimed {}", ctx.sender, amount);
        }
        Ok((settled, payment))
    })
}

/// Handle Finalize call.
pub fn handle_finalize(
    state: &mut EscrowState,
    ctx: &CallContext,
) -> HandlerResult<Vec<FinalizedQuery>> {
    settlement::finalize_all(state, ctx.block_height)
}

/// Handle Recover call.
pub fn handle_recover(
    state: &mut EscrowState,
    ctx: &CallContext,
    amount: Money,
    target: AccountId,
) -> HandlerResult<Payment> {
    if ctx.sender != state.config.owner {
        return Err(EscrowError::NotAuthorized);
    }
    if amount == 0 {
        return Err(EscrowError::ZeroAmount);
    }

    state.take_from_pool(amount)?;
    info!("Recovered {} of slashed funds to {}", amount, target);
    Ok(Payment {
        to: target,
        amount,
        reason: PaymentReason::Recovery,
    })
}

/// Route a call to its handler.
///
/// The handler runs against a staged copy of the state, which replaces the
/// live state only if the handler succeeds.
pub fn dispatch(
    state: &mut EscrowState,
    ctx: &CallContext,
    call: EscrowCall,
) -> HandlerResult<CallReceipt> {
    state.atomically(|staged| route(staged, ctx, call))
}

fn route(state: &mut EscrowState, ctx: &CallContext, call: EscrowCall) -> HandlerResult<CallReceipt> {
    let receipt = match call {
        EscrowCall::Deploy { manifest } => {
            CallReceipt::new(CallOutput::Deployed(handle_deploy(state, ctx, manifest)?))
        }
        EscrowCall::RegisterApi { db, uri } => {
            handle_register_api(state, ctx, db, uri)?;
            CallReceipt::new(CallOutput::ApiRegistered)
        }
        EscrowCall::Stake { db } => {
            let balance = handle_stake(state, ctx, db)?;
            CallReceipt::new(CallOutput::Staked { balance })
        }
        EscrowCall::WithdrawStake { db } => {
            let payment = handle_withdraw_stake(state, ctx, db)?;
            CallReceipt::with_payment(
                CallOutput::Withdrawn {
                    amount: payment.amount,
                },
                Some(payment),
            )
        }
        EscrowCall::EscrowFee { db, qid, deadline } => {
            let total = handle_escrow_fee(state, ctx, db, qid, deadline)?;
            CallReceipt::new(CallOutput::FeeEscrowed { total })
        }
        EscrowCall::SubmitResult { db, qid, result } => {
            let deadline = handle_submit_result(state, ctx, db, qid, result)?;
            CallReceipt::new(CallOutput::ResultSubmitted { deadline })
        }
        EscrowCall::Claim => {
            let (settled, payment) = handle_claim(state, ctx)?;
            let amount = payment.as_ref().map(|p| p.amount).unwrap_or(0);
            CallReceipt::with_payment(CallOutput::Claimed { amount, settled }, payment)
        }
        EscrowCall::Finalize => CallReceipt::new(CallOutput::Finalized(handle_finalize(state, ctx)?)),
        EscrowCall::Recover { amount, target } => {
            let payment = handle_recover(state, ctx, amount, target)?;
            CallReceipt::with_payment(CallOutput::Recovered { amount }, Some(payment))
        }
    };
    Ok(receipt)
}

/// Dispatch a call and schedule its payments once the state change is committed.
pub fn execute(
    state: &mut EscrowState,
    ctx: &CallContext,
    call: EscrowCall,
    transfer: &mut impl ValueTransfer,
) -> HandlerResult<CallOutput> {
    let receipt = dispatch(state, ctx, call)?;
    for payment in receipt.payments {
        transfer.schedule_payment(payment);
    }
    Ok(receipt.output)
}
