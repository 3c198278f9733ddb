//! Ledger operation planning.
//!
//! Planners turn an intent (buy N keys, claim) plus the current snapshots
//! into the ordered operation list the caller submits atomically as one
//! transaction. Business-rule inapplicability ("round not open", "nothing to
//! claim") is a typed [`Plan::NotApplicable`] so callers can render a
//! disabled state; only malformed input and integrity faults are errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lastkey_types::constants::MAX_KEYS_PER_PURCHASE;
use lastkey_types::{Address, IntegrityError, PlayerRecord, RoundSnapshot};

use crate::{payout, phase, pricing};

/// One ledger instruction, in planner order. Serialized into the unsigned
/// bundle handed to the external signer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LedgerOp {
    /// Create the player record if absent (create-if-absent on the ledger
    /// side, so planning it twice is harmless).
    Register { player: Address },
    /// Finalize a stale-round position: pays out the old round's dividends
    /// and winner prize and resets the record for re-entry.
    SettleRound { round: u64 },
    /// Purchase keys in the current round. `max_cost_lamports` is the cost at
    /// the snapshot's supply, submitted as the slippage bound.
    BuyKeys {
        round: u64,
        keys: u64,
        is_agent: bool,
        referrer: Option<Address>,
        max_cost_lamports: u64,
    },
    /// Claim dividends and, when eligible, the winner prize. The program
    /// pays both in one instruction; the planner never splits them.
    ClaimPayout { round: u64 },
    /// Claim accrued referral earnings; valid in any phase.
    ClaimReferral { round: u64 },
}

/// Why a plan is not applicable. Not an error: the request was well-formed,
/// the game state just doesn't admit the action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    RoundNotOpen,
    NotRegistered,
    NothingToClaim,
}

/// Result of planning: an ordered operation list, or a typed "no".
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Plan {
    Ready(Vec<LedgerOp>),
    NotApplicable(Reason),
}

impl Plan {
    pub fn ops(&self) -> Option<&[LedgerOp]> {
        match self {
            Plan::Ready(ops) => Some(ops),
            Plan::NotApplicable(_) => None,
        }
    }
}

/// Input-validation and integrity faults. Never used for expected business
/// conditions — those are [`Plan::NotApplicable`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("no round snapshot available")]
    MissingSnapshot,
    #[error("requested key count {0} outside 1..={MAX_KEYS_PER_PURCHASE}")]
    KeyCountOutOfRange(u64),
    #[error("players cannot refer themselves")]
    SelfReferral,
    #[error("key cost overflows lamport arithmetic")]
    CostOverflow,
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

/// Plan a buy of `requested_keys` keys for `buyer`.
///
/// Ordering invariant: a stale-round position is settled before the buy so
/// the purchase can never credit the wrong round's dividend pool, and an
/// absent record is registered before the buy.
pub fn plan_buy(
    snapshot: Option<&RoundSnapshot>,
    record: Option<&PlayerRecord>,
    buyer: &Address,
    requested_keys: u64,
    is_agent: bool,
    referrer: Option<&Address>,
    now: i64,
) -> Result<Plan, PlanError> {
    let snapshot = snapshot.ok_or(PlanError::MissingSnapshot)?;
    if requested_keys == 0 || requested_keys > MAX_KEYS_PER_PURCHASE {
        return Err(PlanError::KeyCountOutOfRange(requested_keys));
    }
    if referrer.is_some_and(|r| r == buyer) {
        return Err(PlanError::SelfReferral);
    }
    snapshot.config.validate()?;

    if !phase::resolve(snapshot.active, snapshot.timer_end, now).is_open() {
        return Ok(Plan::NotApplicable(Reason::RoundNotOpen));
    }

    let mut ops = Vec::with_capacity(2);
    match record {
        Some(record) if record.round != snapshot.round && record.keys > 0 => {
            ops.push(LedgerOp::SettleRound {
                round: record.round,
            });
        }
        Some(_) => {}
        None => {
            ops.push(LedgerOp::Register {
                player: buyer.clone(),
            });
        }
    }

    // A referrer is linked exactly once; after that the stored referrer wins
    // and a conflicting argument is dropped rather than rejected.
    let referrer = match record.and_then(|r| r.referrer.as_ref()) {
        Some(_) => None,
        None => referrer.cloned(),
    };

    let max_cost_lamports = pricing::cumulative_cost(
        snapshot.total_keys,
        requested_keys,
        snapshot.config.base_price_lamports,
        snapshot.config.price_increment_lamports,
    )
    .ok_or(PlanError::CostOverflow)?;

    ops.push(LedgerOp::BuyKeys {
        round: snapshot.round,
        keys: requested_keys,
        is_agent,
        referrer,
        max_cost_lamports,
    });
    Ok(Plan::Ready(ops))
}

/// Plan a claim for the record's owner: dividends/winner prize once the
/// round is over, plus referral earnings in any phase.
pub fn plan_claim(
    snapshot: Option<&RoundSnapshot>,
    record: Option<&PlayerRecord>,
    now: i64,
) -> Result<Plan, PlanError> {
    let snapshot = snapshot.ok_or(PlanError::MissingSnapshot)?;
    snapshot.config.validate()?;
    let Some(record) = record else {
        return Ok(Plan::NotApplicable(Reason::NotRegistered));
    };

    let over = phase::resolve(snapshot.active, snapshot.timer_end, now).is_over();
    let in_round = record.round == snapshot.round;
    let estimated_dividend = if in_round {
        payout::estimate_dividend(snapshot, record.keys)
    } else {
        0
    };
    let is_winner = payout::estimate_winner_prize(snapshot, &record.player, now) > 0;
    let referral = payout::estimate_referral_earnings(record)?;

    let mut ops = Vec::with_capacity(2);
    if over && in_round && (estimated_dividend > 0 || is_winner) {
        ops.push(LedgerOp::ClaimPayout {
            round: snapshot.round,
        });
    }
    if referral > 0 {
        ops.push(LedgerOp::ClaimReferral {
            round: snapshot.round,
        });
    }
    if ops.is_empty() {
        return Ok(Plan::NotApplicable(Reason::NothingToClaim));
    }
    Ok(Plan::Ready(ops))
}
