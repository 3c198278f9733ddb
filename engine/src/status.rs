//! Action-eligibility summary for one player.
//!
//! Composes the phase resolver and payout estimator into the flags a caller
//! needs to render or gate actions. Always recomputed from the two snapshots
//! plus wall-clock time; never persisted.

use serde::Serialize;

use lastkey_types::{Address, IntegrityError, Phase, PlayerRecord, RoundSnapshot};

use crate::{payout, phase};

/// Derived, ephemeral view of what a player can do right now.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerStatus {
    pub phase: Phase,
    /// No record exists for this address.
    pub needs_registration: bool,
    /// The record's round is behind the current round with keys still held;
    /// those keys must be settled before any new buy.
    pub needs_settlement: bool,
    /// Round of the record, if one exists.
    pub round_of_record: Option<u64>,
    /// Keys held in the current round (zero when the record is stale).
    pub keys: u64,
    pub can_buy_keys: bool,
    pub can_claim: bool,
    pub can_claim_referral: bool,
    pub is_winner: bool,
    pub estimated_dividend_lamports: u64,
    pub estimated_winner_lamports: u64,
    pub estimated_referral_lamports: u64,
}

impl PlayerStatus {
    fn waiting(record: Option<&PlayerRecord>) -> Self {
        Self {
            phase: Phase::Waiting,
            needs_registration: record.is_none(),
            needs_settlement: false,
            round_of_record: record.map(|r| r.round),
            keys: 0,
            can_buy_keys: false,
            can_claim: false,
            can_claim_referral: false,
            is_winner: false,
            estimated_dividend_lamports: 0,
            estimated_winner_lamports: 0,
            estimated_referral_lamports: 0,
        }
    }
}

/// Resolve a player's status against the current round.
///
/// Estimates are computed against the current snapshot only: a stale record's
/// keys belong to a prior round's pool, which this snapshot cannot price, so
/// they surface as `needs_settlement` rather than as a dividend figure.
pub fn resolve_player_status(
    snapshot: Option<&RoundSnapshot>,
    record: Option<&PlayerRecord>,
    address: &Address,
    now: i64,
) -> Result<PlayerStatus, IntegrityError> {
    let Some(snapshot) = snapshot else {
        return Ok(PlayerStatus::waiting(record));
    };
    snapshot.config.validate()?;

    let phase = phase::resolve(snapshot.active, snapshot.timer_end, now);
    let needs_registration = record.is_none();
    let in_round = record.is_some_and(|r| r.round == snapshot.round);
    let needs_settlement =
        record.is_some_and(|r| r.round != snapshot.round && r.keys > 0);
    let keys = if in_round {
        record.map(|r| r.keys).unwrap_or(0)
    } else {
        0
    };

    let estimated_dividend = if in_round {
        payout::estimate_dividend(snapshot, keys)
    } else {
        0
    };
    let estimated_winner = payout::estimate_winner_prize(snapshot, address, now);
    let estimated_referral = record
        .map(payout::estimate_referral_earnings)
        .transpose()?
        .unwrap_or(0);

    let is_winner = estimated_winner > 0;
    Ok(PlayerStatus {
        phase,
        needs_registration,
        needs_settlement,
        round_of_record: record.map(|r| r.round),
        keys,
        can_buy_keys: phase.is_open() && !needs_settlement,
        can_claim: phase.is_over() && (estimated_dividend > 0 || is_winner),
        can_claim_referral: estimated_referral > 0,
        is_winner,
        estimated_dividend_lamports: estimated_dividend,
        estimated_winner_lamports: estimated_winner,
        estimated_referral_lamports: estimated_referral,
    })
}
