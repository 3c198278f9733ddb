use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::constants::BPS_DENOMINATOR;

/// A mismatch between this engine's assumptions and observed ledger state.
/// These are reported loudly, never clamped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("pot split basis points sum to {sum}, expected {BPS_DENOMINATOR}")]
    PotSplitBps { sum: u64 },
    #[error("{name} basis points {bps} exceed {BPS_DENOMINATOR}")]
    BpsOutOfRange { name: &'static str, bps: u64 },
    #[error("claimed referral earnings {claimed} exceed accrued earnings {earned}")]
    ReferralUnderflow { earned: u64, claimed: u64 },
}

/// Round lifecycle as classified by this engine. `Ending` is a display-only
/// urgency refinement of `Active`; the ledger never stores it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Waiting,
    Active,
    Ending,
    Ended,
    Claiming,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Waiting => "waiting",
            Phase::Active => "active",
            Phase::Ending => "ending",
            Phase::Ended => "ended",
            Phase::Claiming => "claiming",
        }
    }

    /// Whether buys are accepted in this phase.
    pub fn is_open(&self) -> bool {
        matches!(self, Phase::Active | Phase::Ending)
    }

    /// Whether the round is over (settled or awaiting settlement).
    pub fn is_over(&self) -> bool {
        matches!(self, Phase::Ended | Phase::Claiming)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pricing and split parameters frozen into a round at round start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Base price per key in lamports
    pub base_price_lamports: u64,
    /// Price increment per key already sold
    pub price_increment_lamports: u64,
    /// Seconds added to timer per buy
    pub timer_extension_secs: i64,
    /// Maximum timer duration in seconds
    pub max_timer_secs: i64,
    /// Winner share in basis points
    pub winner_bps: u64,
    /// Dividend share in basis points
    pub dividend_bps: u64,
    /// Next round carry share in basis points
    pub next_round_bps: u64,
    /// Protocol fee in basis points (taken off the gross cost)
    pub protocol_fee_bps: u64,
    /// Referral bonus in basis points (of the after-fee amount)
    pub referral_bonus_bps: u64,
}

impl RoundConfig {
    /// Validate the frozen config: the three pot splits must sum to exactly
    /// 10_000 bps; protocol fee and referral bonus sit outside that sum but
    /// must each fit in 10_000 bps.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        let sum = self
            .winner_bps
            .saturating_add(self.dividend_bps)
            .saturating_add(self.next_round_bps);
        if sum != BPS_DENOMINATOR {
            return Err(IntegrityError::PotSplitBps { sum });
        }
        if self.protocol_fee_bps > BPS_DENOMINATOR {
            return Err(IntegrityError::BpsOutOfRange {
                name: "protocol_fee",
                bps: self.protocol_fee_bps,
            });
        }
        if self.referral_bonus_bps > BPS_DENOMINATOR {
            return Err(IntegrityError::BpsOutOfRange {
                name: "referral_bonus",
                bps: self.referral_bonus_bps,
            });
        }
        Ok(())
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            base_price_lamports: DEFAULT_BASE_PRICE_LAMPORTS,
            price_increment_lamports: DEFAULT_PRICE_INCREMENT_LAMPORTS,
            timer_extension_secs: DEFAULT_TIMER_EXTENSION_SECS,
            max_timer_secs: DEFAULT_MAX_TIMER_SECS,
            winner_bps: DEFAULT_WINNER_BPS,
            dividend_bps: DEFAULT_DIVIDEND_BPS,
            next_round_bps: DEFAULT_NEXT_ROUND_BPS,
            protocol_fee_bps: DEFAULT_PROTOCOL_FEE_BPS,
            referral_bonus_bps: DEFAULT_REFERRAL_BONUS_BPS,
        }
    }
}

/// Immutable snapshot of one round's on-ledger state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// Round number
    pub round: u64,
    /// Total lamports deposited this round (gross spend)
    pub pot_lamports: u64,
    /// Unix timestamp when the timer expires
    pub timer_end: i64,
    /// Unix timestamp of round start
    pub round_start: i64,
    /// Most recent key buyer (potential winner); system address before any buy
    pub last_buyer: Address,
    /// Total keys sold this round
    pub total_keys: u64,
    /// Unique players in this round
    pub total_players: u32,
    /// Whether the ledger still marks the round active
    pub active: bool,
    /// Whether the winner has claimed the prize
    pub winner_claimed: bool,
    /// Lamports accumulated for proportional dividends
    pub total_dividend_pool: u64,
    /// Accumulated carry for the next round
    pub next_round_pot: u64,
    /// Accumulated winner share
    pub winner_pot: u64,
    /// Config snapshot frozen at round start
    pub config: RoundConfig,
}

impl RoundSnapshot {
    /// Seconds until the timer expires, saturating at zero.
    pub fn remaining_secs(&self, now: i64) -> i64 {
        self.timer_end.saturating_sub(now).max(0)
    }
}

/// One player's on-ledger record. Absence of a record is itself meaningful:
/// the player has never registered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Player's wallet address
    pub player: Address,
    /// Keys held in the round of record
    pub keys: u64,
    /// Round this record last participated in; 0 is the ledger's
    /// "settled, between rounds" sentinel
    pub round: u64,
    /// Total dividends already withdrawn
    pub claimed_dividends_lamports: u64,
    /// Who referred this player (set once, immutable after)
    pub referrer: Option<Address>,
    /// Accrued earnings from referring others
    pub referral_earnings_lamports: u64,
    /// Referral earnings already claimed
    pub claimed_referral_earnings_lamports: u64,
    /// Whether this player is an automated agent
    pub is_agent: bool,
}
