//! Payout estimation from snapshot plus player record.
//!
//! Estimates only — the ledger program performs the authoritative payout.
//! Dividends are derived through a per-key accumulator scaled by
//! `DIVIDEND_PRECISION` and floored twice (accumulator, then per-player), so
//! the sum of all per-player estimates never exceeds the pool; residual dust
//! stays in the round vault and is reconciled by the program.

use lastkey_types::constants::DIVIDEND_PRECISION;
use lastkey_types::{Address, IntegrityError, PlayerRecord, RoundSnapshot};

use crate::phase;

/// Dividend accumulator per key, scaled by [`DIVIDEND_PRECISION`], floored.
pub fn dividend_per_key(total_dividend_pool: u64, total_keys: u64) -> u128 {
    if total_keys == 0 {
        return 0;
    }
    (total_dividend_pool as u128)
        .saturating_mul(DIVIDEND_PRECISION)
        / total_keys as u128
}

/// Estimated dividend for a holder of `player_keys` keys in this round.
pub fn estimate_dividend(snapshot: &RoundSnapshot, player_keys: u64) -> u64 {
    let accumulator = dividend_per_key(snapshot.total_dividend_pool, snapshot.total_keys);
    let share = (player_keys as u128).saturating_mul(accumulator) / DIVIDEND_PRECISION;
    // share <= total_dividend_pool, so the cast cannot truncate
    share as u64
}

/// The winner pot, if (and only if) `address` is the last buyer, the round is
/// over, and the prize is unclaimed.
pub fn estimate_winner_prize(snapshot: &RoundSnapshot, address: &Address, now: i64) -> u64 {
    let over = phase::resolve(snapshot.active, snapshot.timer_end, now).is_over();
    if over && !snapshot.winner_claimed && *address == snapshot.last_buyer {
        snapshot.winner_pot
    } else {
        0
    }
}

/// Unclaimed referral earnings: accrued minus claimed. A claimed total above
/// the accrued total means the ledger and this engine disagree about history,
/// which is an integrity fault, not a zero.
pub fn estimate_referral_earnings(record: &PlayerRecord) -> Result<u64, IntegrityError> {
    record
        .referral_earnings_lamports
        .checked_sub(record.claimed_referral_earnings_lamports)
        .ok_or(IntegrityError::ReferralUnderflow {
            earned: record.referral_earnings_lamports,
            claimed: record.claimed_referral_earnings_lamports,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lastkey_types::RoundConfig;

    fn snapshot(total_keys: u64, pool: u64) -> RoundSnapshot {
        RoundSnapshot {
            round: 4,
            pot_lamports: 0,
            timer_end: 1_000,
            round_start: 0,
            last_buyer: Address::parse("EebbWtjHyocWPwZaQ4k2L61mSdW6y175knsEwppTpdWw").unwrap(),
            total_keys,
            total_players: 3,
            active: true,
            winner_claimed: false,
            total_dividend_pool: pool,
            next_round_pot: 0,
            winner_pot: 480_000_000,
            config: RoundConfig::default(),
        }
    }

    #[test]
    fn dividend_proportional_shares() {
        let snapshot = snapshot(100, 1_000_000_000);
        assert_eq!(estimate_dividend(&snapshot, 30), 300_000_000);
        assert_eq!(estimate_dividend(&snapshot, 70), 700_000_000);
        assert_eq!(estimate_dividend(&snapshot, 0), 0);
    }

    #[test]
    fn dividend_zero_supply_is_zero() {
        let snapshot = snapshot(0, 1_000_000_000);
        assert_eq!(estimate_dividend(&snapshot, 10), 0);
    }

    #[test]
    fn dividend_estimates_never_exceed_pool() {
        // 3 holders of 1 key each against a 100-lamport pool floor to 33 each
        let snapshot = snapshot(3, 100);
        let each = estimate_dividend(&snapshot, 1);
        assert_eq!(each, 33);
        assert!(each * 3 <= snapshot.total_dividend_pool);

        // uneven holdings still sum at or below the pool
        let snapshot = self::snapshot(7, 1_000_000_001);
        let total: u64 = [1u64, 2, 4]
            .iter()
            .map(|keys| estimate_dividend(&snapshot, *keys))
            .sum();
        assert!(total <= snapshot.total_dividend_pool);
    }

    #[test]
    fn winner_prize_requires_last_buyer_and_round_over() {
        let winner = Address::parse("EebbWtjHyocWPwZaQ4k2L61mSdW6y175knsEwppTpdWw").unwrap();
        let other = Address::system();
        let mut snap = snapshot(10, 0);

        // round still running
        assert_eq!(estimate_winner_prize(&snap, &winner, 500), 0);
        // timer expired, ledger still active
        assert_eq!(estimate_winner_prize(&snap, &winner, 2_000), 480_000_000);
        // not the last buyer
        assert_eq!(estimate_winner_prize(&snap, &other, 2_000), 0);
        // already claimed
        snap.winner_claimed = true;
        assert_eq!(estimate_winner_prize(&snap, &winner, 2_000), 0);
    }

    #[test]
    fn referral_earnings_subtract_claimed() {
        let mut record = PlayerRecord {
            player: Address::system(),
            keys: 0,
            round: 0,
            claimed_dividends_lamports: 0,
            referrer: None,
            referral_earnings_lamports: 98_000_000,
            claimed_referral_earnings_lamports: 90_000_000,
            is_agent: false,
        };
        assert_eq!(estimate_referral_earnings(&record), Ok(8_000_000));

        record.claimed_referral_earnings_lamports = 98_000_000;
        assert_eq!(estimate_referral_earnings(&record), Ok(0));
    }

    #[test]
    fn referral_underflow_is_reported() {
        let record = PlayerRecord {
            player: Address::system(),
            keys: 0,
            round: 0,
            claimed_dividends_lamports: 0,
            referrer: None,
            referral_earnings_lamports: 10,
            claimed_referral_earnings_lamports: 11,
            is_agent: false,
        };
        assert_eq!(
            estimate_referral_earnings(&record),
            Err(IntegrityError::ReferralUnderflow {
                earned: 10,
                claimed: 11,
            })
        );
    }
}
