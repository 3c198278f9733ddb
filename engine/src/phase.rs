//! Round phase classification.
//!
//! The resolver is a pure function of ledger-observed state and wall-clock
//! time; it never triggers a transition itself. `Ended` means the timer has
//! expired while the ledger still reports the round active (the program ends
//! rounds lazily, on the next instruction that touches them); `Claiming`
//! means the ledger has marked the round inactive and payouts are available.

use lastkey_types::constants::ENDING_THRESHOLD_SECS;
use lastkey_types::{Phase, RoundSnapshot};

/// Classify a round from its active flag and timer, at `now` (unix seconds).
pub fn resolve(active: bool, timer_end: i64, now: i64) -> Phase {
    if !active {
        return Phase::Claiming;
    }
    if now >= timer_end {
        return Phase::Ended;
    }
    if timer_end.saturating_sub(now) <= ENDING_THRESHOLD_SECS {
        Phase::Ending
    } else {
        Phase::Active
    }
}

/// Classify an optional snapshot; absence of a round is `Waiting`.
pub fn resolve_snapshot(snapshot: Option<&RoundSnapshot>, now: i64) -> Phase {
    match snapshot {
        None => Phase::Waiting,
        Some(snapshot) => resolve(snapshot.active, snapshot.timer_end, now),
    }
}
