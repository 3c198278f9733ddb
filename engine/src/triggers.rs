//! Edge-triggered notification rules over polled snapshots.
//!
//! Each rule fires on the transition into a qualifying state, never on every
//! poll while the state persists. Dedup bookkeeping lives in [`SessionState`],
//! which must be owned by exactly one poller — sharing it across pollers
//! double-fires milestones.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use lastkey_types::constants::{ENDING_THRESHOLD_SECS, LAMPORTS_PER_SOL};
use lastkey_types::{Address, RoundSnapshot};

/// Outbound priority; ties within a priority preserve rule-evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerKind {
    PotMilestone {
        threshold_lamports: u64,
        pot_lamports: u64,
    },
    TimerDrama {
        remaining_secs: i64,
    },
    RoundStarted {
        pot_lamports: u64,
    },
    RoundEnded {
        winner: Address,
        pot_lamports: u64,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TriggerEvent {
    pub round: u64,
    pub priority: Priority,
    #[serde(flatten)]
    pub kind: TriggerKind,
}

/// Rule thresholds. Milestones are normalized to ascending unique order on
/// construction.
#[derive(Clone, Debug)]
pub struct TriggerConfig {
    pub pot_milestones_lamports: Vec<u64>,
    pub drama_threshold_secs: i64,
}

impl TriggerConfig {
    pub fn new(mut pot_milestones_lamports: Vec<u64>, drama_threshold_secs: i64) -> Self {
        pot_milestones_lamports.sort_unstable();
        pot_milestones_lamports.dedup();
        Self {
            pot_milestones_lamports,
            drama_threshold_secs,
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self::new(
            [10u64, 50, 100, 500, 1_000]
                .iter()
                .map(|sol| sol * LAMPORTS_PER_SOL)
                .collect(),
            ENDING_THRESHOLD_SECS,
        )
    }
}

/// Per-poller dedup and pacing state. One instance per running poller; reset
/// rules key off observed round-number changes, not timers.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    round: Option<u64>,
    fired_milestones: BTreeSet<u64>,
    drama_active: bool,
    paused: bool,
    posts_per_channel: HashMap<String, u64>,
    last_snapshot: Option<RoundSnapshot>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn record_post(&mut self, channel: &str) {
        *self
            .posts_per_channel
            .entry(channel.to_string())
            .or_insert(0) += 1;
    }

    pub fn posts(&self, channel: &str) -> u64 {
        self.posts_per_channel.get(channel).copied().unwrap_or(0)
    }

    pub fn last_snapshot(&self) -> Option<&RoundSnapshot> {
        self.last_snapshot.as_ref()
    }
}

/// Evaluates trigger rules against successive polled snapshots.
#[derive(Clone, Debug, Default)]
pub struct TriggerEngine {
    config: TriggerConfig,
}

impl TriggerEngine {
    pub fn new(config: TriggerConfig) -> Self {
        Self { config }
    }

    /// Run every rule against the new snapshot, mutate the session's dedup
    /// state, and return the fired events ordered by priority. A paused
    /// session keeps its bookkeeping current but emits nothing.
    pub fn evaluate(
        &self,
        current: &RoundSnapshot,
        session: &mut SessionState,
        now: i64,
    ) -> Vec<TriggerEvent> {
        let mut lifecycle = Vec::new();

        match session.round {
            Some(previous) if current.round > previous => {
                debug!(previous, round = current.round, "round rollover observed");
                session.fired_milestones.clear();
                session.drama_active = false;
                lifecycle.push(TriggerEvent {
                    round: current.round,
                    priority: Priority::High,
                    kind: TriggerKind::RoundStarted {
                        pot_lamports: current.pot_lamports,
                    },
                });
            }
            Some(previous) if current.round < previous => {
                // observed history moved backwards (restart against an older
                // gateway); resynchronize without firing
                debug!(previous, round = current.round, "round number receded");
                session.fired_milestones.clear();
                session.drama_active = false;
            }
            _ => {}
        }

        if let Some(previous) = session.last_snapshot.as_ref() {
            if previous.round == current.round && previous.active && !current.active {
                lifecycle.push(TriggerEvent {
                    round: current.round,
                    priority: Priority::Medium,
                    kind: TriggerKind::RoundEnded {
                        winner: current.last_buyer.clone(),
                        pot_lamports: current.pot_lamports,
                    },
                });
            }
        }

        let mut milestones = Vec::new();
        for &threshold in &self.config.pot_milestones_lamports {
            if current.pot_lamports >= threshold && session.fired_milestones.insert(threshold) {
                milestones.push(TriggerEvent {
                    round: current.round,
                    priority: Priority::Medium,
                    kind: TriggerKind::PotMilestone {
                        threshold_lamports: threshold,
                        pot_lamports: current.pot_lamports,
                    },
                });
            }
        }

        let mut drama = Vec::new();
        let remaining = current.remaining_secs(now);
        let in_window =
            current.active && now < current.timer_end && remaining <= self.config.drama_threshold_secs;
        if in_window && !session.drama_active {
            session.drama_active = true;
            drama.push(TriggerEvent {
                round: current.round,
                priority: Priority::High,
                kind: TriggerKind::TimerDrama {
                    remaining_secs: remaining,
                },
            });
        } else if !in_window {
            session.drama_active = false;
        }

        session.round = Some(current.round);
        session.last_snapshot = Some(current.clone());

        if session.paused {
            return Vec::new();
        }

        // merge in rule-evaluation order, then stable-sort so ties keep it
        let mut events = milestones;
        events.extend(drama);
        events.extend(lifecycle);
        events.sort_by_key(|event| event.priority);
        events
    }
}
