//! Pure derivation core for the lastkey game engine.
//!
//! Every function in this crate is a pure mapping from ledger snapshots (and
//! wall-clock time) to derived facts or operation plans. Nothing here performs
//! I/O or holds shared state; the modules are safe for unlimited concurrent
//! invocation. The one owned-mutable exception is [`triggers::SessionState`],
//! which belongs to exactly one poller.

pub mod normalize;
pub mod payout;
pub mod phase;
pub mod planner;
pub mod pricing;
pub mod status;
pub mod triggers;

pub use normalize::normalize;
pub use planner::{LedgerOp, Plan, PlanError, Reason};
pub use status::{resolve_player_status, PlayerStatus};
pub use triggers::{Priority, SessionState, TriggerConfig, TriggerEngine, TriggerEvent, TriggerKind};
