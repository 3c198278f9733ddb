//! Raw ledger event normalization.
//!
//! Maps each raw record to at most one stable domain event; bookkeeping
//! records (fees, referral accrual, state pings) normalize to nothing. The
//! match is exhaustive over the closed raw union. Emitted ids are fresh per
//! call — deduplication, when a consumer needs it, keys on the ledger's own
//! transaction signature.

use uuid::Uuid;

use lastkey_types::{Address, DomainEvent, DomainEventKind, RawEvent, RawEventRecord};

/// Normalize one raw record into a domain event, or drop it.
pub fn normalize(record: &RawEventRecord) -> Option<DomainEvent> {
    let signature = record.signature.clone();
    match &record.event {
        RawEvent::KeysPurchased {
            round,
            player,
            keys_bought,
            lamports_spent,
            timestamp,
            ..
        } => Some(DomainEvent {
            id: Uuid::new_v4(),
            kind: DomainEventKind::Buy,
            player: player.clone(),
            lamports: *lamports_spent,
            keys: Some(*keys_bought),
            round: *round,
            timestamp: *timestamp,
            signature,
        }),
        RawEvent::Claimed {
            round,
            player,
            dividend_lamports,
            winner_lamports,
            total_lamports,
            timestamp,
        } => {
            // the program pays dividends and the winner prize jointly, so a
            // nonzero winner share makes the whole record a win
            let (kind, lamports) = if *winner_lamports == 0 {
                (DomainEventKind::Claim, *dividend_lamports)
            } else {
                (DomainEventKind::Win, *total_lamports)
            };
            Some(DomainEvent {
                id: Uuid::new_v4(),
                kind,
                player: player.clone(),
                lamports,
                keys: None,
                round: *round,
                timestamp: *timestamp,
                signature,
            })
        }
        RawEvent::RoundStarted {
            round,
            carry_over_lamports,
            timestamp,
            ..
        } => Some(DomainEvent {
            id: Uuid::new_v4(),
            kind: DomainEventKind::RoundStart,
            player: Address::system(),
            lamports: *carry_over_lamports,
            keys: None,
            round: *round,
            timestamp: *timestamp,
            signature,
        }),
        RawEvent::ReferralEarned { .. }
        | RawEvent::ReferralClaimed { .. }
        | RawEvent::RoundConcluded { .. }
        | RawEvent::ProtocolFeeCollected { .. }
        | RawEvent::GameUpdated { .. } => None,
    }
}
