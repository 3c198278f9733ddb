//! Unsigned instruction bundle assembly.
//!
//! The engine plans operations; this module packs an ordered plan plus the
//! fee payer into the serialized bundle handed to the external signer. The
//! bundle is submitted atomically, all-or-nothing, as one transaction.

use serde::{Deserialize, Serialize};

use lastkey_engine::LedgerOp;
use lastkey_types::Address;

use crate::{Error, Result, MAX_BUNDLE_OPERATIONS};

/// An ordered, unsigned operation bundle awaiting an external signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedBundle {
    pub fee_payer: Address,
    pub operations: Vec<LedgerOp>,
}

impl UnsignedBundle {
    /// Serialize for transport to the signer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Build the unsigned bundle for an ordered operation list.
pub fn build_submission(operations: &[LedgerOp], fee_payer: &Address) -> Result<UnsignedBundle> {
    if operations.is_empty() {
        return Err(Error::EmptySubmission);
    }
    if operations.len() > MAX_BUNDLE_OPERATIONS {
        return Err(Error::TooManyOperations {
            max: MAX_BUNDLE_OPERATIONS,
            got: operations.len(),
        });
    }
    Ok(UnsignedBundle {
        fee_payer: fee_payer.clone(),
        operations: operations.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payer() -> Address {
        Address::parse("EebbWtjHyocWPwZaQ4k2L61mSdW6y175knsEwppTpdWw").unwrap()
    }

    #[test]
    fn preserves_operation_order() {
        let ops = vec![
            LedgerOp::SettleRound { round: 3 },
            LedgerOp::BuyKeys {
                round: 5,
                keys: 2,
                is_agent: false,
                referrer: None,
                max_cost_lamports: 21_000_000,
            },
        ];
        let bundle = build_submission(&ops, &payer()).unwrap();
        assert_eq!(bundle.operations, ops);
        assert_eq!(bundle.fee_payer, payer());
    }

    #[test]
    fn rejects_empty_plan() {
        let err = build_submission(&[], &payer()).unwrap_err();
        assert!(matches!(err, Error::EmptySubmission));
    }

    #[test]
    fn rejects_oversized_plan() {
        let ops = vec![LedgerOp::ClaimReferral { round: 1 }; MAX_BUNDLE_OPERATIONS + 1];
        let err = build_submission(&ops, &payer()).unwrap_err();
        assert!(matches!(err, Error::TooManyOperations { .. }));
    }

    #[test]
    fn bundle_serializes_with_tagged_ops() {
        let ops = vec![LedgerOp::ClaimPayout { round: 9 }];
        let bundle = build_submission(&ops, &payer()).unwrap();
        let json = String::from_utf8(bundle.to_bytes().unwrap()).unwrap();
        assert!(json.contains("\"op\":\"claim_payout\""));
        assert!(json.contains("\"round\":9"));
    }
}
