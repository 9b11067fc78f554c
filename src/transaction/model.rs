use serde::{Deserialize, Serialize};

use crate::ledger::error::LedgerError;

/// A transfer as submitted by a client, before the transaction store has
/// assigned it an identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
    /// Hex-encoded signature. Carried opaque; never verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// A stored transaction. Immutable once saved; owned by the pending pool
/// until mined, then by the block that includes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Identifier assigned by the transaction store on save.
    pub id: String,
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl TransactionDraft {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            signature: None,
        }
    }

    /// Reject drafts that must never reach the pending pool: blank
    /// endpoints or a non-positive (or non-finite) amount.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.sender.trim().is_empty() || self.recipient.trim().is_empty() {
            return Err(LedgerError::InvalidTransaction(
                "transaction must have a sender and a recipient".into(),
            ));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(LedgerError::InvalidTransaction(
                "amount must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::TransactionDraft;
    use crate::ledger::error::LedgerError;

    #[test]
    fn valid_draft_passes() {
        assert!(TransactionDraft::new("alice", "bob", 10.0).validate().is_ok());
    }

    #[test]
    fn blank_endpoints_rejected() {
        let draft = TransactionDraft::new("  ", "bob", 10.0);
        assert!(matches!(
            draft.validate(),
            Err(LedgerError::InvalidTransaction(_))
        ));
        let draft = TransactionDraft::new("alice", "", 10.0);
        assert!(draft.validate().is_err());
    }

    #[test]
    fn non_positive_amount_rejected() {
        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let draft = TransactionDraft::new("alice", "bob", amount);
            assert!(draft.validate().is_err(), "amount {amount} should fail");
        }
    }
}
