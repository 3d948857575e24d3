use crate::domain::account::Balance;
use crate::domain::ports::{Accounter, BalanceSource};
use crate::error::UpdateError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

type LedgerKey = (String, String);

/// Committed balance of one user in one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub asset: String,
    pub uid: String,
    pub balance: Balance,
}

/// A thread-safe in-memory balance book keyed by (asset, user).
///
/// Uses `Arc<RwLock<HashMap<..>>>` so clones share state. Changes only land
/// through [`LedgerTransaction::commit`].
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    balances: Arc<RwLock<HashMap<LedgerKey, Balance>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a transaction against this ledger.
    pub fn begin(&self) -> LedgerTransaction {
        LedgerTransaction {
            ledger: self.clone(),
            staged: HashMap::new(),
            guarded: HashSet::new(),
        }
    }

    /// Committed balance, zero for unknown users.
    pub async fn balance(&self, asset: &str, uid: &str) -> Balance {
        let balances = self.balances.read().await;
        balances
            .get(&(asset.to_string(), uid.to_string()))
            .copied()
            .unwrap_or(Balance::ZERO)
    }

    /// All committed balances ordered by asset, then user.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        let balances = self.balances.read().await;
        let mut entries: Vec<LedgerEntry> = balances
            .iter()
            .map(|((asset, uid), balance)| LedgerEntry {
                asset: asset.clone(),
                uid: uid.clone(),
                balance: *balance,
            })
            .collect();
        entries.sort_by(|a, b| (&a.asset, &a.uid).cmp(&(&b.asset, &b.uid)));
        entries
    }
}

/// Pending balance changes against an [`InMemoryLedger`].
///
/// Reads see committed state plus this transaction's own changes. Dropping
/// the transaction without committing discards the changes. Balances staged
/// through [`stage_guarded`](Self::stage_guarded) are checked again at commit,
/// so a concurrent commit cannot push them below zero.
pub struct LedgerTransaction {
    ledger: InMemoryLedger,
    staged: HashMap<LedgerKey, Balance>,
    guarded: HashSet<LedgerKey>,
}

impl LedgerTransaction {
    pub async fn balance(&self, asset: &str, uid: &str) -> Balance {
        let pending = self
            .staged
            .get(&(asset.to_string(), uid.to_string()))
            .copied()
            .unwrap_or(Balance::ZERO);
        self.ledger.balance(asset, uid).await + pending
    }

    pub fn stage(&mut self, asset: &str, uid: &str, amount: Decimal) {
        *self
            .staged
            .entry((asset.to_string(), uid.to_string()))
            .or_default() += Balance::new(amount);
    }

    /// Like [`stage`](Self::stage), and the resulting balance must not be
    /// negative when the transaction commits.
    pub fn stage_guarded(&mut self, asset: &str, uid: &str, amount: Decimal) {
        self.stage(asset, uid, amount);
        self.guarded.insert((asset.to_string(), uid.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Applies every staged change and returns how many balances changed.
    ///
    /// Fails with [`LedgerError::InsufficientFunds`] and applies nothing if a
    /// guarded balance would end up negative against the committed state.
    pub async fn commit(self) -> Result<usize, LedgerError> {
        let mut balances = self.ledger.balances.write().await;

        for key in &self.guarded {
            let committed = balances.get(key).copied().unwrap_or(Balance::ZERO);
            let delta = self.staged.get(key).copied().unwrap_or(Balance::ZERO);
            if (committed + delta).is_negative() {
                tracing::warn!(asset = %key.0, uid = %key.1, "ledger commit rejected");
                return Err(LedgerError::InsufficientFunds {
                    asset: key.0.clone(),
                    uid: key.1.clone(),
                    balance: committed.value(),
                    amount: delta.value(),
                });
            }
        }

        let changed = self.staged.len();
        for (key, delta) in self.staged {
            *balances.entry(key).or_default() += delta;
        }
        tracing::debug!(changed, "ledger transaction committed");
        Ok(changed)
    }

    pub fn rollback(self) {
        tracing::debug!(discarded = self.staged.len(), "ledger transaction rolled back");
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient funds: {uid} holds {balance} {asset}, cannot apply {amount}")]
    InsufficientFunds {
        asset: String,
        uid: String,
        balance: Decimal,
        amount: Decimal,
    },
}

/// Accounter keeping one asset's balances in an [`InMemoryLedger`].
///
/// Debits that would take a balance below zero are refused unless the
/// accounter was built with [`LedgerAccounter::with_overdraft`].
#[derive(Debug, Clone)]
pub struct LedgerAccounter {
    asset: String,
    allow_overdraft: bool,
}

impl LedgerAccounter {
    pub fn new(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            allow_overdraft: false,
        }
    }

    pub fn with_overdraft(mut self) -> Self {
        self.allow_overdraft = true;
        self
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }
}

#[async_trait]
impl Accounter<LedgerTransaction> for LedgerAccounter {
    async fn update_balance(
        &self,
        uid: &str,
        amount: Decimal,
        tx: &mut LedgerTransaction,
    ) -> Result<(), UpdateError> {
        let current = tx.balance(&self.asset, uid).await;
        if !self.allow_overdraft && (current + Balance::new(amount)).is_negative() {
            return Err(UpdateError::new(LedgerError::InsufficientFunds {
                asset: self.asset.clone(),
                uid: uid.to_string(),
                balance: current.value(),
                amount,
            }));
        }
        if self.allow_overdraft {
            tx.stage(&self.asset, uid, amount);
        } else {
            tx.stage_guarded(&self.asset, uid, amount);
        }
        Ok(())
    }
}

#[async_trait]
impl BalanceSource<LedgerTransaction> for LedgerAccounter {
    async fn balance(&self, uid: &str, tx: &mut LedgerTransaction) -> Result<Balance, UpdateError> {
        Ok(tx.balance(&self.asset, uid).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_commit_applies_staged_changes() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin();
        tx.stage("usd", "u1", dec!(10));
        tx.stage("usd", "u1", dec!(-4));
        tx.stage("cny", "u2", dec!(7));

        assert_eq!(tx.balance("usd", "u1").await, Balance::new(dec!(6)));
        assert_eq!(ledger.balance("usd", "u1").await, Balance::ZERO);

        assert_eq!(tx.commit().await.unwrap(), 2);
        assert_eq!(ledger.balance("usd", "u1").await, Balance::new(dec!(6)));
        assert_eq!(
            ledger.entries().await,
            vec![
                LedgerEntry {
                    asset: "cny".to_string(),
                    uid: "u2".to_string(),
                    balance: Balance::new(dec!(7)),
                },
                LedgerEntry {
                    asset: "usd".to_string(),
                    uid: "u1".to_string(),
                    balance: Balance::new(dec!(6)),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_guarded_commit_rechecks_committed_balance() {
        let ledger = InMemoryLedger::new();
        let mut seed = ledger.begin();
        seed.stage("usd", "u1", dec!(3));
        seed.commit().await.unwrap();

        let mut tx = ledger.begin();
        tx.stage_guarded("usd", "u1", dec!(-3));
        tx.stage("usd", "u2", dec!(3));

        let mut other = ledger.begin();
        other.stage("usd", "u1", dec!(-1));
        other.commit().await.unwrap();

        assert!(matches!(
            tx.commit().await,
            Err(LedgerError::InsufficientFunds { ref uid, .. }) if uid == "u1"
        ));
        assert_eq!(ledger.balance("usd", "u1").await, Balance::new(dec!(2)));
        assert_eq!(ledger.balance("usd", "u2").await, Balance::ZERO);
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_changes() {
        let ledger = InMemoryLedger::new();

        let mut tx = ledger.begin();
        tx.stage("usd", "u1", dec!(10));
        tx.rollback();

        let mut tx = ledger.begin();
        tx.stage("usd", "u1", dec!(10));
        drop(tx);

        assert!(ledger.entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_ledger_accounter_rejects_overdraft() {
        let ledger = InMemoryLedger::new();
        let accounter = LedgerAccounter::new("usd");

        let mut tx = ledger.begin();
        accounter.update_balance("u1", dec!(5), &mut tx).await.unwrap();
        let err = accounter
            .update_balance("u1", dec!(-6), &mut tx)
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<LedgerError>(),
            Some(&LedgerError::InsufficientFunds {
                asset: "usd".to_string(),
                uid: "u1".to_string(),
                balance: dec!(5),
                amount: dec!(-6),
            })
        );
        assert_eq!(
            accounter.balance("u1", &mut tx).await.unwrap(),
            Balance::new(dec!(5))
        );
    }

    #[tokio::test]
    async fn test_ledger_accounter_with_overdraft() {
        let ledger = InMemoryLedger::new();
        let accounter = LedgerAccounter::new("credit").with_overdraft();

        let mut tx = ledger.begin();
        accounter
            .update_balance("u1", dec!(-3.5), &mut tx)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(ledger.balance("credit", "u1").await, Balance::new(dec!(-3.5)));
    }
}
