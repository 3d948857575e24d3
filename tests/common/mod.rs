use opay::AccountRegistry;
use opay::infrastructure::in_memory::{InMemoryLedger, LedgerAccounter, LedgerTransaction};
use std::sync::Arc;

/// A registry wired with ledger accounters for `usd` (no overdraft) and
/// `credit` (overdraft allowed), plus the ledger they write to.
#[allow(dead_code)]
pub fn ledger_registry() -> (Arc<AccountRegistry<LedgerTransaction>>, InMemoryLedger) {
    let registry = AccountRegistry::new();
    registry
        .register("usd", LedgerAccounter::new("usd"))
        .expect("usd registers once");
    registry
        .register("credit", LedgerAccounter::new("credit").with_overdraft())
        .expect("credit registers once");
    (Arc::new(registry), InMemoryLedger::new())
}
