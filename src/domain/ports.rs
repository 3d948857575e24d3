use super::account::Balance;
use crate::error::UpdateError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

/// Adjusts a user's balance of one asset inside a caller-owned transaction.
///
/// `Tx` is whatever the embedding application uses as its transaction handle.
/// Implementations only run business logic against it; beginning, committing
/// and rolling back stay with the caller.
#[async_trait]
pub trait Accounter<Tx: Send>: Send + Sync {
    /// Positive `amount` credits the user, negative debits.
    async fn update_balance(&self, uid: &str, amount: Decimal, tx: &mut Tx)
    -> Result<(), UpdateError>;
}

/// Read side of an accounter.
#[async_trait]
pub trait BalanceSource<Tx: Send>: Send + Sync {
    async fn balance(&self, uid: &str, tx: &mut Tx) -> Result<Balance, UpdateError>;
}

/// Shared handle to a registered accounter.
pub type AccounterRef<Tx> = Arc<dyn Accounter<Tx>>;

/// Lets a plain function or closure act as an [`Accounter`].
pub struct AccounterFn<F>(F);

impl<F> AccounterFn<F> {
    pub fn new<Tx>(f: F) -> Self
    where
        F: Fn(&str, Decimal, &mut Tx) -> Result<(), UpdateError>,
    {
        Self(f)
    }
}

impl<F> fmt::Debug for AccounterFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccounterFn")
    }
}

#[async_trait]
impl<Tx, F> Accounter<Tx> for AccounterFn<F>
where
    Tx: Send,
    F: Fn(&str, Decimal, &mut Tx) -> Result<(), UpdateError> + Send + Sync,
{
    async fn update_balance(
        &self,
        uid: &str,
        amount: Decimal,
        tx: &mut Tx,
    ) -> Result<(), UpdateError> {
        (self.0)(uid, amount, tx)
    }
}

/// Placeholder bound to the empty asset id: every balance is zero and every
/// update succeeds without touching the transaction.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAccounter;

#[async_trait]
impl<Tx: Send> Accounter<Tx> for NoopAccounter {
    async fn update_balance(
        &self,
        _uid: &str,
        _amount: Decimal,
        _tx: &mut Tx,
    ) -> Result<(), UpdateError> {
        Ok(())
    }
}

#[async_trait]
impl<Tx: Send> BalanceSource<Tx> for NoopAccounter {
    async fn balance(&self, _uid: &str, _tx: &mut Tx) -> Result<Balance, UpdateError> {
        Ok(Balance::ZERO)
    }
}
