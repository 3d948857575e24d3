use crate::domain::ports::{Accounter, AccounterFn, AccounterRef, NoopAccounter};
use crate::error::{OpayError, Result, UpdateError};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

/// Asset id that resolves to [`NoopAccounter`] from construction onwards.
pub const DEFAULT_ASSET: &str = "";

/// Maps asset ids to the accounters that adjust their balances.
///
/// Bindings are add-only: once an asset id is registered it keeps its
/// accounter for the life of the registry. Lookups take a shared lock and
/// hand back a cloned `Arc`, so no accounter ever runs while the lock is held.
///
/// One registry is normally built at startup and shared (`Arc`) with every
/// consumer; tests build their own.
pub struct AccountRegistry<Tx: Send> {
    accounters: RwLock<HashMap<String, AccounterRef<Tx>>>,
}

impl<Tx: Send + 'static> AccountRegistry<Tx> {
    /// Creates a registry holding only the default no-op accounter.
    pub fn new() -> Self {
        let mut accounters: HashMap<String, AccounterRef<Tx>> = HashMap::new();
        accounters.insert(DEFAULT_ASSET.to_string(), Arc::new(NoopAccounter));
        Self {
            accounters: RwLock::new(accounters),
        }
    }

    /// Binds `accounter` to `asset_id`.
    ///
    /// Fails with [`OpayError::AlreadyRegistered`] if the id is taken, leaving
    /// the existing binding in place.
    pub fn register<A>(&self, asset_id: impl Into<String>, accounter: A) -> Result<()>
    where
        A: Accounter<Tx> + 'static,
    {
        self.register_shared(asset_id, Arc::new(accounter))
    }

    /// Like [`register`](Self::register) for an accounter already behind an `Arc`.
    pub fn register_shared(
        &self,
        asset_id: impl Into<String>,
        accounter: AccounterRef<Tx>,
    ) -> Result<()> {
        let asset_id = asset_id.into();
        let mut accounters = self.accounters.write();
        match accounters.entry(asset_id) {
            Entry::Occupied(entry) => {
                tracing::warn!(asset_id = %entry.key(), "accounter already registered");
                Err(OpayError::AlreadyRegistered(entry.key().clone()))
            }
            Entry::Vacant(entry) => {
                tracing::debug!(asset_id = %entry.key(), "accounter registered");
                entry.insert(accounter);
                Ok(())
            }
        }
    }

    /// Registers a plain function or closure as the accounter for `asset_id`.
    pub fn register_fn<F>(&self, asset_id: impl Into<String>, f: F) -> Result<()>
    where
        F: Fn(&str, Decimal, &mut Tx) -> std::result::Result<(), UpdateError>
            + Send
            + Sync
            + 'static,
    {
        self.register(asset_id, AccounterFn::new::<Tx>(f))
    }

    /// Looks up the accounter bound to `asset_id`.
    pub fn resolve(&self, asset_id: &str) -> Result<AccounterRef<Tx>> {
        self.accounters
            .read()
            .get(asset_id)
            .cloned()
            .ok_or_else(|| OpayError::NotFound(asset_id.to_string()))
    }

    /// Resolves `asset_id` and applies `amount` to `uid` within `tx`.
    ///
    /// The registry lock is released before the accounter runs. Accounter
    /// failures come back as [`OpayError::Update`] carrying the original
    /// error; rolling back `tx` is up to the caller.
    pub async fn update_balance(
        &self,
        asset_id: &str,
        uid: &str,
        amount: Decimal,
        tx: &mut Tx,
    ) -> Result<()> {
        let accounter = self.resolve(asset_id)?;
        accounter.update_balance(uid, amount, tx).await?;
        Ok(())
    }

    pub fn contains(&self, asset_id: &str) -> bool {
        self.accounters.read().contains_key(asset_id)
    }

    /// Registered asset ids in ascending order, including the default.
    pub fn asset_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.accounters.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.accounters.read().len()
    }

    /// Always false: the default binding cannot be removed.
    pub fn is_empty(&self) -> bool {
        self.accounters.read().is_empty()
    }
}

impl<Tx: Send + 'static> Default for AccountRegistry<Tx> {
    fn default() -> Self {
        Self::new()
    }
}
