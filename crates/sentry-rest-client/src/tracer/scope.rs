//! Explicit holder of the active transaction
//!
//! A [`Scope`] is handed to instrumentation at construction time instead of
//! being looked up from process-wide state. Clones share the same slot, so the
//! code that starts a transaction and the HTTP client that records spans only
//! need to agree on one handle.

use std::sync::{Arc, RwLock};

use tracing::debug;

use super::transaction::{Transaction, TransactionContext};

#[derive(Debug, Clone, Default)]
pub struct Scope {
    transaction: Arc<RwLock<Option<Transaction>>>,
}

impl Scope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The active transaction, if any
    pub fn transaction(&self) -> Option<Transaction> {
        self.transaction
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_transaction(&self, transaction: Transaction) {
        debug!(name = %transaction.name(), "Binding transaction to scope");
        *self.transaction.write().unwrap_or_else(|e| e.into_inner()) = Some(transaction);
    }

    /// Unbinds and returns the active transaction
    pub fn clear_transaction(&self) -> Option<Transaction> {
        self.transaction
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    /// Unbinds `transaction` if it is still the active one. A transaction
    /// bound later by someone else is left in place.
    pub fn clear_transaction_if(&self, transaction: &Transaction) -> bool {
        let mut slot = self.transaction.write().unwrap_or_else(|e| e.into_inner());
        match slot.as_ref() {
            Some(active) if active.ptr_eq(transaction) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Starts a transaction and makes it the active one
    pub fn start_transaction(&self, context: TransactionContext) -> Transaction {
        let transaction = Transaction::start(context);
        self.set_transaction(transaction.clone());
        transaction
    }
}
