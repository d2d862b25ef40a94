use std::sync::Arc;

use arbor_eth::{Block, Receipt};
use arbor_primitives::B256;
use parking_lot::RwLock;

use crate::error::ObserverError;

/// Observer of branch-processing events.
///
/// Hooks are invoked synchronously, in subscription order, from the
/// processing thread. Observers must not mutate world state; an error from
/// any hook aborts the branch and triggers a rollback.
pub trait BranchObserver: Send + Sync {
    /// A branch of suggested blocks is about to be processed.
    fn branch_starting(&self, _blocks: &[Arc<Block>]) -> Result<(), ObserverError> {
        Ok(())
    }

    /// A block was fully processed.
    fn block_processed(&self, _block: &Arc<Block>, _receipts: &[Receipt]) -> Result<(), ObserverError> {
        Ok(())
    }

    /// A transaction was processed. Raised once per transaction, in
    /// transaction order, before the containing block's
    /// [`BranchObserver::block_processed`].
    fn transaction_processed(
        &self,
        _index: usize,
        _transaction_hash: B256,
        _receipt: &Receipt,
    ) -> Result<(), ObserverError> {
        Ok(())
    }
}

/// Registry of branch observers.
#[derive(Default)]
pub struct Events {
    observers: RwLock<Vec<Arc<dyn BranchObserver>>>,
}

impl Events {
    /// Subscribes an observer. Observers are notified in subscription order.
    pub fn subscribe(&self, observer: Arc<dyn BranchObserver>) {
        self.observers.write().push(observer);
    }

    pub(crate) fn branch_starting(&self, blocks: &[Arc<Block>]) -> Result<(), ObserverError> {
        for observer in self.observers.read().iter() {
            observer.branch_starting(blocks)?;
        }
        Ok(())
    }

    pub(crate) fn block_processed(
        &self,
        block: &Arc<Block>,
        receipts: &[Receipt],
    ) -> Result<(), ObserverError> {
        for observer in self.observers.read().iter() {
            observer.block_processed(block, receipts)?;
        }
        Ok(())
    }

    pub(crate) fn transaction_processed(
        &self,
        index: usize,
        transaction_hash: B256,
        receipt: &Receipt,
    ) -> Result<(), ObserverError> {
        for observer in self.observers.read().iter() {
            observer.transaction_processed(index, transaction_hash, receipt)?;
        }
        Ok(())
    }
}
