//! In-memory bulletin store with the three delivery folders.
//!
//! Invariant: a sealed bulletin is a member of exactly one of
//! {outbox, sent} at any time. All transitions that must hold atomically are
//! single `&mut self` methods here, so a caller can never observe a bulletin
//! in neither or both folders.

use std::collections::HashMap;

use thiserror::Error;

use super::{Bulletin, Folder, UniversalId};

/// Which delivery queue an upload attempt draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Queue {
    /// Sealed bulletins awaiting upload.
    Outbox,
    /// Draft bulletins awaiting upload.
    DraftOutbox,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("bulletin {0} is not in the store")]
    UnknownBulletin(UniversalId),

    #[error("bulletin {0} is not queued in {1:?}")]
    NotQueued(UniversalId, Queue),
}

/// Local bulletin store owned by one account.
#[derive(Debug, Default)]
pub struct ClientStore {
    bulletins: HashMap<UniversalId, Bulletin>,
    outbox: Folder,
    draft_outbox: Folder,
    sent: Folder,
}

impl ClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a bulletin and queue it for delivery in the folder matching its
    /// status.
    pub fn save_and_queue(&mut self, bulletin: Bulletin) {
        let id = bulletin.id.clone();
        if bulletin.is_sealed() {
            self.outbox.add(id.clone());
        } else {
            self.draft_outbox.add(id.clone());
        }
        self.bulletins.insert(id, bulletin);
    }

    pub fn bulletin(&self, id: &UniversalId) -> Option<&Bulletin> {
        self.bulletins.get(id)
    }

    pub fn outbox(&self) -> &Folder {
        &self.outbox
    }

    pub fn draft_outbox(&self) -> &Folder {
        &self.draft_outbox
    }

    pub fn sent(&self) -> &Folder {
        &self.sent
    }

    pub fn front(&self, queue: Queue) -> Option<UniversalId> {
        match queue {
            Queue::Outbox => self.outbox.front().cloned(),
            Queue::DraftOutbox => self.draft_outbox.front().cloned(),
        }
    }

    /// Record successful delivery of a sealed bulletin: remove it from the
    /// outbox and add it to sent as one unit.
    pub fn deliver_sealed(&mut self, id: &UniversalId) -> Result<(), StoreError> {
        if !self.bulletins.contains_key(id) {
            return Err(StoreError::UnknownBulletin(id.clone()));
        }
        if !self.outbox.remove(id) {
            return Err(StoreError::NotQueued(id.clone(), Queue::Outbox));
        }
        self.sent.add(id.clone());
        Ok(())
    }

    /// Record successful delivery of a draft: remove it from the draft
    /// outbox. No further local record of the delivery is kept.
    pub fn deliver_draft(&mut self, id: &UniversalId) -> Result<(), StoreError> {
        if !self.draft_outbox.remove(id) {
            return Err(StoreError::NotQueued(id.clone(), Queue::DraftOutbox));
        }
        Ok(())
    }
}
